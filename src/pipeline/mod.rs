//! Pipeline stages shared by rasterization jobs and crop batches.
//!
//! Each submodule implements one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! rasterize:  input ──▶ render ──▶ codec::encode
//!             (URL/path) (engine)   (JPEG, headered base64)
//!
//! crop:       codec::decode ──▶ crop ──▶ codec::encode
//!             (headered/bare)   (bbox → pixels)
//! ```
//!
//! 1. [`input`]: fetch a URL or read a path into memory, check `%PDF`
//! 2. [`render`]: rasterise leading pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`codec`]: base64 + JPEG in both directions
//! 4. [`crop`]: resolve a normalised bbox to pixels and cut it out

pub mod codec;
pub mod crop;
pub mod input;
pub mod render;

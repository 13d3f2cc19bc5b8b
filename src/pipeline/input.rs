//! Document source resolution: fetch a URL or read a local file into memory.
//!
//! The whole document is buffered before any rendering starts; there is no
//! incremental decode. Only the network fetch carries a timeout. Both paths
//! check the `%PDF` magic bytes so a mis-typed URL pointing at an HTML error
//! page fails here with a readable message rather than inside the engine.

use crate::error::FigureError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// User agent sent with every document fetch.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; PDFConverter/1.0)";

/// A fully buffered document and where it came from.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// The source string as given (URL or path).
    pub source: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Fetch or read the document named by `source`.
pub async fn resolve_source(source: &str, timeout_secs: u64) -> Result<SourceDocument, FigureError> {
    let bytes = if is_url(source) {
        download_url(source, timeout_secs).await?
    } else {
        read_local(source).await?
    };
    check_pdf_magic(source, &bytes)?;
    Ok(SourceDocument {
        source: source.to_string(),
        bytes,
    })
}

/// Reject buffers that do not start with `%PDF`.
pub fn check_pdf_magic(source: &str, bytes: &[u8]) -> Result<(), FigureError> {
    if !bytes.starts_with(b"%PDF") {
        return Err(FigureError::NotAPdf {
            source_name: source.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, FigureError> {
    if path_str.trim().is_empty() {
        return Err(FigureError::InvalidInput {
            input: path_str.to_string(),
        });
    }
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FigureError::FileNotFound { path: path.clone() },
        std::io::ErrorKind::PermissionDenied => FigureError::PermissionDenied { path: path.clone() },
        _ => FigureError::InvalidInput {
            input: format!("{}: {e}", path.display()),
        },
    })?;

    debug!("Read local document: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, FigureError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FigureError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            FigureError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            FigureError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_err)?;

    if !response.status().is_success() {
        return Err(FigureError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(map_err)?;
    info!("Downloaded {} bytes", bytes.len());

    Ok(bytes.to_vec())
}

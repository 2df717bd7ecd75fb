//! Fetch the demo image used for pins.

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DemoFileError {
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download `url` to `path` unless the file already exists. Returns true if a download happened.
pub async fn ensure(url: &str, path: &Path) -> Result<bool, DemoFileError> {
    if tokio::fs::try_exists(path).await? {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = reqwest::get(url).await?.error_for_status()?.bytes().await?;
    let tmp = path.with_extension("part");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    tracing::info!(path = %path.display(), len = bytes.len(), "demo file downloaded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn existing_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.png");
        std::fs::write(&path, b"already here").unwrap();
        let downloaded = ensure("http://127.0.0.1:9/unreachable", &path).await.unwrap();
        assert!(!downloaded);
        assert_eq!(std::fs::read(&path).unwrap(), b"already here");
    }

    #[tokio::test]
    async fn unreachable_url_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub/demo.png");
        let err = ensure("http://127.0.0.1:9/unreachable", &path).await;
        assert!(matches!(err, Err(DemoFileError::Http(_))));
        assert!(!path.exists());
    }
}

//! Static file serving module
//!
//! Maps a URL prefix onto a local directory and reads files through a
//! pluggable `FileSource`, detecting the MIME type from the extension.

use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio::fs;

use crate::context::under_prefix;
use crate::http::mime;
use crate::logger;

/// Future returned by a `FileSource` read
pub type ReadFuture<'a> = Pin<Box<dyn Future<Output = io::Result<Vec<u8>>> + Send + 'a>>;

/// File-read capability used by the static bridge
pub trait FileSource: Send + Sync + 'static {
    /// Read a whole file; `ErrorKind::NotFound` means "not found"
    fn read<'a>(&'a self, path: &'a Path) -> ReadFuture<'a>;
}

/// Reads from disk, relative to `root`
///
/// Absolute paths are taken relative to `root` as well, so a configured
/// local directory of `/static` resolves to `<root>/static`.
#[derive(Debug, Clone)]
pub struct DiskFiles {
    root: PathBuf,
}

impl Default for DiskFiles {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DiskFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSource for DiskFiles {
    fn read<'a>(&'a self, path: &'a Path) -> ReadFuture<'a> {
        Box::pin(async move {
            let relative = path.strip_prefix("/").unwrap_or(path);
            fs::read(self.root.join(relative)).await
        })
    }
}

/// The `{prefix -> local_dir}` mapping
#[derive(Clone)]
pub struct StaticAssets {
    prefix: String,
    local_dir: PathBuf,
    source: Arc<dyn FileSource>,
}

impl StaticAssets {
    pub fn new(prefix: &str, local_dir: impl Into<PathBuf>, source: Arc<dyn FileSource>) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            local_dir: local_dir.into(),
            source,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether the request path belongs to the static mapping
    pub fn matches(&self, path: &str) -> bool {
        under_prefix(path, &self.prefix)
    }

    /// Local file path for a request path, `None` if it cannot be served
    pub fn local_path(&self, path: &str) -> Option<PathBuf> {
        if !self.matches(path) {
            return None;
        }
        let remainder = path
            .strip_prefix(self.prefix.as_str())?
            .trim_start_matches('/');
        if remainder.is_empty() {
            return None;
        }

        let relative = Path::new(remainder);
        let escapes = relative.components().any(|c| {
            matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if escapes {
            logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
            return None;
        }

        Some(self.local_dir.join(relative))
    }

    /// Load the file behind a request path together with its content type
    pub async fn load(&self, path: &str) -> Option<(Vec<u8>, &'static str)> {
        let file_path = self.local_path(path)?;

        match self.source.read(&file_path).await {
            Ok(content) => Some((content, mime::for_path(&file_path))),
            // File not found is common (404), no need to log at warning level
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {e}",
                    file_path.display()
                ));
                None
            }
        }
    }
}

impl std::fmt::Debug for StaticAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticAssets")
            .field("prefix", &self.prefix)
            .field("local_dir", &self.local_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets(root: &Path) -> StaticAssets {
        StaticAssets::new("/assets", "/static", Arc::new(DiskFiles::new(root)))
    }

    #[test]
    fn test_local_path() {
        let assets = assets(Path::new("."));
        assert_eq!(
            assets.local_path("/assets/style.css"),
            Some(PathBuf::from("/static/style.css"))
        );
        assert_eq!(
            assets.local_path("/assets/css/site.css"),
            Some(PathBuf::from("/static/css/site.css"))
        );
        assert_eq!(assets.local_path("/assets"), None);
        assert_eq!(assets.local_path("/assets/"), None);
        assert_eq!(assets.local_path("/other/style.css"), None);
    }

    #[test]
    fn test_traversal_rejected() {
        let assets = assets(Path::new("."));
        assert_eq!(assets.local_path("/assets/../Cargo.toml"), None);
        assert_eq!(assets.local_path("/assets/css/../../secret"), None);
        assert!(assets.matches("/assets/../Cargo.toml"));
    }

    #[test]
    fn test_matches_is_segment_aligned() {
        let assets = assets(Path::new("."));
        assert!(assets.matches("/assets/app.js"));
        assert!(!assets.matches("/assetsx/app.js"));
        assert_eq!(assets.prefix(), "/assets");
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/style.css"), "body {}").unwrap();

        let assets = assets(dir.path());
        let (content, content_type) = assets.load("/assets/style.css").await.unwrap();
        assert_eq!(content, b"body {}");
        assert_eq!(content_type, "text/css");

        assert!(assets.load("/assets/missing.css").await.is_none());
    }
}

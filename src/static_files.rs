//! Static file serving with path-traversal protection.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    /// Relative roots resolve against the process working directory.
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        let base: PathBuf = base.into();
        let base_dir = if base.is_relative() {
            std::env::current_dir()
                .map(|cwd| cwd.join(&base))
                .unwrap_or(base)
        } else {
            base
        };
        Self { base_dir }
    }

    /// Map a URL path under the base directory. `..` and absolute components
    /// are rejected outright.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "ico" => "image/x-icon",
            _ => "application/octet-stream",
        }
    }

    /// Read a file under the base directory, returning its bytes and content
    /// type. Traversal attempts and misses both surface as `NotFound`.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_map_path_prevents_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let sf = StaticFiles::new(tmp.path());
        assert!(sf.map_path("../secrets.txt").is_none());
        assert!(sf.map_path("a/../../secrets.txt").is_none());
        assert!(sf.load("../secrets.txt").is_err());
    }

    #[test]
    fn test_load_plain_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut f = File::create(tmp.path().join("hello.txt")).unwrap();
        f.write_all(b"Hello\n").unwrap();
        let sf = StaticFiles::new(tmp.path());
        let (bytes, ct) = sf.load("hello.txt").unwrap();
        assert_eq!(ct, "text/plain");
        assert_eq!(bytes, b"Hello\n");
    }

    #[test]
    fn test_content_types() {
        assert_eq!(StaticFiles::content_type(Path::new("a.html")), "text/html");
        assert_eq!(StaticFiles::content_type(Path::new("a.CSS")), "text/css");
        assert_eq!(
            StaticFiles::content_type(Path::new("a.bin")),
            "application/octet-stream"
        );
    }
}

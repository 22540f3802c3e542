//! Results directories produced by the ArmIE wrapper script.
//!
//! The wrapper writes `binaries.lst`: the binary root name on the first line,
//! then one binary file name per line. Every binary's logs are keyed by its
//! file name; reports label it with its readable version name.

use std::path::{Path, PathBuf};

pub const BINARIES_LIST: &str = "binaries.lst";

#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} lists no binary root", .0.display())]
    EmptyListing(PathBuf),
}

/// One traced binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    /// File name; the key of its log files.
    pub file_name: String,
    /// Readable name used in reports.
    pub version: String,
}

/// A results directory and the binaries traced into it.
#[derive(Debug, Clone)]
pub struct ResultsDir {
    path: PathBuf,
    root: String,
    binaries: Vec<Binary>,
}

/// Strip the binary root and the separator following it: `lulesh-sve` -> `sve`.
pub fn version_name(root: &str, binary: &str) -> String {
    binary.replace(root, "").chars().skip(1).collect()
}

impl ResultsDir {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ResultsError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(ResultsError::NotADirectory(path.to_path_buf()));
        }

        let list_path = path.join(BINARIES_LIST);
        let content = std::fs::read_to_string(&list_path).map_err(|source| ResultsError::Io {
            path: list_path.clone(),
            source,
        })?;

        let (root, binaries) =
            Self::parse_listing(&content).ok_or_else(|| ResultsError::EmptyListing(list_path.clone()))?;
        log::debug!("{}: {} binaries of {}", path.display(), binaries.len(), root);

        Ok(Self {
            path: path.to_path_buf(),
            root,
            binaries,
        })
    }

    /// Parse `binaries.lst`; `None` when it has no root line.
    pub fn parse_listing(content: &str) -> Option<(String, Vec<Binary>)> {
        let mut lines = content.lines().map(str::trim);
        let root = lines.next().filter(|r| !r.is_empty())?.to_string();

        let binaries = lines
            .filter(|l| !l.is_empty())
            .map(|file_name| Binary {
                file_name: file_name.to_string(),
                version: version_name(&root, file_name),
            })
            .collect();

        Some((root, binaries))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The binary root name, reported as the application.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn binaries(&self) -> &[Binary] {
        &self.binaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_name() {
        assert_eq!(version_name("lulesh", "lulesh-sve-512"), "sve-512");
        assert_eq!(version_name("lulesh", "lulesh_neon"), "neon");
        assert_eq!(version_name("lulesh", "lulesh"), "");
    }

    #[test]
    fn test_parse_listing() {
        let (root, binaries) =
            ResultsDir::parse_listing("lulesh\nlulesh-novec\n\nlulesh-sve\n").unwrap();
        assert_eq!(root, "lulesh");
        assert_eq!(
            binaries,
            vec![
                Binary { file_name: "lulesh-novec".into(), version: "novec".into() },
                Binary { file_name: "lulesh-sve".into(), version: "sve".into() },
            ]
        );
        assert!(ResultsDir::parse_listing("").is_none());
    }

    #[test]
    fn test_open() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(BINARIES_LIST), "app\napp-a\napp-b\n").unwrap();

        let results = ResultsDir::open(tmp.path()).unwrap();
        assert_eq!(results.root(), "app");
        assert_eq!(results.binaries().len(), 2);
        assert_eq!(results.path(), tmp.path());
    }

    #[test]
    fn test_open_not_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file");
        std::fs::write(&file, "").unwrap();
        assert!(matches!(ResultsDir::open(&file), Err(ResultsError::NotADirectory(_))));
    }

    #[test]
    fn test_open_without_listing() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(ResultsDir::open(tmp.path()), Err(ResultsError::Io { .. })));
    }
}

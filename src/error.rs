//! Error types shared by the log parsers, the ledger and the memory trace summary.

use std::path::{Path, PathBuf};

/// A line that did not match the expected layout of its file kind.
///
/// Produced by the record parsers, which only see text. The caller that
/// opened the file attaches the path via [`LedgerError::malformed`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct MalformedLine {
    /// 1-indexed line number (0 when the problem is not tied to one line).
    pub line: usize,
    pub reason: String,
}

impl MalformedLine {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Errors raised while building or querying a [`crate::ledger::Ledger`].
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A required log file does not exist.
    #[error("Missing log file: {}", .0.display())]
    MissingLogFile(PathBuf),

    /// An instruction word in the undecoded-count file has no decode entry.
    #[error("Instruction {word} of version {version} has no entry in the decode map")]
    UnresolvedInstruction { version: String, word: String },

    /// A line with the wrong field count or a non-numeric count.
    #[error("{}:{}: {}", .path.display(), .line, .reason)]
    MalformedLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A rank query beyond the number of distinct opcodes.
    #[error("Rank {rank} out of range: ledger has {available} distinct opcodes")]
    OutOfRange { rank: usize, available: usize },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    pub fn malformed(path: &Path, err: MalformedLine) -> Self {
        LedgerError::MalformedLine {
            path: path.to_path_buf(),
            line: err.line,
            reason: err.reason,
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read a whole log file, mapping a missing file to [`LedgerError::MissingLogFile`].
pub(crate) fn read_log(path: &Path) -> Result<String, LedgerError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LedgerError::MissingLogFile(path.to_path_buf())
        } else {
            LedgerError::io(path, e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_log_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decoded_v1.txt");
        match read_log(&path) {
            Err(LedgerError::MissingLogFile(p)) => assert_eq!(p, path),
            other => panic!("expected MissingLogFile, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_display_includes_path_and_line() {
        let err = LedgerError::malformed(
            Path::new("undecoded_v1.txt"),
            MalformedLine::new(3, "expected <count>:<word>"),
        );
        assert_eq!(err.to_string(), "undecoded_v1.txt:3: expected <count>:<word>");
    }
}

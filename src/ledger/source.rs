//! Where a ledger's raw records come from.

use std::path::{Path, PathBuf};

use crate::error::{read_log, LedgerError};
use crate::parser::{
    parse_a64_count, parse_decoded, parse_opcodes_out, parse_undecoded, ApproximateTotals,
    DecodeMap, ExactTotals, InstructionCount,
};

/// Supplies the per-version records a [`super::Ledger`] is built from.
///
/// [`LogDir`] reads ArmIE's text logs; another trace format only needs its
/// own implementation.
pub trait LedgerSource {
    /// Identifier of the binary version, used in diagnostics.
    fn version(&self) -> &str;

    /// Dynamic counts per instruction word, or `None` when the version traced
    /// no instructions of the class of interest.
    fn undecoded_counts(&self) -> Result<Option<Vec<InstructionCount>>, LedgerError>;

    /// Instruction word to opcode mapping. Required whenever
    /// [`undecoded_counts`](Self::undecoded_counts) returns records.
    fn decode_map(&self) -> Result<DecodeMap, LedgerError>;

    /// Exact A64/NEON totals, if available.
    fn exact_totals(&self) -> Result<Option<ExactTotals>, LedgerError>;

    /// Approximate A64 totals, consulted only without exact ones.
    fn approximate_totals(&self) -> Result<ApproximateTotals, LedgerError>;
}

/// The ArmIE log files of one binary inside a results directory.
#[derive(Debug, Clone)]
pub struct LogDir {
    base: PathBuf,
    version: String,
}

impl LogDir {
    pub fn new(base: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            version: version.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn decoded_path(&self) -> PathBuf {
        self.base.join(format!("decoded_{}.txt", self.version))
    }

    pub fn undecoded_path(&self) -> PathBuf {
        self.base.join(format!("undecoded_{}.txt", self.version))
    }

    pub fn a64_count_path(&self) -> PathBuf {
        self.base.join(format!("a64-count_{}.txt", self.version))
    }

    pub fn opcodes_out_path(&self) -> PathBuf {
        self.base.join(format!("opcodes_{}.out", self.version))
    }
}

/// Read an optional log file: `Ok(None)` when it does not exist.
fn read_optional(path: &Path) -> Result<Option<String>, LedgerError> {
    match read_log(path) {
        Ok(content) => Ok(Some(content)),
        Err(LedgerError::MissingLogFile(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

impl LedgerSource for LogDir {
    fn version(&self) -> &str {
        &self.version
    }

    fn undecoded_counts(&self) -> Result<Option<Vec<InstructionCount>>, LedgerError> {
        let path = self.undecoded_path();
        let Some(content) = read_optional(&path)? else {
            log::debug!("{} not found", path.display());
            return Ok(None);
        };
        parse_undecoded(&content)
            .map(Some)
            .map_err(|e| LedgerError::malformed(&path, e))
    }

    fn decode_map(&self) -> Result<DecodeMap, LedgerError> {
        let path = self.decoded_path();
        let content = read_log(&path)?;
        parse_decoded(&content).map_err(|e| LedgerError::malformed(&path, e))
    }

    fn exact_totals(&self) -> Result<Option<ExactTotals>, LedgerError> {
        let path = self.a64_count_path();
        match read_optional(&path)? {
            Some(content) => parse_a64_count(&content)
                .map(Some)
                .map_err(|e| LedgerError::malformed(&path, e)),
            None => Ok(None),
        }
    }

    fn approximate_totals(&self) -> Result<ApproximateTotals, LedgerError> {
        let path = self.opcodes_out_path();
        let content = read_log(&path)?;
        parse_opcodes_out(&content).map_err(|e| LedgerError::malformed(&path, e))
    }
}

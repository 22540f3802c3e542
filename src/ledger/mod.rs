//! Per-version opcode ledger.
//!
//! A [`Ledger`] aggregates the dynamic execution counts of the traced
//! (SVE) instructions of one binary version, keyed by opcode mnemonic, plus
//! the totals of the A64 and NEON instruction classes measured separately.
//!
//! # Building
//!
//! ```no_run
//! use armie_parser::ledger::{Ledger, LogDir};
//!
//! let ledger = Ledger::build(&LogDir::new("results_lulesh", "lulesh-sve"))?;
//! if let Ok((op, count)) = ledger.nth_most_used(1) {
//!     println!("most used: {} ({} times)", op, count);
//! }
//! # Ok::<(), armie_parser::error::LedgerError>(())
//! ```
//!
//! Counts are accumulated first; ranking and totals are derived once in a
//! finalize step and never change afterwards.

mod source;

pub use source::{LedgerSource, LogDir};

use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::error::LedgerError;
use crate::results::Binary;

/// Total of the A64 instruction class and how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionTotal {
    /// From `a64-count_<V>.txt`.
    Exact(u64),
    /// From the opcodes client listing, which omits rare opcodes. The error
    /// bound is the smallest listed count, a heuristic rather than a proof.
    Approximate { value: u64, error_bound: u64 },
}

impl InstructionTotal {
    pub fn value(&self) -> u64 {
        match *self {
            InstructionTotal::Exact(value) => value,
            InstructionTotal::Approximate { value, .. } => value,
        }
    }

    /// 0 for exact totals.
    pub fn error_bound(&self) -> u64 {
        match *self {
            InstructionTotal::Exact(_) => 0,
            InstructionTotal::Approximate { error_bound, .. } => error_bound,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, InstructionTotal::Exact(_))
    }
}

impl Default for InstructionTotal {
    fn default() -> Self {
        InstructionTotal::Exact(0)
    }
}

/// Snapshot of a ledger's derived totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub total_ops: u64,
    pub unique_ops: usize,
    pub scalar: InstructionTotal,
    pub vector_total: u64,
}

impl Totals {
    pub fn error_bound(&self) -> u64 {
        self.scalar.error_bound()
    }
}

/// Opcode execution counts of one binary version.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    opcode_counts: HashMap<String, u64>,
    /// Count descending, ties by opcode name ascending.
    ranked: Vec<(String, u64)>,
    total_ops: u64,
    scalar: InstructionTotal,
    vector_total: u64,
}

impl Ledger {
    /// Build the ledger of one version from its logs.
    ///
    /// A source without undecoded counts yields an empty (but valid) opcode
    /// map. Exact totals are preferred; the approximate listing is only read
    /// when they are missing.
    pub fn build<S: LedgerSource + ?Sized>(source: &S) -> Result<Self, LedgerError> {
        let version = source.version();
        let mut counts: HashMap<String, u64> = HashMap::new();

        match source.undecoded_counts()? {
            Some(records) => {
                let decode = source.decode_map()?;
                log::debug!(
                    "{}: resolving {} instruction words against {} decoded encodings",
                    version,
                    records.len(),
                    decode.len()
                );
                for record in records {
                    let op = decode.resolve(&record.word).ok_or_else(|| {
                        LedgerError::UnresolvedInstruction {
                            version: version.to_string(),
                            word: record.word.clone(),
                        }
                    })?;
                    *counts.entry(op.to_string()).or_insert(0) += record.count;
                }
            }
            None => log::info!("{}: no undecoded instructions traced", version),
        }

        let (scalar, vector_total) = match source.exact_totals()? {
            Some(exact) => (InstructionTotal::Exact(exact.total), exact.vector),
            None => {
                let approx = source.approximate_totals()?;
                log::debug!(
                    "{}: no exact A64 count, using opcodes listing ({} rows)",
                    version,
                    approx.rows.len()
                );
                (
                    InstructionTotal::Approximate {
                        value: approx.total,
                        error_bound: approx.error_bound,
                    },
                    0,
                )
            }
        };

        let ledger = Self::finalize(counts, scalar, vector_total);
        if ledger.vector_total > ledger.scalar.value() {
            log::debug!(
                "{}: vector total {} exceeds A64 total {}",
                version,
                ledger.vector_total,
                ledger.scalar.value()
            );
        }
        Ok(ledger)
    }

    /// Build a ledger from in-memory counts. Repeated opcodes are summed.
    pub fn from_counts<I, S>(counts: I, scalar: InstructionTotal, vector_total: u64) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut map: HashMap<String, u64> = HashMap::new();
        for (op, count) in counts {
            *map.entry(op.into()).or_insert(0) += count;
        }
        Self::finalize(map, scalar, vector_total)
    }

    fn finalize(mut opcode_counts: HashMap<String, u64>, scalar: InstructionTotal, vector_total: u64) -> Self {
        opcode_counts.retain(|_, count| *count > 0);

        let mut ranked: Vec<(String, u64)> = opcode_counts
            .iter()
            .map(|(op, count)| (op.clone(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total_ops = ranked.iter().map(|(_, count)| count).sum();

        Self {
            opcode_counts,
            ranked,
            total_ops,
            scalar,
            vector_total,
        }
    }

    /// Opcode at 1-indexed rank `n`.
    pub fn nth_most_used(&self, n: usize) -> Result<(&str, u64), LedgerError> {
        if n == 0 || n > self.ranked.len() {
            return Err(LedgerError::OutOfRange {
                rank: n,
                available: self.ranked.len(),
            });
        }
        let (op, count) = &self.ranked[n - 1];
        Ok((op.as_str(), *count))
    }

    /// The top `min(n, unique_op_count)` opcodes by rank.
    pub fn top(&self, n: usize) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.ranked
            .iter()
            .take(n)
            .map(|(op, count)| (op.as_str(), *count))
    }

    /// Execution count of `op`, 0 when it never occurred.
    pub fn count_of(&self, op: &str) -> u64 {
        self.opcode_counts.get(op).copied().unwrap_or(0)
    }

    pub fn totals(&self) -> Totals {
        Totals {
            total_ops: self.total_ops,
            unique_ops: self.unique_op_count(),
            scalar: self.scalar,
            vector_total: self.vector_total,
        }
    }

    pub fn total_ops(&self) -> u64 {
        self.total_ops
    }

    pub fn unique_op_count(&self) -> usize {
        self.opcode_counts.len()
    }

    pub fn scalar_total(&self) -> InstructionTotal {
        self.scalar
    }

    pub fn vector_total(&self) -> u64 {
        self.vector_total
    }

    /// A64 instructions that are not NEON.
    pub fn scalar_only_count(&self) -> u64 {
        self.scalar.value().saturating_sub(self.vector_total)
    }

    pub fn ranked(&self) -> &[(String, u64)] {
        &self.ranked
    }

    pub fn opcode_counts(&self) -> &HashMap<String, u64> {
        &self.opcode_counts
    }

    pub fn is_empty(&self) -> bool {
        self.opcode_counts.is_empty()
    }
}

/// Build the ledgers of all `binaries` in `base`, in parallel.
///
/// A version whose logs fail to build is fatal for that version only: with
/// `keep_going` it is logged and left out, otherwise the first failure (in
/// `binaries` order) is returned.
pub fn build_all<'a>(
    base: &Path,
    binaries: &'a [Binary],
    keep_going: bool,
) -> Result<Vec<(&'a Binary, Ledger)>, LedgerError> {
    let built: Vec<(&Binary, Result<Ledger, LedgerError>)> = binaries
        .par_iter()
        .map(|binary| (binary, Ledger::build(&LogDir::new(base, &binary.file_name))))
        .collect();

    let mut ledgers = Vec::with_capacity(built.len());
    for (binary, result) in built {
        match result {
            Ok(ledger) => ledgers.push((binary, ledger)),
            Err(e) if keep_going => log::error!("Skipping {}: {}", binary.version, e),
            Err(e) => return Err(e),
        }
    }
    Ok(ledgers)
}

//! `sve-memtrace.<V>*.log`: one row per SVE memory access from the legacy memtrace client.
//!
//! ```text
//! 7, 1, 0, 0, 32, 0x0000ffffb2a0c010
//! ```
//!
//! Fields are separated by `", "`. Field 1 is negative for the artefacts the
//! emulator emits around the region of interest; fields 2..=4 are the bundle
//! kind, the is-write flag and the access size in bytes.

use crate::error::MalformedLine;

/// Bundle kinds of the memtrace client.
pub mod bundle {
    pub const CONTIGUOUS: u64 = 0;
    pub const GATHER: u64 = 1;
    pub const ELEMENT: u64 = 2;
    pub const SCATTER: u64 = 3;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRecord {
    pub sequence: i64,
    pub bundle: u64,
    pub is_write: bool,
    pub size: u64,
}

impl MemRecord {
    /// Rows the emulator writes at trace boundaries.
    pub fn is_artifact(&self) -> bool {
        self.size == 0 || self.sequence < 0
    }

    /// Component rows of a gather or scatter bundle (kind 2 and above). These
    /// are skipped by the summary.
    pub fn is_element(&self) -> bool {
        self.bundle >= bundle::ELEMENT
    }
}

/// Parse one trace row. `line_no` is 1-indexed and only used for diagnostics.
pub fn parse_memtrace_line(line: &str, line_no: usize) -> Result<Option<MemRecord>, MalformedLine> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split(", ").collect();
    if parts.len() < 5 {
        return Err(MalformedLine::new(
            line_no,
            format!("expected at least 5 fields, found {}", parts.len()),
        ));
    }

    let field = |i: usize| -> Result<i64, MalformedLine> {
        parts[i].trim().parse::<i64>().map_err(|_| {
            MalformedLine::new(line_no, format!("field {} is not an integer: {:?}", i, parts[i]))
        })
    };

    let sequence = field(1)?;
    let bundle = field(2)?;
    let is_write = field(3)?;
    let size = field(4)?;
    if bundle < 0 || size < 0 {
        return Err(MalformedLine::new(line_no, "negative bundle kind or size"));
    }

    Ok(Some(MemRecord {
        sequence,
        bundle: bundle as u64,
        is_write: is_write != 0,
        size: size as u64,
    }))
}

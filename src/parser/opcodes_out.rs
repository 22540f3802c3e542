//! `opcodes_<V>.out`: stdout of the opcodes client, used when no exact A64 count exists.
//!
//! Only the block between the header and the footer line is read:
//!
//! ```text
//! Opcode execution counts in AArch64 mode:
//!          17 : sub
//!        1024 : ldr
//!     1048576 : add
//! 3 unique emulated instructions written to undecoded.txt
//! ```
//!
//! The client prints only its most frequent opcodes, so the summed total
//! undercounts by at most the smallest listed count per omitted opcode.

use crate::error::MalformedLine;

use super::{parse_grouped_int, PATTERNS};

pub const LISTING_HEADER: &str = "Opcode execution counts in AArch64 mode:";
pub const LISTING_FOOTER: &str = "unique emulated instructions written to undecoded.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeRow {
    pub op: String,
    pub count: u64,
}

/// Totals derived from the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApproximateTotals {
    pub rows: Vec<OpcodeRow>,
    pub total: u64,
    /// Smallest listed count; 0 for an empty listing.
    pub error_bound: u64,
}

pub fn parse_opcodes_out(content: &str) -> Result<ApproximateTotals, MalformedLine> {
    let lines: Vec<&str> = content.lines().collect();

    let start = lines
        .iter()
        .position(|l| l.trim_end() == LISTING_HEADER)
        .ok_or_else(|| MalformedLine::new(0, format!("missing header {:?}", LISTING_HEADER)))?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| l.contains(LISTING_FOOTER))
        .map(|p| start + 1 + p)
        .ok_or_else(|| MalformedLine::new(0, format!("missing footer {:?}", LISTING_FOOTER)))?;

    let mut rows = Vec::with_capacity(end - start - 1);
    for (idx, line) in lines.iter().enumerate().take(end).skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        let caps = PATTERNS.opcode_row.captures(line).ok_or_else(|| {
            MalformedLine::new(idx + 1, format!("expected '<count> : <opcode>', found {:?}", line.trim()))
        })?;
        let count = parse_grouped_int(&caps[1]).ok_or_else(|| {
            MalformedLine::new(idx + 1, format!("invalid opcode count {:?}", &caps[1]))
        })?;
        rows.push(OpcodeRow {
            op: caps[2].to_string(),
            count,
        });
    }

    let total = rows.iter().map(|r| r.count).sum();
    let error_bound = rows.iter().map(|r| r.count).min().unwrap_or(0);

    Ok(ApproximateTotals {
        rows,
        total,
        error_bound,
    })
}

//! Text reports over built ledgers.
//!
//! - [`summarize`] - per-version totals and top opcodes
//! - [`highlight`] - pairwise comparison of opcode frequencies
//! - [`export`] - tabular `{application, version, op, count}` records
//!
//! Every report writes to a caller-supplied [`std::io::Write`] sink.

pub mod export;
pub mod highlight;

pub use export::{export_ops, export_records, write_csv, ExportError, ExportRecord};
pub use highlight::{
    classify, find_highlights, highlight, highlight_all_pairs, highlight_candidates, Highlight,
    OpHighlight, Side,
};

use std::io::{self, Write};

use crate::ledger::Ledger;

/// Format an integer with `,` thousands separators.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Percentage of `part` in `whole`, `None` when `whole` is 0.
pub fn percent(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64 * 100.0)
    }
}

/// Print the summary of one version.
///
/// ```text
/// Version: sve-512
///   Total A64 instructions executed: 9,000,000 + O(0)
///   Total SVE instructions executed: 850,999
///   Top ops executed:
///         fmla:     600,000 (70.51%)
/// ```
pub fn summarize<W: Write>(
    out: &mut W,
    ledger: &Ledger,
    label: &str,
    top_n: usize,
) -> io::Result<()> {
    let totals = ledger.totals();

    writeln!(out, "Version: {}", label)?;
    writeln!(
        out,
        "  Total A64 instructions executed: {} + O({})",
        group_thousands(totals.scalar.value()),
        group_thousands(totals.error_bound())
    )?;
    writeln!(
        out,
        "  Total SVE instructions executed: {}",
        group_thousands(totals.total_ops)
    )?;
    writeln!(out, "  Top ops executed:")?;

    for (op, count) in ledger.top(top_n) {
        match percent(count, totals.total_ops) {
            Some(pct) => writeln!(out, "    {:>8}: {:>11} ({:.2}%)", op, group_thousands(count), pct)?,
            None => writeln!(out, "    {:>8}: {:>11}", op, group_thousands(count))?,
        }
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InstructionTotal;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(123456), "123,456");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), Some(25.0));
        assert_eq!(percent(5, 0), None);
    }

    #[test]
    fn test_summarize() {
        let ledger = Ledger::from_counts(
            [("fmla", 750u64), ("ld1w", 200), ("incw", 50)],
            InstructionTotal::Approximate { value: 1_234_567, error_bound: 17 },
            0,
        );
        let mut out = Vec::new();
        summarize(&mut out, &ledger, "sve-512", 2).unwrap();

        let text = String::from_utf8(out).unwrap();
        let expected = "\
Version: sve-512
  Total A64 instructions executed: 1,234,567 + O(17)
  Total SVE instructions executed: 1,000
  Top ops executed:
        fmla:         750 (75.00%)
        ld1w:         200 (20.00%)
\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_summarize_empty_ledger() {
        let ledger = Ledger::from_counts(Vec::<(String, u64)>::new(), InstructionTotal::Exact(42), 0);
        let mut out = Vec::new();
        summarize(&mut out, &ledger, "novec", 8).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total SVE instructions executed: 0\n"));
        assert!(text.ends_with("  Top ops executed:\n\n"));
        assert!(!text.contains("NaN"));
    }
}

//! Pairwise opcode highlights: opcodes whose frequency differs sharply between two versions.

use std::collections::BTreeSet;
use std::io::{self, Write};

use crate::ledger::Ledger;

use super::group_thousands;

/// Which of the two compared ledgers a finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Classification of one opcode in a pairwise comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Highlight {
    /// Executed only on `side`, at least `min_count` times.
    OnlyIn { side: Side, count: u64 },
    /// `factor` times more common on `side`.
    MoreCommon {
        side: Side,
        factor: f64,
        dominant: u64,
        other: u64,
    },
}

impl Highlight {
    pub fn side(&self) -> Side {
        match *self {
            Highlight::OnlyIn { side, .. } | Highlight::MoreCommon { side, .. } => side,
        }
    }

    /// The same finding with the two ledgers swapped.
    pub fn swapped(self) -> Self {
        match self {
            Highlight::OnlyIn { side, count } => Highlight::OnlyIn {
                side: side.other(),
                count,
            },
            Highlight::MoreCommon {
                side,
                factor,
                dominant,
                other,
            } => Highlight::MoreCommon {
                side: side.other(),
                factor,
                dominant,
                other,
            },
        }
    }
}

/// A finding for a named opcode.
#[derive(Debug, Clone, PartialEq)]
pub struct OpHighlight {
    pub op: String,
    pub highlight: Highlight,
}

/// Classify one opcode from its counts in ledgers A and B.
///
/// Exclusive opcodes are checked first. Pairs where both counts are at most
/// `min_count` are noise and skipped. Otherwise the larger side must exceed
/// the smaller by more than `threshold_percent`.
pub fn classify(count_a: u64, count_b: u64, threshold_percent: u32, min_count: u64) -> Option<Highlight> {
    if count_a == 0 && count_b > 0 && count_b >= min_count {
        return Some(Highlight::OnlyIn {
            side: Side::B,
            count: count_b,
        });
    }
    if count_b == 0 && count_a > 0 && count_a >= min_count {
        return Some(Highlight::OnlyIn {
            side: Side::A,
            count: count_a,
        });
    }
    if count_a <= min_count && count_b <= min_count {
        return None;
    }

    let low = count_a.min(count_b);
    if low == 0 {
        return None;
    }
    let factor = 1.0 + count_a.abs_diff(count_b) as f64 / low as f64;

    // big / small > 1 + t/100, in integers
    let scale = 100 + threshold_percent as u128;
    let exceeds = |big: u64, small: u64| big as u128 * 100 > small as u128 * scale;

    if exceeds(count_a, count_b) {
        Some(Highlight::MoreCommon {
            side: Side::A,
            factor,
            dominant: count_a,
            other: count_b,
        })
    } else if exceeds(count_b, count_a) {
        Some(Highlight::MoreCommon {
            side: Side::B,
            factor,
            dominant: count_b,
            other: count_a,
        })
    } else {
        None
    }
}

/// Union of the top `top_n` opcodes of both ledgers, in lexicographic order.
pub fn highlight_candidates<'a>(a: &'a Ledger, b: &'a Ledger, top_n: usize) -> BTreeSet<&'a str> {
    a.top(top_n).chain(b.top(top_n)).map(|(op, _)| op).collect()
}

/// Classify every candidate opcode of the pair.
pub fn find_highlights(
    a: &Ledger,
    b: &Ledger,
    threshold_percent: u32,
    min_count: u64,
    top_n: usize,
) -> Vec<OpHighlight> {
    highlight_candidates(a, b, top_n)
        .into_iter()
        .filter_map(|op| {
            classify(a.count_of(op), b.count_of(op), threshold_percent, min_count).map(|highlight| {
                OpHighlight {
                    op: op.to_string(),
                    highlight,
                }
            })
        })
        .collect()
}

fn write_finding<W: Write>(out: &mut W, finding: &OpHighlight, label_a: &str, label_b: &str) -> io::Result<()> {
    let label = |side: Side| match side {
        Side::A => label_a,
        Side::B => label_b,
    };

    match finding.highlight {
        Highlight::OnlyIn { side, count } => writeln!(
            out,
            "  {:>8}: Only appears in {} ({})",
            finding.op,
            label(side),
            group_thousands(count)
        ),
        Highlight::MoreCommon {
            side,
            factor,
            dominant,
            other,
        } => writeln!(
            out,
            "  {:>8}: {:>4.1}x more common in {} ({}) than in {} ({})",
            finding.op,
            factor,
            label(side),
            group_thousands(dominant),
            label(side.other()),
            group_thousands(other)
        ),
    }
}

/// Compare two versions and print one line per highlighted opcode.
#[allow(clippy::too_many_arguments)]
pub fn highlight<W: Write>(
    out: &mut W,
    a: &Ledger,
    label_a: &str,
    b: &Ledger,
    label_b: &str,
    threshold_percent: u32,
    min_count: u64,
    top_n: usize,
) -> io::Result<Vec<OpHighlight>> {
    let findings = find_highlights(a, b, threshold_percent, min_count, top_n);

    writeln!(out)?;
    writeln!(out, "Opcode highlights: {} / {}", label_a, label_b)?;
    for finding in &findings {
        write_finding(out, finding, label_a, label_b)?;
    }

    Ok(findings)
}

/// Highlight every unordered pair of versions, in list order.
pub fn highlight_all_pairs<W: Write>(
    out: &mut W,
    versions: &[(&str, &Ledger)],
    threshold_percent: u32,
    min_count: u64,
    top_n: usize,
) -> io::Result<()> {
    for (i, (label_a, a)) in versions.iter().enumerate() {
        for (label_b, b) in &versions[i + 1..] {
            highlight(out, a, label_a, b, label_b, threshold_percent, min_count, top_n)?;
        }
    }
    Ok(())
}

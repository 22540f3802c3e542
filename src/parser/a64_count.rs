//! `a64-count_<V>.txt`: exact A64 and NEON totals from the disassembly-based counter.
//!
//! ```text
//! Total instructions: 1,234,567
//! Vector instructions (v only): 12,000 (0.97%)
//! Vector instructions (v and q): 12,345 (1.00%)
//! Instructions outside binary: 1,000 (0.08%)
//! ```

use crate::error::MalformedLine;

use super::{parse_grouped_int, PATTERNS};

/// Exact instruction-class totals. A missing line leaves its total at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExactTotals {
    pub total: u64,
    pub vector: u64,
}

pub fn parse_a64_count(content: &str) -> Result<ExactTotals, MalformedLine> {
    let mut totals = ExactTotals::default();

    for (idx, line) in content.lines().enumerate() {
        let (slot, caps) = if let Some(caps) = PATTERNS.a64_total.captures(line) {
            (&mut totals.total, caps)
        } else if let Some(caps) = PATTERNS.a64_vector.captures(line) {
            (&mut totals.vector, caps)
        } else {
            continue;
        };

        let raw = &caps[1];
        *slot = parse_grouped_int(raw).ok_or_else(|| {
            MalformedLine::new(idx + 1, format!("invalid instruction count {:?}", raw))
        })?;
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A64_COUNT: &str = "\
Total instructions: 1,234,567
Vector instructions (v only): 12,000 (0.97%)
Vector instructions (v and q): 12,345 (1.00%)
Instructions outside binary: 1,000 (0.08%)
";

    #[test]
    fn test_parse_a64_count() {
        let totals = parse_a64_count(A64_COUNT).unwrap();
        assert_eq!(totals.total, 1_234_567);
        assert_eq!(totals.vector, 12_345);
    }

    #[test]
    fn test_parse_a64_count_missing_lines() {
        let totals = parse_a64_count("Total instructions: 99\n").unwrap();
        assert_eq!(totals, ExactTotals { total: 99, vector: 0 });
    }

    #[test]
    fn test_parse_a64_count_bad_number() {
        let err = parse_a64_count("Total instructions: many\n").unwrap_err();
        assert_eq!(err.line, 1);
    }
}

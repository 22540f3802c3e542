//! Log record parsers, one adapter per ArmIE output file kind.
//!
//! Each adapter takes the full text of one file and returns typed records,
//! or a [`MalformedLine`](crate::error::MalformedLine) naming the offending
//! line. None of them touch the filesystem; [`crate::ledger::LogDir`] and
//! [`crate::memtrace`] do the reading.
//!
//! - [`decoded`] - `decoded_<V>.txt`, instruction word to opcode mnemonic
//! - [`undecoded`] - `undecoded_<V>.txt`, dynamic count per instruction word
//! - [`a64_count`] - `a64-count_<V>.txt`, exact A64/NEON totals
//! - [`opcodes_out`] - `opcodes_<V>.out`, approximate A64 totals
//! - [`memtrace`] - `sve-memtrace.<V>*.log`, legacy SVE memory trace rows
//! - [`disassembly`] - `objdump -d` text, address to instruction map
//!
//! Blank lines are skipped in every format.

pub mod a64_count;
pub mod decoded;
pub mod disassembly;
pub mod memtrace;
pub mod opcodes_out;
pub mod undecoded;

pub use a64_count::{parse_a64_count, ExactTotals};
pub use decoded::{parse_decoded, DecodeMap};
pub use disassembly::{parse_address, parse_disassembly, DisassembledInstruction, Disassembly};
pub use memtrace::{parse_memtrace_line, MemRecord};
pub use opcodes_out::{parse_opcodes_out, ApproximateTotals, OpcodeRow};
pub use undecoded::{parse_count_line, parse_undecoded, InstructionCount};

use regex::Regex;
use std::sync::LazyLock;

/// Compiled line patterns shared by the text adapters.
struct Patterns {
    /// `Total instructions: 1,234,567`
    a64_total: Regex,
    /// `Vector instructions (v and q): 12,345 (1.00%)`
    a64_vector: Regex,
    /// `     1234 : fmla` rows of the opcodes client listing
    opcode_row: Regex,
    /// `  4005a4:\t4ea01c00 \tmov\tv0.16b, v0.16b`
    disassembly_line: Regex,
    vector_operand: Regex,
    q_operand: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    a64_total: Regex::new(r"^Total instructions:\s*(\S+)\s*$").unwrap(),
    a64_vector: Regex::new(r"^Vector instructions \(v and q\):\s*(\S+)").unwrap(),
    opcode_row: Regex::new(r"^\s*(\S+)\s*:\s*(\S+)").unwrap(),
    disassembly_line: Regex::new(r"^ {0,2}([0-9a-f]{6,}):\s*(.*)$").unwrap(),
    vector_operand: Regex::new(r"^v[0-9]{1,2}\.[0-9]{1,2}[a-z]").unwrap(),
    q_operand: Regex::new(r"^q[0-9]{1,2}").unwrap(),
});

/// Parse an unsigned integer that may carry thousands separators (`1,234` or `1_234`).
pub fn parse_grouped_int(s: &str) -> Option<u64> {
    let digits: String = s.chars().filter(|c| *c != ',' && *c != '_').collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grouped_int() {
        assert_eq!(parse_grouped_int("1,234,567"), Some(1_234_567));
        assert_eq!(parse_grouped_int("42"), Some(42));
        assert_eq!(parse_grouped_int("1_000"), Some(1000));
        assert_eq!(parse_grouped_int(""), None);
        assert_eq!(parse_grouped_int(","), None);
        assert_eq!(parse_grouped_int("12a"), None);
        assert_eq!(parse_grouped_int("-5"), None);
    }
}

//! Exact A64/NEON totals of one version, written as `a64-count_<V>.txt`.
//!
//! The oprecord client traces a dynamic count per executed address. Each
//! address is looked up in the binary's disassembly to tell NEON from plain
//! A64; addresses outside the disassembled `.text` (libraries, the loader)
//! are counted separately.

use std::io::{self, Write};
use std::path::Path;

use crate::error::{read_log, LedgerError, MalformedLine};
use crate::parser::{parse_address, parse_count_line, parse_disassembly, Disassembly};
use crate::report::{group_thousands, percent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeonCounts {
    pub total: u64,
    /// Instructions whose first operand is a `v` register arrangement.
    pub vector: u64,
    /// Instructions whose first operand is a `q` register.
    pub q_only: u64,
    pub outside_binary: u64,
}

impl NeonCounts {
    pub fn vector_and_q(&self) -> u64 {
        self.vector + self.q_only
    }
}

/// Fold an oprecord trace into per-class totals.
pub fn count_neon(code: &Disassembly, trace: &str) -> Result<NeonCounts, MalformedLine> {
    let mut counts = NeonCounts::default();

    for (idx, line) in trace.lines().enumerate() {
        let Some(record) = parse_count_line(line, idx + 1)? else {
            continue;
        };
        let address = parse_address(&record.word).ok_or_else(|| {
            MalformedLine::new(idx + 1, format!("invalid address {:?}", record.word))
        })?;

        counts.total += record.count;
        match code.get(address) {
            Some(instr) if instr.is_vector => counts.vector += record.count,
            Some(instr) if instr.is_q => counts.q_only += record.count,
            Some(_) => {}
            None => counts.outside_binary += record.count,
        }
    }

    Ok(counts)
}

/// Read a disassembly listing and an oprecord trace and count them.
pub fn count_neon_files(disassembly: &Path, trace: &Path) -> Result<NeonCounts, LedgerError> {
    let code = parse_disassembly(&read_log(disassembly)?);
    if code.is_empty() {
        log::warn!("{}: no instructions found", disassembly.display());
    }
    let content = read_log(trace)?;
    let counts = count_neon(&code, &content).map_err(|e| LedgerError::malformed(trace, e))?;
    log::debug!(
        "{}: {} of {} instructions outside the binary",
        trace.display(),
        counts.outside_binary,
        counts.total
    );
    Ok(counts)
}

/// Write the four-line report read back by [`crate::parser::parse_a64_count`].
pub fn write_a64_count<W: Write>(out: &mut W, counts: &NeonCounts) -> io::Result<()> {
    let pct = |n: u64| percent(n, counts.total).unwrap_or(0.0);

    writeln!(out, "Total instructions: {}", group_thousands(counts.total))?;
    writeln!(
        out,
        "Vector instructions (v only): {} ({:.2}%)",
        group_thousands(counts.vector),
        pct(counts.vector)
    )?;
    writeln!(
        out,
        "Vector instructions (v and q): {} ({:.2}%)",
        group_thousands(counts.vector_and_q()),
        pct(counts.vector_and_q())
    )?;
    writeln!(
        out,
        "Instructions outside binary: {} ({:.2}%)",
        group_thousands(counts.outside_binary),
        pct(counts.outside_binary)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_a64_count;

    const OBJDUMP: &str = "\
0000000000400580 <kernel>:
  400580:\t4ea01c00 \tmov\tv0.16b, v0.16b
  400584:\t3dc00fe0 \tldr\tq0, [sp, #48]
  400588:\t91000421 \tadd\tx1, x1, #0x1
";

    const TRACE: &str = "\
     3000 : 0x0000000000400580
     1000 : 0x0000000000400584
     5000 : 0x0000000000400588
     1000 : 0x0000ffffb7e01234
";

    #[test]
    fn test_count_neon() {
        let code = parse_disassembly(OBJDUMP);
        let counts = count_neon(&code, TRACE).unwrap();
        assert_eq!(
            counts,
            NeonCounts { total: 10_000, vector: 3000, q_only: 1000, outside_binary: 1000 }
        );
        assert_eq!(counts.vector_and_q(), 4000);
    }

    #[test]
    fn test_report_reads_back_as_exact_totals() {
        let counts = count_neon(&parse_disassembly(OBJDUMP), TRACE).unwrap();
        let mut out = Vec::new();
        write_a64_count(&mut out, &counts).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "\
Total instructions: 10,000
Vector instructions (v only): 3,000 (30.00%)
Vector instructions (v and q): 4,000 (40.00%)
Instructions outside binary: 1,000 (10.00%)
"
        );
        let totals = parse_a64_count(&text).unwrap();
        assert_eq!(totals.total, 10_000);
        assert_eq!(totals.vector, 4000);
    }

    #[test]
    fn test_empty_trace_report() {
        let mut out = Vec::new();
        write_a64_count(&mut out, &NeonCounts::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Vector instructions (v and q): 0 (0.00%)\n"));
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn test_bad_trace_address() {
        let code = parse_disassembly(OBJDUMP);
        let err = count_neon(&code, "10 : 0x400580\n\n20 : main\n").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_count_neon_files() {
        let tmp = tempfile::tempdir().unwrap();
        let disas = tmp.path().join("disas.out");
        let trace = tmp.path().join("oprecord.out");
        std::fs::write(&disas, OBJDUMP).unwrap();

        assert!(matches!(
            count_neon_files(&disas, &trace),
            Err(LedgerError::MissingLogFile(p)) if p == trace
        ));

        std::fs::write(&trace, TRACE).unwrap();
        assert_eq!(count_neon_files(&disas, &trace).unwrap().total, 10_000);
    }
}

//! SVE memory access summaries.
//!
//! Two sources are supported:
//!
//! - the legacy `sve-memtrace.<V>*.log` written by the memtrace client,
//!   aggregated here into read/write counts and per-size histograms;
//! - the per-version CSV output of the instrace tools (`analyze.<V>.csv`,
//!   `bundle.<V>.csv`), which is only merged into one file per tool.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{read_log, LedgerError, MalformedLine};
use crate::parser::memtrace::bundle;
use crate::parser::{parse_memtrace_line, MemRecord};
use crate::report::{group_thousands, percent};

/// Instrace tools whose CSV outputs are merged.
pub const INSTRACE_TOOLS: [&str; 2] = ["analyze", "bundle"];

#[derive(Debug, thiserror::Error)]
pub enum MemTraceError {
    #[error("No sve-memtrace.{0}*.log file found")]
    NoTraceFile(String),

    #[error("{count} sve-memtrace.{version}*.log files found, expected one")]
    AmbiguousTraceFile { version: String, count: usize },

    #[error(transparent)]
    Log(#[from] LedgerError),
}

/// Aggregated counts of one memory trace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemTrace {
    pub total_mem_ops: u64,
    pub total_reads: u64,
    pub total_gathers: u64,
    /// Access size in bytes -> number of reads.
    pub read_sizes: BTreeMap<u64, u64>,
    pub total_writes: u64,
    /// Scatter heads carry bundle kind 3 and are skipped with the other
    /// bundle components, so this stays 0 for memtrace client output.
    pub total_scatters: u64,
    pub write_sizes: BTreeMap<u64, u64>,
}

impl MemTrace {
    /// Aggregate the rows of a trace.
    pub fn parse(content: &str) -> Result<Self, MalformedLine> {
        let mut trace = MemTrace::default();

        for (idx, line) in content.lines().enumerate() {
            let Some(record) = parse_memtrace_line(line, idx + 1)? else {
                continue;
            };
            if record.is_artifact() || record.is_element() {
                continue;
            }
            trace.record(record, idx + 1)?;
        }

        Ok(trace)
    }

    fn record(&mut self, rec: MemRecord, line_no: usize) -> Result<(), MalformedLine> {
        self.total_mem_ops += 1;
        if rec.is_write {
            if rec.bundle != bundle::CONTIGUOUS {
                return Err(MalformedLine::new(line_no, format!("write with bundle kind {}", rec.bundle)));
            }
            self.total_writes += 1;
            *self.write_sizes.entry(rec.size).or_insert(0) += 1;
        } else {
            match rec.bundle {
                bundle::CONTIGUOUS => {}
                bundle::GATHER => self.total_gathers += 1,
                other => {
                    return Err(MalformedLine::new(line_no, format!("read with bundle kind {}", other)))
                }
            }
            self.total_reads += 1;
            *self.read_sizes.entry(rec.size).or_insert(0) += 1;
        }
        Ok(())
    }

    /// Locate and aggregate the single `sve-memtrace.<version>*.log` in `base`.
    pub fn for_version(base: &Path, version: &str) -> Result<Self, MemTraceError> {
        let path = find_trace_file(base, version)?;
        let content = read_log(&path)?;
        Self::parse(&content).map_err(|e| MemTraceError::Log(LedgerError::malformed(&path, e)))
    }
}

fn find_trace_file(base: &Path, version: &str) -> Result<PathBuf, MemTraceError> {
    let prefix = format!("sve-memtrace.{}", version);
    let entries = std::fs::read_dir(base).map_err(|e| LedgerError::io(base, e))?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LedgerError::io(base, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(".log") {
            matches.push(entry.path());
        }
    }

    match matches.len() {
        0 => Err(MemTraceError::NoTraceFile(version.to_string())),
        1 => Ok(matches.remove(0)),
        count => Err(MemTraceError::AmbiguousTraceFile {
            version: version.to_string(),
            count,
        }),
    }
}

fn pct(part: u64, whole: u64) -> String {
    format!("{:.2}%", percent(part, whole).unwrap_or(0.0))
}

fn sizes_line(sizes: &BTreeMap<u64, u64>, total: u64) -> String {
    sizes
        .iter()
        .map(|(size, n)| format!("{}: {} ({})", size * 8, group_thousands(*n), pct(*n, total)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print the memory summary of one version. Sizes are shown in bits.
pub fn summarize<W: Write>(out: &mut W, trace: &MemTrace, label: &str) -> io::Result<()> {
    let total = trace.total_mem_ops;
    let (reads, writes) = (trace.total_reads, trace.total_writes);

    writeln!(out, "Version: {}", label)?;
    writeln!(out, "  Total SVE memory operations: {}", group_thousands(total))?;

    if total > 0 {
        writeln!(out, "    Total SVE reads: {} ({} of ops)", group_thousands(reads), pct(reads, total))?;
        if reads > 0 {
            writeln!(out, "      By size: {}", sizes_line(&trace.read_sizes, reads))?;
            writeln!(
                out,
                "      Total SVE gathers: {} ({} of reads, {} of ops)",
                group_thousands(trace.total_gathers),
                pct(trace.total_gathers, reads),
                pct(trace.total_gathers, total)
            )?;
        }

        writeln!(out, "    Total SVE writes: {} ({} of ops)", group_thousands(writes), pct(writes, total))?;
        if writes > 0 {
            writeln!(out, "      By size: {}", sizes_line(&trace.write_sizes, writes))?;
            writeln!(
                out,
                "      Total SVE scatters: {} ({} of writes, {} of ops)",
                group_thousands(trace.total_scatters),
                pct(trace.total_scatters, writes),
                pct(trace.total_scatters, total)
            )?;
        }
    }
    writeln!(out)
}

/// Number of fields of a CSV row; commas inside double quotes do not separate.
fn csv_field_count(line: &str) -> usize {
    let mut fields = 1;
    let mut quoted = false;
    for ch in line.chars() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => fields += 1,
            _ => {}
        }
    }
    fields
}

/// Concatenate `<tool>.<V>.csv` of every version into `<base>/<name>-<tool>.csv`,
/// appending `version` and `application` columns.
///
/// `versions` pairs each binary (file key) with its readable name.
pub fn merge_instrace(
    base: &Path,
    versions: &[(&str, &str)],
    application: &str,
    tool: &str,
    name: &str,
) -> Result<PathBuf, LedgerError> {
    let mut merged = String::new();
    let mut header: Option<String> = None;

    for (binary, version) in versions {
        let path = base.join(format!("{}.{}.csv", tool, binary));
        let content = read_log(&path)?;
        let mut lines = content.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        let Some((_, first)) = lines.next() else {
            log::warn!("{} is empty", path.display());
            continue;
        };
        let columns = csv_field_count(first);
        match &header {
            None => {
                merged.push_str(&format!("{},version,application\n", first));
                header = Some(first.to_string());
            }
            Some(h) if h == first => {}
            Some(h) => {
                return Err(LedgerError::malformed(
                    &path,
                    MalformedLine::new(1, format!("header {:?} differs from {:?}", first, h)),
                ))
            }
        }

        for (idx, line) in lines {
            let fields = csv_field_count(line);
            if fields != columns {
                return Err(LedgerError::malformed(
                    &path,
                    MalformedLine::new(idx + 1, format!("expected {} fields, found {}", columns, fields)),
                ));
            }
            merged.push_str(&format!("{},{},{}\n", line, version, application));
        }
    }

    let out_path = base.join(format!("{}-{}.csv", name, tool));
    std::fs::write(&out_path, merged).map_err(|e| LedgerError::io(&out_path, e))?;
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "\
0, -1, 0, 0, 8, 0x0
1, 1, 0, 0, 32, 0x1000
2, 2, 1, 0, 32, 0x1020
3, 3, 2, 0, 4, 0x1040
4, 4, 2, 0, 4, 0x1044
5, 5, 0, 1, 64, 0x2000
6, 6, 3, 1, 64, 0x2040
7, 7, 2, 1, 4, 0x2080
8, 8, 0, 0, 0, 0x0
";

    #[test]
    fn test_parse_trace() {
        let trace = MemTrace::parse(TRACE).unwrap();
        assert_eq!(trace.total_mem_ops, 3);
        assert_eq!(trace.total_reads, 2);
        assert_eq!(trace.total_gathers, 1);
        assert_eq!(trace.read_sizes, BTreeMap::from([(32, 2)]));
        assert_eq!(trace.total_writes, 1);
        assert_eq!(trace.total_scatters, 0);
        assert_eq!(trace.write_sizes, BTreeMap::from([(64, 1)]));
    }

    #[test]
    fn test_bundle_components_are_skipped() {
        let trace = MemTrace::parse("1, 1, 1, 0, 32, 0x0\n2, 2, 3, 0, 4, 0x4\n3, 3, 3, 1, 32, 0x8\n").unwrap();
        assert_eq!(trace.total_mem_ops, 1);
        assert_eq!(trace.total_reads, 1);
        assert_eq!(trace.total_gathers, 1);
        assert_eq!(trace.total_writes, 0);
        assert_eq!(trace.total_scatters, 0);

        let trace = MemTrace::parse("1, 1, 3, 1, 32, 0x0\n").unwrap();
        assert_eq!(trace, MemTrace::default());
    }

    #[test]
    fn test_invalid_bundle_kind() {
        let err = MemTrace::parse("1, 1, 0, 0, 8, 0x0\n2, 2, 1, 1, 8, 0x0\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.reason.contains("write with bundle kind 1"));
    }

    #[test]
    fn test_summarize() {
        let trace = MemTrace::parse(TRACE).unwrap();
        let mut out = Vec::new();
        summarize(&mut out, &trace, "sve-512").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Version: sve-512\n  Total SVE memory operations: 3\n"));
        assert!(text.contains("    Total SVE reads: 2 (66.67% of ops)\n"));
        assert!(text.contains("      By size: 256: 2 (100.00%)\n"));
        assert!(text.contains("      Total SVE gathers: 1 (50.00% of reads, 33.33% of ops)\n"));
        assert!(text.contains("    Total SVE writes: 1 (33.33% of ops)\n"));
        assert!(text.contains("      Total SVE scatters: 0 (0.00% of writes, 0.00% of ops)\n"));
    }

    #[test]
    fn test_summarize_empty_trace() {
        let mut out = Vec::new();
        summarize(&mut out, &MemTrace::default(), "novec").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Version: novec\n  Total SVE memory operations: 0\n\n"
        );
    }

    #[test]
    fn test_for_version() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("sve-memtrace.v1.1234.log"), TRACE).unwrap();

        let trace = MemTrace::for_version(tmp.path(), "v1").unwrap();
        assert_eq!(trace.total_mem_ops, 3);
        assert!(matches!(
            MemTrace::for_version(tmp.path(), "v2"),
            Err(MemTraceError::NoTraceFile(_))
        ));

        std::fs::write(tmp.path().join("sve-memtrace.v1.5678.log"), TRACE).unwrap();
        assert!(matches!(
            MemTrace::for_version(tmp.path(), "v1"),
            Err(MemTraceError::AmbiguousTraceFile { count: 2, .. })
        ));
    }

    #[test]
    fn test_merge_instrace() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("analyze.app-a.csv"), "type,total\nload,10\nstore,5\n").unwrap();
        std::fs::write(tmp.path().join("analyze.app-b.csv"), "type,total\nload,7\n").unwrap();

        let path = merge_instrace(tmp.path(), &[("app-a", "a"), ("app-b", "b")], "app", "analyze", "mem")
            .unwrap();
        assert_eq!(path, tmp.path().join("mem-analyze.csv"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "type,total,version,application\nload,10,a,app\nstore,5,a,app\nload,7,b,app\n"
        );
    }

    #[test]
    fn test_merge_instrace_quoted_fields() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("bundle.v1.csv"),
            "\"kind, size\",total\n\"gather, 32\",4\n\"say \"\"hi\"\", x\",1\n",
        )
        .unwrap();

        let path = merge_instrace(tmp.path(), &[("v1", "one")], "app", "bundle", "mem").unwrap();
        let merged = std::fs::read_to_string(path).unwrap();
        assert_eq!(merged.lines().count(), 3);
        assert!(merged.contains("\"gather, 32\",4,one,app\n"));
    }

    #[test]
    fn test_csv_field_count() {
        assert_eq!(csv_field_count("a,b,c"), 3);
        assert_eq!(csv_field_count("\"a,b\",c"), 2);
        assert_eq!(csv_field_count(""), 1);
    }

    #[test]
    fn test_merge_instrace_field_count_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("bundle.v1.csv"), "a,b\n1,2,3\n").unwrap();
        assert!(matches!(
            merge_instrace(tmp.path(), &[("v1", "v1")], "app", "bundle", "mem"),
            Err(LedgerError::MalformedLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_merge_instrace_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            merge_instrace(tmp.path(), &[("v1", "v1")], "app", "bundle", "mem"),
            Err(LedgerError::MissingLogFile(_))
        ));
    }
}

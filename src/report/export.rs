//! Export of per-opcode counts as `{application, version, op, count}` records.
//!
//! Two files are written next to the logs: `<name>.csv` for spreadsheets and
//! plotting scripts, `<name>.json` for programmatic consumers.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::ledger::Ledger;

/// Pseudo-opcode carrying a version's non-NEON A64 total.
pub const A64_OP: &str = "A64";
/// Pseudo-opcode carrying a version's NEON total.
pub const NEON_OP: &str = "NEON";

pub const CSV_COLUMNS: [&str; 4] = ["application", "version", "op", "count"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub application: String,
    pub version: String,
    pub op: String,
    pub count: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize export records: {0}")]
    Json(#[from] serde_json::Error),
}

/// Records for every opcode of every version, then one `A64` and one `NEON`
/// record per version.
pub fn export_records(application: &str, versions: &[(&str, &Ledger)]) -> Vec<ExportRecord> {
    let record = |version: &str, op: &str, count: u64| ExportRecord {
        application: application.to_string(),
        version: version.to_string(),
        op: op.to_string(),
        count,
    };

    let mut records: Vec<ExportRecord> = versions
        .iter()
        .flat_map(|(version, ledger)| {
            ledger
                .ranked()
                .iter()
                .map(move |(op, count)| record(version, op, *count))
        })
        .collect();
    records.extend(
        versions
            .iter()
            .map(|(version, ledger)| record(version, A64_OP, ledger.scalar_only_count())),
    );
    records.extend(
        versions
            .iter()
            .map(|(version, ledger)| record(version, NEON_OP, ledger.vector_total())),
    );
    records
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn write_csv<W: Write>(out: &mut W, records: &[ExportRecord]) -> io::Result<()> {
    writeln!(out, "{}", CSV_COLUMNS.join(","))?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{}",
            csv_field(&r.application),
            csv_field(&r.version),
            csv_field(&r.op),
            r.count
        )?;
    }
    Ok(())
}

/// Write `<base>/<name>.json` and `<base>/<name>.csv`, returning both paths.
pub fn export_ops(
    base: &Path,
    name: &str,
    application: &str,
    versions: &[(&str, &Ledger)],
) -> Result<(PathBuf, PathBuf), ExportError> {
    let records = export_records(application, versions);

    let json_path = base.join(format!("{}.json", name));
    let json = serde_json::to_vec_pretty(&records)?;
    std::fs::write(&json_path, json).map_err(|source| ExportError::Io {
        path: json_path.clone(),
        source,
    })?;

    let csv_path = base.join(format!("{}.csv", name));
    let mut csv = Vec::new();
    write_csv(&mut csv, &records).map_err(|source| ExportError::Io {
        path: csv_path.clone(),
        source,
    })?;
    std::fs::write(&csv_path, csv).map_err(|source| ExportError::Io {
        path: csv_path.clone(),
        source,
    })?;

    log::info!("Exported {} records for {}", records.len(), application);
    Ok((json_path, csv_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InstructionTotal;

    fn sample() -> (Ledger, Ledger) {
        let a = Ledger::from_counts([("fmla", 30u64), ("ld1w", 20)], InstructionTotal::Exact(1000), 100);
        let b = Ledger::from_counts(Vec::<(String, u64)>::new(), InstructionTotal::Exact(500), 0);
        (a, b)
    }

    #[test]
    fn test_export_records() {
        let (a, b) = sample();
        let records = export_records("lulesh", &[("sve", &a), ("novec", &b)]);

        let summary: Vec<(&str, &str, u64)> = records
            .iter()
            .map(|r| (r.version.as_str(), r.op.as_str(), r.count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("sve", "fmla", 30),
                ("sve", "ld1w", 20),
                ("sve", "A64", 900),
                ("novec", "A64", 500),
                ("sve", "NEON", 100),
                ("novec", "NEON", 0),
            ]
        );
        assert!(records.iter().all(|r| r.application == "lulesh"));
    }

    #[test]
    fn test_write_csv() {
        let records = vec![
            ExportRecord {
                application: "app".into(),
                version: "v1".into(),
                op: "fmla".into(),
                count: 7,
            },
            ExportRecord {
                application: "app".into(),
                version: "odd,\"name\"".into(),
                op: "A64".into(),
                count: 1_000_000,
            },
        ];
        let mut out = Vec::new();
        write_csv(&mut out, &records).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "application,version,op,count\napp,v1,fmla,7\napp,\"odd,\"\"name\"\"\",A64,1000000\n"
        );
    }

    #[test]
    fn test_export_ops_writes_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let (a, b) = sample();
        let (json_path, csv_path) =
            export_ops(tmp.path(), "ops", "lulesh", &[("sve", &a), ("novec", &b)]).unwrap();

        assert_eq!(json_path, tmp.path().join("ops.json"));
        assert_eq!(csv_path, tmp.path().join("ops.csv"));

        let json = std::fs::read(&json_path).unwrap();
        let records: Vec<ExportRecord> = serde_json::from_slice(&json).unwrap();
        assert_eq!(records.len(), 6);

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv.lines().count(), 7);
        assert!(csv.starts_with("application,version,op,count\n"));
    }
}

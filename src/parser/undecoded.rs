//! `undecoded_<V>.txt`: dynamic execution count per emulated instruction word.
//!
//! Written by the opcodes client as `"%9lu : 0x%08x"`, so every line carries
//! padding that is removed before splitting on the single `:`. The oprecord
//! client writes its per-address traces in the same layout.

use crate::error::MalformedLine;

use super::parse_grouped_int;

/// One `<count>:<word>` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionCount {
    pub word: String,
    pub count: u64,
}

/// Parse one `<count>:<word>` line. Blank lines yield `None`; `line_no` is
/// 1-indexed and only used for diagnostics.
pub fn parse_count_line(line: &str, line_no: usize) -> Result<Option<InstructionCount>, MalformedLine> {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(None);
    }

    let mut parts = compact.split(':');
    let (count, word) = match (parts.next(), parts.next(), parts.next()) {
        (Some(count), Some(word), None) if !word.is_empty() => (count, word),
        _ => {
            return Err(MalformedLine::new(
                line_no,
                format!("expected '<count>:<word>', found {:?}", line.trim()),
            ))
        }
    };

    let count = parse_grouped_int(count).ok_or_else(|| {
        MalformedLine::new(line_no, format!("invalid instruction count {:?}", count))
    })?;

    Ok(Some(InstructionCount {
        word: word.to_string(),
        count,
    }))
}

pub fn parse_undecoded(content: &str) -> Result<Vec<InstructionCount>, MalformedLine> {
    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if let Some(record) = parse_count_line(line, idx + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

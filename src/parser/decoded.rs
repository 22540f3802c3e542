//! `decoded_<V>.txt`: the decoder's view of every distinct encoding observed.
//!
//! ```text
//! 0x65a00000 : fmla z0.s, p0/m, z0.s, z0.s
//! 0xa540a000 : ld1w {z0.s}, p0/z, [x0]
//! ```
//!
//! Field 0 is the instruction word, field 2 the opcode mnemonic.

use std::collections::HashMap;

use crate::error::MalformedLine;

/// Mapping from raw instruction word text to opcode mnemonic.
#[derive(Debug, Clone, Default)]
pub struct DecodeMap {
    map: HashMap<String, String>,
}

impl DecodeMap {
    /// Opcode for an instruction word, if the decoder saw it.
    pub fn resolve(&self, word: &str) -> Option<&str> {
        self.map.get(word).map(String::as_str)
    }

    pub fn insert(&mut self, word: impl Into<String>, op: impl Into<String>) {
        self.map.insert(word.into(), op.into());
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Parse decode-map text. A repeated word keeps its last mnemonic.
pub fn parse_decoded(content: &str) -> Result<DecodeMap, MalformedLine> {
    let mut decode = DecodeMap::default();

    for (idx, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 3 {
            return Err(MalformedLine::new(
                idx + 1,
                format!("expected '<word> : <opcode> ...', found {} field(s)", fields.len()),
            ));
        }
        decode.insert(fields[0], fields[2]);
    }

    Ok(decode)
}

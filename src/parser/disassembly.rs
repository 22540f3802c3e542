//! `objdump -d` text of a traced binary: address to instruction map.
//!
//! ```text
//!   400580:	d503201f 	nop
//!   4005a4:	4ea01c00 	mov	v0.16b, v0.16b
//!   4005a8:	3dc00fe0 	ldr	q0, [sp, #48]  // spill
//! ```
//!
//! Only instruction lines are kept; section and symbol headers, blank lines
//! and truncated rows are skipped. An instruction counts as NEON when its
//! first operand is a vector arrangement (`v0.16b`) or a `q` register.

use std::collections::HashMap;

use super::PATTERNS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassembledInstruction {
    pub opcode: String,
    /// Operands with any trailing `//` comment removed.
    pub arguments: String,
    /// First operand is a `v` register with an arrangement.
    pub is_vector: bool,
    /// First operand is a `q` register.
    pub is_q: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Disassembly {
    instructions: HashMap<u64, DisassembledInstruction>,
}

impl Disassembly {
    pub fn get(&self, address: u64) -> Option<&DisassembledInstruction> {
        self.instructions.get(&address)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Parse a hexadecimal address with or without the `0x` prefix.
pub fn parse_address(s: &str) -> Option<u64> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

pub fn parse_disassembly(content: &str) -> Disassembly {
    let mut instructions = HashMap::new();

    for line in content.lines() {
        let Some(caps) = PATTERNS.disassembly_line.captures(line) else {
            continue;
        };
        let Some(address) = parse_address(&caps[1]) else {
            continue;
        };

        // encoding, mnemonic, operands...
        let mut fields = caps[2].split_whitespace();
        let (Some(_encoding), Some(opcode)) = (fields.next(), fields.next()) else {
            continue;
        };
        let operands = fields.collect::<Vec<_>>().join(" ");
        let arguments = match operands.find("//") {
            Some(pos) => operands[..pos].trim_end().to_string(),
            None => operands,
        };

        let is_vector = PATTERNS.vector_operand.is_match(&arguments);
        let is_q = PATTERNS.q_operand.is_match(&arguments);
        instructions.insert(
            address,
            DisassembledInstruction {
                opcode: opcode.to_string(),
                arguments,
                is_vector,
                is_q,
            },
        );
    }

    log::debug!("Parsed {} instructions from disassembly", instructions.len());
    Disassembly { instructions }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJDUMP: &str = "
lulesh:     file format elf64-littleaarch64


Disassembly of section .text:

0000000000400580 <_start>:
  400580:\td503201f \tnop
  400584:\t4ea01c00 \tmov\tv0.16b, v0.16b
  400588:\t3dc00fe0 \tldr\tq0, [sp, #48]  // spill
  40058c:\t91000421 \tadd\tx1, x1, #0x1
  400590:\t0e205800 \tcnt\tv0.8b, v0.8b
  400594:\t65a00000
";

    #[test]
    fn test_parse_disassembly() {
        let code = parse_disassembly(OBJDUMP);
        assert_eq!(code.len(), 5);

        let nop = code.get(0x400580).unwrap();
        assert_eq!(nop.opcode, "nop");
        assert_eq!(nop.arguments, "");
        assert!(!nop.is_vector && !nop.is_q);

        let mov = code.get(0x400584).unwrap();
        assert_eq!(mov.opcode, "mov");
        assert_eq!(mov.arguments, "v0.16b, v0.16b");
        assert!(mov.is_vector);

        let ldr = code.get(0x400588).unwrap();
        assert_eq!(ldr.arguments, "q0, [sp, #48]");
        assert!(ldr.is_q && !ldr.is_vector);

        assert!(!code.get(0x40058c).unwrap().is_vector);
        assert!(code.get(0x400590).unwrap().is_vector);
        assert!(code.get(0x400594).is_none());
    }

    #[test]
    fn test_symbol_headers_are_not_instructions() {
        let code = parse_disassembly("0000000000400580 <_start>:\n");
        assert!(code.is_empty());
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x0000000000400580"), Some(0x400580));
        assert_eq!(parse_address("400580"), Some(0x400580));
        assert_eq!(parse_address("0x"), None);
        assert_eq!(parse_address("main"), None);
    }
}

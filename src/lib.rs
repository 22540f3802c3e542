//! armie-parser library
//!
//! Post-processing of ArmIE emulator trace logs: per-version opcode ledgers,
//! cross-version highlights, exact NEON counts and SVE memory trace summaries.

pub mod config;
pub mod error;
pub mod ledger;
pub mod memtrace;
pub mod neon;
pub mod parser;
pub mod report;
pub mod results;

pub use error::{LedgerError, MalformedLine};
pub use ledger::{InstructionTotal, Ledger, LedgerSource, LogDir, Totals};
pub use results::{Binary, ResultsDir};

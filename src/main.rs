//! armie-parser: summarize the trace logs of an ArmIE results directory.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;

use armie_parser::config::Config;
use armie_parser::ledger::build_all;
use armie_parser::memtrace::{self, MemTrace, INSTRACE_TOOLS};
use armie_parser::neon::{count_neon_files, write_a64_count};
use armie_parser::report::{self, export_ops, highlight_all_pairs};
use armie_parser::{Ledger, ResultsDir};

/// Instruction sets a run can be analysed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Isa {
    A64,
    Sve,
    Both,
}

/// armie-parser - ArmIE trace log post-processing
#[derive(Parser, Debug)]
#[command(name = "armie-parser", version, about = "Opcode and memory summaries of ArmIE results")]
#[command(group(ArgGroup::new("mode").args(["list", "op_count", "mem_count", "count_neon"])))]
struct Args {
    /// List binaries for which results have been collected
    #[arg(short, long)]
    list: bool,

    /// Count executed ops (default mode)
    #[arg(long)]
    op_count: bool,

    /// Count memory operations
    #[arg(long)]
    mem_count: bool,

    /// Count NEON instructions of an oprecord trace against an objdump
    /// disassembly and print the a64-count report
    #[arg(long, num_args = 2, value_names = ["DISASSEMBLY", "TRACE"])]
    count_neon: Option<Vec<PathBuf>>,

    /// Show N items in top summaries
    #[arg(short = 'n', value_name = "N")]
    top_n: Option<usize>,

    /// Instruction set(s) to consider
    #[arg(short, long, value_enum, default_value_t = Isa::Sve)]
    isa: Isa,

    /// Export the results to CSV and JSON
    #[arg(short, long)]
    export: bool,

    /// Compare pairs of results to find opcodes more common in one than in the other
    #[arg(long)]
    highlight: bool,

    /// Highlight opcodes only when differences are above T%
    #[arg(short, long, value_name = "T")]
    threshold: Option<u32>,

    /// Highlight opcodes only when they appear at least N times
    #[arg(long, value_name = "N")]
    min_count: Option<u64>,

    /// Skip versions whose logs fail to parse instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Print a sample config file and exit
    #[arg(long)]
    sample_config: bool,

    /// Path to config file (default: ./armie-parser.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to a results directory
    #[arg(required_unless_present_any = ["count_neon", "sample_config"])]
    results: Option<PathBuf>,
}

/// Settings after merging command-line flags over the config file.
struct Settings {
    top_n: usize,
    threshold: u32,
    min_count: u64,
    export_name: String,
    highlight: bool,
    export: bool,
    keep_going: bool,
}

impl Settings {
    /// Highlights look twice as deep as the summaries.
    fn highlight_top_n(&self) -> usize {
        self.top_n.saturating_mul(2)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    if args.sample_config {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    if let Some(files) = &args.count_neon {
        let [disassembly, trace] = files.as_slice() else {
            anyhow::bail!("--count-neon takes a disassembly and a trace");
        };
        let counts = count_neon_files(disassembly, trace)
            .with_context(|| format!("Failed to count NEON instructions of {}", trace.display()))?;
        write_a64_count(&mut io::stdout().lock(), &counts)?;
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::load_with(path),
        None => Config::get().clone(),
    };
    let settings = Settings {
        top_n: args.top_n.unwrap_or_else(|| config.top_n()),
        threshold: args.threshold.unwrap_or_else(|| config.threshold()),
        min_count: args.min_count.unwrap_or_else(|| config.min_count()),
        export_name: config.export_name(),
        highlight: args.highlight,
        export: args.export,
        keep_going: args.keep_going,
    };

    let results_path = args.results.as_ref().context("A results directory is required")?;
    let results = ResultsDir::open(results_path)?;

    if args.list {
        let versions: Vec<&str> = results.binaries().iter().map(|b| b.version.as_str()).collect();
        println!("Binary name: {}", results.root());
        println!("  Versions: {}", versions.join(" "));
        return Ok(());
    }

    if args.isa != Isa::Sve {
        log::warn!("Instruction set '{:?}' not implemented, reporting SVE", args.isa);
    }

    if args.mem_count {
        run_mem_count(&results, &settings)
    } else {
        run_op_count(&results, &settings)
    }
}

/// Build every version's ledger, print summaries, then highlights and exports.
fn run_op_count(results: &ResultsDir, settings: &Settings) -> Result<()> {
    let ledgers = build_all(results.path(), results.binaries(), settings.keep_going)
        .with_context(|| format!("Failed to build opcode ledgers of {}", results.root()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (binary, ledger) in &ledgers {
        report::summarize(&mut out, ledger, &binary.version, settings.top_n)?;
    }

    let labelled: Vec<(&str, &Ledger)> = ledgers
        .iter()
        .map(|(binary, ledger)| (binary.version.as_str(), ledger))
        .collect();

    if settings.highlight {
        highlight_all_pairs(
            &mut out,
            &labelled,
            settings.threshold,
            settings.min_count,
            settings.highlight_top_n(),
        )?;
    }

    if settings.export {
        let (json, csv) = export_ops(results.path(), &settings.export_name, results.root(), &labelled)?;
        writeln!(out, "Exported to {} and {}", json.display(), csv.display())?;
    }

    Ok(())
}

/// Summarize legacy memory traces, or merge the instrace CSVs with `--export`.
fn run_mem_count(results: &ResultsDir, settings: &Settings) -> Result<()> {
    if settings.highlight {
        log::warn!("--highlight is ignored in mem-count mode");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if settings.export {
        let versions: Vec<(&str, &str)> = results
            .binaries()
            .iter()
            .map(|b| (b.file_name.as_str(), b.version.as_str()))
            .collect();
        for tool in INSTRACE_TOOLS {
            let path = memtrace::merge_instrace(results.path(), &versions, results.root(), tool, "mem")
                .with_context(|| format!("Failed to merge {} data", tool))?;
            writeln!(out, "Exported {} data to {}", tool, path.display())?;
        }
        return Ok(());
    }

    for binary in results.binaries() {
        match MemTrace::for_version(results.path(), &binary.file_name) {
            Ok(trace) => memtrace::summarize(&mut out, &trace, &binary.version)?,
            Err(e) if settings.keep_going => log::error!("Skipping {}: {}", binary.version, e),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read memory trace of {}", binary.file_name))
            }
        }
    }

    Ok(())
}

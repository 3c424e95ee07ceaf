//! uniqpass - loop-unique access analysis driver
//!
//! # Usage
//!
//! ```bash
//! # Analyze every task of a serialized program
//! uniqpass analyze program.json
//!
//! # One task only, JSON output
//! uniqpass analyze program.json --task 4 --format json
//!
//! # Load and validate without analyzing
//! uniqpass check program.json
//!
//! # Describe an error code, or list them all
//! uniqpass explain E2008
//! uniqpass explain
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use compiler::analysis::{AnalysisConfig, AnalysisManager, AnalysisReport, StructuralAliasOracle};
use compiler::error_codes::{
    error_registry, format_error_code, get_error_code, ErrorCode, E_DRIVER_UNKNOWN_CODE,
};
use compiler::ir::{dump::dump_program, Program, StmtId};
use compiler::{logging, AnalysisError, ProgramLoadError};
use log::LevelFilter;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "uniqpass")]
#[command(version = "0.1.0")]
#[command(about = "Loop-unique access analysis for offloaded tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a serialized program
    Analyze {
        /// Path to the program (JSON)
        file: PathBuf,

        /// Driver configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Analyze only the task boundary with this statement id
        #[arg(long)]
        task: Option<u32>,

        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Print the program before the results
        #[arg(long)]
        dump_ir: bool,

        /// Analyze tasks in parallel
        #[arg(long)]
        parallel: bool,

        /// Increase log verbosity (-v info, -vv debug, -vvv trace)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },

    /// Load and validate a serialized program
    Check {
        /// Path to the program (JSON)
        file: PathBuf,
    },

    /// Describe an error code (e.g. E2008), or list every code
    Explain {
        code: Option<String>,
    },
}

#[derive(ValueEnum, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct DriverConfig {
    analysis: AnalysisConfig,
    log: LogConfig,
    output: OutputConfig,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct LogConfig {
    level: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct OutputConfig {
    format: Option<OutputFormat>,
    dump_ir: bool,
}

impl DriverConfig {
    fn load(path: &Path) -> Result<Self, ProgramLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProgramLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

/// Driver failure carrying its registry entry
#[derive(Debug)]
struct CliError {
    code: u16,
    entry: Option<&'static ErrorCode>,
    message: String,
}

impl CliError {
    fn new(code: u16, message: String) -> Self {
        CliError {
            code,
            entry: get_error_code(code),
            message,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", format_error_code(self.code), self.message)?;
        if let Some(entry) = self.entry {
            write!(f, "\n  = note: {}", entry.description)?;
            if let Some(help) = entry.help {
                write!(f, "\n  = help: {}", help)?;
            }
        }
        Ok(())
    }
}

impl From<ProgramLoadError> for CliError {
    fn from(e: ProgramLoadError) -> Self {
        let mut message = e.to_string();
        for error in e.validation_errors() {
            message.push_str(&format!("\n  {}", error));
        }
        CliError {
            code: e.code(),
            entry: e.error_code(),
            message,
        }
    }
}

impl From<AnalysisError> for CliError {
    fn from(e: AnalysisError) -> Self {
        CliError {
            code: e.code(),
            entry: e.error_code(),
            message: e.to_string(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze { file, config, task, format, dump_ir, parallel, verbose } => {
            analyze_file(file, config, task, format, dump_ir, parallel, verbose)
        }
        Commands::Check { file } => {
            logging::init_from_env();
            check_file(file)
        }
        Commands::Explain { code } => explain(code.as_deref()).map(|text| print!("{}", text)),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn log_level(verbose: u8, configured: Option<&str>) -> LevelFilter {
    match verbose {
        0 => configured
            .and_then(|level| level.parse().ok())
            .unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn analyze_file(
    file: PathBuf,
    config: Option<PathBuf>,
    task: Option<u32>,
    format: Option<OutputFormat>,
    dump_ir: bool,
    parallel: bool,
    verbose: u8,
) -> Result<(), CliError> {
    let mut driver = match &config {
        Some(path) => DriverConfig::load(path)?,
        None => DriverConfig::default(),
    };
    logging::init_with_level(log_level(verbose, driver.log.level.as_deref()));

    // flags override the file
    driver.analysis.parallel_tasks |= parallel;
    let format = format.or(driver.output.format).unwrap_or_default();
    let dump_ir = dump_ir || driver.output.dump_ir;

    let program = Program::load(&file)?;
    log::info!("loaded {} ({} statements)", file.display(), program.len());
    if dump_ir {
        println!("{}", dump_program(&program));
    }

    let oracle = StructuralAliasOracle::new(&program);
    let report = match task {
        Some(id) => AnalysisReport::for_task(&program, StmtId::new(id), &oracle)?,
        None => {
            let mut amgr = AnalysisManager::new();
            AnalysisReport::build(&program, &oracle, driver.analysis, &mut amgr)?
        }
    };

    match format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::from(ProgramLoadError::from(e)))?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn check_file(file: PathBuf) -> Result<(), CliError> {
    let program = Program::load(&file)?;
    println!(
        "✓ {}: {} statements, {} storage nodes, {} tasks",
        file.display(),
        program.len(),
        program.snodes.len(),
        program.tasks().len()
    );
    Ok(())
}

fn explain(code: Option<&str>) -> Result<String, CliError> {
    let registry = error_registry();
    let Some(code) = code else {
        return Ok(registry.all().iter().map(|entry| format!("{}\n", entry)).collect());
    };
    let entry = registry
        .get_by_string(&code.to_ascii_uppercase())
        .ok_or_else(|| CliError::new(E_DRIVER_UNKNOWN_CODE, format!("unknown error code `{}`", code)))?;
    let mut text = format!("{}\n", entry);
    if let Some(help) = entry.help {
        text.push_str(&format!("help: {}\n", help));
    }
    Ok(text)
}

// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;

use filterkit::app_config::{self, Config, DEFAULT_CONFIG_FILE, LineBreak};
use filterkit::app_controller::{BatchReport, Controller, Operation};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for LineBreak to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLineBreak {
    Auto,
    Lf,
    Crlf,
    Cr,
}

impl From<CliLineBreak> for LineBreak {
    fn from(cli_break: CliLineBreak) -> Self {
        match cli_break {
            CliLineBreak::Auto => LineBreak::Auto,
            CliLineBreak::Lf => LineBreak::Lf,
            CliLineBreak::Crlf => LineBreak::CrLf,
            CliLineBreak::Cr => LineBreak::Cr,
        }
    }
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Input document or directory
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Filter configuration id (by extension when omitted)
    #[arg(long = "filter")]
    filter_config: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the events of a document as JSON lines
    Extract(InputArgs),

    /// Extract and write back documents, checking the output is identical
    Roundtrip(InputArgs),

    /// Extract and write documents in the target locale
    Rewrite {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory (next to each input by default)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output encoding (input encoding by default)
        #[arg(short = 'e', long)]
        output_encoding: Option<String>,

        /// Line break of the output
        #[arg(long, value_enum)]
        line_break: Option<CliLineBreak>,

        /// Fill missing targets with upper-cased source text
        #[arg(long)]
        pseudo: bool,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// List the available filter configurations
    Filters,

    /// Generate shell completions for filterkit
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// filterkit - lossless extraction of translatable text
#[derive(Parser, Debug)]
#[command(name = "filterkit")]
#[command(version)]
#[command(about = "Extract translatable text from documents and write it back losslessly")]
#[command(long_about = "filterkit reads properties, plain text, DTD, TransTable and HTML fragment \
documents into text units and skeleton, and writes them back byte-for-byte.

EXAMPLES:
    filterkit extract messages.properties             # Dump events as JSON lines
    filterkit roundtrip ./resources                   # Check every known document in a directory
    filterkit rewrite --pseudo -t de messages.properties
    filterkit filters                                 # List filter configurations
    filterkit completions bash > filterkit.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in filterkit.json by default. If the file doesn't
    exist, a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Source locale (e.g., 'en', 'en-US')
    #[arg(short, long, global = true)]
    source_locale: Option<String>,

    /// Target locale (e.g., 'fr', 'de-CH')
    #[arg(short, long, global = true)]
    target_locale: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "filterkit", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Extract(input) => {
            let controller = Controller::with_config(config)?;
            let inputs = controller.collect_inputs(&input.input_path, input.filter_config.as_deref())?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for (path, config_id) in inputs {
                let count = controller.dump_events(&path, &config_id, &mut out)?;
                info!("{}: {} events ({})", path.display(), count, config_id);
            }
            Ok(())
        }
        Commands::Roundtrip(input) => {
            let controller = Controller::with_config(config)?;
            let report = controller.run_batch(
                &input.input_path,
                input.filter_config.as_deref(),
                &Operation::RoundTrip,
            )?;
            finish(report)
        }
        Commands::Rewrite {
            input,
            output_dir,
            output_encoding,
            line_break,
            pseudo,
            force_overwrite,
        } => {
            let mut config = config;
            if output_encoding.is_some() {
                config.output_encoding = output_encoding;
            }
            if let Some(line_break) = line_break {
                config.line_break = line_break.into();
            }
            let controller = Controller::with_config(config)?;
            let operation = Operation::Rewrite {
                output_dir,
                pseudo,
                force_overwrite,
            };
            let report = controller.run_batch(
                &input.input_path,
                input.filter_config.as_deref(),
                &operation,
            )?;
            finish(report)
        }
        Commands::Filters => {
            let mapper = config.build_mapper()?;
            for configuration in mapper.configurations() {
                println!(
                    "{:<32} {:<20} {} [{}]",
                    configuration.config_id,
                    configuration.mime_type,
                    configuration.name,
                    configuration.extensions.join(", ")
                );
            }
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load or create the configuration, then apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(source) = &cli.source_locale {
        config.source_locale = source.clone();
    }
    if let Some(target) = &cli.target_locale {
        config.target_locale = target.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    Ok(config)
}

fn finish(report: BatchReport) -> Result<()> {
    for (path, detail) in &report.mismatches {
        println!("DIFF {}: {}", path.display(), detail);
    }
    for (path, error) in &report.failures {
        println!("FAIL {}: {}", path.display(), error);
    }
    if report.is_success() {
        Ok(())
    } else {
        Err(anyhow!(report.summary()))
    }
}

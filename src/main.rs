/*!
 * dxtpack CLI - Command Line Interface
 */

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use dxtpack::{
    cli_style::{self, print_error, print_success, Icons, Theme},
    commands::{run_init, PromptInitializer},
    config::{LogLevel, PackConfig, MANIFEST_FILE},
    error::{PackError, Result, EXIT_FAILURE, EXIT_SUCCESS},
    logging, manifest,
    output::{ConsoleReporter, Reporter, SilentReporter},
    pack::{DecliningInitializer, ManifestInitializer, PackOptions, Packer},
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dxtpack")]
#[command(version, about = "Package an extension directory into a deterministic .dxt archive", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Deflate compression level (1-9, or 0 to store uncompressed)
    #[arg(long, value_name = "LEVEL", global = true, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: Option<u32>,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write JSON logs to this file instead of stderr
    #[arg(long, value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Enable verbose logging (equivalent to --log-level=debug)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Print the result as a single JSON document
    #[arg(long, global = true)]
    json: bool,

    /// Suppress the report
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Never offer to create a missing manifest
    #[arg(long, global = true)]
    no_init: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack an extension directory into a .dxt archive
    Pack {
        /// Extension directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output archive path (default: <dir name>.dxt in the current directory)
        output: Option<PathBuf>,
    },

    /// Create a manifest.json interactively
    Init {
        /// Extension directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Accept all defaults without prompting
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Validate a manifest.json without packing
    Validate {
        /// Manifest file, or a directory containing one
        manifest: PathBuf,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            print_error(&e.to_string(), None);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Err(e) = logging::init_logging(&config) {
        cli_style::print_warning(&format!("Failed to initialize logging: {}", e));
    }

    match cli.command {
        Commands::Pack { dir, output } => {
            let reporter: Box<dyn Reporter> = if cli.quiet && !cli.json {
                Box::new(SilentReporter)
            } else {
                Box::new(ConsoleReporter::new(cli.json))
            };
            let initializer: Box<dyn ManifestInitializer> = if cli.no_init || cli.json {
                Box::new(DecliningInitializer)
            } else {
                Box::new(PromptInitializer::default())
            };

            let mut options = PackOptions::new(dir);
            options.output = output;

            let mut packer = Packer::new(&config, reporter.as_ref(), initializer.as_ref());
            Ok(if packer.pack(&options) {
                EXIT_SUCCESS
            } else {
                EXIT_FAILURE
            })
        }
        Commands::Init { dir, yes } => {
            run_init(&dir, yes).map_err(|e| PackError::Other(format!("{:#}", e)))?;
            Ok(EXIT_SUCCESS)
        }
        Commands::Validate { manifest } => validate_command(&manifest, cli.json),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dxtpack", &mut std::io::stdout());
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Config file first, then command-line overrides
fn load_config(cli: &Cli) -> Result<PackConfig> {
    let mut config = match cli.config {
        Some(ref path) => PackConfig::from_file(path)?,
        None => PackConfig::default(),
    };

    if let Some(level) = cli.level {
        config.compression_level = level;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    config.verbose |= cli.verbose;

    config.validate()?;
    Ok(config)
}

fn validate_command(path: &Path, json: bool) -> Result<i32> {
    let manifest_path = if path.is_dir() {
        path.join(MANIFEST_FILE)
    } else {
        path.to_path_buf()
    };

    let result = manifest::validate(&manifest_path)?;

    if json {
        let issues: Vec<String> = result.issues().iter().map(ToString::to_string).collect();
        let doc = serde_json::json!({
            "valid": result.is_valid(),
            "manifest": manifest_path.display().to_string(),
            "issues": issues,
        });
        println!("{}", doc);
    } else if result.is_valid() {
        print_success(&format!("{} is valid", manifest_path.display()));
    } else {
        print_error(
            &format!(
                "{} has {} problem(s)",
                manifest_path.display(),
                result.issues().len()
            ),
            None,
        );
        for issue in result.issues() {
            println!("  {} {}", Theme::muted(Icons::ARROW_RIGHT), issue);
        }
    }

    Ok(if result.is_valid() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}

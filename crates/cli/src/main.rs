// prodmatch CLI - resumable product-line standardization

mod doctor;
mod exit_codes;
mod standardize;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;

use prodmatch_config::settings::Settings;
use prodmatch_config::ConfigError;
use prodmatch_matcher::MatchError;

use exit_codes::{config_exit_code, match_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "prodmatch")]
#[command(about = "Standardize raw product mentions against a brand catalog")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: ./prodmatch.toml, then the user config dir)
    #[arg(long, global = true, env = "PRODMATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match every unprocessed record, resuming the checkpointed session
    #[command(after_help = "\
Examples:
  prodmatch run videos.json catalog.json
  prodmatch run videos.json catalog.json --output-dir runs/march --rate-limit-ms 250
  prodmatch run videos.json catalog.json --retry-failed --json > summary.json

Interrupting is safe: rerun the same command to continue where it stopped.")]
    Run {
        /// Records to standardize (JSON array)
        records: PathBuf,

        /// Product catalog (JSON object with a `products` array)
        catalog: PathBuf,

        /// Folder holding checkpoint.json and the output pair
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Pause after every oracle call, in milliseconds
        #[arg(long)]
        rate_limit_ms: Option<u64>,

        /// Rows shown per non-match bucket
        #[arg(long)]
        top_n: Option<usize>,

        /// Re-query records whose previous attempt failed in transport
        #[arg(long)]
        retry_failed: bool,

        /// Print the summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Show the checkpointed session without contacting the oracle
    Status {
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Rebuild the summary and non-match buckets from the session output
    Report {
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        top_n: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Show resolved oracle settings and where the API key comes from
    #[command(after_help = "\
Exit codes:
  0   API key found
  10  no API key (set PRODMATCH_OPENAI_KEY or OPENAI_API_KEY)")]
    Doctor {
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
        )
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run { records, catalog, output_dir, rate_limit_ms, top_n, retry_failed, json } => {
            load_settings(config).and_then(|mut settings| {
                if let Some(dir) = output_dir {
                    settings.output_dir = dir;
                }
                if let Some(ms) = rate_limit_ms {
                    settings.rate_limit_ms = ms;
                }
                if let Some(n) = top_n {
                    settings.top_n = n;
                }
                settings.retry_failed |= retry_failed;
                standardize::cmd_run(&settings, &records, &catalog, json)
            })
        }
        Commands::Status { output_dir, json } => load_settings(config).and_then(|mut settings| {
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            standardize::cmd_status(&settings, json)
        }),
        Commands::Report { output_dir, top_n, json } => load_settings(config).and_then(|mut settings| {
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            if let Some(n) = top_n {
                settings.top_n = n;
            }
            standardize::cmd_report(&settings, json)
        }),
        Commands::Doctor { json } => doctor::cmd_doctor(config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn load_settings(explicit: Option<&std::path::Path>) -> Result<Settings, CliError> {
    let (settings, used) = Settings::load(explicit).map_err(CliError::config)?;
    if let Some(path) = used {
        log::debug!("settings: {}", path.display());
    }
    Ok(settings)
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn matcher(err: MatchError) -> Self {
        Self::new(match_exit_code(&err), err.to_string())
    }

    pub fn config(err: ConfigError) -> Self {
        Self::new(config_exit_code(&err), err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

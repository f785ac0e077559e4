//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

use examdl_core::{AppConfig, FileFormat};

/// CLI arguments for examdl
#[derive(Parser, Debug)]
#[command(name = "examdl")]
#[command(version, about = "Download certification question banks, cache first")]
#[command(long_about = r#"
examdl reads a catalog of certifications and, for each one, fetches its
questions from the remote cache or crawls the provider's discussion pages,
then writes a rendered file and a link list per certification.

Configuration is loaded from (lowest to highest priority):
1. Built-in defaults
2. ./examdl.toml       Project-level config
3. --config <path>     Explicit config file (or EXAMDL_CONFIG_FILE)
4. EXAMDL_* environment variables
5. Command-line flags

Example:
  examdl --csv catalog.csv -p microsoft --type md
  examdl -p amazon -c --no-cache --sleep 5
"#)]
pub struct Cli {
    /// Certification catalog CSV
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Provider name, e.g. microsoft or amazon
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Directory for rendered question files
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory for link lists
    #[arg(long, value_name = "DIR")]
    pub links_dir: Option<PathBuf>,

    /// Include community discussion in the output
    #[arg(short = 'c', long = "comments")]
    pub comments: bool,

    /// Output format: md, txt, json or html
    #[arg(long = "type", value_name = "FORMAT")]
    pub file_format: Option<FileFormat>,

    /// Skip the remote cache and always crawl
    #[arg(long)]
    pub no_cache: bool,

    /// Access token for the cache service
    #[arg(short = 't', long = "token", value_name = "TOKEN")]
    pub token: Option<String>,

    /// Seconds to wait between certifications that hit the provider
    #[arg(long, value_name = "SECS")]
    pub sleep: Option<u64>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Export live crawls as cache snapshots under <output-dir>/snapshots
    #[arg(long)]
    pub save_snapshots: bool,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Apply flags on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(csv) = &self.csv {
            config.catalog_path = csv.clone();
        }
        if let Some(provider) = &self.provider {
            config.provider = provider.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.links_dir {
            config.links_dir = dir.clone();
        }
        if self.comments {
            config.include_discussion = true;
        }
        if let Some(format) = self.file_format {
            config.file_format = format;
        }
        if self.no_cache {
            config.cache_enabled = false;
        }
        if let Some(token) = &self.token {
            config.access_token = Some(token.clone());
        }
        if let Some(secs) = self.sleep {
            config.sleep_secs = secs;
        }
        if self.save_snapshots {
            config.save_snapshots = true;
        }
    }

    /// Default log filter for the verbosity level.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use crate::github::DEFAULT_API_URL;
use crate::report::Axis;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "font-filesize")]
#[command(about = "Rank fontsource variable fonts by file size along each axis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write one html table per axis plus an index
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        // Output directory for the html pages
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,
    },
    /// Build the tables once and serve them over http
    Serve {
        #[command(flatten)]
        source: SourceArgs,

        // Port to run the server on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    // Repository owner
    #[arg(long, default_value = "fontsource")]
    pub owner: String,

    // Repository name
    #[arg(long, default_value = "font-files")]
    pub repo: String,

    #[arg(long, default_value = "main")]
    pub branch: String,

    // Folder holding one sub folder per font
    #[arg(long, default_value = "fonts/variable")]
    pub root: String,

    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    // GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    // Max requests in flight at once
    #[arg(long, default_value_t = 50)]
    pub max_concurrent: usize,

    // Max requests per rate window
    #[arg(long, default_value_t = 800)]
    pub rate_limit: usize,

    // Rate window in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window: u64,

    // Persist fetched documents here between runs
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    // Cache TTL in seconds (no expiry when unset)
    #[arg(long)]
    pub cache_ttl: Option<u64>,

    // Only look at the first N fonts
    #[arg(long)]
    pub limit: Option<usize>,

    // Axes to report on (all when none given)
    #[arg(long = "axis", value_enum)]
    pub axes: Vec<Axis>,

    // Style part of the measured file name
    #[arg(long, default_value = "normal")]
    pub style: String,
}

impl SourceArgs {
    pub fn axes(&self) -> Vec<Axis> {
        if self.axes.is_empty() {
            Axis::ALL.to_vec()
        } else {
            self.axes.clone()
        }
    }
}

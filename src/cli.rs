use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct RunArgs {
    /// JSON suite file; built-in defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Client binary to test, overrides the suite file
    #[arg(short, long)]
    pub binary: Option<String>,

    /// Per-case timeout in seconds, overrides the suite file
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Only run cases whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Stop after the first failing case
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// Print the report as JSON instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// List the selected cases and their commands without running them
    #[arg(short, long, default_value_t = false)]
    pub list: bool,
}

impl RunArgs {
    pub fn from_env() -> Self {
        Self::parse()
    }
}

use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "engagement-etl")]
#[command(about = "Employee engagement reports for a community wall")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "engagement-etl.toml")]
    pub config: String,

    /// Override load.output_path from config
    #[arg(short, long)]
    pub output: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Likes / reposts of every tracked employee over the latest posts
    Activity {
        /// Number of latest posts (1-100, otherwise 30)
        #[arg(short = 'n', long)]
        posts: Option<usize>,
    },
    /// Views, likes, reposts and comments of the latest posts
    Posts {
        #[arg(short = 'n', long)]
        posts: Option<usize>,
    },
    /// Posts published between two dates (DD.MM.YYYY)
    Range {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Read commands from stdin, reusing one cache across them
    Session,
}

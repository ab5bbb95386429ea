use clap::Parser;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "sfw", version = VERSION, about = "Starfish build dashboard TUI")]
pub struct Cli {
    /// Base URL of the Starfish web backend
    #[arg(short, long, default_value = "http://localhost:8000")]
    pub server: String,

    /// Number of log lines kept in the live tail view
    #[arg(short = 'n', long, default_value_t = 20)]
    pub tail_len: usize,

    /// Build-list poll interval in seconds
    #[arg(short, long, default_value_t = 10)]
    pub interval: u64,

    /// Maximum number of builds to display
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,
}

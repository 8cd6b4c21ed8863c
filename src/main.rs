use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sfconn::{
    commands,
    config::Config,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "sfconn")]
#[command(about = "Salesforce connection manager - select, validate and activate saved login profiles")]
#[command(version)]
struct Cli {
    /// Name of a pre-configured connection
    #[arg(short = 'c', long = "connection", value_name = "ALIAS")]
    connection: Option<String>,

    /// List saved connections and exit
    #[arg(short, long, conflicts_with = "connection")]
    list: bool,

    /// Directory holding the connection store [env: SFCONN_STORE_DIR] [default: .jsforce]
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Seconds to wait for the login endpoint [env: SFCONN_TIMEOUT_SECS] [default: 30]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Show debug logs on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "sfconn=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ui = Ui::new(cli.color, cli.no_color);
    let config = Config::resolve(cli.store, cli.timeout)?;

    if cli.list {
        return commands::list(&config, &ui);
    }

    commands::connect(&config, cli.connection.as_deref(), &ui)
}

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, WrapErr};
use keystore::{Access, Config, Store};
use std::path::PathBuf;
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "keystore")]
#[command(about = "Key/value store backed by a JSON file on disk")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Directory holding keystore.json and its keystore.json.lock lock file
    /// (default: $KEY_STORE_PATH)
    #[arg(short, long, global = true)]
    store_path: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a key/value pair, overwriting any existing value
    Add {
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Print the whole store as JSON
    List,

    /// Print the value stored under a key
    Get { key: String },

    /// Remove a key
    Remove { key: String },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.store_path)?;
    let access = match cli.command {
        Commands::List | Commands::Get { .. } => Access::ReadOnly,
        Commands::Add { .. } | Commands::Remove { .. } => Access::ReadWrite,
    };
    let mut store = Store::open_with_config(&config, access)
        .wrap_err_with(|| format!("Failed to open store in {}", config.store_dir().display()))?;

    match cli.command {
        Commands::Add { key, value } => {
            let added = store.add(&key, &value).wrap_err("Failed to add entry")?;
            println!("{}", added);
        }
        Commands::List => {
            println!("{}", store.list()?);
        }
        Commands::Get { key } => {
            if let Some(value) = store.get(&key) {
                println!("{}", value);
            }
        }
        Commands::Remove { key } => {
            let removed = store.remove(&key).wrap_err("Failed to remove entry")?;
            println!("{}", removed);
        }
    }

    Ok(())
}

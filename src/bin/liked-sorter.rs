mod commands;

use clap::Parser;
use commands::{execute_command, Commands};
use liked_sorter::config::RUN_TIMEOUT;
use liked_sorter::CancellationState;
use std::time::Duration;

/// Spotify liked songs organiser
#[derive(Parser)]
#[command(
    name = "liked-sorter",
    about = "Sort Spotify liked songs into yearly playlists and prune unwanted artists",
    long_about = None
)]
struct Cli {
    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    /// Abort the run after this many minutes
    #[arg(
        long,
        global = true,
        env = "LIKED_SORTER_TIMEOUT_MINS",
        default_value_t = RUN_TIMEOUT.as_secs() / 60
    )]
    timeout_mins: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the variables may come from the shell.
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    // RUST_LOG, when set, takes precedence over --verbose.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();

    if args.verbose {
        println!("🔍 Verbose mode enabled");
    }

    let cancel = CancellationState::with_timeout(Duration::from_secs(args.timeout_mins * 60));
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n🛑 Interrupted, stopping after the current request...");
            on_interrupt.cancel();
        }
    });

    if let Err(e) = execute_command(args.command, &cancel).await {
        eprintln!("❌ Command failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}

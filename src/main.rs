mod cli;

use clap::Parser;
use cli::{Cli, Command};
use hotkeys::ManagerOptions;
use hotkeys::run::{self, ReplayConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            script,
            binds,
            groups,
            no_once,
            no_prevent_default,
            report,
        } => {
            let config = ReplayConfig {
                script,
                binds,
                groups,
                options: ManagerOptions {
                    once: !no_once,
                    prevent_default: !no_prevent_default,
                },
                report,
            };
            if let Err(e) = run::replay(config).await {
                tracing::error!(error = %e, "replay failed");
                eprintln!("hotkeys replay: {e}");
                std::process::exit(1);
            }
        }
        Command::Check { binds } => {
            if let Err(e) = run::check(&binds, ManagerOptions::default()) {
                tracing::error!(error = %e, "check failed");
                eprintln!("hotkeys check: {e}");
                std::process::exit(1);
            }
        }
        Command::Dump { path } => {
            if let Err(e) = run::dump(&path).await {
                tracing::error!(error = %e, "dump failed");
                eprintln!("hotkeys dump: {e}");
                std::process::exit(1);
            }
        }
    }
}

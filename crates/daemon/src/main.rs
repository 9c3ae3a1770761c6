use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lakemount_daemon::cli::ops::{Mount, Umount};
use lakemount_daemon::cli::{Op, OpContext};
use lakemount_daemon::MOUNT_SERVER_ADDR;

#[derive(Parser, Debug)]
#[command(
    name = "lakemount",
    version,
    about = "Mount remote lakeFS paths as local read-only directories"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mount a remote path to a local directory
    Mount(Mount),
    /// Unmount a path
    Umount(Umount),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = OpContext {
        server_addr: MOUNT_SERVER_ADDR.to_string(),
    };

    let result = match cli.command {
        Command::Mount(op) => op.execute(&ctx).await.map_err(|err| err.to_string()),
        Command::Umount(op) => op.execute(&ctx).await.map_err(|err| err.to_string()),
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    }
}

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nix_go::cli::{Cli, Dispatcher};
use nix_go::config::Settings;
use nix_go::db::Database;
use nix_go::launcher::SystemLauncher;

/// Initialize tracing on stderr so stdout carries only command output
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "nix_go=warn",
        1 => "nix_go=info",
        _ => "nix_go=debug",
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load().context("Failed to load settings")?;
    let db = Database::open_default(&settings).with_context(|| {
        format!(
            "Failed to open database at {}",
            settings.database_path.display()
        )
    })?;
    db.migrate().context("Failed to migrate database")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut dispatcher = Dispatcher::new(&db, &settings.launch, SystemLauncher);
    dispatcher.execute(cli.command, &mut out)?;

    Ok(())
}

use std::io::IsTerminal;

use clap::Parser;
use devbox_init::app_context::AppContext;
use devbox_init_config::{cli::Cli, env::StartupEnv};
use miette::{Context, IntoDiagnostic};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    let env = StartupEnv::from_process();

    let ctx = AppContext::bootstrap(cli, &env)?;

    let rt = Runtime::new()
        .into_diagnostic()
        .wrap_err("Failed to build Tokio runtime")?;
    rt.block_on(ctx.run())?;

    tracing::info!("Startup configuration complete");
    Ok(())
}

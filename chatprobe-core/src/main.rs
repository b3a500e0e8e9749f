use chatprobe_core::{config, console, CompletionError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the console line; logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("chatprobe {}", chatprobe_core::version());

    let outcome = match config::load() {
        Ok(config) => chatprobe_core::run(&config).await,
        Err(err) => Err(CompletionError::from(err)),
    };

    let stdout = std::io::stdout();
    console::write_outcome(&mut stdout.lock(), &outcome)?;

    Ok(())
}

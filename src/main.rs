use clap::Parser;
use mepie_finance_api::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up DATABASE_URL, FINANCE_EDIT_PASSWORD, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = mepie_finance_api::cli::run(cli).await {
        tracing::error!("{e:?}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

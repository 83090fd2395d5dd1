use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    llmchess::core::logging::init();

    cli::run(cli::Cli::parse()).await
}

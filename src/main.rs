use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = redis_exporter::cli::Cli::parse();
    if let Err(e) = redis_exporter::cmd::dispatch(cli).await {
        tracing::error!(error = %e, "redis_exporter failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

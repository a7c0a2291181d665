use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = lightrelay::cli::Cli::parse();
    if let Err(e) = lightrelay::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

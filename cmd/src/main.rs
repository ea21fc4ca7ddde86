use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

#[derive(Debug, Parser)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:5080")]
    listen: SocketAddr,
    /// Directory of JSON sample files to seed the store with
    #[arg(long)]
    samples_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let store = pv_monitor::create_store(cli.samples_dir.as_ref()).await?;
    pv_monitor::http::server(cli.listen, store).await
}

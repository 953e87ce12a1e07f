use clap::Parser;

use endpoint_sentinel::cmd::{run_notify, Cli};
use endpoint_sentinel::log::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_notify(&cli).await?;
    Ok(())
}

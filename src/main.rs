use anyhow::Result;
use cospec_push::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}

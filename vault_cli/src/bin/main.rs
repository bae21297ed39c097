use anyhow::Result;
use clap::Parser;
use vault_cli::app::VaultApp;

#[tokio::main]
async fn main() -> Result<()> {
    let app = VaultApp::parse();

    app.run().await?;

    Ok(())
}

use anyhow::Result;
use censo_validator::lsp::server::serve;

#[tokio::main]
async fn main() -> Result<()> {
    serve().await
}

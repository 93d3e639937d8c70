use anyhow::Result;

use benchjudge::app;

#[tokio::main]
async fn main() -> Result<()> {
    app::main().await
}

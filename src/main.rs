use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    spot_search::run().await
}

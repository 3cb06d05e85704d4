#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tokenrelay::cli::run().await
}

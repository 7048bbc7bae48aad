#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wordmatch_backend::run().await
}

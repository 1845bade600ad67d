#[tokio::main]
async fn main() -> anyhow::Result<()> {
    promptdesk_server::start().await
}

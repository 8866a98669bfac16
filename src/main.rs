#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Content Hub: music content server");
    content_hub::run_server().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = proofread_rust::run().await {
        eprintln!("proofread-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

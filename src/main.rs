#[tokio::main]
async fn main() {
    if let Err(e) = quizzet_translator::run().await {
        tracing::error!(error = %e, "quizzet-translator failed");
        eprintln!("quizzet-translator: {e}");
        std::process::exit(1);
    }
}

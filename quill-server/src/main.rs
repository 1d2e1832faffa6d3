use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = quill_server::build(quill_server::config_from_env()).await?;
    let addr = app.addr();

    tracing::info!(%addr, backend = %app.config.get_or("blob.backend", "memory"), "quill listening");

    app.listen(addr).await?;

    Ok(())
}

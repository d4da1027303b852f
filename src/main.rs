use youtube_downloader_lib::config::ServiceConfig;
use youtube_downloader_lib::{logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = ServiceConfig::from_env()?;
    server::serve(config).await
}

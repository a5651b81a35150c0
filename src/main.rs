use std::sync::Arc;

use anyhow::Context;
use backend::Gemini;
use clap::Parser;
use config::Config;
use story::StoryTeller;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod backend;
mod client;
mod config;
mod protocol;
mod server;
mod session;
mod story;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // connect tracing to stdout, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::parse();

    let mut gemini = Gemini::new(&config.api_key, &config.model, config.request_timeout())
        .context("failed to create the gemini client")?;
    if let Some(base_url) = &config.base_url {
        gemini = gemini.with_base_url(base_url);
    }
    tracing::debug!("using backend: {:?}", gemini);

    let teller = StoryTeller::new(Arc::new(gemini));

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to listen on {}", config.listen))?;
    tracing::info!(
        max_turns = config.max_turns,
        model = %config.model,
        "server listening on: {}",
        listener.local_addr()?
    );

    server::serve(listener, teller, config.max_turns, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for the shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    })
    .await;

    Ok(())
}

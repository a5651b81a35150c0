use std::future::Future;

use tokio::net::TcpListener;
use tracing::Instrument;

use crate::{client, story::StoryTeller};

/// Accepts clients until `shutdown` resolves
///
/// every client gets its own task and its own session,
/// connections that are still open on shutdown are left to finish on their own.
pub async fn serve(
    listener: TcpListener,
    teller: StoryTeller,
    max_turns: u32,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        let (conn, addr) = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutting down, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!("failed to accept a connection: {}", err);
                    continue;
                }
            },
        };

        let teller = teller.clone();
        let span = tracing::info_span!("connection", peer = %addr);
        tokio::spawn(
            async move {
                tracing::info!("client connected");
                match client::handle(conn, teller, max_turns).await {
                    Ok(()) => tracing::info!("client disconnected"),
                    Err(err) => tracing::warn!(kind = "transport", "connection dropped: {}", err),
                }
            }
            .instrument(span),
        );
    }
}

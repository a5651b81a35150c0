use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    protocol::{Connection, ConnectionErr, Request, Response},
    session::{Phase, Session},
    story::StoryTeller,
};

/// Serves a single client until it leaves
///
/// only transport errors end the connection early, every other error
/// is reported to the client and the connection stays usable.
pub async fn handle<S>(
    stream: S,
    teller: StoryTeller,
    max_turns: u32,
) -> Result<(), ConnectionErr>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut conn = Connection::new(stream);
    let mut session = Session::new(teller.clone(), max_turns);

    while let Some(request) = conn.read_request().await? {
        let request = match request {
            Ok(request) => request,
            Err(reason) => {
                tracing::warn!(kind = "malformed_request", "rejected request: {}", reason);
                conn.send_response(&Response::error(reason.to_string()))
                    .await?;
                continue;
            }
        };

        tracing::debug!("received request: {}", request);

        let result = match request {
            Request::Exit => {
                tracing::debug!("the client asked to leave");
                break;
            }
            Request::Init { genre, setting } => {
                // a story that reached its ending is replaced by a brand new one
                if session.phase() == Phase::Ended {
                    tracing::info!("starting a new story");
                    session = Session::new(teller.clone(), max_turns);
                }

                session.init(&genre, &setting).await
            }
            Request::Continue { genre, text } => session.advance(&genre, &text).await,
            Request::End { genre } => session.conclude(&genre).await,
            Request::Suggest => session.suggest().await,
        };

        let response = match result {
            Ok(content) => Response::ok(content),
            Err(reason) => {
                tracing::warn!(kind = reason.kind(), "request failed: {}", reason);
                Response::error(reason.to_string())
            }
        };

        tracing::debug!(
            phase = ?session.phase(),
            genre = ?session.genre(),
            turns_remaining = session.turns_remaining(),
            "responded: {}",
            response
        );
        conn.send_response(&response).await?;
    }

    session.end();
    tracing::debug!(
        context_len = session.context().len(),
        "session ended with the connection"
    );

    Ok(())
}

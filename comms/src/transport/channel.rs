use anyhow::Context;
use futures_util::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::header::AUTHORIZATION, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};

use crate::{command::ClientCommand, event::ServerEvent};

use super::common::BoxedStream;

/// [EventStream] is a stream of [crate::event::ServerEvent]s pushed by the server.
///
/// Ends when the server closes the channel. Non-text frames are skipped.
///
/// # Cancel Safety
///
/// This stream is cancel-safe, meaning that it can be used in [tokio::select]
/// without the risk of missing events.
pub type EventStream = BoxedStream<anyhow::Result<ServerEvent>>;

/// [CommandWriter] is the write half of the channel, sending
/// [crate::command::ClientCommand]s as text frames
pub struct CommandWriter {
    sink: SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>,
}

impl CommandWriter {
    /// Serialize a [crate::command::ClientCommand] into a single frame and send it
    ///
    /// # Cancel Safety
    ///
    /// This method is not cancellation safe. If it is used as the event
    /// in a [tokio::select!] statement and some other branch completes
    /// first, the frame may have been queued without being flushed.
    pub async fn write(&mut self, command: &ClientCommand) -> anyhow::Result<()> {
        let serialized = serde_json::to_string(command)?;

        self.sink
            .send(WsMessage::Text(serialized))
            .await
            .context("could not send command over the channel")?;

        Ok(())
    }

    /// Closes the channel gracefully
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.sink
            .close()
            .await
            .context("could not close the channel")?;

        Ok(())
    }
}

/// Establishes the real-time channel and splits it into a stream of events
/// and a command writer.
///
/// # Arguments
///
/// - `ws_url` - websocket endpoint of the chat server
/// - `access_token` - bearer credential sent with the handshake
pub async fn connect(
    ws_url: &str,
    access_token: &str,
) -> anyhow::Result<(EventStream, CommandWriter)> {
    let mut request = ws_url
        .into_client_request()
        .context("invalid channel url")?;
    request.headers_mut().insert(
        AUTHORIZATION,
        format!("Bearer {}", access_token)
            .parse()
            .context("access token is not a valid header value")?,
    );

    let (stream, _) = connect_async(request)
        .await
        .context("could not establish the channel connection")?;
    tracing::debug!(url = ws_url, "channel established");

    let (sink, stream) = stream.split();

    let events: EventStream = Box::pin(stream.filter_map(|maybe_message| async move {
        match maybe_message {
            Ok(WsMessage::Text(text)) => Some(
                serde_json::from_str::<ServerEvent>(&text)
                    .context("failed to deserialize event from the server"),
            ),
            Ok(_) => None,
            Err(err) => Some(Err(
                anyhow::Error::from(err).context("could not read from the channel")
            )),
        }
    }));

    Ok((events, CommandWriter { sink }))
}

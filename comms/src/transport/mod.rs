#[cfg(feature = "client")]
mod common;

/// Real-time channel over a websocket connection
#[cfg(feature = "client")]
pub mod channel;
/// HTTP request/response client for the chat API
#[cfg(feature = "client")]
pub mod http;

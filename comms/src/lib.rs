/// Data model shared with the remote chat API
pub mod types;
/// Set of commands which can be emitted over the real-time channel
pub mod command;
/// Set of events pushed by the server over the real-time channel
pub mod event;
/// HTTP request/response client and real-time channel transport.
/// Requires the 'client' feature and will bring in reqwest and tokio-tungstenite alongside other dependencies
pub mod transport;

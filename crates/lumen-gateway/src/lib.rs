//! HTTP gateway: chat, document add/delete/lookup and health endpoints.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use server::GatewayServer;

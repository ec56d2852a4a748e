mod client_message;
mod codec;
mod error;
mod server_message;

pub use client_message::ClientMessage;
pub use error::MessageError;
pub use server_message::ServerMessage;

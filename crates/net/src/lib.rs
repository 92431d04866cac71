//! Line-oriented TCP/Telnet transport. Owns
//! option negotiation, IAC filtering, and backspace/DEL line editing; the
//! engine crate never touches raw bytes, only [`transport::LineTransport`].

pub mod tcp;
pub mod telnet;
pub mod transport;

pub use tcp::{listen, TcpSession};
pub use transport::LineTransport;

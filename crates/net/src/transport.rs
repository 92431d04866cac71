use async_trait::async_trait;
use moor_mud_common::MudResult;
use std::time::Duration;

/// The line-oriented duplex session abstraction the core engine consumes
///. The wire framing (Telnet option
/// negotiation, ANSI rendering) is an explicit non-goal of the core itself
///; this trait is the seam. `moor-mud-net` is the one concrete
/// implementation shipped in this workspace.
#[async_trait]
pub trait LineTransport: Send {
    /// Reads one line, waiting up to `timeout`. `Ok(None)` means the peer
    /// closed the connection *or* the read timed out — the engine's game
    /// loop treats both as "no input" and continues, distinguishing them only via
    /// `is_closed`.
    async fn read_line(&mut self, timeout: Duration) -> MudResult<Option<String>>;

    /// Enqueues a line for delivery; best-effort.
    async fn write_line(&mut self, text: &str) -> MudResult<()>;

    /// Asserts WILL ECHO so the client suppresses local echo during
    /// password entry.
    async fn disable_echo(&mut self) -> MudResult<()>;

    /// Restores WONT ECHO after password entry.
    async fn enable_echo(&mut self) -> MudResult<()>;

    /// Idempotent; closes the underlying connection.
    async fn close(&mut self, reason: &str) -> MudResult<()>;

    /// True once the peer has disconnected (as opposed to a read timeout).
    fn is_closed(&self) -> bool;
}

use crate::telnet::{self, TelnetCodec};
use crate::transport::LineTransport;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use moor_mud_common::{MudError, MudResult};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

/// The concrete TCP/Telnet implementation of [`LineTransport`]. Option
/// negotiation happens once up front; `disable_echo`/`enable_echo` toggle
/// WILL/WONT ECHO around password entry.
pub struct TcpSession {
    framed: Framed<TcpStream, TelnetCodec>,
    closed: bool,
}

impl TcpSession {
    pub async fn accept(stream: TcpStream) -> MudResult<Self> {
        stream
            .set_nodelay(true)
            .map_err(|e| MudError::Transient(e.to_string()))?;
        let mut framed = Framed::new(stream, TelnetCodec::new());
        framed
            .get_mut()
            .try_write(&telnet::initial_negotiation())
            .map_err(|e| MudError::Transient(e.to_string()))?;
        let _ = &mut framed;
        Ok(Self {
                framed,
                closed: false,
        })
    }
}

#[async_trait]
impl LineTransport for TcpSession {
    async fn read_line(&mut self, timeout: Duration) -> MudResult<Option<String>> {
        match tokio::time::timeout(timeout, self.framed.next()).await {
            Ok(Some(Ok(line))) => Ok(Some(line)),
            Ok(Some(Err(e))) => {
                self.closed = true;
                Err(MudError::Transient(e.to_string()))
            }
            Ok(None) => {
                self.closed = true;
                Ok(None)
            }
            Err(_elapsed) => Ok(None),
        }
    }

    async fn write_line(&mut self, text: &str) -> MudResult<()> {
        if self.closed {
            return Ok(());
        }
        if self.framed.send(text.to_string()).await.is_err() {
            self.closed = true;
        }
        Ok(())
    }

    async fn disable_echo(&mut self) -> MudResult<()> {
        let _ = self.framed.get_mut().try_write(&telnet::will_echo());
        Ok(())
    }

    async fn enable_echo(&mut self) -> MudResult<()> {
        let _ = self.framed.get_mut().try_write(&telnet::wont_echo());
        Ok(())
    }

    async fn close(&mut self, _reason: &str) -> MudResult<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Accepts connections on `addr` and invokes `on_connect` with each new
/// transport on its own task. This is the sole listener task in
/// §5's task inventory; everything past the transport handoff is the
/// engine crate's concern.
pub async fn listen<F, Fut>(addr: std::net::SocketAddr, on_connect: F) -> MudResult<()>
where
F: Fn(TcpSession, std::net::SocketAddr) -> Fut + Send + Sync + 'static,
Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MudError::Fatal(format!("bind {addr} failed: {e}")))?;
    tracing::info!(%addr, "listening for telnet connections");
    let on_connect = std::sync::Arc::new(on_connect);
    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| MudError::Transient(e.to_string()))?;
        tracing::info!(%peer, "accepted connection");
        let session = match TcpSession::accept(stream).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(%peer, error = %e, "failed to negotiate telnet session");
                continue;
            }
        };
        let on_connect = on_connect.clone();
        tokio::spawn(async move {
                on_connect(session, peer).await;
        });
    }
}

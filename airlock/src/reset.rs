use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// A one-shot pulse line. Any byte received on `reset_listen` arms the
/// pulse; the cycle loop consumes it (and clears it) on the next tick so
/// `rst_lock` is asserted for exactly one cycle.
#[derive(Clone, Default)]
pub struct ResetLine(Arc<AtomicBool>);

impl ResetLine {
    /// Consume the pulse, returning whether it had been armed.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }

    fn arm(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

pub async fn run(addr: SocketAddr, line: ResetLine) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(?addr, "reset listener bound");

    loop {
        let (mut stream, peer) = listener.accept().await?;
        let line = line.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) if n > 0 => line.arm(),
                    Ok(_) => {}
                    Err(e) => {
                        warn!(%peer, error = %e, "reset listener: read error");
                        break;
                    }
                }
            }
        });
    }
}

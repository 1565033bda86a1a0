use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// A control line sampled once per cycle. Any byte received on
/// `heartbeat_listen` flips the line; the watchdog's edge detector (not
/// this listener) decides whether that counts as a reload.
#[derive(Clone, Default)]
pub struct HeartbeatLine(Arc<AtomicBool>);

impl HeartbeatLine {
    pub fn sample(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn flip(&self) {
        self.0.fetch_xor(true, Ordering::Relaxed);
    }
}

pub async fn run(addr: SocketAddr, line: HeartbeatLine) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(?addr, "heartbeat listener bound");

    loop {
        let (mut stream, peer) = listener.accept().await?;
        let line = line.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        for _ in 0..n {
                            line.flip();
                        }
                    }
                    Err(e) => {
                        warn!(%peer, error = %e, "heartbeat listener: read error");
                        break;
                    }
                }
            }
        });
    }
}

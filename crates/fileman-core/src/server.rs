use std::net::SocketAddr;

use anyhow::{Context, Result};
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::ops::OpsHandler;
use crate::protocol::Message;

/// Handle to send messages back to a connected client. Replies are
/// funneled through a channel to the connection's writer task, so
/// handlers never touch the socket directly.
#[derive(Clone)]
pub struct ConnectionHandle {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }

    pub async fn send_message(&self, msg: &Message) -> Result<()> {
        self.tx
            .send(msg.encode())
            .await
            .map_err(|_| anyhow::anyhow!("connection channel closed"))
    }
}

/// TCP server for the directory operation protocol. One spawned task
/// per client; clients may pipeline requests and match replies by
/// request_id.
pub struct FileServer {
    listener: TcpListener,
    handler: OpsHandler,
}

impl FileServer {
    pub async fn bind(addr: &str, handler: OpsHandler) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        Ok(Self { listener, handler })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept clients until the task is cancelled or the listener fails.
    pub async fn run(self) -> Result<()> {
        info!("listening on {}", self.listener.local_addr()?);

        loop {
            let (stream, peer) = self.listener.accept().await.context("accept failed")?;
            info!("client connected: {}", peer);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                match serve_client(stream, handler).await {
                    Ok(()) => info!("client {} disconnected", peer),
                    Err(e) => warn!("client {} dropped: {:#}", peer, e),
                }
            });
        }
    }
}

async fn serve_client(stream: TcpStream, handler: OpsHandler) -> Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
    let handle = ConnectionHandle::new(tx);

    let write_task = tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if let Err(e) = writer.write_all(&data).await {
                warn!("write failed: {}", e);
                break;
            }
        }
    });

    let mut read_buf = BytesMut::with_capacity(8 * 1024);

    loop {
        let n = reader
            .read_buf(&mut read_buf)
            .await
            .context("read failed")?;
        if n == 0 {
            break;
        }

        // Decode all complete messages from the buffer
        loop {
            match Message::decode(&read_buf) {
                Ok(Some((msg, consumed))) => {
                    read_buf.advance(consumed);
                    handler.handle_message(msg, &handle).await;
                }
                Ok(None) => break, // need more data
                Err(e) => {
                    error!("protocol decode error: {}", e);
                    anyhow::bail!("protocol decode error: {}", e);
                }
            }
        }
    }

    drop(handle);
    let _ = write_task.await;
    Ok(())
}

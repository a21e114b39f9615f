use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::ProxyError;

use super::{LoopExit, BUF_SIZE, IDLE_TIMEOUT, MAX_EMPTY_READS};

enum Side {
    Client(std::io::Result<usize>),
    Upstream(std::io::Result<usize>),
}

/// Classic bidirectional pump: read from whichever side is ready, write the
/// full read length to the other side (`write_all`, so short writes loop
/// internally). An empty read (EOF) is retried up to [`MAX_EMPTY_READS`]
/// times before the loop gives up on that side.
pub async fn copy_loop(client: &mut TcpStream, upstream: &mut TcpStream) -> Result<LoopExit, ProxyError> {
    let mut client_buf = [0u8; BUF_SIZE];
    let mut upstream_buf = [0u8; BUF_SIZE];
    let mut client_empty_reads = 0u32;
    let mut upstream_empty_reads = 0u32;

    loop {
        let side = tokio::time::timeout(IDLE_TIMEOUT, async {
            tokio::select! {
                r = client.read(&mut client_buf) => Side::Client(r),
                r = upstream.read(&mut upstream_buf) => Side::Upstream(r),
            }
        })
        .await
        .map_err(|_| ProxyError::IdleTimeout)?;

        match side {
            Side::Client(Ok(0)) => {
                client_empty_reads += 1;
                if client_empty_reads >= MAX_EMPTY_READS {
                    return Ok(LoopExit::Closed);
                }
            }
            Side::Client(Ok(n)) => {
                client_empty_reads = 0;
                upstream.write_all(&client_buf[..n]).await?;
            }
            Side::Client(Err(e)) => return Err(ProxyError::Io(e)),
            Side::Upstream(Ok(0)) => {
                upstream_empty_reads += 1;
                if upstream_empty_reads >= MAX_EMPTY_READS {
                    return Ok(LoopExit::Closed);
                }
            }
            Side::Upstream(Ok(n)) => {
                upstream_empty_reads = 0;
                client.write_all(&upstream_buf[..n]).await?;
            }
            Side::Upstream(Err(e)) => return Err(ProxyError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt as _;
    use tokio::net::TcpListener;

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = TcpStream::connect(addr);
        let accept = listener.accept();
        let (a, b) = tokio::join!(connect, accept);
        let (b, _) = b.unwrap();
        (a.unwrap(), b)
    }

    #[tokio::test]
    async fn forwards_bytes_both_directions() {
        let (mut client_side, mut client) = connected_pair().await;
        let (mut upstream_side, mut upstream) = connected_pair().await;

        let relay = tokio::spawn(async move { copy_loop(&mut client, &mut upstream).await });

        client_side.write_all(b"hello upstream").await.unwrap();
        let mut buf = [0u8; 32];
        let n = upstream_side.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello upstream");

        upstream_side.write_all(b"hello client").await.unwrap();
        let n = client_side.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello client");

        drop(client_side);
        drop(upstream_side);
        let exit = relay.await.unwrap().unwrap();
        assert_eq!(exit, LoopExit::Closed);
    }
}

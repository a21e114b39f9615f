use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::ProxyError;
use crate::scheduler::{Phase, Scheduler};
use crate::stratum::{classify, StratumKind};

use super::{LoopExit, BUF_SIZE, IDLE_TIMEOUT, MAX_EMPTY_READS};

enum Side {
    Client(std::io::Result<usize>),
    Upstream(std::io::Result<usize>),
}

/// As [`super::copy_loop`], but additionally classifies every server→client
/// frame: on a `NOTIFY`, the scheduler's per-phase counter is incremented,
/// and once the flip threshold is reached this returns [`LoopExit::Redial`]
/// so the driver can tear the connection down and re-dial the other pool.
pub async fn copy_loop_switching(
    client: &mut TcpStream,
    upstream: &mut TcpStream,
    scheduler: &Scheduler,
    phase: Phase,
) -> Result<LoopExit, ProxyError> {
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
                if classify(&upstream_buf[..n]).contains(StratumKind::NOTIFY)
                    && scheduler.record_notify_and_maybe_flip(phase)
                {
                    return Ok(LoopExit::Redial);
                }
            }
            Side::Upstream(Err(e)) => return Err(ProxyError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn scheduler() -> Scheduler {
        Scheduler::new("venus.worker".to_string(), "venus.pool".to_string(), 1)
    }

    #[tokio::test]
    async fn six_notify_frames_trigger_redial() {
        let (mut client_side, mut client) = connected_pair().await;
        let (mut upstream_side, mut upstream) = connected_pair().await;
        let scheduler = scheduler();

        let relay = tokio::spawn({
            let notify_line = br#"{"id":null,"method":"mining.notify","params":[]}"#.to_vec();
            async move {
                for _ in 0..6 {
                    upstream_side.write_all(&notify_line).await.unwrap();
                    let mut buf = [0u8; 256];
                    let _ = client_side.read(&mut buf).await.unwrap();
                }
            }
        });

        let exit = copy_loop_switching(&mut client, &mut upstream, &scheduler, Phase::Real)
            .await
            .unwrap();
        assert_eq!(exit, LoopExit::Redial);
        assert_eq!(scheduler.phase(), Phase::Venus);
        relay.await.unwrap();
    }
}

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::ProxyError;
use crate::scheduler::{Phase, Scheduler};
use crate::stratum::{classify, extract_id, replace_id, rewrite_first_param, templates, StratumKind};
use crate::util::bytes::slice_between;

use super::{LoopExit, BUF_SIZE, IDLE_TIMEOUT};

enum Side {
    Client(std::io::Result<usize>),
    Upstream(std::io::Result<usize>),
}

/// The full three-way rewriter used once venus steering is active: classifies
/// every frame and, depending on direction and kind, either replays cached
/// handshake state back to the client, rewrites the worker name before
/// forwarding upstream, or just caches and forwards. See the relay table in
/// the design notes for the exact per-kind action.
///
/// Unlike the plain and switching loops, a zero-length read from either side
/// closes the session immediately rather than tolerating a handful of empty
/// reads — matching the upstream rewriter, which treats any short read on
/// the MITM path as the peer hanging up.
pub async fn copy_loop_mitm(
    client: &mut TcpStream,
    upstream: &mut TcpStream,
    scheduler: &Scheduler,
    phase: Phase,
) -> Result<LoopExit, ProxyError> {
    let mut client_buf = [0u8; BUF_SIZE];
    let mut upstream_buf = [0u8; BUF_SIZE];

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
            Side::Client(Ok(0)) => return Ok(LoopExit::Closed),
            Side::Client(Ok(n)) => {
                handle_client_frame(&client_buf[..n], client, upstream, scheduler, phase).await?;
            }
            Side::Client(Err(e)) => return Err(ProxyError::Io(e)),
            Side::Upstream(Ok(0)) => return Ok(LoopExit::Closed),
            Side::Upstream(Ok(n)) => {
                let redial =
                    handle_upstream_frame(&upstream_buf[..n], client, scheduler, phase).await?;
                if redial {
                    return Ok(LoopExit::Redial);
                }
            }
            Side::Upstream(Err(e)) => return Err(ProxyError::Io(e)),
        }
    }
}

async fn handle_client_frame(
    chunk: &[u8],
    client: &mut TcpStream,
    upstream: &mut TcpStream,
    scheduler: &Scheduler,
    phase: Phase,
) -> Result<(), ProxyError> {
    let kind = classify(chunk);
    let text = String::from_utf8_lossy(chunk);

    if kind.contains(StratumKind::SUBSCRIBE) {
        match scheduler.subscribe_reply(phase) {
            Some(cached) => {
                let id = extract_id(&text).unwrap_or("null");
                let reply = replace_id(&cached, id);
                client.write_all(reply.as_bytes()).await?;
            }
            None => upstream.write_all(chunk).await?,
        }
    } else if kind.contains(StratumKind::AUTH) {
        match scheduler.difficulty(phase) {
            Some(difficulty) => {
                let id = extract_id(&text).unwrap_or("null");
                let ack = format!("{}\n", templates::result_true(id));
                client.write_all(ack.as_bytes()).await?;
                let diff_frame = format!("{}\n", templates::set_difficulty(&difficulty));
                client.write_all(diff_frame.as_bytes()).await?;
                if let Some(notify) = scheduler.notify(phase) {
                    client.write_all(notify.as_bytes()).await?;
                }
            }
            None if phase == Phase::Venus => {
                let rewritten = rewrite_first_param(&text, &scheduler.venus_worker_name);
                upstream.write_all(rewritten.as_bytes()).await?;
            }
            None => upstream.write_all(chunk).await?,
        }
    } else if kind.contains(StratumKind::SUBMIT) {
        if phase == Phase::Venus {
            let rewritten = rewrite_first_param(&text, &scheduler.venus_worker_name);
            upstream.write_all(rewritten.as_bytes()).await?;
        } else {
            upstream.write_all(chunk).await?;
        }
    } else {
        upstream.write_all(chunk).await?;
    }
    Ok(())
}

/// Returns `true` when the scheduler just flipped phase and the caller
/// should exit the loop with [`LoopExit::Redial`].
async fn handle_upstream_frame(
    chunk: &[u8],
    client: &mut TcpStream,
    scheduler: &Scheduler,
    phase: Phase,
) -> Result<bool, ProxyError> {
    let kind = classify(chunk);
    let text = String::from_utf8_lossy(chunk);

    if kind == StratumKind::INIT_SUBSCRIBE {
        scheduler.cache_subscribe_reply(phase, &text);
    } else if kind.contains(StratumKind::SET_DIFFICULTY) {
        if let Some(params) = slice_between(&text, "\"params\":[", "]") {
            scheduler.cache_difficulty(phase, params);
        }
    } else if kind.contains(StratumKind::NOTIFY) {
        scheduler.cache_notify(phase, &text);
    }

    client.write_all(chunk).await?;

    if kind.contains(StratumKind::NOTIFY) && scheduler.record_notify_and_maybe_flip(phase) {
        return Ok(true);
    }
    Ok(false)
}

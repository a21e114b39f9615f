//! Per-connection driver (component G): glues SOCKS5 negotiation to the
//! dial guard and the relay loops. One instance of [`handle_connection`]
//! runs per accepted client, inside its own tokio task.

use std::net::SocketAddr;

use log::{debug, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::relay::{copy_loop_mitm, copy_loop_switching, LoopExit};
use crate::scheduler::{Phase, Scheduler};
use crate::socks5::dial::dial;
use crate::socks5::negotiation::{parse_connect_request, parse_method_select, parse_user_pass};
use crate::socks5::{connect_reply, method_reply, userpass_reply, AuthIpCache, AuthMethod, ReplyCode};

const MAX_FRAME: usize = 512;

/// Runs the full lifetime of one accepted client: negotiation, dial, relay,
/// cleanup. Never panics or propagates an error past itself — failures are
/// logged and the connection is simply dropped.
pub async fn handle_connection(
    mut client: TcpStream,
    peer: SocketAddr,
    config: &ProxyConfig,
    scheduler: &Scheduler,
    auth_cache: &AuthIpCache,
) {
    if let Err(e) = run_connection(&mut client, peer, config, scheduler, auth_cache).await {
        warn!(target: "stratum_socks_proxy", "connection from {peer} ended: {e}");
    }
}

async fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>, ProxyError> {
    let mut buf = [0u8; MAX_FRAME];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Err(ProxyError::PeerClosed);
    }
    Ok(buf[..n].to_vec())
}

async fn run_connection(
    client: &mut TcpStream,
    peer: SocketAddr,
    config: &ProxyConfig,
    scheduler: &Scheduler,
    auth_cache: &AuthIpCache,
) -> Result<(), ProxyError> {
    let frame = read_frame(client).await?;
    let methods = parse_method_select(&frame)?;

    let creds_configured = config.credentials.is_some();
    let peer_is_cached = auth_cache.contains(peer.ip());
    let method = crate::socks5::negotiation::select_method(methods, creds_configured, peer_is_cached);
    client.write_all(&method_reply(method)).await?;

    if method == AuthMethod::Invalid {
        debug!(target: "stratum_socks_proxy", "{peer} offered no acceptable auth method");
        return Ok(());
    }

    if method == AuthMethod::UsernamePassword {
        let frame = read_frame(client).await?;
        let (user, pass) = parse_user_pass(&frame)?;
        let creds = config
            .credentials
            .as_ref()
            .expect("username/password method selected without configured credentials");
        let success = user == creds.user.as_str() && pass == creds.pass.as_str();
        client.write_all(&userpass_reply(success)).await?;
        if !success {
            debug!(target: "stratum_socks_proxy", "{peer} failed username/password auth");
            return Ok(());
        }
        if config.auth_once {
            auth_cache.insert(peer.ip());
        }
    }

    let frame = read_frame(client).await?;
    let connect_req = match parse_connect_request(&frame) {
        Ok(req) => req,
        Err(e) => {
            let _ = client.write_all(&connect_reply(e.reply_code())).await;
            return Err(e);
        }
    };
    let bind_ip = config.bind_outgoing.then_some(config.listen_ip);

    let mut mitm_active = false;
    let mut first_dial = true;
    loop {
        let dial_result = {
            let _guard = scheduler.acquire_dial_guard().await;
            let phase = scheduler.phase();
            let (host, port, is_venus) = match phase {
                Phase::Venus => (
                    scheduler.venus_pool_host.clone(),
                    scheduler.venus_pool_port,
                    true,
                ),
                Phase::Real => (connect_req.host.clone(), connect_req.port, false),
            };
            dial(&host, port, bind_ip).await.map(|stream| (stream, phase, is_venus))
        };

        let (mut upstream, phase, is_venus) = match dial_result {
            Ok(v) => v,
            Err(e) => {
                if first_dial {
                    let _ = client.write_all(&connect_reply(e.reply_code())).await;
                }
                return Err(e);
            }
        };
        mitm_active = mitm_active || is_venus;

        // Only the first successful dial gets a CONNECT reply; a later
        // redial (on phase flip) must stay invisible to the client, which
        // is already mid-session and reading raw Stratum frames.
        if first_dial {
            client.write_all(&connect_reply(ReplyCode::Success)).await?;
            first_dial = false;
        }

        let exit = if mitm_active {
            copy_loop_mitm(client, &mut upstream, scheduler, phase).await?
        } else {
            copy_loop_switching(client, &mut upstream, scheduler, phase).await?
        };

        match exit {
            LoopExit::Closed => return Ok(()),
            LoopExit::Redial => continue,
        }
    }
}

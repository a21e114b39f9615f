//! Accept loop and per-connection task registry (component J).

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ProxyConfig;
use crate::driver::handle_connection;
use crate::scheduler::Scheduler;
use crate::socks5::AuthIpCache;

/// Backoff applied after a spawn/bind hiccup, mirroring the source's
/// sleep-and-retry around transient accept failures.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(200);

/// Binds the listener and runs the accept loop forever, spawning one task
/// per accepted connection and sweeping finished handles out of the
/// registry between accepts — the async analogue of the source's reaper
/// thread joining finished worker threads.
pub async fn run(config: ProxyConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind((config.listen_ip, config.port)).await?;
    info!(target: "stratum_socks_proxy", "listening on {}", listener.local_addr()?);

    let config = Arc::new(config);
    let scheduler = Arc::new(Scheduler::new(
        config.venus_worker_name.clone(),
        config.venus_pool_host.clone(),
        config.venus_pool_port,
    ));
    let auth_cache = Arc::new(AuthIpCache::new());
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    loop {
        tasks.retain(|handle| !handle.is_finished());

        match listener.accept().await {
            Ok((socket, peer)) => {
                let config = Arc::clone(&config);
                let scheduler = Arc::clone(&scheduler);
                let auth_cache = Arc::clone(&auth_cache);
                let handle = tokio::spawn(async move {
                    handle_connection(socket, peer, &config, &scheduler, &auth_cache).await;
                });
                tasks.push(handle);
            }
            Err(e) => {
                error!(target: "stratum_socks_proxy", "accept failed: {e}");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }
}

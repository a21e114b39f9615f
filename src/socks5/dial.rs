use std::io::ErrorKind;
use std::net::IpAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::ProxyError;
use crate::net::{bind::bind_outgoing, resolve::resolve};

/// 6-second send-side connect timeout, mirroring the source's
/// `SO_SNDTIMEO` of 6 seconds around the blocking `connect()` call.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(6);

/// Resolves `host:port`, optionally binds the outbound socket's source
/// address to `bind_ip`, and connects with a 6-second timeout. Maps every
/// failure onto the [`ProxyError`] variant whose `reply_code()` matches the
/// SOCKS5 error table of the negotiation spec.
pub async fn dial(host: &str, port: u16, bind_ip: Option<IpAddr>) -> Result<TcpStream, ProxyError> {
    let addrs = resolve(host, port)
        .await
        .map_err(|e| ProxyError::ResolveFailed(e.to_string()))?;

    let mut last_err = None;
    for addr in addrs {
        let connect_fut = async {
            let socket = match bind_ip {
                Some(ip) => bind_outgoing(addr, ip)?,
                None => match addr {
                    std::net::SocketAddr::V4(_) => tokio::net::TcpSocket::new_v4()?,
                    std::net::SocketAddr::V6(_) => tokio::net::TcpSocket::new_v6()?,
                },
            };
            socket.connect(addr).await
        };

        match timeout(CONNECT_TIMEOUT, connect_fut).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => last_err = Some(map_io_error(e)),
            Err(_) => last_err = Some(ProxyError::DialTimeout),
        }
    }

    Err(last_err.unwrap_or(ProxyError::ResolveFailed(host.to_string())))
}

fn map_io_error(err: std::io::Error) -> ProxyError {
    match err.kind() {
        ErrorKind::ConnectionRefused => ProxyError::DialRefused,
        ErrorKind::HostUnreachable => ProxyError::DialHostUnreachable,
        ErrorKind::NetworkUnreachable | ErrorKind::NetworkDown => ProxyError::DialNetworkUnreachable,
        ErrorKind::TimedOut => ProxyError::DialTimeout,
        _ => ProxyError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn dial_connects_to_reachable_target() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let stream = dial("127.0.0.1", addr.port(), None).await;
        assert!(stream.is_ok());
    }

    #[tokio::test]
    async fn dial_maps_refused_connection() {
        // Bind a listener then immediately drop it to free the port while
        // keeping the refusal deterministic on loopback.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = dial("127.0.0.1", addr.port(), None).await;
        assert!(matches!(result, Err(ProxyError::DialRefused)));
    }

    #[test]
    fn map_io_error_keeps_host_and_network_unreachable_distinct() {
        assert!(matches!(
            map_io_error(std::io::Error::from(ErrorKind::HostUnreachable)),
            ProxyError::DialHostUnreachable
        ));
        assert!(matches!(
            map_io_error(std::io::Error::from(ErrorKind::NetworkUnreachable)),
            ProxyError::DialNetworkUnreachable
        ));
        assert!(matches!(
            map_io_error(std::io::Error::from(ErrorKind::NetworkDown)),
            ProxyError::DialNetworkUnreachable
        ));
    }
}

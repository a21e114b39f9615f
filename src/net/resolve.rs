use std::net::SocketAddr;

/// Thin wrapper around the async resolver, named to match the distilled
/// spec's `resolve(name, port) -> addrinfo` interface. Kept as a single
/// call site so the dialer has one seam to reason about; name resolution
/// itself is ordinary I/O plumbing with no Stratum/SOCKS5 semantics.
pub async fn resolve(host: &str, port: u16) -> std::io::Result<Vec<SocketAddr>> {
    let addrs = tokio::net::lookup_host((host, port)).await?.collect::<Vec<_>>();
    if addrs.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no addresses found for {host}:{port}"),
        ));
    }
    Ok(addrs)
}

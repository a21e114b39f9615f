use std::net::{IpAddr, SocketAddr};

use socket2::{Domain, Socket, Type};
use tokio::net::TcpSocket;

/// Binds an outbound socket's source address to `ip` before it connects,
/// used only when `-b`/`--bind-outgoing` is set. `target` picks the address
/// family (v4/v6) so the bound socket matches the address it is about to
/// connect to.
pub fn bind_outgoing(target: SocketAddr, ip: IpAddr) -> std::io::Result<TcpSocket> {
    let domain = match target {
        SocketAddr::V4(_) => Domain::IPV4,
        SocketAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.set_nonblocking(true)?;
    socket.bind(&SocketAddr::new(ip, 0).into())?;
    Ok(TcpSocket::from_std_stream(socket.into()))
}

use thiserror::Error;

use crate::socks5::ReplyCode;

/// Errors surfaced while negotiating SOCKS5 or relaying a Stratum session.
///
/// Every per-connection task terminates on its first `ProxyError`; none of
/// these ever unwind into a panic, since the driver logs and drops the
/// connection instead of propagating the error further.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("malformed SOCKS5 request")]
    MalformedRequest,

    #[error("unsupported SOCKS5 command")]
    UnsupportedMethod,

    #[error("unsupported SOCKS5 address type")]
    UnsupportedAddrType,

    #[error("SOCKS5 authentication failed")]
    AuthFailed,

    #[error("failed to resolve upstream host: {0}")]
    ResolveFailed(String),

    #[error("upstream refused the connection")]
    DialRefused,

    #[error("upstream host unreachable")]
    DialHostUnreachable,

    #[error("upstream network unreachable")]
    DialNetworkUnreachable,

    #[error("upstream connect timed out")]
    DialTimeout,

    #[error("connection idle for too long")]
    IdleTimeout,

    #[error("peer closed the connection")]
    PeerClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    /// Maps a negotiation/dial failure onto the SOCKS5 reply code that
    /// should be sent back to the client before the connection is closed.
    pub fn reply_code(&self) -> ReplyCode {
        match self {
            ProxyError::MalformedRequest => ReplyCode::GeneralFailure,
            ProxyError::UnsupportedMethod => ReplyCode::CommandNotSupported,
            ProxyError::UnsupportedAddrType => ReplyCode::AddressTypeNotSupported,
            ProxyError::AuthFailed => ReplyCode::NotAllowed,
            ProxyError::ResolveFailed(_) => ReplyCode::GeneralFailure,
            ProxyError::DialRefused => ReplyCode::ConnectionRefused,
            ProxyError::DialHostUnreachable => ReplyCode::HostUnreachable,
            ProxyError::DialNetworkUnreachable => ReplyCode::NetworkUnreachable,
            ProxyError::DialTimeout => ReplyCode::GeneralFailure,
            ProxyError::IdleTimeout => ReplyCode::TtlExpired,
            ProxyError::PeerClosed => ReplyCode::GeneralFailure,
            ProxyError::Io(_) => ReplyCode::GeneralFailure,
        }
    }
}

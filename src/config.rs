//! CLI argument parsing and validation (component H). `Cli` is the raw
//! `clap`-derived surface; [`Cli::into_config`] validates the credential
//! flags and produces the immutable [`ProxyConfig`] the rest of the crate
//! runs on.

use std::net::IpAddr;

use clap::Parser;
use thiserror::Error;
use zeroize::Zeroizing;

/// Default upstream the scheduler steers connections to while in the venus
/// phase. Overridable for tests via [`ProxyConfig::with_venus_pool`].
pub const DEFAULT_VENUS_POOL_HOST: &str = "cn.stratum.slushpool.com";
pub const DEFAULT_VENUS_POOL_PORT: u16 = 443;
pub const DEFAULT_VENUS_WORKER_NAME: &str = "venus.worker";

#[derive(Parser, Debug)]
#[command(
    name = "stratum-socks-proxy",
    about = "A transparent SOCKS5 proxy with Stratum mining protocol relay"
)]
pub struct Cli {
    /// Listen address.
    #[arg(short = 'i', long = "listen-ip", default_value = "0.0.0.0")]
    pub listen_ip: IpAddr,

    /// Listen port.
    #[arg(short = 'p', long = "port", default_value_t = 1080)]
    pub port: u16,

    /// Username for SOCKS5 username/password authentication.
    #[arg(short = 'u', long = "user")]
    pub user: Option<String>,

    /// Password for SOCKS5 username/password authentication.
    #[arg(short = 'P', long = "pass")]
    pub pass: Option<String>,

    /// Whitelist a peer's address after its first successful auth, so later
    /// connections from it skip subnegotiation entirely.
    #[arg(short = '1', long = "auth-once")]
    pub auth_once: bool,

    /// Bind outbound sockets to `listen_ip` before connecting upstream.
    #[arg(short = 'b', long = "bind-outgoing")]
    pub bind_outgoing: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--user and --pass must be supplied together")]
    IncompleteCredentials,
    #[error("--auth-once requires --user and --pass")]
    AuthOnceNeedsCredentials,
}

/// Username/password pair, zeroized on drop — the closest safe-Rust
/// analogue to scrubbing argv in place, since `std::env::args` only ever
/// yields owned copies rather than a view into the original buffer.
pub struct Credentials {
    pub user: Zeroizing<String>,
    pub pass: Zeroizing<String>,
}

/// Fully validated, immutable configuration the rest of the crate runs on.
pub struct ProxyConfig {
    pub listen_ip: IpAddr,
    pub port: u16,
    pub credentials: Option<Credentials>,
    pub auth_once: bool,
    pub bind_outgoing: bool,
    pub venus_pool_host: String,
    pub venus_pool_port: u16,
    pub venus_worker_name: String,
}

impl Cli {
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let credentials = match (self.user, self.pass) {
            (Some(user), Some(pass)) => Some(Credentials {
                user: Zeroizing::new(user),
                pass: Zeroizing::new(pass),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteCredentials),
        };

        if self.auth_once && credentials.is_none() {
            return Err(ConfigError::AuthOnceNeedsCredentials);
        }

        Ok(ProxyConfig {
            listen_ip: self.listen_ip,
            port: self.port,
            credentials,
            auth_once: self.auth_once,
            bind_outgoing: self.bind_outgoing,
            venus_pool_host: DEFAULT_VENUS_POOL_HOST.to_string(),
            venus_pool_port: DEFAULT_VENUS_POOL_PORT,
            venus_worker_name: DEFAULT_VENUS_WORKER_NAME.to_string(),
        })
    }
}

impl ProxyConfig {
    /// Overrides the venus pool target and worker name, used by tests to
    /// point the scheduler at a local fake pool instead of the hardcoded
    /// default.
    pub fn with_venus_pool(mut self, host: impl Into<String>, port: u16, worker_name: impl Into<String>) -> Self {
        self.venus_pool_host = host.into();
        self.venus_pool_port = port;
        self.venus_worker_name = worker_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            listen_ip: "0.0.0.0".parse().unwrap(),
            port: 1080,
            user: None,
            pass: None,
            auth_once: false,
            bind_outgoing: false,
        }
    }

    #[test]
    fn no_credentials_is_valid() {
        let config = base_cli().into_config().unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn matched_credentials_are_valid() {
        let mut cli = base_cli();
        cli.user = Some("alice".to_string());
        cli.pass = Some("secret".to_string());
        let config = cli.into_config().unwrap();
        assert!(config.credentials.is_some());
    }

    #[test]
    fn user_without_pass_is_rejected() {
        let mut cli = base_cli();
        cli.user = Some("alice".to_string());
        assert!(matches!(
            cli.into_config(),
            Err(ConfigError::IncompleteCredentials)
        ));
    }

    #[test]
    fn auth_once_without_credentials_is_rejected() {
        let mut cli = base_cli();
        cli.auth_once = true;
        assert!(matches!(
            cli.into_config(),
            Err(ConfigError::AuthOnceNeedsCredentials)
        ));
    }

    #[test]
    fn auth_once_with_credentials_is_valid() {
        let mut cli = base_cli();
        cli.user = Some("alice".to_string());
        cli.pass = Some("secret".to_string());
        cli.auth_once = true;
        assert!(cli.into_config().is_ok());
    }

    #[test]
    fn venus_pool_override_replaces_defaults() {
        let config = base_cli()
            .into_config()
            .unwrap()
            .with_venus_pool("127.0.0.1", 9001, "test.worker");
        assert_eq!(config.venus_pool_host, "127.0.0.1");
        assert_eq!(config.venus_pool_port, 9001);
        assert_eq!(config.venus_worker_name, "test.worker");
    }
}

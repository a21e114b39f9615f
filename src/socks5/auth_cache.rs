use std::net::IpAddr;
use std::sync::Mutex;

/// Process-wide set of peer addresses that have already completed a
/// successful username/password authentication under "auth-once" mode.
///
/// Equality ignores the port, matching RFC 1928's notion of a "client" as
/// an address rather than an address+port pair. Entries are never pruned —
/// the cache grows for the lifetime of the process, mirroring the source's
/// unbounded `sblist`.
#[derive(Default)]
pub struct AuthIpCache {
    ips: Mutex<Vec<IpAddr>>,
}

impl AuthIpCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, peer: IpAddr) -> bool {
        let ips = self.ips.lock().expect("auth-ip cache mutex poisoned");
        ips.contains(&peer)
    }

    pub fn insert(&self, peer: IpAddr) {
        let mut ips = self.ips.lock().expect("auth-ip cache mutex poisoned");
        if !ips.contains(&peer) {
            ips.push(peer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cache_contains_nothing() {
        let cache = AuthIpCache::new();
        assert!(!cache.contains("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn insert_then_contains() {
        let cache = AuthIpCache::new();
        let addr = "10.0.0.5".parse().unwrap();
        cache.insert(addr);
        assert!(cache.contains(addr));
    }

    #[test]
    fn insert_is_idempotent() {
        let cache = AuthIpCache::new();
        let addr: IpAddr = "10.0.0.5".parse().unwrap();
        cache.insert(addr);
        cache.insert(addr);
        assert!(cache.contains(addr));
    }

    #[test]
    fn distinct_addresses_do_not_collide() {
        let cache = AuthIpCache::new();
        cache.insert("10.0.0.1".parse().unwrap());
        assert!(!cache.contains("10.0.0.2".parse().unwrap()));
    }

    #[test]
    fn ipv4_and_ipv6_are_distinct() {
        let cache = AuthIpCache::new();
        cache.insert("10.0.0.1".parse().unwrap());
        assert!(!cache.contains("::ffff:10.0.0.1".parse().unwrap()));
    }
}

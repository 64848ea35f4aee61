use std::net::ToSocketAddrs;

use confsync_core::SyncError;
use rand::Rng;

/// Picks one of the resolved addresses. Injectable so tests can force a
/// deterministic choice.
pub trait AddressSelector {
    fn pick(&self, len: usize) -> usize;
}

/// Uniform random selection, spreading load across service replicas.
pub struct RandomSelector;

impl AddressSelector for RandomSelector {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the given index (clamped); for tests.
pub struct FixedSelector(pub usize);

impl AddressSelector for FixedSelector {
    fn pick(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

/// Resolve `host` and build the base URL for one chosen address.
///
/// Lookup failure or an empty address set is fatal for the run; there is no
/// retry at this stage. `SocketAddr` display keeps IPv6 addresses bracketed.
pub fn resolve(host: &str, port: u16, selector: &dyn AddressSelector) -> Result<String, SyncError> {
    let addrs: Vec<_> = (host, port)
        .to_socket_addrs()
        .map_err(|e| SyncError::Resolution { host: host.to_string(), reason: e.to_string() })?
        .collect();
    if addrs.is_empty() {
        return Err(SyncError::Resolution {
            host: host.to_string(),
            reason: "lookup returned no addresses".to_string(),
        });
    }
    let addr = addrs[selector.pick(addrs.len())];
    Ok(format!("http://{addr}/"))
}

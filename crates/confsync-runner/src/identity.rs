use std::net::UdpSocket;

use anyhow::{Context, Result};
use confsync_core::NodeId;

use crate::config::Config;

/// Identity sent with every generation request: the configured asset code when
/// present, otherwise the address of a non-loopback interface.
pub fn node_identity(cfg: &Config) -> Result<NodeId> {
    if let Some(id) = &cfg.node.id {
        return Ok(NodeId::new(id.clone()));
    }
    let addr = outbound_address()
        .context("deriving node identity from a local address; set [node] id to override")?;
    Ok(NodeId::new(addr))
}

/// Connecting a UDP socket makes the kernel pick the outbound interface; no
/// packet is sent.
fn outbound_address() -> Result<String> {
    let sock = UdpSocket::bind(("0.0.0.0", 0))?;
    sock.connect(("8.8.8.8", 53))?;
    Ok(sock.local_addr()?.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_id(id: Option<&str>) -> Config {
        let mut cfg: Config = toml::from_str(
            r#"
            [server]
            host = "h"
            [paths]
            local_tarballs = "/tmp/t"
            active_pointer = "/tmp/a"
            "#,
        )
        .unwrap();
        cfg.node.id = id.map(str::to_string);
        cfg
    }

    #[test]
    fn configured_asset_code_wins() {
        let cfg = config_with_id(Some("rack4-node17"));
        assert_eq!(node_identity(&cfg).unwrap().as_str(), "rack4-node17");
    }
}

//! Turning a domain or address argument into the address written to the hosts file.

use crate::error::{QhError, Result};
use std::net::{IpAddr, ToSocketAddrs};

/// Resolves the `<address>` argument of `add`/`tmp` to an address literal.
pub trait Resolve {
    fn resolve(&self, target: &str) -> Result<String>;
}

/// Resolver backed by the platform's name service.
///
/// - `localhost` maps to `127.0.0.1` without a lookup.
/// - IP literals are returned in canonical form.
/// - Empty or whitespace-containing targets fail without a lookup.
/// - Anything else is looked up and the first IPv4 address wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, target: &str) -> Result<String> {
        if let Some(address) = literal_address(target) {
            return Ok(address);
        }
        if target.is_empty() || target.contains(char::is_whitespace) {
            return Err(QhError::Resolution {
                target: target.to_string(),
                reason: "not a hostname".to_string(),
            });
        }

        tracing::debug!(query = %target, "Looking up address");
        let addrs = (target, 0)
            .to_socket_addrs()
            .map_err(|e| QhError::Resolution {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        addrs
            .map(|sa| sa.ip())
            .find(IpAddr::is_ipv4)
            .map(|ip| ip.to_string())
            .ok_or_else(|| QhError::Resolution {
                target: target.to_string(),
                reason: "no A record found".to_string(),
            })
    }
}

/// Handles the inputs that never need a lookup.
pub(crate) fn literal_address(target: &str) -> Option<String> {
    if target.eq_ignore_ascii_case("localhost") {
        return Some("127.0.0.1".to_string());
    }
    target.parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_is_loopback() {
        assert_eq!(SystemResolver.resolve("localhost").unwrap(), "127.0.0.1");
        assert_eq!(SystemResolver.resolve("LOCALHOST").unwrap(), "127.0.0.1");
    }

    #[test]
    fn ip_literals_pass_through() {
        assert_eq!(SystemResolver.resolve("10.1.2.3").unwrap(), "10.1.2.3");
        assert_eq!(SystemResolver.resolve("::1").unwrap(), "::1");
    }

    #[test]
    fn non_literals_need_lookup() {
        assert_eq!(literal_address("example.test"), None);
        assert_eq!(literal_address("999.0.0.1"), None);
    }

    #[test]
    fn malformed_target_fails_without_lookup() {
        for target in ["", "not a host", "tab\there"] {
            let err = SystemResolver.resolve(target).unwrap_err();
            assert!(matches!(err, QhError::Resolution { .. }), "{target:?}");
        }
    }
}

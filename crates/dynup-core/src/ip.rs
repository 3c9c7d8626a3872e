//! IP address literal validators.

use std::net::{Ipv4Addr, Ipv6Addr};

/// True iff `s` is a dotted-quad IPv4 literal with each octet in 0-255.
pub fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

/// True iff `s` is an IPv6 literal, ignoring an optional `%zone` suffix.
pub fn is_ipv6(s: &str) -> bool {
    // A leading '%' is not a zone separator
    let host = match s.find('%') {
        Some(idx) if idx > 0 => &s[..idx],
        _ => s,
    };
    host.parse::<Ipv6Addr>().is_ok()
}

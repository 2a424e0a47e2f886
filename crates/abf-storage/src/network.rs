//! Parsing and normalisation of network literals.
//!
//! A bare IPv4/IPv6 address is accepted as /32 or /128 respectively; CIDR
//! strings are parsed to their network form. Ported from the reference
//! implementation's `bwliststorage.ParseIPNet` / `api.parseIPNet`.

use std::net::IpAddr;
use std::str::FromStr;

use ipnetwork::IpNetwork;

use abf_core::AbfError;

/// Parse a CIDR string (`"10.0.0.0/8"`) or a bare IP (`"1.2.3.4"`,
/// normalised to `/32`; or an IPv6 literal, normalised to `/128`).
pub fn parse_network(s: &str) -> Result<IpNetwork, AbfError> {
    if let Ok(net) = IpNetwork::from_str(s) {
        return Ok(net);
    }

    match IpAddr::from_str(s) {
        Ok(ip) => Ok(IpNetwork::from(ip)),
        Err(_) => Err(AbfError::InvalidArgument(format!(
            "\"{s}\" is not a valid IP address or CIDR network"
        ))),
    }
}

/// Parse a bare IP literal (used by `Auth`/`Reset`, which never accept CIDR).
pub fn parse_ip(s: &str) -> Result<IpAddr, AbfError> {
    IpAddr::from_str(s).map_err(|_| AbfError::InvalidArgument(format!("\"{s}\" is not a valid IP address")))
}

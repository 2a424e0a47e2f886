use abf_storage::network::{parse_ip, parse_network};

#[test]
fn bare_ipv4_normalises_to_slash_32() {
    let net = parse_network("1.2.3.4").unwrap();
    assert_eq!(net.prefix(), 32);
    assert_eq!(net.to_string(), "1.2.3.4/32");
}

#[test]
fn bare_ipv6_normalises_to_slash_128() {
    let net = parse_network("::1").unwrap();
    assert_eq!(net.prefix(), 128);
}

#[test]
fn cidr_parses_as_network() {
    let net = parse_network("10.0.0.0/8").unwrap();
    assert_eq!(net.prefix(), 8);
    assert!(net.contains("10.5.5.5".parse().unwrap()));
}

#[test]
fn malformed_network_is_rejected() {
    assert!(parse_network("not-an-ip").is_err());
    assert!(parse_network("10.0.0.0/99").is_err());
}

#[test]
fn parse_ip_rejects_cidr() {
    assert!(parse_ip("10.0.0.0/8").is_err());
    assert!(parse_ip("10.0.0.5").is_ok());
}

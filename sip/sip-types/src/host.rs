//! [HostPort] and [Host] type found in SIP URIs

use crate::parse::{IResult, Parse};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::AsChar;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, u8};
use nom::combinator::{map, map_res, opt, recognize, verify};
use nom::multi::many0;
use nom::sequence::{delimited, preceded, tuple};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Either IP address or FQDN
#[derive(Debug, Clone)]
pub enum Host {
    IP6(Ipv6Addr),
    IP4(Ipv4Addr),
    Name(BytesStr),
}

impl PartialEq for Host {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Host::IP6(a), Host::IP6(b)) => a == b,
            (Host::IP4(a), Host::IP4(b)) => a == b,
            // hostnames compare case-insensitive (RFC3261 Section 19.1.4)
            (Host::Name(a), Host::Name(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl Eq for Host {}

impl Host {
    /// Returns the hostname or the printed ip-address
    pub fn to_realm(&self) -> BytesStr {
        match self {
            Host::Name(name) => name.clone(),
            ip => BytesStr::from(ip.to_string()),
        }
    }
}

impl Parse for Host {
    fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| {
            alt((
                map_res(ip6_reference, |ip6| ip6.parse().map(Self::IP6)),
                map_res(ip4_address, |ip4| ip4.parse().map(Self::IP4)),
                map(hostname, |hostname| {
                    Self::Name(BytesStr::from_parse(src, hostname))
                }),
            ))(i)
        }
    }
}
impl_from_str!(Host);

/// IPv4address =  1*3DIGIT "." 1*3DIGIT "." 1*3DIGIT "." 1*3DIGIT
fn ip4_address(i: &str) -> IResult<&str, &str> {
    recognize(tuple((u8, char('.'), u8, char('.'), u8, char('.'), u8)))(i)
}

/// IPv6reference  =  "[" IPv6address "]"
fn ip6_reference(i: &str) -> IResult<&str, &str> {
    delimited(
        char('['),
        take_while1(|c: char| c.is_hex_digit() || matches!(c, ':' | '.')),
        char(']'),
    )(i)
}

/// Relaxed hostname parsing, the SIP ABNF is stricter than what DNS allows today.
fn hostname(i: &str) -> IResult<&str, &str> {
    recognize(tuple((
        label,
        many0(tuple((char('.'), label))),
        opt(char('.')),
    )))(i)
}

fn label(i: &str) -> IResult<&str, &str> {
    verify(
        take_while1(|c: char| c.is_alphanum() || c == '-'),
        |label: &str| !(label.starts_with('-') || label.ends_with('-')),
    )(i)
}

impl From<IpAddr> for Host {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(addr) => Host::IP4(addr),
            IpAddr::V6(addr) => Host::IP6(addr),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::IP6(addr) => write!(f, "[{}]", addr),
            Host::IP4(addr) => write!(f, "{}", addr),
            Host::Name(name) => f.write_str(name),
        }
    }
}

/// Contains [Host] paired with an optional port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    pub host: Host,
    pub port: Option<u16>,
}

impl HostPort {
    /// Creates a new host-port from a hostname
    pub fn host_name<S: Into<BytesStr>>(name: S) -> HostPort {
        HostPort {
            host: Host::Name(name.into()),
            port: None,
        }
    }
}

impl Parse for HostPort {
    fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| {
            map(
                tuple((
                    Host::parse(src),
                    opt(preceded(
                        tag(":"),
                        map_res(take_while1(char::is_dec_digit), str::parse::<u16>),
                    )),
                )),
                |(host, port)| HostPort { host, port },
            )(i)
        }
    }
}
impl_from_str!(HostPort);

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)?;

        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[track_caller]
    fn expect_hostname(i: &'static str) {
        let got = HostPort::from_str(i).unwrap();
        assert_eq!(got, HostPort::host_name(i));
    }

    #[test]
    fn host() {
        expect_hostname("drachtio.org");
        expect_hostname("example.org.");
        expect_hostname("123.123.123.321");

        let got = HostPort::from_str("127.0.0.1:5060").unwrap();
        assert_eq!(got.host, Host::IP4(Ipv4Addr::LOCALHOST));
        assert_eq!(got.port, Some(5060));

        let got = HostPort::from_str("[::1]").unwrap();
        assert_eq!(got.host, Host::IP6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn hostname_case_insensitive() {
        assert_eq!(
            Host::from_str("Drachtio.ORG").unwrap(),
            Host::from_str("drachtio.org").unwrap()
        );
    }
}

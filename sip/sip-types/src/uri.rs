//! SIP URI as found in the request-line, the digest `uri` parameter and `From` / `To` headers

use crate::host::HostPort;
use crate::parse::{IResult, Parse, parse_quoted, whitespace};
use crate::print::{AppendCtx, Print, PrintCtx, UriContext};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::{tag, tag_no_case, take_while, take_while1};
use nom::combinator::{map, opt};
use nom::multi::many0;
use nom::sequence::{delimited, preceded, terminated, tuple};
use nom::branch::alt;
use percent_encoding::percent_decode_str;
use std::fmt;

/// A single `;name[=value]` URI parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriParam {
    pub name: BytesStr,
    pub value: Option<BytesStr>,
}

#[derive(Clone)]
pub struct SipUri {
    pub sips: bool,
    pub user: Option<BytesStr>,
    pub host_port: HostPort,
    pub params: Vec<UriParam>,
    /// Everything after `?`, kept verbatim
    pub headers: Option<BytesStr>,
}

impl SipUri {
    pub fn new(host_port: HostPort) -> Self {
        SipUri {
            sips: false,
            user: None,
            host_port,
            params: Vec::new(),
            headers: None,
        }
    }

    pub fn user(mut self, user: BytesStr) -> Self {
        self.user = Some(user);
        self
    }

    /// Returns the value of the URI parameter `name`
    pub fn param(&self, name: &str) -> Option<&UriParam> {
        self.params
            .iter()
            .find(|param| param.name.eq_ignore_ascii_case(name))
    }

    /// Compare two URIs ignoring parameters.
    ///
    /// The user part is compared after percent-decoding, the host case-insensitive.
    pub fn compare(&self, other: &Self) -> bool {
        fn decoded(user: &Option<BytesStr>) -> Option<String> {
            user.as_ref()
                .map(|user| percent_decode_str(user).decode_utf8_lossy().into_owned())
        }

        self.sips == other.sips
            && decoded(&self.user) == decoded(&other.user)
            && self.host_port == other.host_port
    }
}

impl Parse for SipUri {
    fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| {
            map(
                tuple((
                    alt((
                        map(tag_no_case("sips:"), |_| true),
                        map(tag_no_case("sip:"), |_| false),
                    )),
                    opt(terminated(take_while1(user_char), tag("@"))),
                    HostPort::parse(src),
                    many0(preceded(
                        tag(";"),
                        tuple((
                            take_while1(param_char),
                            opt(preceded(tag("="), take_while(param_char))),
                        )),
                    )),
                    opt(preceded(tag("?"), take_while1(|c| !is_uri_end(c)))),
                )),
                |(sips, user, host_port, params, headers)| SipUri {
                    sips,
                    user: user.map(|user| BytesStr::from_parse(src, user)),
                    host_port,
                    params: params
                        .into_iter()
                        .map(|(name, value)| UriParam {
                            name: BytesStr::from_parse(src, name),
                            value: value.map(|value| BytesStr::from_parse(src, value)),
                        })
                        .collect(),
                    headers: headers.map(|headers| BytesStr::from_parse(src, headers)),
                },
            )(i)
        }
    }
}
impl_from_str!(SipUri);

fn user_char(c: char) -> bool {
    !matches!(c, '@' | ';' | '?' | '>' | '"' | ',') && !is_uri_end(c)
}

fn param_char(c: char) -> bool {
    !matches!(c, ';' | '=' | '?' | '>' | '"' | ',') && !is_uri_end(c)
}

fn is_uri_end(c: char) -> bool {
    c.is_whitespace() || c == '>'
}

impl fmt::Debug for SipUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f, PrintCtx::default())
    }
}

impl Print for SipUri {
    fn print(&self, f: &mut fmt::Formatter<'_>, ctx: PrintCtx) -> fmt::Result {
        f.write_str(if self.sips { "sips:" } else { "sip:" })?;

        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }

        write!(f, "{}", self.host_port)?;

        for param in &self.params {
            write!(f, ";{}", param.name)?;

            if let Some(value) = &param.value {
                write!(f, "={}", value)?;
            }
        }

        // header params are not allowed inside the request-line
        if let (Some(headers), false) = (&self.headers, ctx.uri == Some(UriContext::ReqUri)) {
            write!(f, "?{}", headers)?;
        }

        Ok(())
    }
}

/// URI with an optional display name, `"display" <URI>` or a bare `URI`
#[derive(Debug, Clone)]
pub struct NameAddr {
    pub name: Option<BytesStr>,
    pub uri: SipUri,
}

impl NameAddr {
    pub fn uri(uri: SipUri) -> Self {
        Self { name: None, uri }
    }
}

impl Parse for NameAddr {
    fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| {
            alt((
                map(
                    tuple((
                        opt(alt((parse_quoted, take_while1(display)))),
                        take_while(whitespace),
                        delimited(tag("<"), SipUri::parse(src), tag(">")),
                    )),
                    |(name, _, uri)| Self {
                        name: name
                            .map(str::trim)
                            .filter(|name| !name.is_empty())
                            .map(|name| BytesStr::from_parse(src, name)),
                        uri,
                    },
                ),
                map(SipUri::parse(src), Self::uri),
            ))(i)
        }
    }
}
impl_from_str!(NameAddr);

impl Print for NameAddr {
    fn print(&self, f: &mut fmt::Formatter<'_>, ctx: PrintCtx) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "\"{}\" ", name)?;
        }

        write!(f, "<{}>", self.uri.print_ctx(ctx))
    }
}

fn display(c: char) -> bool {
    !matches!(c, ':' | '\r' | '\n' | '<')
}

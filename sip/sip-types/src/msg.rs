//! Contains SIP message parts and parser

use crate::code::StatusCode;
use crate::method::Method;
use crate::parse::{IResult, Parse, ParseError, token, whitespace, ws};
use crate::print::{AppendCtx, Print, PrintCtx, UriContext};
use crate::uri::SipUri;
use crate::{Headers, Name};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::char;
use nom::combinator::map;
use nom::sequence::{separated_pair, terminated, tuple};
use std::fmt;

/// Represents a header `header-name: header-value` line inside a message
pub struct Line {
    pub name: Name,
    pub value: BytesStr,
}

impl Line {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        map(
            tuple((ws(take_while1(token)), ws(char(':')), ws(|i| Ok(("", i))))),
            |(name, _, value): (&str, _, &str)| Line {
                name: BytesStr::from_parse(src, name).into(),
                value: BytesStr::from_parse(src, value.trim_end()),
            },
        )(i)
    }
}

/// The leading line of a SIP request message
#[derive(Debug, Clone)]
pub struct RequestLine {
    pub method: Method,
    pub uri: SipUri,
}

impl Print for RequestLine {
    fn print(&self, f: &mut fmt::Formatter<'_>, _: PrintCtx) -> fmt::Result {
        let ctx = PrintCtx {
            uri: Some(UriContext::ReqUri),
        };

        write!(f, "{} {} SIP/2.0", self.method, self.uri.print_ctx(ctx))
    }
}

impl Parse for RequestLine {
    fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| {
            map(
                separated_pair(
                    Method::parse(src),
                    take_while(whitespace),
                    terminated(
                        SipUri::parse(src),
                        tuple((take_while(whitespace), tag("SIP/2.0"))),
                    ),
                ),
                |(method, uri)| RequestLine { method, uri },
            )(i)
        }
    }
}
impl_from_str!(RequestLine);

/// The leading line of a SIP response message
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub code: StatusCode,
    pub reason: Option<BytesStr>,
}

impl StatusLine {
    /// Status line with the default reason phrase of `code`
    pub fn new(code: StatusCode) -> Self {
        StatusLine {
            code,
            reason: code.text().map(BytesStr::from_static),
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIP/2.0 {}", self.code.into_u16())?;

        if let Some(reason) = &self.reason {
            write!(f, " {}", reason)?;
        }

        Ok(())
    }
}

/// A complete SIP request
#[derive(Debug, Clone)]
pub struct Request {
    pub line: RequestLine,
    pub headers: Headers,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, uri: SipUri) -> Self {
        Request {
            line: RequestLine { method, uri },
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Parse a request from a buffer containing a complete message
    pub fn parse(src: Bytes) -> Result<Self, ParseError> {
        let (head_len, body_offset) = find_head_end(&src);

        let head = std::str::from_utf8(&src[..head_len]).map_err(|_| ParseError::Utf8)?;
        let mut lines = head.split('\n').map(|line| line.trim_end_matches('\r'));

        let first = lines
            .next()
            .ok_or_else(|| ParseError::Invalid("empty message".into()))?;

        let line = match RequestLine::parse(&src)(first.trim()) {
            Ok(("", line)) => line,
            Ok((rem, _)) => return Err(ParseError::TrailingInput(rem.into())),
            Err(e) => return Err(ParseError::Invalid(format!("request-line: {e}"))),
        };

        let mut headers = Headers::new();

        for raw in lines.filter(|line| !line.trim().is_empty()) {
            let (_, Line { name, value }) = Line::parse(&src, raw)
                .map_err(|e| ParseError::Invalid(format!("header line {raw:?}: {e}")))?;

            headers.extend([(name, value)]);
        }

        Ok(Request {
            line,
            headers,
            body: src.slice(body_offset..),
        })
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n{}", self.line.default_print_ctx(), self.headers)?;
        write_body(f, &self.headers, &self.body)
    }
}

/// A complete SIP response
#[derive(Debug, Clone)]
pub struct Response {
    pub line: StatusLine,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(code: StatusCode) -> Self {
        Response {
            line: StatusLine::new(code),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn code(&self) -> StatusCode {
        self.line.code
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n{}", self.line, self.headers)?;
        write_body(f, &self.headers, &self.body)
    }
}

fn write_body(f: &mut fmt::Formatter<'_>, headers: &Headers, body: &Bytes) -> fmt::Result {
    if !headers.contains(&Name::CONTENT_LENGTH) {
        write!(f, "Content-Length: {}\r\n", body.len())?;
    }

    f.write_str("\r\n")?;
    f.write_str(&String::from_utf8_lossy(body))
}

/// Returns the length of the message head and the offset of the body
fn find_head_end(src: &[u8]) -> (usize, usize) {
    if let Some(pos) = src.windows(4).position(|w| w == b"\r\n\r\n") {
        return (pos, pos + 4);
    }

    if let Some(pos) = src.windows(2).position(|w| w == b"\n\n") {
        return (pos, pos + 2);
    }

    (src.len(), src.len())
}

use crate::header::HeaderParse;
use crate::parse::{IResult, Parse, parse_quoted, token, ws};
use crate::print::{Print, PrintCtx, UriContext};
use crate::uri::{NameAddr, UriParam};
use anyhow::anyhow;
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::combinator::{map, opt};
use nom::multi::many0;
use nom::sequence::{preceded, tuple};
use std::fmt;

/// Value of a `From` or `To` header
#[derive(Debug, Clone)]
pub struct FromTo {
    pub uri: NameAddr,
    pub tag: Option<BytesStr>,
    /// Header parameters other than `tag`
    pub params: Vec<UriParam>,
}

impl FromTo {
    pub fn new(uri: NameAddr, tag: Option<BytesStr>) -> Self {
        Self {
            uri,
            tag,
            params: vec![],
        }
    }
}

impl HeaderParse for FromTo {
    fn parse<'i>(src: &'i Bytes, i: &'i str) -> anyhow::Result<(&'i str, Self)> {
        let (rem, (mut uri, params)) = tuple((NameAddr::parse(src), many0(header_param(src))))(i)
            .map_err(|e| anyhow!("invalid from/to header: {e}"))?;

        // parameters of a URI without angle brackets belong to the header
        let mut params = if uri.name.is_none() && !i.trim_start().starts_with('<') {
            std::mem::take(&mut uri.uri.params)
        } else {
            vec![]
        }
        .into_iter()
        .chain(params)
        .collect::<Vec<_>>();

        let tag_idx = params
            .iter()
            .position(|param| param.name.eq_ignore_ascii_case("tag"));
        let tag = tag_idx.and_then(|idx| params.remove(idx).value);

        Ok((rem, FromTo { uri, tag, params }))
    }
}

fn header_param(src: &Bytes) -> impl Fn(&str) -> IResult<&str, UriParam> + '_ {
    move |i| {
        map(
            preceded(
                ws(tag(";")),
                tuple((
                    ws(take_while1(token)),
                    opt(preceded(
                        ws(tag("=")),
                        ws(alt((parse_quoted, take_while1(token)))),
                    )),
                )),
            ),
            |(name, value)| UriParam {
                name: BytesStr::from_parse(src, name),
                value: value.map(|value| BytesStr::from_parse(src, value)),
            },
        )(i)
    }
}

impl Print for FromTo {
    fn print(&self, f: &mut fmt::Formatter<'_>, mut ctx: PrintCtx) -> fmt::Result {
        ctx.uri = Some(UriContext::Header);
        self.uri.print(f, ctx)?;

        if let Some(tag) = &self.tag {
            write!(f, ";tag={tag}")?;
        }

        for param in &self.params {
            write!(f, ";{}", param.name)?;

            if let Some(value) = &param.value {
                write!(f, "={value}")?;
            }
        }

        Ok(())
    }
}

use crate::header::name::Name;
use crate::header::{ConstNamed, HeaderParse};
use crate::method::Method;
use crate::parse::{Parse, whitespace};
use anyhow::anyhow;
use bytes::Bytes;
use nom::bytes::complete::take_while;
use nom::character::complete::digit1;
use nom::combinator::map_res;
use nom::sequence::separated_pair;
use std::fmt;
use std::str::FromStr;

/// `CSeq` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSeq {
    pub cseq: u32,
    pub method: Method,
}

impl CSeq {
    #[inline]
    pub const fn new(cseq: u32, method: Method) -> CSeq {
        CSeq { cseq, method }
    }
}

impl ConstNamed for CSeq {
    const NAME: Name = Name::CSEQ;
}

impl HeaderParse for CSeq {
    fn parse<'i>(src: &'i Bytes, i: &'i str) -> anyhow::Result<(&'i str, Self)> {
        let (rem, (cseq, method)) = separated_pair(
            map_res(digit1, u32::from_str),
            take_while(whitespace),
            Method::parse(src),
        )(i.trim())
        .map_err(|e| anyhow!("invalid CSeq {i:?}: {e}"))?;

        Ok((rem, CSeq { cseq, method }))
    }
}

impl fmt::Display for CSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.cseq, self.method)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Headers;

    const CSEQ: CSeq = CSeq {
        cseq: 123,
        method: Method::INVITE,
    };

    #[test]
    fn print_cseq() {
        let mut headers = Headers::new();
        headers.insert_named(&CSEQ);
        let headers = headers.to_string();

        assert_eq!(headers, "CSeq: 123 INVITE\r\n");
    }

    #[test]
    fn parse_cseq() {
        let mut headers = Headers::new();
        headers.insert(Name::CSEQ, "123 INVITE");

        let cseq: CSeq = headers.get_named().unwrap();
        assert_eq!(cseq, CSEQ);
    }
}

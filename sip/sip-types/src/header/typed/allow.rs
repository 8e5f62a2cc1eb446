use crate::header::name::Name;
use crate::header::{ConstNamed, HeaderParse};
use crate::method::Method;
use crate::parse::{Parse, ws};
use anyhow::anyhow;
use bytes::Bytes;
use nom::bytes::complete::tag;
use nom::multi::separated_list1;
use std::fmt;

/// `Allow` header listing every method in a single value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allow(pub Vec<Method>);

impl ConstNamed for Allow {
    const NAME: Name = Name::ALLOW;
}

impl HeaderParse for Allow {
    fn parse<'i>(src: &'i Bytes, i: &'i str) -> anyhow::Result<(&'i str, Self)> {
        let (rem, methods) = separated_list1(ws(tag(",")), ws(Method::parse(src)))(i)
            .map_err(|e| anyhow!("invalid Allow {i:?}: {e}"))?;

        Ok((rem, Self(methods)))
    }
}

impl fmt::Display for Allow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods = self.0.iter();

        if let Some(first) = methods.next() {
            write!(f, "{}", first)?;

            for method in methods {
                write!(f, ", {}", method)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Headers;

    #[test]
    fn print_allow() {
        let mut headers = Headers::new();
        headers.insert_named(&Allow(vec![Method::INVITE, Method::ACK, Method::BYE]));

        assert_eq!(headers.to_string(), "Allow: INVITE, ACK, BYE\r\n");
    }

    #[test]
    fn parse_allow() {
        let mut headers = Headers::new();
        headers.insert(Name::ALLOW, "INVITE,REGISTER , SUBSCRIBE");

        let allow: Allow = headers.get_named().unwrap();
        assert_eq!(
            allow,
            Allow(vec![Method::INVITE, Method::REGISTER, Method::SUBSCRIBE])
        );
    }
}

use crate::header::name::Name;
use crate::header::{ConstNamed, HeaderParse};
use bytes::Bytes;
use std::fmt;

/// `Expires` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expires(pub u32);

impl ConstNamed for Expires {
    const NAME: Name = Name::EXPIRES;
}

impl HeaderParse for Expires {
    fn parse<'i>(_: &'i Bytes, i: &'i str) -> anyhow::Result<(&'i str, Self)> {
        Ok(("", Self(i.trim().parse()?)))
    }
}

impl fmt::Display for Expires {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Headers;

    #[test]
    fn expires_spaces() {
        let mut headers = Headers::new();
        headers.insert(Name::EXPIRES, "   240   ");

        let expires: Expires = headers.get_named().unwrap();
        assert_eq!(expires, Expires(240));
    }

    #[test]
    fn expires_print() {
        let mut headers = Headers::new();
        headers.insert_named(&Expires(3600));

        assert_eq!(headers.to_string(), "Expires: 3600\r\n");
    }
}

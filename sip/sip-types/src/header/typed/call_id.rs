use crate::Name;
use crate::header::{ConstNamed, HeaderParse};
use bytes::Bytes;
use bytesstr::BytesStr;
use std::fmt;

/// `Call-ID` header
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallID(pub BytesStr);

impl CallID {
    pub fn new<B>(id: B) -> Self
    where
        B: Into<BytesStr>,
    {
        CallID(id.into())
    }
}

impl ConstNamed for CallID {
    const NAME: Name = Name::CALL_ID;
}

impl HeaderParse for CallID {
    fn parse<'i>(src: &'i Bytes, i: &'i str) -> anyhow::Result<(&'i str, Self)> {
        let id = i.trim();

        if id.is_empty() {
            anyhow::bail!("empty Call-ID");
        }

        Ok(("", Self(BytesStr::from_parse(src, id))))
    }
}

impl fmt::Display for CallID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Headers;

    const CALL_ID: CallID = CallID(BytesStr::from_static("SomeCallID"));

    #[test]
    fn print_call_id() {
        let mut headers = Headers::new();
        headers.insert_named(&CALL_ID);
        let headers = headers.to_string();

        assert_eq!(headers, "Call-ID: SomeCallID\r\n");
    }

    #[test]
    fn parse_call_id() {
        let mut headers = Headers::new();
        headers.insert(Name::CALL_ID, " SomeCallID ");

        let call_id: CallID = headers.get_named().unwrap();
        assert_eq!(call_id, CALL_ID);
    }

    #[test]
    fn parse_empty_call_id() {
        let mut headers = Headers::new();
        headers.insert(Name::CALL_ID, "");

        assert!(headers.get_named::<CallID>().is_err());
    }
}

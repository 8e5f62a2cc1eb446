use crate::parse::{IResult, Parse, token};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::take_while1;
use nom::combinator::map;
use std::fmt;

/// Represents a SIP-Method.
///
/// # Example
///
/// ```
/// use mockuas_sip_types::Method;
///
/// // well known methods are implemented as constants
/// let _register = Method::REGISTER;
///
/// // custom methods can be also used:
/// let custom = Method::from("HELLO");
/// assert_eq!(custom.to_string(), "HELLO");
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Method(Repr);

macro_rules! methods {
    ($($print:literal, $ident:ident;)+) => {
        #[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[allow(clippy::upper_case_acronyms)]
        enum Repr {
            $($ident,)+
            Other(BytesStr),
        }

        impl Method {
            $(pub const $ident: Self = Self(Repr::$ident);)+

            fn from_parse(src: &Bytes, slice: &str) -> Self {
                $(
                if slice.eq_ignore_ascii_case($print) {
                    return Self(Repr::$ident);
                }
                )+

                Self(Repr::Other(BytesStr::from_parse(src, slice)))
            }
        }

        impl fmt::Display for Method {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.0 {
                    $(Repr::$ident => f.write_str($print),)+
                    Repr::Other(other) => f.write_str(other),
                }
            }
        }
    };
}

methods! {
    "INVITE",    INVITE;
    "ACK",       ACK;
    "CANCEL",    CANCEL;
    "BYE",       BYE;
    "REGISTER",  REGISTER;
    "SUBSCRIBE", SUBSCRIBE;
    "NOTIFY",    NOTIFY;
    "MESSAGE",   MESSAGE;
    "OPTIONS",   OPTIONS;
}

impl Parse for Method {
    fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| map(take_while1(token), |slice| Self::from_parse(src, slice))(i)
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        let s = BytesStr::from(s);

        Self::from_parse(s.as_ref(), s.as_ref())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_method() {
        let input = BytesStr::from_static("subscribe");

        let (rem, method) = Method::parse(input.as_ref())(&input).unwrap();

        assert!(rem.is_empty());
        assert_eq!(method, Method::SUBSCRIBE);
        assert_eq!(method.to_string(), "SUBSCRIBE");
    }

    #[test]
    fn other_method() {
        let method = Method::from("PUBLISH");

        assert_eq!(method, Method(Repr::Other("PUBLISH".into())));
        assert_eq!(method.to_string(), "PUBLISH");
    }
}

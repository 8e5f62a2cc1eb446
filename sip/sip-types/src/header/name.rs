use bytesstr::BytesStr;
use std::fmt;

/// Represents a SIP-Header's name. It is used as key inside [Headers].
///
/// Names compare case-insensitive and compact forms (e.g. `i` for `Call-ID`)
/// are resolved to their full name when parsing.
///
/// [Headers]: crate::Headers
#[derive(Debug, Clone)]
pub struct Name(Repr);

impl Name {
    /// Returns a Name for a header not implemented as constant
    pub const fn unknown(name: BytesStr) -> Self {
        Self(Repr::Unknown(name))
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Unknown(a), Repr::Unknown(b)) => a.eq_ignore_ascii_case(b),
            (Repr::Unknown(name), _) => other == name.as_str(),
            (_, Repr::Unknown(name)) => self == name.as_str(),
            (a, b) => a == b,
        }
    }
}

impl Eq for Name {}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        match &self.0 {
            Repr::Unknown(name) => name.eq_ignore_ascii_case(other),
            _ => self
                .as_parse_strs()
                .iter()
                .any(|name| name.eq_ignore_ascii_case(other)),
        }
    }
}

impl<T> From<T> for Name
where
    T: Into<BytesStr> + AsRef<[u8]>,
{
    fn from(name: T) -> Self {
        Name::from_bytes(name)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_print_str())
    }
}

macro_rules! header_names {
    ($($(#[$comments:meta])* $print:literal, $ident:ident, [$($parse:literal),+], $konst:ident;)+) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        enum Repr {
            $($ident,)+
            Unknown(BytesStr),
        }

        static NAMES: &[(&str, Name)] = &[
            $($( ($parse, Name::$konst), )*)*
        ];

        impl Name {
            $(
            $(#[$comments])*
            pub const $konst: Name = Name(Repr::$ident);
            )+

            fn from_bytes(name: impl Into<BytesStr> + AsRef<[u8]>) -> Name {
                let slice: &[u8] = name.as_ref();

                for (parse, name) in NAMES {
                    if parse.as_bytes().eq_ignore_ascii_case(slice) {
                        return name.clone();
                    }
                }

                Name::unknown(name.into())
            }

            pub fn as_print_str(&self) -> &str {
                match &self.0 {
                    $(Repr::$ident => $print,)*
                    Repr::Unknown(name) => name.as_ref(),
                }
            }

            fn as_parse_strs(&self) -> &'static [&'static str] {
                match &self.0 {
                    $(Repr::$ident => &[$($parse),*],)+
                    Repr::Unknown(_) => &[],
                }
            }
        }
    };
}

header_names! {
    /// [[RFC3261, Section 20.5](https://tools.ietf.org/html/rfc3261#section-20.5)]
    "Allow",                Allow,              ["allow"],                  ALLOW;

    /// [[RFC3261, Section 20.7](https://tools.ietf.org/html/rfc3261#section-20.7)]
    "Authorization",        Authorization,      ["authorization"],          AUTHORIZATION;

    /// [[RFC3261, Section 20.8](https://tools.ietf.org/html/rfc3261#section-20.8)]
    "Call-ID",              CallID,             ["call-id", "i"],           CALL_ID;

    /// [[RFC3261, Section 20.10](https://tools.ietf.org/html/rfc3261#section-20.10)]
    "Contact",              Contact,            ["contact", "m"],           CONTACT;

    /// [[RFC3261, Section 20.14](https://tools.ietf.org/html/rfc3261#section-20.14)]
    "Content-Length",       ContentLength,      ["content-length", "l"],    CONTENT_LENGTH;

    /// [[RFC3261, Section 20.15](https://tools.ietf.org/html/rfc3261#section-20.15)]
    "Content-Type",         ContentType,        ["content-type", "c"],      CONTENT_TYPE;

    /// [[RFC3261, Section 20.16](https://tools.ietf.org/html/rfc3261#section-20.16)]
    "CSeq",                 CSeq,               ["cseq"],                   CSEQ;

    /// [[RFC6665, Section 8.2.1](https://datatracker.ietf.org/doc/html/rfc6665#section-8.2.1)]
    "Event",                Event,              ["event", "o"],             EVENT;

    /// [[RFC3261, Section 20.19](https://tools.ietf.org/html/rfc3261#section-20.19)]
    "Expires",              Expires,            ["expires"],                EXPIRES;

    /// [[RFC3261, Section 20.20](https://tools.ietf.org/html/rfc3261#section-20.20)]
    "From",                 From,               ["from", "f"],              FROM;

    /// [[RFC3261, Section 20.22](https://tools.ietf.org/html/rfc3261#section-20.22)]
    "Max-Forwards",         MaxForwards,        ["max-forwards"],           MAX_FORWARDS;

    /// [[RFC3261, Section 20.27](https://tools.ietf.org/html/rfc3261#section-20.27)]
    "Proxy-Authenticate",   ProxyAuthenticate,  ["proxy-authenticate"],     PROXY_AUTHENTICATE;

    /// [[RFC3261, Section 20.28](https://tools.ietf.org/html/rfc3261#section-20.28)]
    "Proxy-Authorization",  ProxyAuthorization, ["proxy-authorization"],    PROXY_AUTHORIZATION;

    /// [[RFC3261, Section 20.35](https://tools.ietf.org/html/rfc3261#section-20.35)]
    "Server",               Server,             ["server"],                 SERVER;

    /// [[RFC3261, Section 20.39](https://tools.ietf.org/html/rfc3261#section-20.39)]
    "To",                   To,                 ["to", "t"],                TO;

    /// [[RFC3261, Section 20.41](https://tools.ietf.org/html/rfc3261#section-20.41)]
    "User-Agent",           UserAgent,          ["user-agent"],             USER_AGENT;

    /// [[RFC3261, Section 20.42](https://tools.ietf.org/html/rfc3261#section-20.42)]
    "Via",                  Via,                ["via", "v"],               VIA;

    /// [[RFC3261, Section 20.44](https://tools.ietf.org/html/rfc3261#section-20.44)]
    "WWW-Authenticate",     WWWAuthenticate,    ["www-authenticate"],       WWW_AUTHENTICATE;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compact_and_case() {
        assert_eq!(Name::from("i"), Name::CALL_ID);
        assert_eq!(Name::from("WWW-AUTHENTICATE"), Name::WWW_AUTHENTICATE);
        assert_eq!(Name::unknown(BytesStr::from_static("Via")), Name::VIA);
        assert_eq!(Name::VIA, Name::unknown(BytesStr::from_static("v")));
        assert_ne!(Name::AUTHORIZATION, Name::PROXY_AUTHORIZATION);
        assert_eq!(
            Name::from("X-Custom"),
            Name::unknown(BytesStr::from_static("x-custom"))
        );
    }
}

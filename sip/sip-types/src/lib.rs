#![forbid(unsafe_code)]
//! SIP types used by the mock UAS authentication engine.
//!
//! Only the subset of SIP needed to authenticate requests is modelled here:
//! methods, status codes, header names, a header container, SIP URIs and the
//! typed `Authorization` / `WWW-Authenticate` family of headers.

macro_rules! impl_from_str {
    ($ty:ty) => {
        impl std::str::FromStr for $ty {
            type Err = $crate::parse::ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let src = bytes::Bytes::copy_from_slice(s.as_bytes());
                let i = std::str::from_utf8(&src).map_err(|_| $crate::parse::ParseError::Utf8)?;

                match <$ty as $crate::parse::Parse>::parse(&src)(i) {
                    Ok(("", parsed)) => Ok(parsed),
                    Ok((rem, _)) => Err($crate::parse::ParseError::TrailingInput(rem.into())),
                    Err(e) => Err($crate::parse::ParseError::Invalid(format!("{e:?}"))),
                }
            }
        }
    };
}

pub mod print;
pub mod parse;
mod code;
pub mod header;
pub mod host;
mod method;
pub mod msg;
pub mod uri;

pub use code::{CodeKind, StatusCode};
pub use method::Method;

pub use header::headers::Headers;
pub use header::name::Name;

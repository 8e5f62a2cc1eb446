//! Parsing utilities for SIP message components

use bytes::Bytes;
use nom::bytes::complete::take_while;
use nom::character::complete::char;
use nom::error::{ErrorKind, ParseError as _, VerboseError};
use nom::sequence::preceded;

pub type IResult<I, O> = nom::IResult<I, O, VerboseError<I>>;

/// Error returned by the `FromStr` implementations of parsable types
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("input is not valid UTF-8")]
    Utf8,
    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
    #[error("invalid input: {0}")]
    Invalid(String),
}

/// Types that can be parsed out of a shared source buffer.
///
/// The returned parser must only be called with slices of `src`, so that parsed
/// values can reference the buffer instead of copying.
pub trait Parse: Sized {
    fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_;
}

/// Parses a quoted string, returning the content between the quotes.
///
/// Escaped quotes (`\"`) are kept as is. An empty quoted string yields an empty slice.
pub(crate) fn parse_quoted(i: &str) -> IResult<&str, &str> {
    let (rest, _) = char('"')(i)?;

    let mut escaped = false;

    for (idx, c) in rest.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Ok((&rest[idx + 1..], &rest[..idx])),
            _ => escaped = false,
        }
    }

    Err(nom::Err::Error(VerboseError::from_error_kind(
        i,
        ErrorKind::Char,
    )))
}

pub(crate) fn whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

#[rustfmt::skip]
pub(crate) fn token(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '.' | '!' | '%' | '*' | '_' | '`' | '\'' | '~' | '+')
}

/// Skip leading whitespace before running `parser`
pub(crate) fn ws<'i, O, F>(parser: F) -> impl FnMut(&'i str) -> IResult<&'i str, O>
where
    F: FnMut(&'i str) -> IResult<&'i str, O>,
{
    preceded(take_while(whitespace), parser)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quoted() {
        assert_eq!(parse_quoted(r#""abc" rest"#).unwrap(), (" rest", "abc"));
        assert_eq!(parse_quoted(r#""""#).unwrap(), ("", ""));
        assert_eq!(
            parse_quoted(r#""a\"b", x"#).unwrap(),
            (", x", r#"a\"b"#)
        );
        assert!(parse_quoted(r#""unterminated"#).is_err());
        assert!(parse_quoted("noquote").is_err());
    }
}

//! Contains everything header related

use bytes::Bytes;
use name::Name;

mod error;
pub(crate) mod headers;
pub(crate) mod name;
pub mod typed;

pub use error::HeaderError;

/// Assign a constant header name to a type.
///
/// Is used by [`Headers`]'s `(get/insert)_named` API so no
/// name has to be provided by the caller.
///
/// [`Headers`]: crate::Headers
pub trait ConstNamed {
    const NAME: Name;
}

/// Parse a header type from a single header value.
///
/// `src` is the buffer `i` was sliced from, parsed types may reference it.
pub trait HeaderParse: Sized {
    fn parse<'i>(src: &'i Bytes, i: &'i str) -> anyhow::Result<(&'i str, Self)>;
}

use super::{ConstNamed, HeaderError, HeaderParse};
use crate::header::name::Name;
use crate::print::{AppendCtx, Print, PrintCtx};
use anyhow::Context;
use bytesstr::BytesStr;
use std::mem::take;
use std::{fmt, slice};

/// Headers is simple container for SIP-Message headers.
/// The headers are stored as [BytesStr] under its respective [Name].
///
/// Internally it is a `Vec`-backed multimap to keep insertion order
#[derive(Default, Clone)]
pub struct Headers {
    entries: Vec<Entry>,
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Headers {
    /// Returns a new empty [Headers]
    #[inline]
    pub fn new() -> Self {
        Headers {
            entries: Vec::new(),
        }
    }

    /// Returns a new empty [Headers] with the specified capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Headers {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns if a header with the given name is inside the map.
    #[inline]
    pub fn contains(&self, name: &Name) -> bool {
        self.entries.iter().any(|entry| &entry.name == name)
    }

    /// Inserts `header` under its constant name
    #[inline]
    pub fn insert_named<H: ConstNamed + Print>(&mut self, header: &H) {
        let value = header.print_ctx(PrintCtx::default()).to_string();

        self.insert_value(H::NAME, value.into())
    }

    /// Insert a header value with the given name to end of the list
    #[inline]
    pub fn insert<N, V>(&mut self, name: N, value: V)
    where
        N: Into<Name>,
        V: Print,
    {
        let value = value.print_ctx(PrintCtx::default()).to_string();

        self.insert_value(name.into(), value.into())
    }

    fn insert_value(&mut self, name: Name, value: BytesStr) {
        if let Some(Entry { values, .. }) = self.entry_mut(&name) {
            values.push(value);
        } else {
            self.entries.push(Entry {
                name,
                values: OneOrMore::One(value),
            });
        }
    }

    /// Remove all headers with the given name
    #[inline]
    pub fn remove(&mut self, name: &Name) -> Option<Vec<BytesStr>> {
        let idx = self.entries.iter().position(|entry| &entry.name == name)?;

        match self.entries.remove(idx).values {
            OneOrMore::One(v) => Some(vec![v]),
            OneOrMore::More(v) => Some(v),
        }
    }

    /// Returns a parsed header `H`.
    #[inline]
    pub fn get_named<H: ConstNamed + HeaderParse>(&self) -> Result<H, HeaderError> {
        self.get(H::NAME)
    }

    /// Returns a parsed header `H`. Returns `None` instead of an
    /// HeaderError if the header is not present.
    #[inline]
    pub fn try_get_named<H: ConstNamed + HeaderParse>(&self) -> Option<Result<H, HeaderError>> {
        self.try_get(H::NAME)
    }

    /// Returns the first value with `name` parsed as `H`.
    #[inline]
    pub fn get<H: HeaderParse>(&self, name: Name) -> Result<H, HeaderError> {
        match self.try_get(name.clone()) {
            Some(res) => res,
            None => Err(HeaderError::missing(name)),
        }
    }

    /// Returns a parsed header `H`. Returns `None` instead a HeaderError if header is not present.
    #[inline]
    pub fn try_get<H: HeaderParse>(&self, name: Name) -> Option<Result<H, HeaderError>> {
        let value = self.entry(&name)?.values.first();

        Some(
            decode_one(value)
                .map(|(_, h)| h)
                .map_err(|err| HeaderError::malformed(name, err)),
        )
    }

    /// Returns every value with `name` parsed as `H`, including comma separated ones.
    ///
    /// Returns an empty vec if no header with `name` exists.
    pub fn get_all<H: HeaderParse>(&self, name: Name) -> Result<Vec<H>, HeaderError> {
        let Some(entry) = self.entry(&name) else {
            return Ok(vec![]);
        };

        let mut parsed = vec![];

        for value in entry.values.iter() {
            decode_csv(value, &mut parsed)
                .map_err(|err| HeaderError::malformed(name.clone(), err))?;
        }

        Ok(parsed)
    }

    /// Returns the raw value of the first header with `name`
    pub fn get_raw(&self, name: &Name) -> Option<&BytesStr> {
        self.entry(name).map(|entry| entry.values.first())
    }

    /// Clones all headers with `name` into another [Headers].
    #[inline]
    pub fn clone_into(&self, dest: &mut Self, name: Name) -> Result<(), HeaderError> {
        let Entry { values, .. } = self
            .entry(&name)
            .ok_or_else(|| HeaderError::missing(name.clone()))?;

        for value in values.iter() {
            dest.insert_value(name.clone(), value.clone());
        }

        Ok(())
    }

    /// Returns an iterator over [Name] and [BytesStr] pairs in the map.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &BytesStr)> + '_ {
        self.entries
            .iter()
            .flat_map(|entry| entry.values.iter().map(move |value| (&entry.name, value)))
    }

    fn entry(&self, n: &Name) -> Option<&Entry> {
        self.entries.iter().find(|Entry { name, .. }| name == n)
    }

    fn entry_mut(&mut self, n: &Name) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|Entry { name, .. }| name == n)
    }
}

fn decode_one<H: HeaderParse>(value: &BytesStr) -> anyhow::Result<(&str, H)> {
    H::parse(value.as_ref(), value.as_str())
}

fn decode_csv<H: HeaderParse>(value: &BytesStr, out: &mut Vec<H>) -> anyhow::Result<()> {
    let mut i = value.as_str();

    loop {
        let (rem, h) = H::parse(value.as_ref(), i)?;
        out.push(h);

        let rem = rem.trim_start();

        if rem.is_empty() {
            return Ok(());
        }

        i = rem
            .strip_prefix(',')
            .with_context(|| format!("unexpected input after header value {rem:?}"))?;
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{}: {}\r\n", name.as_print_str(), value)?;
        }

        Ok(())
    }
}

impl Extend<(Name, BytesStr)> for Headers {
    fn extend<T: IntoIterator<Item = (Name, BytesStr)>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.insert_value(name, value);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    name: Name,
    values: OneOrMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OneOrMore {
    One(BytesStr),
    More(Vec<BytesStr>),
}

impl OneOrMore {
    fn push(&mut self, value: BytesStr) {
        match self {
            OneOrMore::One(existing_value) => {
                let existing_value = take(existing_value);
                *self = OneOrMore::More(vec![existing_value, value]);
            }
            OneOrMore::More(vec) => vec.push(value),
        }
    }

    fn first(&self) -> &BytesStr {
        match self {
            OneOrMore::One(value) => value,
            OneOrMore::More(values) => &values[0],
        }
    }

    fn iter(&self) -> slice::Iter<'_, BytesStr> {
        match self {
            OneOrMore::One(value) => slice::from_ref(value).iter(),
            OneOrMore::More(values) => values.iter(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::header::typed::{CSeq, CallID};
    use crate::Method;

    #[test]
    fn header_insert_twice() {
        let mut headers = Headers::new();

        headers.insert(Name::VIA, BytesStr::from_static("SIP/2.0/UDP a;branch=1"));
        headers.insert(Name::VIA, BytesStr::from_static("SIP/2.0/UDP b;branch=2"));

        assert_eq!(headers.entries.len(), 1);
        assert_eq!(
            headers.entries[0].values,
            OneOrMore::More(vec![
                BytesStr::from_static("SIP/2.0/UDP a;branch=1"),
                BytesStr::from_static("SIP/2.0/UDP b;branch=2")
            ])
        );
    }

    #[test]
    fn header_remove() {
        let mut headers = Headers::new();
        headers.insert(Name::VIA, "a");
        headers.insert(Name::VIA, "b");
        headers.insert(Name::CALL_ID, "abc");

        assert_eq!(headers.remove(&Name::VIA).unwrap().len(), 2);
        assert!(!headers.contains(&Name::VIA));
        assert!(headers.contains(&Name::CALL_ID));
        assert!(headers.remove(&Name::VIA).is_none());
    }

    #[test]
    fn header_get() {
        let mut headers = Headers::new();
        headers.insert("i", "abc123");

        let call_id: CallID = headers.get_named().unwrap();
        assert_eq!(call_id.0, "abc123");

        let err = headers.get_named::<CSeq>().unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn header_get_malformed() {
        let mut headers = Headers::new();
        headers.insert(Name::CSEQ, "abc INVITE");

        let err = headers.get_named::<CSeq>().unwrap_err();
        assert!(!err.is_missing());
    }

    #[test]
    fn header_insert_named() {
        let mut headers = Headers::new();
        headers.insert_named(&CSeq::new(2, Method::REGISTER));

        assert_eq!(headers.to_string(), "CSeq: 2 REGISTER\r\n");
    }

    #[test]
    fn header_clone_into() {
        let mut headers1 = Headers::new();
        headers1.insert(Name::VIA, "a");
        headers1.insert(Name::VIA, "b");

        let mut headers2 = Headers::new();
        headers2.insert(Name::VIA, "c");

        headers1.clone_into(&mut headers2, Name::VIA).unwrap();

        assert_eq!(
            headers2.entries[0].values,
            OneOrMore::More(vec![
                BytesStr::from_static("c"),
                BytesStr::from_static("a"),
                BytesStr::from_static("b")
            ])
        );

        assert!(
            headers1
                .clone_into(&mut headers2, Name::CALL_ID)
                .unwrap_err()
                .is_missing()
        );
    }

    #[test]
    fn header_iter() {
        let mut headers = Headers::new();
        headers.insert(Name::VIA, "SIP/2.0/UDP 192.168.123.222;branch=123abc");
        headers.insert(Name::CALL_ID, "abc123");
        headers.insert(Name::VIA, "SIP/2.0/UDP 192.168.123.223;branch=1234ab");

        let mut iter = headers.iter();

        let (name, value) = iter.next().unwrap();
        assert_eq!(name, &Name::VIA);
        assert_eq!(value, "SIP/2.0/UDP 192.168.123.222;branch=123abc");

        let (name, value) = iter.next().unwrap();
        assert_eq!(name, &Name::VIA);
        assert_eq!(value, "SIP/2.0/UDP 192.168.123.223;branch=1234ab");

        let (name, value) = iter.next().unwrap();
        assert_eq!(name, &Name::CALL_ID);
        assert_eq!(value, "abc123");

        assert!(iter.next().is_none());
    }
}

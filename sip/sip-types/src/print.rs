//! Printing utilities for SIP message components

use std::fmt;

/// Context in which an URI is being printed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UriContext {
    /// The URI is being printed inside the request-line
    ReqUri,

    /// The URI is being printed inside a header or an auth parameter
    Header,
}

/// SIP message context for printing sip types
#[derive(Default, Copy, Clone)]
pub struct PrintCtx {
    pub uri: Option<UriContext>,
}

/// Implements [`fmt::Display`] where `T` implements [`Print`] and passes its context to [`Print::print`]
///
/// Constructed using [`AppendCtx::print_ctx`].
pub struct WithPrintCtx<'a, T: ?Sized> {
    pub ctx: PrintCtx,
    inner: &'a T,
}

impl<T: Print> fmt::Display for WithPrintCtx<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Print::print(self.inner, f, self.ctx)
    }
}

/// Helper trait to wrap types that implement [`Print`] into [`WithPrintCtx`]
pub trait AppendCtx: Sized {
    fn print_ctx(&self, ctx: PrintCtx) -> WithPrintCtx<'_, Self> {
        WithPrintCtx { ctx, inner: self }
    }

    /// Wraps a type inside [`WithPrintCtx`] containing an 'empty' [`PrintCtx`].
    fn default_print_ctx(&self) -> WithPrintCtx<'_, Self> {
        self.print_ctx(PrintCtx::default())
    }
}

impl<T: Print> AppendCtx for T {}

/// Trait similar to [`fmt::Display`] with the difference that it also takes a [`PrintCtx`]
pub trait Print {
    fn print(&self, f: &mut fmt::Formatter<'_>, ctx: PrintCtx) -> fmt::Result;
}

impl<T: fmt::Display> Print for T {
    fn print(&self, f: &mut fmt::Formatter<'_>, _: PrintCtx) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

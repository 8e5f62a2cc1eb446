use crate::RequestParts;
use bytesstr::BytesStr;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// An owned dynamically typed [`Future`]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type SyncFn = dyn Fn(RequestParts<'_>) -> Option<BytesStr> + Send + Sync;
type AsyncFn =
    dyn Fn(RequestParts<'_>) -> BoxFuture<'static, Result<Option<BytesStr>, ResolverError>>
        + Send
        + Sync;

/// Failure of the realm resolver itself, not a policy decision
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("realm resolver failed: {0}")]
    Failed(#[source] Box<dyn Error + Send + Sync>),
    #[error("realm resolver timed out")]
    Timeout,
}

impl ResolverError {
    pub fn failed<E>(error: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::Failed(error.into())
    }
}

/// Result of a realm lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRealm {
    /// Authenticate the request against this realm
    Realm(BytesStr),
    /// The request's domain is not served, it is rejected without a challenge
    Refused,
}

/// Where the realm of an authenticated request comes from.
///
/// Every variant is resolved through [`RealmSource::resolve`] so the state machine
/// never sees which one was configured.
#[derive(Clone, Default)]
pub enum RealmSource {
    /// A fixed realm
    Literal(BytesStr),
    /// A function of the request, returning `None` refuses the request
    Sync(Arc<SyncFn>),
    /// A function of the request returning a future
    Async(Arc<AsyncFn>),
    /// The host part of the request-uri
    #[default]
    RequestUri,
}

impl fmt::Debug for RealmSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealmSource::Literal(realm) => f.debug_tuple("Literal").field(realm).finish(),
            RealmSource::Sync(_) => f.write_str("Sync(..)"),
            RealmSource::Async(_) => f.write_str("Async(..)"),
            RealmSource::RequestUri => f.write_str("RequestUri"),
        }
    }
}

impl RealmSource {
    pub fn literal<R: Into<BytesStr>>(realm: R) -> Self {
        Self::Literal(realm.into())
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(RequestParts<'_>) -> Option<BytesStr> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Realm computed by a future.
    ///
    /// The future must not borrow the request, extract what is needed before creating it.
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(RequestParts<'_>) -> BoxFuture<'static, Result<Option<BytesStr>, ResolverError>>
            + Send
            + Sync
            + 'static,
    {
        Self::Async(Arc::new(f))
    }

    /// Use the request-uri host as realm, but only if it is one of `domains`
    pub fn allow_domains<I, D>(domains: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        let domains: Vec<String> = domains.into_iter().map(Into::into).collect();

        Self::sync(move |request| {
            let host = request.line.uri.host_port.host.to_realm();

            if domains.iter().any(|domain| domain.eq_ignore_ascii_case(&host)) {
                Some(host)
            } else {
                log::debug!("refusing request for unknown domain {host}");
                None
            }
        })
    }

    /// Resolve the realm for `request`
    pub async fn resolve(&self, request: RequestParts<'_>) -> Result<ResolvedRealm, ResolverError> {
        let realm = match self {
            RealmSource::Literal(realm) => Some(realm.clone()),
            RealmSource::Sync(f) => f(request),
            RealmSource::Async(f) => f(request).await?,
            RealmSource::RequestUri => Some(request.line.uri.host_port.host.to_realm()),
        };

        Ok(realm.map_or(ResolvedRealm::Refused, ResolvedRealm::Realm))
    }
}

impl From<&'static str> for RealmSource {
    fn from(realm: &'static str) -> Self {
        Self::literal(realm)
    }
}

impl From<BytesStr> for RealmSource {
    fn from(realm: BytesStr) -> Self {
        Self::Literal(realm)
    }
}

//! Digest authentication for a SIP user agent server.
//!
//! The server side is split into small parts which are wired together by [`Authenticator`]:
//!
//! - [`CredentialStore`] maps usernames to passwords
//! - [`RealmSource`] resolves the realm of a request, either from a literal, a function or a future
//! - [`ChallengeIssuer`] creates `WWW-Authenticate` / `Proxy-Authenticate` challenges
//! - [`DigestVerifier`] recomputes and compares digest responses
//! - [`Transaction`] is the per transaction state machine
//!
//! [`DigestAuthenticator`] implements the client side and is used to answer challenges.

use sip_types::Headers;
use sip_types::msg::{Request, RequestLine, Response, StatusLine};
use std::error::Error;
use std::fmt::Debug;

mod challenge;
mod client;
mod credentials;
mod error;
mod hash;
mod machine;
mod realm;
mod verify;

pub use challenge::{AuthRole, ChallengeIssuer, FixedNonce, IssuedChallenge, NonceSource, RandomNonce};
pub use client::{DigestAuthenticator, DigestError};
pub use credentials::{CredentialStore, DigestCredentials, DigestUser};
pub use error::{AuthError, RejectReason};
pub use machine::{AuthOutcome, Authenticator, Transaction, TransactionState};
pub use realm::{BoxFuture, RealmSource, ResolvedRealm, ResolverError};
pub use verify::{DigestVerifier, Verification};

/// SIP request authenticator
pub trait ClientAuthenticator {
    type Error: Error + Debug;

    /// Modify a request's header to add the required authorization
    ///
    /// Implementations like Digest will do nothing here before receiving a rejection response
    fn authorize_request(&mut self, request: &mut Headers);

    /// Handle a rejection request
    ///
    /// Must return an error when no more requests should be sent
    fn handle_rejection(
        &mut self,
        rejected_request: RequestParts<'_>,
        reject_response: ResponseParts<'_>,
    ) -> Result<(), Self::Error>;
}

/// Information about the request that has to be authenticated
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'s> {
    pub line: &'s RequestLine,
    pub headers: &'s Headers,
    pub body: &'s [u8],
}

impl<'s> From<&'s Request> for RequestParts<'s> {
    fn from(request: &'s Request) -> Self {
        RequestParts {
            line: &request.line,
            headers: &request.headers,
            body: &request.body,
        }
    }
}

/// Information about the response that rejection the authentication
pub struct ResponseParts<'s> {
    pub line: &'s StatusLine,
    pub headers: &'s Headers,
    pub body: &'s [u8],
}

impl<'s> From<&'s Response> for ResponseParts<'s> {
    fn from(response: &'s Response) -> Self {
        ResponseParts {
            line: &response.line,
            headers: &response.headers,
            body: &response.body,
        }
    }
}

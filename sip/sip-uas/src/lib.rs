#![forbid(unsafe_code)]
//! Mock SIP user agent server.
//!
//! [`MockUas`] answers INVITE, REGISTER and SUBSCRIBE requests and can require digest
//! authentication for any of them, acting either as the final destination (401) or as
//! a proxy (407). Networking is left to a [`Transport`] implementation which receives
//! every response, inbound requests are fed through [`MockUas::listen`] or [`MockUas::handle`].

mod config;
mod error;
mod response;
mod transport;
mod uas;
mod util;

pub use config::{UasBuilder, UasConfig};
pub use error::UasError;
pub use transport::{ChannelTransport, IncomingRequest, Transport};
pub use uas::MockUas;

pub use sip_auth::{AuthRole, RealmSource, ResolvedRealm, ResolverError};

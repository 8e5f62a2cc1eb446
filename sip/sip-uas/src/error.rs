use sip_auth::{AuthError, ResolverError};
use sip_types::header::HeaderError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum UasError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("mock uas has been disconnected")]
    Disconnected,
}

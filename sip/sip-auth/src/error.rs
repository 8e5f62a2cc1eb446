use sip_types::header::HeaderError;

/// Why a request was rejected with 403 Forbidden
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("unknown user")]
    UnknownUser,
    #[error("digest response does not match")]
    CredentialMismatch,
    #[error("malformed authorization")]
    MalformedAuthorization,
    #[error("realm refused by policy")]
    RealmPolicyRejected,
    #[error("no credentials after challenge")]
    MissingCredentials,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("transaction already reached a final state")]
    TransactionFinished,
    #[error(transparent)]
    Header(#[from] HeaderError),
}

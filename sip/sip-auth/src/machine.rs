use crate::challenge::{AuthRole, ChallengeIssuer, IssuedChallenge};
use crate::credentials::CredentialStore;
use crate::error::{AuthError, RejectReason};
use crate::realm::{RealmSource, ResolvedRealm, ResolverError};
use crate::verify::{DigestVerifier, Verification};
use crate::RequestParts;
use bytesstr::BytesStr;
use sip_types::Headers;
use sip_types::header::typed::{AuthResponse, DigestResponse};
use std::time::Duration;

/// What to answer to an authenticated request
#[derive(Debug)]
pub enum AuthOutcome {
    /// Credentials verified, respond with the method's success response
    Accepted { username: BytesStr, realm: BytesStr },
    /// Respond with 403
    Rejected(RejectReason),
    /// Respond with 401 / 407 carrying the challenge
    ChallengeRequired(IssuedChallenge),
    /// The realm could not be resolved, respond with 500
    Failed(ResolverError),
}

impl AuthOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AuthOutcome::Accepted { .. })
    }

    fn next_state(&self) -> TransactionState {
        match self {
            AuthOutcome::Accepted { .. } => TransactionState::Accepted,
            AuthOutcome::Rejected(_) => TransactionState::Rejected,
            AuthOutcome::ChallengeRequired(challenge) => {
                TransactionState::Challenged(challenge.clone())
            }
            AuthOutcome::Failed(_) => TransactionState::Failed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum TransactionState {
    #[default]
    Unchallenged,
    /// Waiting for the client to answer this challenge
    Challenged(IssuedChallenge),
    Accepted,
    Rejected,
    /// Realm resolution failed
    Failed,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Accepted | TransactionState::Rejected | TransactionState::Failed
        )
    }
}

/// Authentication state of a single transaction.
///
/// Challenges at most once, a terminal state is never left.
#[derive(Debug, Default)]
pub struct Transaction {
    state: TransactionState,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TransactionState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Advance the transaction with the already resolved `realm` of `request`
    pub fn decide(
        &mut self,
        authenticator: &Authenticator,
        realm: Result<ResolvedRealm, ResolverError>,
        request: RequestParts<'_>,
    ) -> Result<AuthOutcome, AuthError> {
        let challenge = match &self.state {
            TransactionState::Unchallenged => None,
            TransactionState::Challenged(challenge) => Some(challenge),
            _ => return Err(AuthError::TransactionFinished),
        };

        let outcome = authenticator.evaluate(challenge, realm, request);

        self.state = outcome.next_state();

        Ok(outcome)
    }
}

/// Server side digest authentication, shared by all transactions
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    pub credentials: CredentialStore,
    pub realm: RealmSource,
    pub issuer: ChallengeIssuer,
    pub verifier: DigestVerifier,
    pub role: AuthRole,
    /// Upper bound for the realm lookup, unbounded if `None`
    pub resolver_timeout: Option<Duration>,
}

impl Authenticator {
    pub fn new<R: Into<RealmSource>>(credentials: CredentialStore, realm: R) -> Self {
        Self {
            credentials,
            realm: realm.into(),
            ..Self::default()
        }
    }

    pub fn role(mut self, role: AuthRole) -> Self {
        self.role = role;
        self
    }

    pub fn issuer(mut self, issuer: ChallengeIssuer) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn resolver_timeout(mut self, timeout: Duration) -> Self {
        self.resolver_timeout = Some(timeout);
        self
    }

    /// Resolve the realm of `request`, honoring the configured timeout
    pub async fn resolve_realm(
        &self,
        request: RequestParts<'_>,
    ) -> Result<ResolvedRealm, ResolverError> {
        match self.resolver_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.realm.resolve(request))
                .await
                .map_err(|_| ResolverError::Timeout)?,
            None => self.realm.resolve(request).await,
        }
    }

    /// Resolve the realm and advance `transaction` with `request`
    pub async fn authenticate(
        &self,
        transaction: &mut Transaction,
        request: RequestParts<'_>,
    ) -> Result<AuthOutcome, AuthError> {
        if transaction.is_finished() {
            return Err(AuthError::TransactionFinished);
        }

        let realm = self.resolve_realm(request).await;

        transaction.decide(self, realm, request)
    }

    /// Returns the digest credentials of `headers` for `realm`.
    ///
    /// Prefers credentials matching the realm and falls back to the first digest credentials.
    pub fn credentials_for(
        &self,
        headers: &Headers,
        realm: &str,
    ) -> Result<Option<DigestResponse>, AuthError> {
        let responses: Vec<AuthResponse> = headers.get_all(self.role.credentials_header())?;

        let mut digests = responses.into_iter().filter_map(|response| match response {
            AuthResponse::Digest(digest) => Some(digest),
            AuthResponse::Other(_) => None,
        });

        let Some(first) = digests.next() else {
            return Ok(None);
        };

        if first.realm == realm {
            return Ok(Some(first));
        }

        Ok(Some(
            digests
                .find(|digest| digest.realm == realm)
                .unwrap_or(first),
        ))
    }

    fn evaluate(
        &self,
        challenge: Option<&IssuedChallenge>,
        realm: Result<ResolvedRealm, ResolverError>,
        request: RequestParts<'_>,
    ) -> AuthOutcome {
        let realm = match realm {
            Ok(ResolvedRealm::Realm(realm)) => realm,
            Ok(ResolvedRealm::Refused) => {
                log::warn!(
                    "refusing {} for {}, realm rejected by policy",
                    request.line.method,
                    request.line.uri.host_port.host.to_realm()
                );
                return AuthOutcome::Rejected(RejectReason::RealmPolicyRejected);
            }
            Err(e) => {
                log::warn!("failed to resolve realm, {e}");
                return AuthOutcome::Failed(e);
            }
        };

        let credentials = match self.credentials_for(request.headers, &realm) {
            Ok(credentials) => credentials,
            Err(e) => {
                log::warn!("failed to read credentials, {e}");
                return AuthOutcome::Rejected(RejectReason::MalformedAuthorization);
            }
        };

        let Some(challenge) = challenge else {
            if credentials.as_ref().is_some_and(|c| c.nonce.is_empty()) {
                log::debug!("credentials with empty nonce, treating request as unauthenticated");
            }

            return AuthOutcome::ChallengeRequired(self.issuer.issue(realm, self.role));
        };

        let Some(credentials) = credentials else {
            log::warn!("request after challenge carries no credentials");
            return AuthOutcome::Rejected(RejectReason::MissingCredentials);
        };

        let username = credentials.username.decoded();

        let Some(user) = self.credentials.lookup(&username) else {
            log::warn!("unknown user {username:?} in realm {realm}");
            return AuthOutcome::Rejected(RejectReason::UnknownUser);
        };

        match self.verifier.verify(
            &credentials,
            user.password(),
            &challenge.digest,
            &realm,
            request,
        ) {
            Verification::Match => {
                log::debug!("authenticated {username:?} in realm {realm}");

                AuthOutcome::Accepted {
                    username: BytesStr::from(username.as_ref()),
                    realm,
                }
            }
            Verification::Mismatch => {
                log::warn!("digest mismatch for user {username:?} in realm {realm}");
                AuthOutcome::Rejected(RejectReason::CredentialMismatch)
            }
            Verification::Malformed => {
                log::warn!("malformed credentials of user {username:?} in realm {realm}");
                AuthOutcome::Rejected(RejectReason::MalformedAuthorization)
            }
        }
    }
}

use bytesstr::BytesStr;
use rand::Rng;
use rand::distr::Alphanumeric;
use sip_types::header::typed::{Algorithm, DigestChallenge, QopOption};
use sip_types::print::AppendCtx;
use sip_types::{Headers, Name, StatusCode};
use std::sync::Arc;

/// Source of the nonce placed in every new challenge
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> BytesStr;
}

/// Draws nonces from the thread local CSPRNG
#[derive(Debug, Clone, Copy)]
pub struct RandomNonce {
    pub len: usize,
}

impl Default for RandomNonce {
    fn default() -> Self {
        Self { len: 32 }
    }
}

impl NonceSource for RandomNonce {
    fn next_nonce(&self) -> BytesStr {
        let nonce: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(self.len)
            .map(char::from)
            .collect();

        nonce.into()
    }
}

/// Always returns the same nonce, only useful for reproducible tests
#[derive(Debug, Clone)]
pub struct FixedNonce(pub BytesStr);

impl NonceSource for FixedNonce {
    fn next_nonce(&self) -> BytesStr {
        self.0.clone()
    }
}

/// Whether the server authenticates as the final destination or as a proxy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AuthRole {
    /// 401 with `WWW-Authenticate`, credentials in `Authorization`
    #[default]
    Uas,
    /// 407 with `Proxy-Authenticate`, credentials in `Proxy-Authorization`
    Proxy,
}

impl AuthRole {
    pub fn from_proxy_flag(is_proxy: bool) -> Self {
        if is_proxy { Self::Proxy } else { Self::Uas }
    }

    /// Status code of the challenge response
    pub fn challenge_code(self) -> StatusCode {
        match self {
            AuthRole::Uas => StatusCode::UNAUTHORIZED,
            AuthRole::Proxy => StatusCode::PROXY_AUTHENTICATION_REQUIRED,
        }
    }

    /// Header carrying the challenge
    pub fn challenge_header(self) -> Name {
        match self {
            AuthRole::Uas => Name::WWW_AUTHENTICATE,
            AuthRole::Proxy => Name::PROXY_AUTHENTICATE,
        }
    }

    /// Header carrying the client's credentials
    pub fn credentials_header(self) -> Name {
        match self {
            AuthRole::Uas => Name::AUTHORIZATION,
            AuthRole::Proxy => Name::PROXY_AUTHORIZATION,
        }
    }
}

/// A challenge sent to the client, kept by the transaction to match its retry
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub role: AuthRole,
    pub digest: DigestChallenge,
}

impl IssuedChallenge {
    pub fn code(&self) -> StatusCode {
        self.role.challenge_code()
    }

    /// Insert the challenge header into `headers`
    pub fn insert_into(&self, headers: &mut Headers) {
        headers.insert(
            self.role.challenge_header(),
            self.digest.default_print_ctx(),
        );
    }
}

/// Creates challenges
#[derive(Clone)]
pub struct ChallengeIssuer {
    nonce: Arc<dyn NonceSource>,
    pub algorithm: Algorithm,
    pub qop: Vec<QopOption>,
    /// Attach a random opaque value to every challenge
    pub opaque: bool,
}

impl Default for ChallengeIssuer {
    fn default() -> Self {
        Self {
            nonce: Arc::new(RandomNonce::default()),
            algorithm: Algorithm::MD5,
            qop: vec![QopOption::Auth],
            opaque: true,
        }
    }
}

impl ChallengeIssuer {
    pub fn new<N: NonceSource + 'static>(nonce: N) -> Self {
        Self {
            nonce: Arc::new(nonce),
            ..Self::default()
        }
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn qop(mut self, qop: Vec<QopOption>) -> Self {
        self.qop = qop;
        self
    }

    pub fn opaque(mut self, opaque: bool) -> Self {
        self.opaque = opaque;
        self
    }

    /// Create a new challenge for `realm` with a fresh nonce
    pub fn issue(&self, realm: BytesStr, role: AuthRole) -> IssuedChallenge {
        let opaque = self
            .opaque
            .then(|| BytesStr::from(uuid::Uuid::new_v4().simple().to_string()));

        IssuedChallenge {
            role,
            digest: DigestChallenge {
                realm,
                domain: None,
                nonce: self.nonce.next_nonce(),
                opaque,
                stale: false,
                algorithm: self.algorithm.clone(),
                qop: self.qop.clone(),
                userhash: false,
                other: vec![],
            },
        }
    }
}

impl std::fmt::Debug for ChallengeIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeIssuer")
            .field("algorithm", &self.algorithm)
            .field("qop", &self.qop)
            .field("opaque", &self.opaque)
            .finish_non_exhaustive()
    }
}

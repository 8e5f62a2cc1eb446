use crate::uas::MockUas;
use sip_auth::{AuthRole, ChallengeIssuer, CredentialStore, DigestUser, NonceSource, RealmSource};
use sip_types::Method;
use sip_types::header::typed::{Algorithm, QopOption};
use sip_types::uri::SipUri;
use std::time::Duration;

/// Configuration of a [`MockUas`].
///
/// Realm and role are shared by every authenticated method.
#[derive(Debug, Clone)]
pub struct UasConfig {
    /// Realm of authenticated requests
    pub realm: RealmSource,
    /// Challenge as UAS (401) or proxy (407)
    pub role: AuthRole,
    /// Methods which require authentication
    pub methods: Vec<Method>,
    /// Methods served at all, everything else is answered with 405
    pub allow: Vec<Method>,
    pub credentials: CredentialStore,
    /// qop options offered in challenges, empty to offer none
    pub qop: Vec<QopOption>,
    pub algorithm: Algorithm,
    /// Attach an opaque value to challenges
    pub opaque: bool,
    /// Bound the realm lookup, `None` waits forever
    pub resolver_timeout: Option<Duration>,
    /// How long a challenged transaction waits for the client's retry
    pub challenge_ttl: Duration,
    /// Contact of the UAS in 200 responses to INVITE, defaults to the request-uri
    pub contact: Option<SipUri>,
}

impl Default for UasConfig {
    fn default() -> Self {
        Self {
            realm: RealmSource::RequestUri,
            role: AuthRole::Uas,
            methods: vec![],
            allow: vec![
                Method::INVITE,
                Method::ACK,
                Method::BYE,
                Method::REGISTER,
                Method::SUBSCRIBE,
            ],
            credentials: CredentialStore::new(),
            qop: vec![QopOption::Auth],
            algorithm: Algorithm::MD5,
            opaque: true,
            resolver_timeout: None,
            // 64*T1, the lifetime of a non-INVITE client transaction
            challenge_ttl: Duration::from_secs(32),
            contact: None,
        }
    }
}

/// Builder for [`MockUas`], created with [`MockUas::builder`]
#[derive(Debug, Default)]
pub struct UasBuilder {
    config: UasConfig,
    issuer: ChallengeIssuer,
}

impl UasBuilder {
    /// Require authentication of INVITE requests with the given credentials.
    ///
    /// `is_proxy` switches the role of the whole UAS, see [`UasBuilder::authenticate`].
    pub fn auth_invite<U, P, R>(self, user: U, password: P, realm: R, is_proxy: bool) -> Self
    where
        U: Into<String>,
        P: Into<Vec<u8>>,
        R: Into<RealmSource>,
    {
        self.authenticate(Method::INVITE, user, password, realm)
            .role(AuthRole::from_proxy_flag(is_proxy))
    }

    /// Require authentication of REGISTER requests with the given credentials
    pub fn auth_register<U, P, R>(self, user: U, password: P, realm: R) -> Self
    where
        U: Into<String>,
        P: Into<Vec<u8>>,
        R: Into<RealmSource>,
    {
        self.authenticate(Method::REGISTER, user, password, realm)
    }

    /// Require authentication of SUBSCRIBE requests with the given credentials
    pub fn auth_subscribe<U, P, R>(self, user: U, password: P, realm: R) -> Self
    where
        U: Into<String>,
        P: Into<Vec<u8>>,
        R: Into<RealmSource>,
    {
        self.authenticate(Method::SUBSCRIBE, user, password, realm)
    }

    /// Require authentication of `method`.
    ///
    /// The realm replaces the realm of previously added methods, a single realm source serves
    /// every method. Use [`RealmSource::sync`] or [`RealmSource::deferred`] to pick the realm
    /// per request.
    pub fn authenticate<U, P, R>(mut self, method: Method, user: U, password: P, realm: R) -> Self
    where
        U: Into<String>,
        P: Into<Vec<u8>>,
        R: Into<RealmSource>,
    {
        if !self.config.methods.contains(&method) {
            self.config.methods.push(method.clone());
        }

        if !self.config.allow.contains(&method) {
            self.config.allow.push(method);
        }

        self.config.credentials.add(DigestUser::new(user, password));
        self.config.realm = realm.into();
        self
    }

    /// Add another user allowed to authenticate
    pub fn user<U, P>(mut self, user: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<Vec<u8>>,
    {
        self.config.credentials.add(DigestUser::new(user, password));
        self
    }

    pub fn role(mut self, role: AuthRole) -> Self {
        self.config.role = role;
        self
    }

    pub fn qop(mut self, qop: Vec<QopOption>) -> Self {
        self.config.qop = qop;
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    pub fn opaque(mut self, opaque: bool) -> Self {
        self.config.opaque = opaque;
        self
    }

    pub fn resolver_timeout(mut self, timeout: Duration) -> Self {
        self.config.resolver_timeout = Some(timeout);
        self
    }

    pub fn challenge_ttl(mut self, ttl: Duration) -> Self {
        self.config.challenge_ttl = ttl;
        self
    }

    pub fn contact(mut self, contact: SipUri) -> Self {
        self.config.contact = Some(contact);
        self
    }

    /// Replace the random nonces of challenges
    pub fn nonce_source<N: NonceSource + 'static>(mut self, nonce: N) -> Self {
        self.issuer = ChallengeIssuer::new(nonce);
        self
    }

    pub fn build(self) -> MockUas {
        MockUas::with_issuer(self.config, self.issuer)
    }
}

impl From<UasConfig> for UasBuilder {
    fn from(config: UasConfig) -> Self {
        Self {
            config,
            issuer: ChallengeIssuer::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn auth_invite_as_proxy() {
        let builder = UasBuilder::default().auth_invite("dhorton", "pass123", "drachtio.org", true);

        assert_eq!(builder.config.methods, vec![Method::INVITE]);
        assert_eq!(builder.config.role, AuthRole::Proxy);
        assert!(builder.config.credentials.lookup("dhorton").is_some());
        assert!(matches!(builder.config.realm, RealmSource::Literal(ref realm) if realm.as_str() == "drachtio.org"));
    }

    #[test]
    fn additional_methods_are_allowed() {
        let builder = UasBuilder::default()
            .authenticate(Method::OPTIONS, "dhorton", "pass123", RealmSource::RequestUri)
            .auth_register("dhorton", "pass123", RealmSource::RequestUri);

        assert_eq!(builder.config.methods, vec![Method::OPTIONS, Method::REGISTER]);
        assert!(builder.config.allow.contains(&Method::OPTIONS));
        assert_eq!(
            builder.config.allow.iter().filter(|m| **m == Method::REGISTER).count(),
            1
        );
        assert_eq!(builder.config.credentials.len(), 1);
    }

    #[test]
    fn realm_and_role_are_shared_by_all_methods() {
        let builder = UasBuilder::default()
            .auth_invite("dhorton", "pass123", "drachtio.org", true)
            .auth_register("dhorton", "pass123", "drachtio.com");

        assert_eq!(builder.config.role, AuthRole::Proxy);
        assert!(matches!(builder.config.realm, RealmSource::Literal(ref realm) if realm.as_str() == "drachtio.com"));
    }
}

use std::collections::HashMap;
use std::fmt;

/// A username and password pair
#[derive(Clone)]
pub struct DigestUser {
    user: String,
    password: Vec<u8>,
}

impl DigestUser {
    pub fn new<U, P>(user: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<Vec<u8>>,
    {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &[u8] {
        &self.password
    }
}

impl fmt::Debug for DigestUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestUser")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Server side store of the users allowed to authenticate, looked up by username.
///
/// Populated once and only read afterwards.
#[derive(Debug, Default, Clone)]
pub struct CredentialStore {
    users: HashMap<String, DigestUser>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style [`CredentialStore::add`]
    pub fn with_user<U, P>(mut self, user: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<Vec<u8>>,
    {
        self.add(DigestUser::new(user, password));
        self
    }

    /// Add `user`, replacing a previous user with the same name
    pub fn add(&mut self, user: DigestUser) {
        self.users.insert(user.user.clone(), user);
    }

    /// Returns the user named `username`
    pub fn lookup(&self, username: &str) -> Option<&DigestUser> {
        self.users.get(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<U, P> FromIterator<(U, P)> for CredentialStore
where
    U: Into<String>,
    P: Into<Vec<u8>>,
{
    fn from_iter<T: IntoIterator<Item = (U, P)>>(iter: T) -> Self {
        let mut store = Self::new();

        for (user, password) in iter {
            store.add(DigestUser::new(user, password));
        }

        store
    }
}

/// A HashMap wrapper that holds credentials mapped to their respective realm
///
/// Default credentials can be set to attempt authentication for unknown realms
#[derive(Default, Clone)]
pub struct DigestCredentials {
    default: Option<DigestUser>,
    map: HashMap<String, DigestUser>,
}

impl DigestCredentials {
    pub fn new() -> Self {
        Self {
            default: None,
            map: HashMap::new(),
        }
    }

    /// Set default `credentials` to authenticate on unknown realms
    pub fn set_default(&mut self, credentials: DigestUser) {
        self.default = Some(credentials)
    }

    /// Add `credentials` that will be used when authenticating for `realm`
    pub fn add_for_realm<R>(&mut self, realm: R, credentials: DigestUser)
    where
        R: Into<String>,
    {
        self.map.insert(realm.into(), credentials);
    }

    /// Get credentials for the specified `realm`
    ///
    /// Returns the default credentials when no credentials where set for the
    /// requested `realm`
    pub fn get_for_realm(&self, realm: &str) -> Option<&DigestUser> {
        self.map.get(realm).or(self.default.as_ref())
    }
}

use sha2::Digest;
use sip_types::Method;
use sip_types::header::typed::{Algorithm, QopOption};

pub(crate) type HashFn = fn(&[u8]) -> String;

pub(crate) fn hash_md5(i: &[u8]) -> String {
    format!("{:x}", md5::compute(i))
}

pub(crate) fn hash_sha256(i: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(i);
    format!("{:x}", hasher.finalize())
}

pub(crate) fn hash_sha512_trunc256(i: &[u8]) -> String {
    let mut hasher = sha2::Sha512_256::new();
    hasher.update(i);
    format!("{:x}", hasher.finalize())
}

/// Returns the hash function for `algorithm` and if it is a `-sess` variant
pub(crate) fn for_algorithm(algorithm: &Algorithm) -> Option<(HashFn, bool)> {
    let hash: HashFn = match algorithm {
        Algorithm::MD5 | Algorithm::MD5Sess => hash_md5,
        Algorithm::SHA256 | Algorithm::SHA256Sess => hash_sha256,
        Algorithm::SHA512256 | Algorithm::SHA512256Sess => hash_sha512_trunc256,
        Algorithm::Other(_) => return None,
    };

    Some((hash, algorithm.is_session()))
}

/// Everything needed to compute a digest `response` value (RFC 2617 Section 3.2.2)
pub(crate) struct DigestInput<'a> {
    pub(crate) hash: HashFn,
    pub(crate) is_session: bool,
    pub(crate) username: &'a str,
    pub(crate) realm: &'a str,
    pub(crate) password: &'a [u8],
    pub(crate) nonce: &'a str,
    pub(crate) method: &'a Method,
    pub(crate) uri: &'a str,
    pub(crate) body: &'a [u8],
    pub(crate) qop: Option<QopInput<'a>>,
}

pub(crate) struct QopInput<'a> {
    pub(crate) qop: &'a QopOption,
    pub(crate) nc: &'a str,
    pub(crate) cnonce: &'a str,
}

impl DigestInput<'_> {
    pub(crate) fn response(&self) -> String {
        let hash = self.hash;

        let mut ha1 = hash(
            [
                format!("{}:{}:", self.username, self.realm).as_bytes(),
                self.password,
            ]
            .concat()
            .as_slice(),
        );

        if self.is_session {
            let cnonce = self.qop.as_ref().map(|qop| qop.cnonce).unwrap_or_default();

            ha1 = hash(format!("{}:{}:{}", ha1, self.nonce, cnonce).as_bytes());
        }

        let ha2 = match &self.qop {
            Some(QopInput {
                qop: QopOption::AuthInt,
                ..
            }) => hash(format!("{}:{}:{}", self.method, self.uri, hash(self.body)).as_bytes()),
            _ => hash(format!("{}:{}", self.method, self.uri).as_bytes()),
        };

        match &self.qop {
            Some(QopInput { qop, nc, cnonce }) => hash(
                format!("{}:{}:{}:{}:{}:{}", ha1, self.nonce, nc, cnonce, qop, ha2).as_bytes(),
            ),
            None => hash(format!("{}:{}:{}", ha1, self.nonce, ha2).as_bytes()),
        }
    }
}

/// Compares two digests without short-circuiting on the first differing byte
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

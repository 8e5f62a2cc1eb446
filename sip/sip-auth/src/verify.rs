use crate::RequestParts;
use crate::hash::{self, DigestInput, QopInput, constant_time_eq};
use sip_types::header::typed::{DigestChallenge, DigestResponse};
use sip_types::uri::SipUri;
use std::str::FromStr;

/// Result of comparing a digest response against the expected value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch,
    /// The response is not a valid answer to the challenge
    Malformed,
}

/// Recomputes the digest of an `Authorization` / `Proxy-Authorization` response.
///
/// Stateless, the challenge to verify against is passed in by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct DigestVerifier;

impl DigestVerifier {
    pub fn verify(
        &self,
        attempt: &DigestResponse,
        password: &[u8],
        challenge: &DigestChallenge,
        realm: &str,
        request: RequestParts<'_>,
    ) -> Verification {
        // some clients send empty values when they have no credentials
        if attempt.nonce.is_empty() && attempt.response.is_empty() {
            return Verification::Mismatch;
        }

        if attempt.nonce != challenge.nonce {
            log::debug!("nonce {:?} was never issued", attempt.nonce);
            return Verification::Malformed;
        }

        if attempt.realm != realm {
            log::debug!("realm {:?} does not match {realm:?}", attempt.realm);
            return Verification::Mismatch;
        }

        if attempt.algorithm != challenge.algorithm || attempt.userhash {
            return Verification::Malformed;
        }

        let Some((hash, is_session)) = hash::for_algorithm(&attempt.algorithm) else {
            return Verification::Malformed;
        };

        let qop = match (&attempt.qop_response, challenge.qop.is_empty()) {
            (None, true) => None,
            (Some(qop_response), false) if challenge.qop.contains(&qop_response.qop) => {
                Some(QopInput {
                    qop: &qop_response.qop,
                    nc: &qop_response.nc,
                    cnonce: &qop_response.cnonce,
                })
            }
            _ => {
                log::debug!("qop of response does not fit the challenge");
                return Verification::Malformed;
            }
        };

        if attempt.opaque != challenge.opaque {
            return Verification::Malformed;
        }

        if !uri_matches(&attempt.uri, &request.line.uri) {
            log::debug!("digest uri {:?} does not match the request-uri", attempt.uri);
            return Verification::Malformed;
        }

        let username = attempt.username.decoded();

        let expected = DigestInput {
            hash,
            is_session,
            username: &username,
            realm: &attempt.realm,
            password,
            nonce: &attempt.nonce,
            method: &request.line.method,
            uri: &attempt.uri,
            body: request.body,
            qop,
        }
        .response();

        if constant_time_eq(expected.as_bytes(), attempt.response.as_bytes()) {
            Verification::Match
        } else {
            Verification::Mismatch
        }
    }
}

fn uri_matches(digest_uri: &str, request_uri: &SipUri) -> bool {
    match SipUri::from_str(digest_uri) {
        Ok(uri) => uri.compare(request_uri),
        Err(_) => {
            use sip_types::print::{AppendCtx, PrintCtx, UriContext};

            let ctx = PrintCtx {
                uri: Some(UriContext::ReqUri),
            };

            request_uri.print_ctx(ctx).to_string() == digest_uri
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hash::hash_md5;
    use bytesstr::BytesStr;
    use sip_types::header::typed::{Algorithm, QopOption, QopResponse, Username};
    use sip_types::msg::RequestLine;
    use sip_types::{Headers, Method};

    fn challenge(qop: Vec<QopOption>) -> DigestChallenge {
        DigestChallenge {
            realm: "drachtio.org".into(),
            domain: None,
            nonce: "abc".into(),
            opaque: Some("op".into()),
            stale: false,
            algorithm: Algorithm::MD5,
            qop,
            userhash: false,
            other: vec![],
        }
    }

    fn line() -> RequestLine {
        RequestLine::from_str("REGISTER sip:drachtio.org SIP/2.0").unwrap()
    }

    fn response_without_qop(password: &str) -> DigestResponse {
        let ha1 = hash_md5(format!("dhorton:drachtio.org:{password}").as_bytes());
        let ha2 = hash_md5(b"REGISTER:sip:drachtio.org");
        let response = hash_md5(format!("{ha1}:abc:{ha2}").as_bytes());

        DigestResponse {
            username: Username::new("dhorton".into()),
            realm: "drachtio.org".into(),
            nonce: "abc".into(),
            uri: "sip:drachtio.org".into(),
            response: response.into(),
            algorithm: Algorithm::MD5,
            opaque: Some("op".into()),
            qop_response: None,
            userhash: false,
            other: vec![],
        }
    }

    fn verify(attempt: &DigestResponse, challenge: &DigestChallenge) -> Verification {
        let line = line();
        let headers = Headers::new();

        DigestVerifier.verify(
            attempt,
            b"pass123",
            challenge,
            "drachtio.org",
            RequestParts {
                line: &line,
                headers: &headers,
                body: &[],
            },
        )
    }

    #[test]
    fn match_without_qop() {
        let attempt = response_without_qop("pass123");
        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Match);
    }

    #[test]
    fn wrong_password() {
        let attempt = response_without_qop("badpass");
        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Mismatch);
    }

    #[test]
    fn response_is_case_sensitive() {
        let mut attempt = response_without_qop("pass123");
        attempt.response = attempt.response.to_uppercase().into();

        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Mismatch);
    }

    #[test]
    fn match_with_qop() {
        let ha1 = hash_md5(b"dhorton:drachtio.org:pass123");
        let ha2 = hash_md5(b"REGISTER:sip:drachtio.org");
        let response = hash_md5(format!("{ha1}:abc:0000000a:xyz:auth:{ha2}").as_bytes());

        let mut attempt = response_without_qop("pass123");
        attempt.response = response.into();
        attempt.qop_response = Some(QopResponse {
            qop: QopOption::Auth,
            cnonce: "xyz".into(),
            nc: "0000000a".into(),
        });

        assert_eq!(
            verify(&attempt, &challenge(vec![QopOption::Auth])),
            Verification::Match
        );

        // qop in the response but none offered
        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Malformed);

        // qop offered but the response lacks it
        let attempt = response_without_qop("pass123");
        assert_eq!(
            verify(&attempt, &challenge(vec![QopOption::Auth])),
            Verification::Malformed
        );
    }

    #[test]
    fn empty_nonce_and_response() {
        let mut attempt = response_without_qop("pass123");
        attempt.nonce = BytesStr::from_static("");
        attempt.response = BytesStr::from_static("");

        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Mismatch);
    }

    #[test]
    fn foreign_nonce() {
        let mut attempt = response_without_qop("pass123");
        attempt.nonce = "other".into();

        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Malformed);
    }

    #[test]
    fn other_realm() {
        let mut attempt = response_without_qop("pass123");
        attempt.realm = "drachtio.com".into();

        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Mismatch);
    }

    #[test]
    fn algorithm_and_opaque() {
        let mut attempt = response_without_qop("pass123");
        attempt.algorithm = Algorithm::SHA256;
        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Malformed);

        let mut attempt = response_without_qop("pass123");
        attempt.opaque = None;
        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Malformed);
    }

    #[test]
    fn digest_uri_must_match_request() {
        let mut attempt = response_without_qop("pass123");
        attempt.uri = "sip:drachtio.com".into();
        assert_eq!(verify(&attempt, &challenge(vec![])), Verification::Malformed);
    }

    #[test]
    fn sha256_session() {
        let mut challenge = challenge(vec![QopOption::Auth]);
        challenge.algorithm = Algorithm::SHA256Sess;

        let ha1 = hash::hash_sha256(b"dhorton:drachtio.org:pass123");
        let ha1 = hash::hash_sha256(format!("{ha1}:abc:xyz").as_bytes());
        let ha2 = hash::hash_sha256(b"REGISTER:sip:drachtio.org");
        let response = hash::hash_sha256(format!("{ha1}:abc:00000001:xyz:auth:{ha2}").as_bytes());

        let mut attempt = response_without_qop("pass123");
        attempt.algorithm = Algorithm::SHA256Sess;
        attempt.response = response.into();
        attempt.qop_response = Some(QopResponse {
            qop: QopOption::Auth,
            cnonce: "xyz".into(),
            nc: "00000001".into(),
        });

        assert_eq!(verify(&attempt, &challenge), Verification::Match);
    }

    #[test]
    fn method_is_part_of_the_digest() {
        let attempt = response_without_qop("pass123");
        let line = RequestLine {
            method: Method::INVITE,
            uri: line().uri,
        };
        let headers = Headers::new();

        let result = DigestVerifier.verify(
            &attempt,
            b"pass123",
            &challenge(vec![]),
            "drachtio.org",
            RequestParts {
                line: &line,
                headers: &headers,
                body: &[],
            },
        );

        assert_eq!(result, Verification::Mismatch);
    }
}

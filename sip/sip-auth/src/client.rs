use crate::challenge::AuthRole;
use crate::credentials::DigestCredentials;
use crate::hash::{self, DigestInput, QopInput};
use crate::{ClientAuthenticator, RequestParts, ResponseParts};
use bytesstr::BytesStr;
use sip_types::Headers;
use sip_types::header::HeaderError;
use sip_types::header::typed::{
    Algorithm, AuthChallenge, DigestChallenge, DigestResponse, QopOption, QopResponse, Username,
};
use sip_types::print::{AppendCtx, PrintCtx, UriContext};

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("failed to authenticate realms: {0:?}")]
    FailedToAuthenticate(Vec<BytesStr>),
    #[error("encountered unsupported algorithm {0}")]
    UnsupportedAlgorithm(BytesStr),
    #[error("missing credentials for realm {0}")]
    MissingCredentials(BytesStr),
    #[error("unsupported qop")]
    UnsupportedQop,
    #[error(transparent)]
    Header(HeaderError),
}

/// Used to solve Digest authenticate challenges in 401 / 407 SIP responses
///
/// Plays the UAC part when driving the server side [`Authenticator`](crate::Authenticator).
pub struct DigestAuthenticator {
    pub credentials: DigestCredentials,
    responses: Vec<ResponseEntry>,

    /// Reject challenges with MD5 algorithm. Is false by default
    pub reject_md5: bool,
}

/// Everything needed to recalculate a response with an incremented nonce-count
struct QopEntry {
    username: String,
    password: Vec<u8>,
    method: sip_types::Method,
    body: Vec<u8>,
    nc: u32,
}

/// Contains a list of authentication challenges that want to authenticate the same realm.
///
/// As each realm may only be authenticated once per request, only the topmost supported challenge will
/// be used for authentication. (See RFC8760 Section 2.4)
struct ChallengedRealm {
    realm: BytesStr,
    challenges: Vec<(AuthRole, DigestChallenge)>,
}

/// A cached authorization response that will be used/reused to authorize a request
struct ResponseEntry {
    realm: BytesStr,
    header: DigestResponse,

    /// Number of times the response has been used in a request
    use_count: u32,

    role: AuthRole,
    qop_entry: Option<QopEntry>,
}

impl ClientAuthenticator for DigestAuthenticator {
    type Error = DigestError;

    fn authorize_request(&mut self, request_headers: &mut Headers) {
        for response in &mut self.responses {
            // nc is already correct
            if response.use_count > 0 {
                if let (Some(qop_response), Some(qop_entry)) =
                    (&mut response.header.qop_response, &mut response.qop_entry)
                {
                    qop_entry.nc += 1;
                    qop_response.nc = format!("{:08x}", qop_entry.nc).into();

                    if let Some((hash, is_session)) =
                        hash::for_algorithm(&response.header.algorithm)
                    {
                        let digest = DigestInput {
                            hash,
                            is_session,
                            username: &qop_entry.username,
                            realm: &response.header.realm,
                            password: &qop_entry.password,
                            nonce: &response.header.nonce,
                            method: &qop_entry.method,
                            uri: &response.header.uri,
                            body: &qop_entry.body,
                            qop: Some(QopInput {
                                qop: &qop_response.qop,
                                nc: &qop_response.nc,
                                cnonce: &qop_response.cnonce,
                            }),
                        }
                        .response();

                        response.header.response = digest.into();
                    }
                }
            }

            response.use_count += 1;

            request_headers.insert(
                response.role.credentials_header(),
                response.header.default_print_ctx(),
            );
        }
    }

    fn handle_rejection(
        &mut self,
        rejected_request: RequestParts<'_>,
        reject_response: ResponseParts<'_>,
    ) -> Result<(), DigestError> {
        let mut challenged_realms = vec![];

        read_challenges(AuthRole::Uas, reject_response.headers, &mut challenged_realms)?;
        read_challenges(AuthRole::Proxy, reject_response.headers, &mut challenged_realms)?;

        let mut failed_realms = vec![];

        'outer: for challenged_realm in challenged_realms {
            for (role, challenge) in challenged_realm.challenges {
                let (response, qop_entry) = match self.handle_challenge(rejected_request, challenge)
                {
                    Ok(response) => response,
                    Err(e) => {
                        log::warn!("failed to handle challenge {}", e);
                        continue;
                    }
                };

                let realm = challenged_realm.realm;

                // Remove old response for the realm
                self.responses.retain(|response| response.realm != realm);

                self.responses.push(ResponseEntry {
                    realm,
                    header: response,
                    use_count: 0,
                    role,
                    qop_entry,
                });

                continue 'outer;
            }

            failed_realms.push(challenged_realm.realm);
        }

        if !failed_realms.is_empty() {
            return Err(DigestError::FailedToAuthenticate(failed_realms));
        }

        Ok(())
    }
}

/// Read all authentication headers of `role` and group them by realm
fn read_challenges(
    role: AuthRole,
    headers: &Headers,
    dst: &mut Vec<ChallengedRealm>,
) -> Result<(), DigestError> {
    let challenges: Vec<AuthChallenge> = headers
        .get_all(role.challenge_header())
        .map_err(DigestError::Header)?;

    for challenge in challenges {
        let AuthChallenge::Digest(challenge) = challenge else {
            continue;
        };

        if let Some(challenged_realm) = dst
            .iter_mut()
            .find(|challenged_realm| challenged_realm.realm == challenge.realm)
        {
            challenged_realm.challenges.push((role, challenge));
        } else {
            dst.push(ChallengedRealm {
                realm: challenge.realm.clone(),
                challenges: vec![(role, challenge)],
            });
        }
    }

    Ok(())
}

impl DigestAuthenticator {
    pub fn new(credentials: DigestCredentials) -> Self {
        Self {
            credentials,
            responses: vec![],
            reject_md5: false,
        }
    }

    fn handle_challenge(
        &self,
        request_parts: RequestParts<'_>,
        challenge: DigestChallenge,
    ) -> Result<(DigestResponse, Option<QopEntry>), DigestError> {
        // A realm is authenticated again only when the nonce changed, regardless of `stale`.
        // Some servers issue a new nonce without setting stale=true.
        let previous_response = self
            .responses
            .iter()
            .find(|response| response.realm == challenge.realm);

        if previous_response.is_some_and(|previous| previous.header.nonce == challenge.nonce) {
            return Err(DigestError::FailedToAuthenticate(vec![challenge.realm]));
        }

        if self.reject_md5 && matches!(challenge.algorithm, Algorithm::MD5 | Algorithm::MD5Sess) {
            return Err(DigestError::UnsupportedAlgorithm(BytesStr::from_static(
                "MD5",
            )));
        }

        let (hash, is_session) = hash::for_algorithm(&challenge.algorithm)
            .ok_or_else(|| DigestError::UnsupportedAlgorithm(challenge.algorithm.to_string().into()))?;

        self.digest_respond(challenge, request_parts, is_session, hash)
    }

    fn digest_respond(
        &self,
        challenge: DigestChallenge,
        request_parts: RequestParts<'_>,
        is_session: bool,
        hash: hash::HashFn,
    ) -> Result<(DigestResponse, Option<QopEntry>), DigestError> {
        let digest_user = self
            .credentials
            .get_for_realm(&challenge.realm)
            .ok_or_else(|| DigestError::MissingCredentials(challenge.realm.clone()))?;

        let ctx = PrintCtx {
            uri: Some(UriContext::ReqUri),
        };

        let uri = request_parts.line.uri.print_ctx(ctx).to_string();

        let qop = if challenge.qop.is_empty() {
            None
        } else if challenge.qop.contains(&QopOption::AuthInt) {
            Some(QopOption::AuthInt)
        } else if challenge.qop.contains(&QopOption::Auth) {
            Some(QopOption::Auth)
        } else {
            return Err(DigestError::UnsupportedQop);
        };

        let qop_response = qop.map(|qop| QopResponse {
            qop,
            cnonce: uuid::Uuid::new_v4().simple().to_string().into(),
            nc: BytesStr::from_static("00000001"),
        });

        let response = DigestInput {
            hash,
            is_session,
            username: digest_user.user(),
            realm: &challenge.realm,
            password: digest_user.password(),
            nonce: &challenge.nonce,
            method: &request_parts.line.method,
            uri: &uri,
            body: request_parts.body,
            qop: qop_response.as_ref().map(|qop_response| QopInput {
                qop: &qop_response.qop,
                nc: &qop_response.nc,
                cnonce: &qop_response.cnonce,
            }),
        }
        .response();

        let qop_entry = qop_response.is_some().then(|| QopEntry {
            username: digest_user.user().to_owned(),
            password: digest_user.password().to_vec(),
            method: request_parts.line.method.clone(),
            body: request_parts.body.to_vec(),
            nc: 1,
        });

        let response = DigestResponse {
            username: Username::new(digest_user.user().into()),
            realm: challenge.realm,
            nonce: challenge.nonce,
            uri: uri.into(),
            response: response.into(),
            algorithm: challenge.algorithm,
            opaque: challenge.opaque,
            qop_response,
            userhash: false,
            other: vec![],
        };

        Ok((response, qop_entry))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::credentials::DigestUser;
    use sip_types::header::typed::AuthResponse;
    use sip_types::msg::{RequestLine, StatusLine};
    use sip_types::uri::SipUri;
    use sip_types::{Method, Name, StatusCode};

    fn test_authenticator() -> DigestAuthenticator {
        let mut credentials = DigestCredentials::new();

        credentials.add_for_realm("example.org", DigestUser::new("user123", "password123"));

        DigestAuthenticator::new(credentials)
    }

    fn challenge(qop: Vec<QopOption>) -> DigestChallenge {
        DigestChallenge {
            realm: "example.org".into(),
            domain: None,
            nonce: "YWmh5GFpoLjiTDCA1hTSSygkgdj99aHE".into(),
            opaque: None,
            stale: false,
            algorithm: Algorithm::MD5,
            qop,
            userhash: false,
            other: vec![],
        }
    }

    fn reject(authenticator: &mut DigestAuthenticator, name: Name, challenge: DigestChallenge) {
        let mut headers = Headers::new();

        headers.insert(name, AuthChallenge::Digest(challenge).default_print_ctx());

        let line = RequestLine {
            method: Method::REGISTER,
            uri: "sip:example.org".parse::<SipUri>().unwrap(),
        };

        authenticator
            .handle_rejection(
                RequestParts {
                    line: &line,
                    headers: &Headers::new(),
                    body: &[],
                },
                ResponseParts {
                    line: &StatusLine::new(StatusCode::UNAUTHORIZED),
                    headers: &headers,
                    body: &[],
                },
            )
            .unwrap();
    }

    fn authorization(authenticator: &mut DigestAuthenticator, name: Name) -> DigestResponse {
        let mut headers = Headers::new();
        authenticator.authorize_request(&mut headers);

        match headers.get::<AuthResponse>(name).unwrap() {
            AuthResponse::Digest(response) => response,
            AuthResponse::Other(_) => panic!("expected digest"),
        }
    }

    #[test]
    fn digest_challenge() {
        let mut authenticator = test_authenticator();

        reject(&mut authenticator, Name::WWW_AUTHENTICATE, challenge(vec![]));

        let DigestResponse {
            username,
            realm,
            nonce,
            uri,
            response,
            algorithm,
            opaque,
            qop_response,
            userhash,
            other,
        } = authorization(&mut authenticator, Name::AUTHORIZATION);

        assert_eq!(username, Username::Username("user123".into()));
        assert_eq!(realm, "example.org");
        assert_eq!(nonce, "YWmh5GFpoLjiTDCA1hTSSygkgdj99aHE");
        assert_eq!(uri, "sip:example.org");
        assert_eq!(response, "bc185e4893f17f12dc53153d2a62e6a6");
        assert_eq!(algorithm, Algorithm::MD5);
        assert_eq!(opaque, None);
        assert_eq!(qop_response, None);
        assert!(!userhash);
        assert!(other.is_empty());
    }

    #[test]
    fn digest_challenge_and_response() {
        let mut authenticator = test_authenticator();

        reject(
            &mut authenticator,
            Name::WWW_AUTHENTICATE,
            challenge(vec![QopOption::AuthInt]),
        );

        let first = authorization(&mut authenticator, Name::AUTHORIZATION);

        let qop_response = first.qop_response.as_ref().unwrap();
        assert_eq!(qop_response.qop, QopOption::AuthInt);
        assert_eq!(qop_response.nc, "00000001");

        let second = authorization(&mut authenticator, Name::AUTHORIZATION);

        let qop_response = second.qop_response.as_ref().unwrap();
        assert_eq!(qop_response.qop, QopOption::AuthInt);
        assert_eq!(qop_response.nc, "00000002");
        assert_eq!(second.nonce, first.nonce);
        assert_ne!(second.response, first.response);
    }

    #[test]
    fn proxy_challenge() {
        let mut authenticator = test_authenticator();

        reject(
            &mut authenticator,
            Name::PROXY_AUTHENTICATE,
            challenge(vec![QopOption::Auth]),
        );

        let response = authorization(&mut authenticator, Name::PROXY_AUTHORIZATION);
        assert_eq!(response.realm, "example.org");
    }

    #[test]
    fn same_nonce_fails() {
        let mut authenticator = test_authenticator();

        reject(&mut authenticator, Name::WWW_AUTHENTICATE, challenge(vec![]));

        let mut headers = Headers::new();
        headers.insert(
            Name::WWW_AUTHENTICATE,
            AuthChallenge::Digest(challenge(vec![])).default_print_ctx(),
        );

        let line = RequestLine {
            method: Method::REGISTER,
            uri: "sip:example.org".parse::<SipUri>().unwrap(),
        };

        let result = authenticator.handle_rejection(
            RequestParts {
                line: &line,
                headers: &Headers::new(),
                body: &[],
            },
            ResponseParts {
                line: &StatusLine::new(StatusCode::UNAUTHORIZED),
                headers: &headers,
                body: &[],
            },
        );

        assert!(matches!(result, Err(DigestError::FailedToAuthenticate(_))));
    }

    #[test]
    fn reject_md5() {
        let mut authenticator = test_authenticator();
        authenticator.reject_md5 = true;

        let mut headers = Headers::new();
        headers.insert(
            Name::WWW_AUTHENTICATE,
            AuthChallenge::Digest(challenge(vec![])).default_print_ctx(),
        );

        let line = RequestLine {
            method: Method::REGISTER,
            uri: "sip:example.org".parse::<SipUri>().unwrap(),
        };

        let result = authenticator.handle_rejection(
            RequestParts {
                line: &line,
                headers: &Headers::new(),
                body: &[],
            },
            ResponseParts {
                line: &StatusLine::new(StatusCode::UNAUTHORIZED),
                headers: &headers,
                body: &[],
            },
        );

        assert!(matches!(result, Err(DigestError::FailedToAuthenticate(_))));
    }
}

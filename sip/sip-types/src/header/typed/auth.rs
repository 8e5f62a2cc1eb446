use crate::header::HeaderParse;
use crate::parse::{IResult, parse_quoted, token, whitespace, ws};
use crate::print::{Print, PrintCtx};
use anyhow::{Context, anyhow, bail};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::combinator::map;
use nom::multi::many0;
use nom::sequence::{preceded, tuple};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::borrow::Cow;
use std::fmt;
use std::fmt::{Display, Write};

/// Param contained inside [Auth].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthParam {
    pub name: BytesStr,
    pub value: BytesStr,
}

impl fmt::Display for AuthParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#"{}="{}""#, self.name, self.value)
    }
}

impl AuthParam {
    fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| {
            map(
                ws(tuple((
                    take_while1(token),
                    ws(tag("=")),
                    ws(alt((parse_quoted, take_while(token)))),
                ))),
                move |(name, _, value)| AuthParam {
                    name: BytesStr::from_parse(src, name),
                    value: BytesStr::from_parse(src, value),
                },
            )(i)
        }
    }
}

/// Value of a `WWW-Authenticate` or `Proxy-Authenticate` header
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum AuthChallenge {
    Digest(DigestChallenge),
    Other(Auth),
}

impl HeaderParse for AuthChallenge {
    fn parse<'i>(src: &'i Bytes, i: &'i str) -> anyhow::Result<(&'i str, Self)> {
        let (rem, (scheme, params)) = parse_auth_params(src)(i)
            .map_err(|e| anyhow!("invalid authenticate header: {e}"))?;

        let challenge = if scheme.eq_ignore_ascii_case("Digest") {
            Self::Digest(DigestChallenge::from_auth_params(params)?)
        } else {
            Self::Other(Auth { scheme, params })
        };

        Ok((rem, challenge))
    }
}

impl Print for AuthChallenge {
    fn print(&self, f: &mut fmt::Formatter<'_>, ctx: PrintCtx) -> fmt::Result {
        match self {
            AuthChallenge::Digest(digest) => digest.print(f, ctx),
            AuthChallenge::Other(other) => other.print(f, ctx),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DigestChallenge {
    pub realm: BytesStr,
    pub domain: Option<BytesStr>,
    pub nonce: BytesStr,
    pub opaque: Option<BytesStr>,
    pub stale: bool,
    pub algorithm: Algorithm,
    pub qop: Vec<QopOption>,
    pub userhash: bool,
    /// Remaining fields
    pub other: Vec<AuthParam>,
}

impl DigestChallenge {
    pub(crate) fn from_auth_params(params: Vec<AuthParam>) -> anyhow::Result<Self> {
        let mut realm = None;
        let mut domain = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut stale = false;
        let mut algorithm = Algorithm::MD5;
        let mut qop = vec![];
        let mut userhash = false;
        let mut other = vec![];

        for param in params {
            match param.name.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(param.value),
                "domain" => domain = Some(param.value),
                "nonce" => nonce = Some(param.value),
                "opaque" => opaque = Some(param.value),
                "stale" => stale = param.value.eq_ignore_ascii_case("true"),
                "algorithm" => algorithm = Algorithm::from(param.value),
                "qop" => qop.extend(
                    param
                        .value
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| QopOption::from(param.value.slice_ref(v))),
                ),
                "userhash" => userhash = param.value.eq_ignore_ascii_case("true"),
                _ => other.push(param),
            }
        }

        Ok(Self {
            realm: realm.context("Missing realm in authenticate header")?,
            domain,
            nonce: nonce.context("Missing nonce in authenticate header")?,
            opaque,
            stale,
            algorithm,
            qop,
            userhash,
            other,
        })
    }
}

impl Print for DigestChallenge {
    fn print(&self, f: &mut fmt::Formatter<'_>, _ctx: PrintCtx) -> fmt::Result {
        write!(
            f,
            r#"Digest realm="{}", nonce="{}""#,
            self.realm, self.nonce,
        )?;

        if let Some(domain) = &self.domain {
            write!(f, r#", domain="{}""#, domain)?;
        }

        if let Some(opaque) = &self.opaque {
            write!(f, r#", opaque="{}""#, opaque)?;
        }

        if self.stale {
            f.write_str(", stale=true")?;
        }

        write!(f, ", algorithm={}", self.algorithm)?;

        let mut qop_iter = self.qop.iter();

        if let Some(first) = qop_iter.next() {
            write!(f, r#", qop="{}"#, first)?;

            for qop_option in qop_iter {
                write!(f, ",{}", qop_option)?;
            }

            f.write_char('"')?;
        }

        if self.userhash {
            f.write_str(", userhash=true")?;
        }

        for param in &self.other {
            write!(f, ", {}", param)?;
        }

        Ok(())
    }
}

/// Value of an `Authorization` or `Proxy-Authorization` header
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum AuthResponse {
    Digest(DigestResponse),
    Other(Auth),
}

impl HeaderParse for AuthResponse {
    fn parse<'i>(src: &'i Bytes, i: &'i str) -> anyhow::Result<(&'i str, Self)> {
        let (rem, (scheme, params)) = parse_auth_params(src)(i)
            .map_err(|e| anyhow!("invalid authorization header: {e}"))?;

        let response = if scheme.eq_ignore_ascii_case("Digest") {
            Self::Digest(DigestResponse::from_auth_params(params)?)
        } else {
            Self::Other(Auth { scheme, params })
        };

        Ok((rem, response))
    }
}

impl Print for AuthResponse {
    fn print(&self, f: &mut fmt::Formatter<'_>, ctx: PrintCtx) -> fmt::Result {
        match self {
            AuthResponse::Digest(digest) => digest.print(f, ctx),
            AuthResponse::Other(other) => other.print(f, ctx),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Username {
    Username(BytesStr),
    /// RFC 7616 `username*` in its `UTF-8''` extended notation
    UsernameNonASCII(BytesStr),
}

const CHARSET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

const EXTENDED_PREFIX: &str = "UTF-8''";

impl Username {
    /// Create a new [`Username`]
    ///
    /// Determines the variant and encodes non ascii usernames with utf8 percentage encoding.
    pub fn new(username: BytesStr) -> Self {
        let maybe_encoded = utf8_percent_encode(&username, CHARSET).into();

        match maybe_encoded {
            Cow::Borrowed(_) => Username::Username(username),
            Cow::Owned(encoded) => {
                let username_encoded = format!("{EXTENDED_PREFIX}{encoded}").into();

                Username::UsernameNonASCII(username_encoded)
            }
        }
    }

    /// Returns the username as it is used for credential lookup and hashing
    pub fn decoded(&self) -> Cow<'_, str> {
        match self {
            Username::Username(username) => Cow::Borrowed(username.as_str()),
            Username::UsernameNonASCII(encoded) => {
                let encoded = encoded.as_str();
                let encoded = match encoded.get(..EXTENDED_PREFIX.len()) {
                    Some(prefix) if prefix.eq_ignore_ascii_case(EXTENDED_PREFIX) => {
                        &encoded[EXTENDED_PREFIX.len()..]
                    }
                    _ => encoded,
                };

                percent_decode_str(encoded).decode_utf8_lossy()
            }
        }
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Username::Username(username) => {
                write!(f, r#"username="{}""#, username)
            }
            Username::UsernameNonASCII(username_non_ascii) => {
                write!(f, r#"username*={}"#, username_non_ascii)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DigestResponse {
    pub username: Username,
    pub realm: BytesStr,
    pub nonce: BytesStr,
    pub uri: BytesStr,
    pub response: BytesStr,
    pub algorithm: Algorithm,
    pub opaque: Option<BytesStr>,
    pub qop_response: Option<QopResponse>,
    pub userhash: bool,
    /// Remaining fields
    pub other: Vec<AuthParam>,
}

impl DigestResponse {
    pub(crate) fn from_auth_params(params: Vec<AuthParam>) -> anyhow::Result<Self> {
        let mut username = None;
        let mut username_non_ascii = None;
        let mut realm = None;
        let mut nonce = None;
        let mut uri = None;
        let mut response = None;
        let mut algorithm = Algorithm::MD5;
        let mut opaque = None;

        // qop related params
        let mut qop = None;
        let mut cnonce = None;
        let mut nc = None;

        let mut userhash = false;

        let mut other = vec![];

        for param in params {
            match param.name.to_ascii_lowercase().as_str() {
                "username" => username = Some(param.value),
                "username*" => username_non_ascii = Some(param.value),
                "realm" => realm = Some(param.value),
                "nonce" => nonce = Some(param.value),
                "uri" => uri = Some(param.value),
                "response" => response = Some(param.value),
                "algorithm" => algorithm = Algorithm::from(param.value),
                "opaque" => opaque = Some(param.value),
                "qop" => qop = Some(QopOption::from(param.value)),
                "cnonce" => cnonce = Some(param.value),
                "nc" => nc = Some(param.value),
                "userhash" => userhash = param.value.eq_ignore_ascii_case("true"),
                _ => other.push(param),
            }
        }

        let qop_response = if let Some(qop) = qop {
            let nc = nc.context("Missing nc in authorization header")?;

            if nc.len() != 8 || !nc.bytes().all(|b| b.is_ascii_hexdigit()) {
                bail!("Invalid nc value {:?} in authorization header", nc.as_str());
            }

            Some(QopResponse {
                qop,
                cnonce: cnonce.context("Missing cnonce in authorization header")?,
                nc,
            })
        } else {
            None
        };

        if username.is_some() && username_non_ascii.is_some() {
            bail!("Received both, 'username' and 'username*' in authorization header");
        }

        let username = if let Some(username) = username {
            Username::Username(username)
        } else if let Some(username_non_ascii) = username_non_ascii {
            if userhash {
                bail!("Received 'userhash=true' and 'username*' in authorization header");
            }

            Username::UsernameNonASCII(username_non_ascii)
        } else {
            bail!("Missing username in authorization header");
        };

        Ok(Self {
            username,
            realm: realm.context("Missing realm in authorization header")?,
            nonce: nonce.context("Missing nonce in authorization header")?,
            uri: uri.context("Missing uri in authorization header")?,
            response: response.context("Missing response in authorization header")?,
            algorithm,
            opaque,
            qop_response,
            userhash,
            other,
        })
    }
}

impl Print for DigestResponse {
    fn print(&self, f: &mut fmt::Formatter<'_>, _ctx: PrintCtx) -> fmt::Result {
        write!(
            f,
            r#"Digest {}, realm="{}", nonce="{}", uri="{}", response="{}", algorithm={}"#,
            self.username, self.realm, self.nonce, self.uri, self.response, self.algorithm
        )?;

        if let Some(opaque) = &self.opaque {
            write!(f, r#", opaque="{}""#, opaque)?;
        }

        if let Some(qop_response) = &self.qop_response {
            write!(
                f,
                r#", qop={}, cnonce="{}", nc={}"#,
                qop_response.qop, qop_response.cnonce, qop_response.nc
            )?;
        }

        if self.userhash {
            f.write_str(", userhash=true")?;
        }

        for param in &self.other {
            write!(f, ", {}", param)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QopResponse {
    pub qop: QopOption,
    pub cnonce: BytesStr,
    /// Nonce count, 8 hex digits exactly as sent by the client
    pub nc: BytesStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QopOption {
    Auth,
    AuthInt,
    Other(BytesStr),
}

impl From<BytesStr> for QopOption {
    fn from(value: BytesStr) -> Self {
        if value.eq_ignore_ascii_case("auth") {
            Self::Auth
        } else if value.eq_ignore_ascii_case("auth-int") {
            Self::AuthInt
        } else {
            Self::Other(value)
        }
    }
}

impl Display for QopOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QopOption::Auth => f.write_str("auth"),
            QopOption::AuthInt => f.write_str("auth-int"),
            QopOption::Other(token) => f.write_str(token),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Algorithm {
    MD5,
    MD5Sess,
    SHA256,
    SHA256Sess,
    SHA512256,
    SHA512256Sess,
    Other(BytesStr),
}

impl Algorithm {
    /// Returns if HA1 must be rehashed with the nonce and cnonce
    pub fn is_session(&self) -> bool {
        matches!(
            self,
            Algorithm::MD5Sess | Algorithm::SHA256Sess | Algorithm::SHA512256Sess
        )
    }
}

impl From<BytesStr> for Algorithm {
    fn from(value: BytesStr) -> Self {
        if value.eq_ignore_ascii_case("MD5") {
            Algorithm::MD5
        } else if value.eq_ignore_ascii_case("MD5-sess") {
            Algorithm::MD5Sess
        } else if value.eq_ignore_ascii_case("SHA-256") {
            Algorithm::SHA256
        } else if value.eq_ignore_ascii_case("SHA-256-sess") {
            Algorithm::SHA256Sess
        } else if value.eq_ignore_ascii_case("SHA-512-256") {
            Algorithm::SHA512256
        } else if value.eq_ignore_ascii_case("SHA-512-256-sess") {
            Algorithm::SHA512256Sess
        } else {
            Algorithm::Other(value)
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::MD5 => f.write_str("MD5"),
            Algorithm::MD5Sess => f.write_str("MD5-sess"),
            Algorithm::SHA256 => f.write_str("SHA-256"),
            Algorithm::SHA256Sess => f.write_str("SHA-256-sess"),
            Algorithm::SHA512256 => f.write_str("SHA-512-256"),
            Algorithm::SHA512256Sess => f.write_str("SHA-512-256-sess"),
            Algorithm::Other(other) => f.write_str(other),
        }
    }
}

fn parse_auth_params(
    src: &Bytes,
) -> impl Fn(&str) -> IResult<&str, (BytesStr, Vec<AuthParam>)> + '_ {
    move |i| {
        tuple((
            map(ws(take_while1(|c| !whitespace(c))), |scheme| {
                BytesStr::from_parse(src, scheme)
            }),
            preceded(
                take_while(whitespace),
                map(
                    tuple((
                        AuthParam::parse(src),
                        many0(preceded(ws(tag(",")), AuthParam::parse(src))),
                    )),
                    |(first_param, mut v)| {
                        v.insert(0, first_param);
                        v
                    },
                ),
            ),
        ))(i)
    }
}

/// Implementation for all Auth kind headers.
#[derive(Debug, Clone)]
pub struct Auth {
    pub scheme: BytesStr,
    pub params: Vec<AuthParam>,
}

impl Print for Auth {
    fn print(&self, f: &mut fmt::Formatter<'_>, _: PrintCtx) -> fmt::Result {
        write!(f, "{} ", self.scheme)?;

        let mut params = self.params.iter();

        if let Some(param) = params.next() {
            write!(f, "{}", param)?;

            for param in params {
                write!(f, ", {}", param)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::print::AppendCtx;
    use crate::{Headers, Name};

    #[test]
    fn parse_simple_digest_challenge() {
        let input = BytesStr::from_static(r#"Digest realm="example.com", nonce="abc123""#);

        let (rem, auth) = AuthChallenge::parse(input.as_ref(), &input).unwrap();

        match auth {
            AuthChallenge::Digest(DigestChallenge {
                realm,
                domain,
                nonce,
                opaque,
                stale,
                algorithm,
                qop,
                userhash,
                other,
            }) => {
                assert_eq!(realm, "example.com");
                assert_eq!(domain, None);
                assert_eq!(nonce, "abc123");
                assert_eq!(opaque, None);
                assert!(!stale);
                assert_eq!(algorithm, Algorithm::MD5);
                assert_eq!(qop, vec![]);
                assert!(!userhash);
                assert!(other.is_empty())
            }
            _ => panic!(),
        }

        assert_eq!(rem, "");
    }

    #[test]
    fn print_digest_challenge() {
        let challenge = AuthChallenge::Digest(DigestChallenge {
            realm: BytesStr::from_static("drachtio.org"),
            domain: None,
            nonce: BytesStr::from_static("abc123"),
            opaque: Some(BytesStr::from_static("xyz")),
            stale: false,
            algorithm: Algorithm::MD5,
            qop: vec![QopOption::Auth],
            userhash: false,
            other: vec![],
        });

        let expected =
            r#"Digest realm="drachtio.org", nonce="abc123", opaque="xyz", algorithm=MD5, qop="auth""#;

        assert_eq!(expected, challenge.default_print_ctx().to_string());
    }

    #[test]
    fn parse_challenge_qop_list() {
        let input = BytesStr::from_static(
            r#"Digest realm="a", nonce="n", qop="auth, auth-int", algorithm=SHA-256-sess"#,
        );

        let (_, auth) = AuthChallenge::parse(input.as_ref(), &input).unwrap();

        let AuthChallenge::Digest(digest) = auth else {
            panic!()
        };

        assert_eq!(digest.qop, vec![QopOption::Auth, QopOption::AuthInt]);
        assert_eq!(digest.algorithm, Algorithm::SHA256Sess);
        assert!(digest.algorithm.is_session());
    }

    #[test]
    fn parse_digest_response() {
        let input = BytesStr::from_static(
            r#"Digest username="dhorton", realm="drachtio.org", nonce="abc", uri="sip:drachtio.org", response="0123", qop=auth, nc=0000000a, cnonce="xyz", opaque="op""#,
        );

        let (rem, auth) = AuthResponse::parse(input.as_ref(), &input).unwrap();
        assert_eq!(rem, "");

        let AuthResponse::Digest(digest) = auth else {
            panic!()
        };

        assert_eq!(digest.username, Username::Username("dhorton".into()));
        assert_eq!(digest.realm, "drachtio.org");
        assert_eq!(digest.nonce, "abc");
        assert_eq!(digest.uri, "sip:drachtio.org");
        assert_eq!(digest.response, "0123");
        assert_eq!(digest.opaque.as_deref(), Some("op"));
        assert_eq!(
            digest.qop_response,
            Some(QopResponse {
                qop: QopOption::Auth,
                cnonce: "xyz".into(),
                nc: "0000000a".into(),
            })
        );
    }

    #[test]
    fn parse_empty_nonce_and_response() {
        let input = BytesStr::from_static(
            r#"Digest username="dhorton", realm="drachtio.org", nonce="", uri="sip:drachtio.org", response="""#,
        );

        let (_, auth) = AuthResponse::parse(input.as_ref(), &input).unwrap();

        let AuthResponse::Digest(digest) = auth else {
            panic!()
        };

        assert!(digest.nonce.is_empty());
        assert!(digest.response.is_empty());
    }

    #[test]
    fn parse_response_missing_fields() {
        let input = BytesStr::from_static(r#"Digest username="dhorton", realm="drachtio.org""#);
        assert!(AuthResponse::parse(input.as_ref(), &input).is_err());

        let input = BytesStr::from_static(
            r#"Digest username="a", realm="b", nonce="c", uri="d", response="e", qop=auth, cnonce="f", nc=1"#,
        );
        assert!(AuthResponse::parse(input.as_ref(), &input).is_err());
    }

    #[test]
    fn parse_other_scheme() {
        let mut headers = Headers::new();
        headers.insert(Name::AUTHORIZATION, r#"Bearer token="abc""#);

        let auth: AuthResponse = headers.get(Name::AUTHORIZATION).unwrap();

        match auth {
            AuthResponse::Other(Auth { scheme, params }) => {
                assert_eq!(scheme, "Bearer");
                assert_eq!(params.len(), 1);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn multiple_credentials_in_one_value() {
        let mut headers = Headers::new();
        headers.insert(
            Name::AUTHORIZATION,
            r#"Digest username="a", realm="one", nonce="n", uri="u", response="r", Digest username="b", realm="two", nonce="n", uri="u", response="r""#,
        );

        let auths: Vec<AuthResponse> = headers.get_all(Name::AUTHORIZATION).unwrap();
        assert_eq!(auths.len(), 2);
    }

    #[test]
    fn username_non_ascii() {
        let username = Username::new("jörg".into());

        assert_eq!(
            username,
            Username::UsernameNonASCII("UTF-8''j%C3%B6rg".into())
        );
        assert_eq!(username.decoded(), "jörg");
        assert_eq!(username.to_string(), "username*=UTF-8''j%C3%B6rg");

        let username = Username::new("dhorton".into());
        assert_eq!(username.decoded(), "dhorton");
    }

    #[test]
    fn print_digest_response() {
        let response = DigestResponse {
            username: Username::new("dhorton".into()),
            realm: "drachtio.org".into(),
            nonce: "abc".into(),
            uri: "sip:drachtio.org".into(),
            response: "0123".into(),
            algorithm: Algorithm::MD5,
            opaque: None,
            qop_response: Some(QopResponse {
                qop: QopOption::Auth,
                cnonce: "xyz".into(),
                nc: "00000001".into(),
            }),
            userhash: false,
            other: vec![],
        };

        assert_eq!(
            response.default_print_ctx().to_string(),
            r#"Digest username="dhorton", realm="drachtio.org", nonce="abc", uri="sip:drachtio.org", response="0123", algorithm=MD5, qop=auth, cnonce="xyz", nc=00000001"#
        );
    }
}

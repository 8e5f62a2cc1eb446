use std::fmt;
use std::str::FromStr;

type Repr = u16;

/// Representation of a SIP status code
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StatusCode(Repr);

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("StatusCode");
        tuple.field(&self.0);
        if let Some(text) = self.text() {
            tuple.field(&text);
        }
        tuple.finish()
    }
}

/// Kind of status code for broader status code handling
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CodeKind {
    /// Represents code 100..=199
    Provisional,

    /// Represents code 200..=299
    Success,

    /// Represents code 300..=399
    Redirection,

    /// Represents code 400..=499
    RequestFailure,

    /// Represents code 500..=599
    ServerFailure,

    /// Represents code 600..=699
    GlobalFailure,

    /// Represents all other codes
    Custom,
}

impl StatusCode {
    /// Returns the [CodeKind] of the code
    ///
    /// # Example
    ///
    /// ```
    /// use mockuas_sip_types::{CodeKind, StatusCode};
    ///
    /// assert_eq!(StatusCode::OK.kind(), CodeKind::Success);
    /// assert_eq!(StatusCode::FORBIDDEN.kind(), CodeKind::RequestFailure);
    /// ```
    #[inline]
    pub fn kind(self) -> CodeKind {
        match self.0 {
            100..=199 => CodeKind::Provisional,
            200..=299 => CodeKind::Success,
            300..=399 => CodeKind::Redirection,
            400..=499 => CodeKind::RequestFailure,
            500..=599 => CodeKind::ServerFailure,
            600..=699 => CodeKind::GlobalFailure,
            _ => CodeKind::Custom,
        }
    }

    /// Returns the number that the code represents
    pub fn into_u16(self) -> Repr {
        self.0
    }

    /// Returns if the code ends a transaction
    pub fn is_final(self) -> bool {
        self.0 >= 200
    }
}

impl FromStr for StatusCode {
    type Err = <Repr as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StatusCode(Repr::from_str(s)?))
    }
}

impl From<Repr> for StatusCode {
    fn from(r: Repr) -> StatusCode {
        StatusCode(r)
    }
}

macro_rules! codes {
    ($($(#[$comments:meta])* [$code:expr => $name:ident, $text:literal];)*) => {
        impl StatusCode {
            /// Returns the default reason phrase for a known code
            pub fn text(self) -> Option<&'static str> {
                match self.0 {
                    $($code => Some($text),)*
                    _ => None
                }
            }

            $(
            $(#[$comments])*
            pub const $name: StatusCode = StatusCode($code);
            )*
        }
    };
}

codes! {
    /// [[RFC3261, Section 21.1.1](https://tools.ietf.org/html/rfc3261#section-21.1.1)]
    [100 => TRYING, "Trying"];

    /// [[RFC3261, Section 21.1.2](https://tools.ietf.org/html/rfc3261#section-21.1.2)]
    [180 => RINGING, "Ringing"];

    /// [[RFC3261, Section 21.2.1](https://tools.ietf.org/html/rfc3261#section-21.2.1)]
    [200 => OK, "OK"];

    /// [[RFC6665, Section 8.3.1](https://datatracker.ietf.org/doc/html/rfc6665#section-8.3.1)]
    [202 => ACCEPTED, "Accepted"];

    /// [[RFC3261, Section 21.4.1](https://tools.ietf.org/html/rfc3261#section-21.4.1)]
    [400 => BAD_REQUEST, "Bad Request"];

    /// [[RFC3261, Section 21.4.2](https://tools.ietf.org/html/rfc3261#section-21.4.2)]
    [401 => UNAUTHORIZED, "Unauthorized"];

    /// [[RFC3261, Section 21.4.4](https://tools.ietf.org/html/rfc3261#section-21.4.4)]
    [403 => FORBIDDEN, "Forbidden"];

    /// [[RFC3261, Section 21.4.5](https://tools.ietf.org/html/rfc3261#section-21.4.5)]
    [404 => NOT_FOUND, "Not Found"];

    /// [[RFC3261, Section 21.4.6](https://tools.ietf.org/html/rfc3261#section-21.4.6)]
    [405 => METHOD_NOT_ALLOWED, "Method Not Allowed"];

    /// [[RFC3261, Section 21.4.8](https://tools.ietf.org/html/rfc3261#section-21.4.8)]
    [407 => PROXY_AUTHENTICATION_REQUIRED, "Proxy Authentication Required"];

    /// [[RFC3261, Section 21.4.19](https://tools.ietf.org/html/rfc3261#section-21.4.19)]
    [481 => CALL_OR_TRANSACTION_DOES_NOT_EXIST, "Call/Transaction Does Not Exist"];

    /// [[RFC3261, Section 21.5.1](https://tools.ietf.org/html/rfc3261#section-21.5.1)]
    [500 => SERVER_INTERNAL_ERROR, "Server Internal Error"];

    /// [[RFC3261, Section 21.5.4](https://tools.ietf.org/html/rfc3261#section-21.5.4)]
    [503 => SERVICE_UNAVAILABLE, "Service Unavailable"];
}

//! Contains the SIP headers needed for authentication as types for parsing & serializing

mod allow;
mod auth;
mod call_id;
mod cseq;
mod expires;
mod from_to;

pub use allow::Allow;
pub use auth::*;
pub use call_id::CallID;
pub use cseq::CSeq;
pub use expires::Expires;
pub use from_to::FromTo;

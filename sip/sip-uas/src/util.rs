use bytesstr::BytesStr;
use rand::{Rng, distr::Alphanumeric, rng};

pub(crate) fn random_string() -> BytesStr {
    rng()
        .sample_iter(Alphanumeric)
        .take(30)
        .map(char::from)
        .collect::<String>()
        .into()
}

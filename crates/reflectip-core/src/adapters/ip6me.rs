use std::net::IpAddr;

use crate::error::ValidationError;
use crate::provider::{parse_address, ReflectionProvider};
use crate::source::ProviderId;

pub const ENDPOINT: &str = "https://ip6.me/api/";

/// Field delimiters of the ip6.me line format.
const FIELD_SEPARATORS: &[char] = &[','];

pub(crate) const SAMPLE_BODY: &str = "IPv4,203.0.113.7,Ver=1.1,=,,1.0\n";

pub fn provider() -> Result<ReflectionProvider, ValidationError> {
    ReflectionProvider::new(ProviderId::Ip6Me, ENDPOINT, parse)
}

/// Parses `family,address[,...]`.
///
/// The address is the second non-empty field. The family field is not
/// checked against the address that follows it.
pub fn parse(text: &str) -> Option<IpAddr> {
    if text.trim().is_empty() {
        return None;
    }

    let fields = text
        .split(FIELD_SEPARATORS)
        .filter(|field| !field.is_empty())
        .collect::<Vec<_>>();

    if fields.len() < 2 {
        return None;
    }

    fields.get(1).copied().and_then(parse_address)
}

use std::net::IpAddr;

use crate::error::ValidationError;
use crate::provider::{parse_address, ReflectionProvider};
use crate::source::ProviderId;

pub const ENDPOINT: &str = "https://icanhazip.com";

pub(crate) const SAMPLE_BODY: &str = "203.0.113.12\n";

pub fn provider() -> Result<ReflectionProvider, ValidationError> {
    ReflectionProvider::new(ProviderId::Icanhazip, ENDPOINT, parse)
}

/// The first non-blank line is the address; later lines are ignored.
pub fn parse(text: &str) -> Option<IpAddr> {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .and_then(parse_address)
}

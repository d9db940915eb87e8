use std::net::IpAddr;

use crate::error::ValidationError;
use crate::provider::{parse_address, ReflectionProvider};
use crate::source::ProviderId;

pub const ENDPOINT: &str = "https://1.1.1.1/cdn-cgi/trace";

const ADDRESS_KEY: &str = "ip";

pub(crate) const SAMPLE_BODY: &str = "fl=29f\nh=1.1.1.1\nip=203.0.113.13\nts=1700000000.0\nvisit_scheme=https\nuag=reflectip\ncolo=AMS\nhttp=http/2\nloc=NL\ntls=TLSv1.3\nwarp=off\n";

pub fn provider() -> Result<ReflectionProvider, ValidationError> {
    ReflectionProvider::new(ProviderId::Cloudflare, ENDPOINT, parse)
}

/// Parses the `key=value` trace format; the address is the first `ip` value.
pub fn parse(text: &str) -> Option<IpAddr> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == ADDRESS_KEY)
        .and_then(|(_, value)| parse_address(value))
}

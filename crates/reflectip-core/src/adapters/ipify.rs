use std::net::IpAddr;

use crate::error::ValidationError;
use crate::provider::{parse_address, ReflectionProvider};
use crate::source::ProviderId;

/// Dual-stack endpoint; answers over whichever family the connection used.
pub const ENDPOINT: &str = "https://api64.ipify.org";

pub(crate) const SAMPLE_BODY: &str = "203.0.113.11";

pub fn provider() -> Result<ReflectionProvider, ValidationError> {
    ReflectionProvider::new(ProviderId::Ipify, ENDPOINT, parse)
}

/// The whole body is the address.
pub fn parse(text: &str) -> Option<IpAddr> {
    parse_address(text)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn bare_address_body() {
        assert_eq!(
            parse(SAMPLE_BODY),
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 11)))
        );
        assert_eq!(parse(" 2001:db8::11\n"), "2001:db8::11".parse::<IpAddr>().ok());
    }

    #[test]
    fn anything_else_is_absent() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("{\"ip\":\"203.0.113.11\"}"), None);
        assert_eq!(parse("203.0.113.11 203.0.113.12"), None);
        assert_eq!(parse("<html>rate limited</html>"), None);
    }
}

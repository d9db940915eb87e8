use std::net::IpAddr;

use serde_json::Value;

use crate::error::ValidationError;
use crate::provider::{parse_address, ReflectionProvider};
use crate::source::ProviderId;

pub const ENDPOINT: &str = "https://ipinfo.io/json";

pub(crate) const SAMPLE_BODY: &str = r#"{
  "ip": "203.0.113.14",
  "city": "Amsterdam",
  "region": "North Holland",
  "country": "NL",
  "org": "AS64496 Example Networks",
  "timezone": "Europe/Amsterdam"
}"#;

pub fn provider() -> Result<ReflectionProvider, ValidationError> {
    ReflectionProvider::new(ProviderId::Ipinfo, ENDPOINT, parse)
}

/// Reads the string field `ip` of the JSON object; other fields are ignored.
pub fn parse(text: &str) -> Option<IpAddr> {
    let payload = serde_json::from_str::<Value>(text).ok()?;
    payload
        .as_object()?
        .get("ip")?
        .as_str()
        .and_then(parse_address)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn reads_ip_field() {
        assert_eq!(
            parse(SAMPLE_BODY),
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 14)))
        );
    }

    #[test]
    fn malformed_payloads_are_absent() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("203.0.113.14"), None);
        assert_eq!(parse("[\"203.0.113.14\"]"), None);
        assert_eq!(parse("{\"city\":\"Amsterdam\"}"), None);
        assert_eq!(parse("{\"ip\":null}"), None);
        assert_eq!(parse("{\"ip\":42}"), None);
        assert_eq!(parse("{\"ip\":\"bogon\"}"), None);
        assert_eq!(parse("{\"ip\":\"203.0.113.14\""), None);
    }
}

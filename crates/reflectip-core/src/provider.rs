//! Reflection provider contract.
//!
//! A provider is a plain value: where to ask, and how to read the answer.
//! Asking is left to the [`AddressResolver`](crate::AddressResolver) and its
//! injected [`HttpClient`](crate::HttpClient).

use std::net::IpAddr;

use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::decode::{read_to_end, TextDecoding};
use crate::error::{FetchError, ValidationError};
use crate::http_client::BodyStream;
use crate::source::ProviderId;

/// Pure parser from a decoded response body to an address.
///
/// Must return `None` rather than a partially valid result for any body it
/// does not fully understand.
pub type ParseFn = fn(&str) -> Option<IpAddr>;

/// A remote service that echoes back the caller's public address.
#[derive(Debug, Clone)]
pub struct ReflectionProvider {
    id: ProviderId,
    endpoint: Url,
    decoding: TextDecoding,
    parse: ParseFn,
}

impl ReflectionProvider {
    /// Registers a provider. Fails unless `endpoint` is an absolute https URI.
    pub fn new(id: ProviderId, endpoint: &str, parse: ParseFn) -> Result<Self, ValidationError> {
        let endpoint = Url::parse(endpoint).map_err(|error| ValidationError::MalformedEndpoint {
            value: endpoint.to_owned(),
            reason: error.to_string(),
        })?;

        if endpoint.scheme() != "https" {
            return Err(ValidationError::InsecureEndpoint {
                value: endpoint.to_string(),
                scheme: endpoint.scheme().to_owned(),
            });
        }

        Ok(Self {
            id,
            endpoint,
            decoding: TextDecoding::default(),
            parse,
        })
    }

    pub fn with_decoding(mut self, decoding: TextDecoding) -> Self {
        self.decoding = decoding;
        self
    }

    pub const fn id(&self) -> &ProviderId {
        &self.id
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub const fn decoding(&self) -> TextDecoding {
        self.decoding
    }

    /// Applies the parser to already decoded text.
    pub fn parse_text(&self, text: &str) -> Option<IpAddr> {
        (self.parse)(text)
    }

    /// Applies the decoding policy and parser to a fully buffered body.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Option<IpAddr> {
        self.parse_text(&self.decoding.decode(bytes))
    }

    /// Reads `body` to completion, then parses it.
    ///
    /// `Ok(None)` means the service answered but no usable address was in
    /// the body. Errors are limited to cancellation and faults while reading.
    pub async fn parse(
        &self,
        body: BodyStream,
        cancel: &CancellationToken,
    ) -> Result<Option<IpAddr>, FetchError> {
        let bytes = read_to_end(body, cancel).await?;
        Ok(self.parse_bytes(&bytes))
    }
}

/// Strict address parse of a single token, ignoring surrounding whitespace.
pub(crate) fn parse_address(token: &str) -> Option<IpAddr> {
    token.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn first_line(text: &str) -> Option<IpAddr> {
        text.lines().next().and_then(parse_address)
    }

    #[test]
    fn relative_endpoint_fails_at_registration() {
        let error = ReflectionProvider::new(ProviderId::Ipify, "/api/", first_line)
            .expect_err("relative URI");
        assert!(matches!(error, ValidationError::MalformedEndpoint { .. }));
    }

    #[test]
    fn plain_http_endpoint_fails_at_registration() {
        let error = ReflectionProvider::new(ProviderId::Ipify, "http://api.ipify.org", first_line)
            .expect_err("insecure scheme");
        assert_eq!(
            error,
            ValidationError::InsecureEndpoint {
                value: String::from("http://api.ipify.org/"),
                scheme: String::from("http"),
            }
        );
    }

    #[test]
    fn parse_bytes_applies_decoding_before_parser() {
        let provider =
            ReflectionProvider::new(ProviderId::Ipify, "https://api64.ipify.org", first_line)
                .expect("valid provider");

        assert_eq!(
            provider.parse_bytes(b"\xEF\xBB\xBF192.0.2.10"),
            Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)))
        );
        assert_eq!(
            provider
                .with_decoding(TextDecoding::Utf8)
                .parse_bytes(b"\xEF\xBB\xBF192.0.2.10"),
            None
        );
    }

    #[test]
    fn strict_parse_rejects_lenient_forms() {
        assert_eq!(parse_address(" 192.0.2.1 "), Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))));
        assert_eq!(parse_address("192.0.2"), None);
        assert_eq!(parse_address("192.0.2.01"), None);
        assert_eq!(parse_address("fe80::1%eth0"), None);
        assert_eq!(parse_address(""), None);
    }
}

use std::net::IpAddr;

use bytes::Bytes;
use futures_util::stream;
use reflectip_core::adapters::{self, builtin_all};
use reflectip_core::{BodyStream, FetchError, HttpError, ProviderId, ReflectionProvider};
use tokio_util::sync::CancellationToken;

fn chunked(chunks: &[&[u8]]) -> BodyStream {
    let chunks = chunks
        .iter()
        .map(|chunk| Ok::<_, HttpError>(Bytes::copy_from_slice(chunk)))
        .collect::<Vec<_>>();
    Box::pin(stream::iter(chunks))
}

fn providers() -> Vec<ReflectionProvider> {
    builtin_all().expect("built-in endpoints are valid")
}

fn sample(provider: &ReflectionProvider) -> &'static str {
    adapters::sample_body(provider.id()).expect("every built-in has a sample body")
}

#[test]
fn every_provider_uses_https_and_a_distinct_id() {
    let providers = providers();
    let ids = providers
        .iter()
        .map(|provider| provider.id().clone())
        .collect::<Vec<_>>();

    assert_eq!(ids, ProviderId::ALL.to_vec());
    for provider in &providers {
        assert_eq!(provider.endpoint().scheme(), "https", "{}", provider.id());
        assert!(provider.endpoint().host_str().is_some(), "{}", provider.id());
    }
}

#[tokio::test]
async fn every_provider_parses_its_sample_body_from_a_stream() {
    for provider in providers() {
        let body = sample(&provider);
        let streamed = provider
            .parse(chunked(&[body.as_bytes()]), &CancellationToken::new())
            .await
            .expect("no transport fault");

        assert!(streamed.is_some(), "{}", provider.id());
        assert_eq!(streamed, provider.parse_text(body), "{}", provider.id());
    }
}

#[tokio::test]
async fn chunk_boundaries_do_not_change_the_result() {
    for provider in providers() {
        let body = sample(&provider).as_bytes();
        let (head, tail) = body.split_at(body.len() / 2);

        let split = provider
            .parse(chunked(&[head, b"", tail]), &CancellationToken::new())
            .await
            .expect("no transport fault");

        assert_eq!(split, provider.parse_bytes(body), "{}", provider.id());
    }
}

#[tokio::test]
async fn zero_byte_stream_is_absent_for_every_provider() {
    for provider in providers() {
        let result = provider
            .parse(chunked(&[]), &CancellationToken::new())
            .await
            .expect("no transport fault");

        assert_eq!(result, None, "{}", provider.id());
    }
}

#[test]
fn garbage_and_blank_bodies_are_absent_for_every_provider() {
    for provider in providers() {
        for body in ["", "   ", "\n\n", "<html>rate limited</html>", "not-an-ip", "{}", "[]"] {
            assert_eq!(provider.parse_text(body), None, "{} {body:?}", provider.id());
        }
    }
}

#[test]
fn parsing_is_idempotent() {
    for provider in providers() {
        let body = sample(&provider).as_bytes();
        assert_eq!(provider.parse_bytes(body), provider.parse_bytes(body));
    }
}

#[test]
fn byte_order_mark_is_ignored() {
    for provider in providers() {
        let mut body = b"\xEF\xBB\xBF".to_vec();
        body.extend_from_slice(sample(&provider).as_bytes());

        assert_eq!(
            provider.parse_bytes(&body),
            provider.parse_text(sample(&provider)),
            "{}",
            provider.id()
        );
    }
}

#[tokio::test]
async fn cancelled_token_never_yields_an_address() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    for provider in providers() {
        let body = sample(&provider);
        let result = provider.parse(chunked(&[body.as_bytes()]), &cancel).await;

        assert_eq!(result, Err(FetchError::Cancelled), "{}", provider.id());
    }
}

#[tokio::test]
async fn body_fault_is_a_transport_fault_not_an_absent_result() {
    for provider in providers() {
        let body: BodyStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"203.0.")),
            Err(HttpError::body("connection reset")),
        ]));

        let result = provider.parse(body, &CancellationToken::new()).await;
        assert!(
            matches!(result, Err(FetchError::Transport(_))),
            "{}: {result:?}",
            provider.id()
        );
    }
}

#[test]
fn ip6me_result_equals_direct_address_parse() {
    let provider = adapters::builtin(&ProviderId::Ip6Me).expect("valid");

    for address in ["203.0.113.5", "2001:db8::5", "::1", "255.255.255.255"] {
        assert_eq!(
            provider.parse_text(&format!("IPv4,{address}")),
            address.parse::<IpAddr>().ok(),
            "{address}"
        );
    }
}

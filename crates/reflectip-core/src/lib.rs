//! # Reflectip Core
//!
//! Public IP address discovery through third-party reflection services.
//!
//! ## Overview
//!
//! A reflection service answers an HTTPS GET with the caller's public
//! address, in a format of its own. This crate provides:
//!
//! - **Provider descriptors** pairing an endpoint with a pure body parser
//! - **Built-in providers** for ip6.me, ipify, icanhazip, Cloudflare trace and ipinfo
//! - **Streaming body decoding** with byte-order-mark detection and a size cap
//! - **Resolution** across providers with fallback, racing, retries and cancellation
//! - **Environment configuration** for provider order, timeout and retries
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Built-in reflection services and their parsers |
//! | [`config`] | Resolver configuration from `REFLECTIP_*` variables |
//! | [`decode`] | Body reading and text decoding |
//! | [`error`] | Validation and fetch error types |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`provider`] | Reflection provider descriptor |
//! | [`retry`] | Per-provider retry policy |
//! | [`routing`] | Address resolver and strategies |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reflectip_core::{AddressResolverBuilder, ResolveStrategy};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = AddressResolverBuilder::new().build()?;
//!     let resolution = resolver
//!         .resolve(&ResolveStrategy::Auto, &CancellationToken::new())
//!         .await?;
//!
//!     println!("{} (via {})", resolution.address, resolution.selected_source);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Caller   │
//! └────────┬────────┘
//!          │ strategy + cancellation token
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ AddressResolver │────▶│ RetryConfig      │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HttpClient      │────▶│ BodyStream       │
//! │ (reqwest/static)│     │ (capped, decoded)│
//! └─────────────────┘     └────────┬─────────┘
//!                                  │
//!                                  ▼
//!                         ┌──────────────────┐
//!                         │ Provider parser  │
//!                         │ (text -> IpAddr) │
//!                         └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! A provider attempt ends in one of three ways that are never conflated:
//! an address, an answer without an address, or a transport fault.
//! Cancellation is reported separately from all three.
//!
//! ```rust
//! use reflectip_core::{AttemptOutcome, ResolveError};
//!
//! fn explain(error: &ResolveError) -> &'static str {
//!     match error {
//!         ResolveError::NotResolved(failure) if failure.all_faulted() => "network trouble",
//!         ResolveError::NotResolved(_) => "services answered without an address",
//!         ResolveError::Cancelled { .. } => "cancelled",
//!     }
//! }
//!
//! assert_eq!(AttemptOutcome::Absent.code(), "provider.absent");
//! ```
//!
//! ## Security
//!
//! - Provider endpoints must use `https`
//! - Response bodies are read up to [`decode::MAX_BODY_BYTES`]
//! - Addresses are accepted only when they parse as a complete IPv4 or IPv6 literal

pub mod adapters;
pub mod config;
pub mod decode;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod retry;
pub mod routing;
pub mod source;

// Configuration
pub use config::{ResolverConfig, DEFAULT_TIMEOUT_MS};

// Decoding
pub use decode::{read_to_end, TextDecoding, MAX_BODY_BYTES};

// Error types
pub use error::{FetchError, ValidationError};

// HTTP client types
pub use http_client::{
    BodyStream, HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse,
    ReqwestHttpClient, StaticHttpClient, DEFAULT_USER_AGENT,
};

// Providers
pub use provider::{ParseFn, ReflectionProvider};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Resolution
pub use routing::{
    AddressResolver, AddressResolverBuilder, AttemptOutcome, FailedAttempt, Resolution,
    ResolveError, ResolveFailure, ResolveResult, ResolveStrategy,
};

// Source identifiers
pub use source::{parse_provider_list, ProviderId};

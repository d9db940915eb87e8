//! Built-in reflection services.
//!
//! | Provider | Endpoint | Body format |
//! |----------|----------|-------------|
//! | `ip6me` | `https://ip6.me/api/` | `family,address[,...]` |
//! | `ipify` | `https://api64.ipify.org` | bare address |
//! | `icanhazip` | `https://icanhazip.com` | address line |
//! | `cloudflare` | `https://1.1.1.1/cdn-cgi/trace` | `key=value` lines, `ip` key |
//! | `ipinfo` | `https://ipinfo.io/json` | JSON object, `ip` field |

pub mod cloudflare;
pub mod icanhazip;
pub mod ip6me;
pub mod ipify;
pub mod ipinfo;

use crate::error::ValidationError;
use crate::provider::ReflectionProvider;
use crate::source::ProviderId;

/// Builds the built-in provider for `id`. Custom ids have no built-in.
pub fn builtin(id: &ProviderId) -> Result<ReflectionProvider, ValidationError> {
    match id {
        ProviderId::Ip6Me => ip6me::provider(),
        ProviderId::Ipify => ipify::provider(),
        ProviderId::Icanhazip => icanhazip::provider(),
        ProviderId::Cloudflare => cloudflare::provider(),
        ProviderId::Ipinfo => ipinfo::provider(),
        ProviderId::Custom(name) => Err(ValidationError::InvalidSource {
            value: name.to_string(),
        }),
    }
}

/// Every built-in provider in [`ProviderId::ALL`] order.
pub fn builtin_all() -> Result<Vec<ReflectionProvider>, ValidationError> {
    ProviderId::ALL.iter().map(builtin).collect()
}

/// A representative response body for a built-in `id`, using documentation
/// addresses.
pub fn sample_body(id: &ProviderId) -> Option<&'static str> {
    match id {
        ProviderId::Ip6Me => Some(ip6me::SAMPLE_BODY),
        ProviderId::Ipify => Some(ipify::SAMPLE_BODY),
        ProviderId::Icanhazip => Some(icanhazip::SAMPLE_BODY),
        ProviderId::Cloudflare => Some(cloudflare::SAMPLE_BODY),
        ProviderId::Ipinfo => Some(ipinfo::SAMPLE_BODY),
        ProviderId::Custom(_) => None,
    }
}

//! Report shapes and renderers for command output.

use std::io::Write;
use std::net::IpAddr;

use reflectip_core::{FailedAttempt, ProviderId, Resolution, ResolveFailure};
use serde::Serialize;

use crate::error::CliError;
use crate::metadata::{utc_timestamp, RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl From<IpAddr> for AddressFamily {
    fn from(address: IpAddr) -> Self {
        match address {
            IpAddr::V4(_) => Self::Ipv4,
            IpAddr::V6(_) => Self::Ipv6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptReport {
    pub provider: ProviderId,
    pub code: &'static str,
    pub message: String,
    pub latency_ms: u64,
}

impl From<&FailedAttempt> for AttemptReport {
    fn from(attempt: &FailedAttempt) -> Self {
        Self {
            provider: attempt.provider.clone(),
            code: attempt.outcome.code(),
            message: attempt.outcome.message(),
            latency_ms: attempt.latency_ms,
        }
    }
}

/// Outcome of `reflectip resolve`. Field order is the JSON field order.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub request_id: RequestId,
    pub resolved_at: String,
    pub address: Option<IpAddr>,
    pub family: Option<AddressFamily>,
    pub source: Option<ProviderId>,
    pub source_chain: Vec<ProviderId>,
    pub latency_ms: u64,
    pub warnings: Vec<String>,
    pub errors: Vec<AttemptReport>,
}

impl ResolveReport {
    pub fn resolved(resolution: &Resolution) -> Result<Self, CliError> {
        Ok(Self {
            request_id: RequestId::new_v4(),
            resolved_at: utc_timestamp()?,
            address: Some(resolution.address),
            family: Some(resolution.address.into()),
            source: Some(resolution.selected_source.clone()),
            source_chain: resolution.source_chain.clone(),
            latency_ms: resolution.latency_ms,
            warnings: resolution.warnings.clone(),
            errors: resolution.failures.iter().map(AttemptReport::from).collect(),
        })
    }

    pub fn unresolved(failure: &ResolveFailure) -> Result<Self, CliError> {
        Ok(Self {
            request_id: RequestId::new_v4(),
            resolved_at: utc_timestamp()?,
            address: None,
            family: None,
            source: None,
            source_chain: failure.source_chain.clone(),
            latency_ms: failure.latency_ms,
            warnings: Vec::new(),
            errors: failure.failures.iter().map(AttemptReport::from).collect(),
        })
    }
}

pub fn write_json<W, T>(out: &mut W, value: &T, pretty: bool) -> Result<(), CliError>
where
    W: Write,
    T: Serialize,
{
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

/// The bare address on `out`; warnings and failure details on `diagnostics`.
pub fn write_text<W, E>(
    out: &mut W,
    diagnostics: &mut E,
    report: &ResolveReport,
) -> Result<(), CliError>
where
    W: Write,
    E: Write,
{
    match report.address {
        Some(address) => {
            writeln!(out, "{address}")?;
            for warning in &report.warnings {
                writeln!(diagnostics, "warning: {warning}")?;
            }
        }
        None => {
            writeln!(diagnostics, "error: no address could be determined")?;
            for attempt in &report.errors {
                writeln!(
                    diagnostics,
                    "  {}: {} ({})",
                    attempt.provider, attempt.message, attempt.code
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use reflectip_core::{AttemptOutcome, HttpError};
    use serde_json::Value;

    use super::*;

    fn fallback_resolution() -> Resolution {
        Resolution {
            address: IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)),
            selected_source: ProviderId::Ipify,
            source_chain: vec![ProviderId::Ip6Me, ProviderId::Ipify],
            failures: vec![FailedAttempt {
                provider: ProviderId::Ip6Me,
                outcome: AttemptOutcome::Transport(HttpError::timeout("no answer")),
                latency_ms: 3000,
            }],
            warnings: vec![String::from("fallback succeeded with 'ipify' after 1 failed attempt(s)")],
            latency_ms: 3012,
        }
    }

    #[test]
    fn resolved_report_json_shape() {
        let report = ResolveReport::resolved(&fallback_resolution()).expect("report");
        let mut buffer = Vec::new();
        write_json(&mut buffer, &report, false).expect("writes");

        let json: Value = serde_json::from_slice(&buffer).expect("valid json");
        assert_eq!(json["address"], "203.0.113.7");
        assert_eq!(json["family"], "ipv4");
        assert_eq!(json["source"], "ipify");
        assert_eq!(json["source_chain"], serde_json::json!(["ip6me", "ipify"]));
        assert_eq!(json["latency_ms"], 3012);
        assert_eq!(json["errors"][0]["code"], "provider.transport");
        assert_eq!(json["errors"][0]["provider"], "ip6me");
        assert_eq!(json["warnings"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["request_id"].as_str().map(str::len), Some(36));
        assert!(buffer.ends_with(b"\n"));
    }

    #[test]
    fn unresolved_report_has_null_address() {
        let failure = ResolveFailure {
            source_chain: vec![ProviderId::Ip6Me],
            failures: vec![FailedAttempt {
                provider: ProviderId::Ip6Me,
                outcome: AttemptOutcome::Absent,
                latency_ms: 40,
            }],
            latency_ms: 41,
        };
        let report = ResolveReport::unresolved(&failure).expect("report");
        let json = serde_json::to_value(&report).expect("serializes");

        assert_eq!(json["address"], Value::Null);
        assert_eq!(json["family"], Value::Null);
        assert_eq!(json["errors"][0]["code"], "provider.absent");
    }

    #[test]
    fn text_output_is_the_bare_address() {
        let report = ResolveReport::resolved(&fallback_resolution()).expect("report");
        let mut out = Vec::new();
        let mut diagnostics = Vec::new();
        write_text(&mut out, &mut diagnostics, &report).expect("writes");

        assert_eq!(String::from_utf8(out).expect("utf8"), "203.0.113.7\n");
        assert!(String::from_utf8(diagnostics)
            .expect("utf8")
            .starts_with("warning: fallback succeeded"));
    }

    #[test]
    fn ipv6_family_is_reported() {
        let address = "2001:db8::1".parse::<IpAddr>().expect("valid");
        assert_eq!(AddressFamily::from(address), AddressFamily::Ipv6);
    }
}

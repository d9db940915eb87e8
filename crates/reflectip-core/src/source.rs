use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::ValidationError;

/// Identity of a reflection service.
///
/// Built-in services have their own variants. Services registered by the
/// caller use [`ProviderId::custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Ip6Me,
    Ipify,
    Icanhazip,
    Cloudflare,
    Ipinfo,
    Custom(Cow<'static, str>),
}

impl ProviderId {
    /// Default registration order of the built-ins.
    pub const ALL: [Self; 5] = [
        Self::Ip6Me,
        Self::Ipify,
        Self::Icanhazip,
        Self::Cloudflare,
        Self::Ipinfo,
    ];

    /// Names a caller-registered service.
    ///
    /// The name is lowercased and may hold ASCII letters, digits, `-`, `_`
    /// and `.`. Built-in names are reserved.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Result<Self, ValidationError> {
        let name = name.into();
        let invalid = |reason| ValidationError::InvalidProviderName {
            value: name.to_string(),
            reason,
        };

        let normalized = name.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !normalized
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        {
            return Err(invalid("only ASCII letters, digits, '-', '_' and '.' are allowed"));
        }
        if Self::builtin_named(&normalized).is_some() {
            return Err(invalid("name is reserved for a built-in provider"));
        }

        Ok(if normalized == name {
            Self::Custom(name)
        } else {
            Self::Custom(Cow::Owned(normalized))
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ip6Me => "ip6me",
            Self::Ipify => "ipify",
            Self::Icanhazip => "icanhazip",
            Self::Cloudflare => "cloudflare",
            Self::Ipinfo => "ipinfo",
            Self::Custom(name) => name.as_ref(),
        }
    }

    pub const fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    fn builtin_named(name: &str) -> Option<Self> {
        match name {
            "ip6me" => Some(Self::Ip6Me),
            "ipify" => Some(Self::Ipify),
            "icanhazip" => Some(Self::Icanhazip),
            "cloudflare" => Some(Self::Cloudflare),
            "ipinfo" => Some(Self::Ipinfo),
            _ => None,
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProviderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Parses a built-in provider name. Custom names are not accepted here.
impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::builtin_named(&normalized).ok_or(ValidationError::InvalidSource { value: normalized })
    }
}

/// Parses a comma-separated provider list such as `"ipify, cloudflare"`.
pub fn parse_provider_list(value: &str) -> Result<Vec<ProviderId>, ValidationError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ProviderId::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for id in ProviderId::ALL {
            assert_eq!(id.as_str().parse::<ProviderId>(), Ok(id.clone()));
        }
    }

    #[test]
    fn from_str_is_case_insensitive_and_trimmed() {
        assert_eq!(" IP6Me ".parse::<ProviderId>(), Ok(ProviderId::Ip6Me));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let error = "whatismyip".parse::<ProviderId>().expect_err("unknown name");
        assert_eq!(
            error,
            ValidationError::InvalidSource {
                value: String::from("whatismyip")
            }
        );
    }

    #[test]
    fn provider_list_skips_blank_entries() {
        let ids = parse_provider_list("ipify,, cloudflare ,").expect("valid list");
        assert_eq!(ids, vec![ProviderId::Ipify, ProviderId::Cloudflare]);
    }

    #[test]
    fn custom_names_are_normalized() {
        let id = ProviderId::custom("  Ident.Me ").expect("valid name");

        assert_eq!(id, ProviderId::Custom(Cow::Borrowed("ident.me")));
        assert_eq!(id.to_string(), "ident.me");
        assert!(!id.is_builtin());
        assert!(ProviderId::Ipify.is_builtin());
    }

    #[test]
    fn invalid_or_reserved_custom_names_are_rejected() {
        for name in ["", "   ", "my service", "ipify", "IPINFO", "ip/6"] {
            let error = ProviderId::custom(name).expect_err("rejected");
            assert!(
                matches!(error, ValidationError::InvalidProviderName { .. }),
                "{name:?}: {error:?}"
            );
        }
    }

    #[test]
    fn custom_ids_serialize_as_their_name() {
        let ids = vec![ProviderId::Ip6Me, ProviderId::custom("ident-me").expect("valid")];
        assert_eq!(
            serde_json::to_string(&ids).expect("serializes"),
            r#"["ip6me","ident-me"]"#
        );
    }
}

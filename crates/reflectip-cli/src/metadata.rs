use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::CliError;

/// Request identifier (UUID v4) stamped on every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Current UTC time as RFC 3339.
pub fn utc_timestamp() -> Result<String, CliError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_uuid_v4() {
        let request_id = RequestId::new_v4();
        assert_eq!(request_id.0.get_version_num(), 4);
        assert_eq!(request_id.to_string().len(), 36);
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let timestamp = utc_timestamp().expect("formats");
        let parsed = OffsetDateTime::parse(&timestamp, &Rfc3339).expect("parses back");

        assert!(timestamp.ends_with('Z'));
        assert_eq!(parsed.offset(), time::UtcOffset::UTC);
    }
}

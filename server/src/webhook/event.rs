//! Webhook event payload types

use serde::Deserialize;

/// The push event name sent in the event-type header
pub const PUSH_EVENT: &str = "push";

/// Prefix of branch refs in push payloads
const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Push event payload, cut down to the fields the gate consumes
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    /// Ref that was pushed, e.g. `refs/heads/main`
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// Repository the push happened in
    pub repository: Repository,
}

impl PushPayload {
    /// Parse a raw request body into a push payload
    pub fn from_bytes(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Branch name pushed to, with the `refs/heads/` prefix stripped
    ///
    /// Tag pushes (`refs/tags/...`) keep their full ref and therefore never
    /// match a configured branch.
    pub fn branch(&self) -> &str {
        self.git_ref
            .strip_prefix(BRANCH_REF_PREFIX)
            .unwrap_or(&self.git_ref)
    }
}

/// Repository information in webhook payloads
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// Repository name
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_payload() {
        let payload =
            PushPayload::from_bytes(br#"{"repository":{"name":"site"},"ref":"refs/heads/main"}"#)
                .unwrap();

        assert_eq!(payload.repository.name, "site");
        assert_eq!(payload.branch(), "main");
    }

    #[test]
    fn test_tag_ref_not_treated_as_branch() {
        let payload =
            PushPayload::from_bytes(br#"{"repository":{"name":"site"},"ref":"refs/tags/v1.0"}"#)
                .unwrap();

        assert_eq!(payload.branch(), "refs/tags/v1.0");
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(PushPayload::from_bytes(b"not json").is_err());
        assert!(PushPayload::from_bytes(br#"{"repository":{}}"#).is_err());
    }
}

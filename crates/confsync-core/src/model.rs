use serde::Serialize;
use serde_json::Value;

use crate::error::SyncError;

/// Opaque identity of the requesting machine. Computed once per run, either
/// from the configured asset code or from a non-loopback interface address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Wire body for `POST {base}configuration/generate`.
///
/// `tag` is omitted entirely when absent; the server treats a missing tag as
/// "regenerate nothing, current configuration stands".
#[derive(Clone, Debug, Serialize)]
pub struct GenerationRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<&'a str>,
    pub node: &'a str,
}

/// Classify a decoded generation response into an artifact name or a failure.
///
/// Rules, in order: an `error` object wins even when `result` is also present
/// (the two are supposed to be exclusive; failure takes precedence when the
/// server misbehaves); otherwise a non-empty string `result` is the artifact
/// name; anything else is a contract violation.
pub fn classify_response(body: &Value) -> Result<String, SyncError> {
    if let Some(err) = body.get("error") {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or(-1);
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no message supplied")
            .to_string();
        return Err(SyncError::Api { code, message });
    }
    match body.get("result").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(SyncError::MalformedResponse),
    }
}

/// Result of one convergence run. Surfaced to the caller, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl ApplyOutcome {
    pub fn from_exit_code(code: i32) -> Self {
        Self { success: code == 0, exit_code: Some(code) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_id_preserves_the_given_string() {
        assert_eq!(NodeId::new("10.0.0.5").as_str(), "10.0.0.5");
    }

    #[test]
    fn request_body_with_tag() {
        let req = GenerationRequest { tag: Some("v2"), node: "10.0.0.5" };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"node": "10.0.0.5", "tag": "v2"}));
    }

    #[test]
    fn request_body_omits_absent_tag() {
        let req = GenerationRequest { tag: None, node: "10.0.0.5" };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"node": "10.0.0.5"}));
    }

    #[test]
    fn result_field_yields_artifact_name() {
        let name = classify_response(&json!({"result": "cfg-20240101"})).unwrap();
        assert_eq!(name, "cfg-20240101");
    }

    #[test]
    fn error_field_yields_api_failure() {
        let err = classify_response(&json!({
            "error": {"code": 17, "message": "unknown tag"}
        }))
        .unwrap_err();
        match err {
            SyncError::Api { code, message } => {
                assert_eq!(code, 17);
                assert_eq!(message, "unknown tag");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn error_takes_precedence_over_result() {
        // The two fields are supposed to be exclusive; if a server sends both,
        // failure wins and no artifact name escapes.
        let err = classify_response(&json!({
            "result": "cfg-1",
            "error": {"code": 1, "message": "boom"}
        }))
        .unwrap_err();
        assert!(matches!(err, SyncError::Api { code: 1, .. }));
    }

    #[test]
    fn missing_both_fields_is_malformed() {
        let err = classify_response(&json!({"status": "ok"})).unwrap_err();
        assert!(matches!(err, SyncError::MalformedResponse));
    }

    #[test]
    fn empty_or_non_string_result_is_malformed() {
        assert!(matches!(
            classify_response(&json!({"result": ""})).unwrap_err(),
            SyncError::MalformedResponse
        ));
        assert!(matches!(
            classify_response(&json!({"result": 7})).unwrap_err(),
            SyncError::MalformedResponse
        ));
    }

    #[test]
    fn error_without_fields_still_fails_cleanly() {
        let err = classify_response(&json!({"error": {}})).unwrap_err();
        match err {
            SyncError::Api { code, .. } => assert_eq!(code, -1),
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn apply_outcome_maps_exit_codes() {
        assert!(ApplyOutcome::from_exit_code(0).success);
        let failed = ApplyOutcome::from_exit_code(2);
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(2));
    }
}

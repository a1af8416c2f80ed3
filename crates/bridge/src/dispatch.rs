//! Invocation dispatcher: lookup, optional input validation, forward, envelope.

use crate::backend::Backend;
use crate::error::{BridgeError, Result};
use crate::registry::{ToolId, ToolRegistry};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Success half of the invocation envelope.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvocationSuccess {
    pub tool: String,
    pub result: Value,
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    backend: Arc<dyn Backend>,
    /// Compiled input schemas; `None` means payloads are forwarded unchecked.
    validators: Option<HashMap<ToolId, jsonschema::Validator>>,
}

impl Dispatcher {
    /// Dispatcher that forwards payloads as-is.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, backend: Arc<dyn Backend>) -> Self {
        Self {
            registry,
            backend,
            validators: None,
        }
    }

    /// Dispatcher that rejects payloads violating the tool's `inputSchema` before forwarding.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if any registered input schema is not a valid JSON Schema.
    pub fn with_input_validation(
        registry: Arc<ToolRegistry>,
        backend: Arc<dyn Backend>,
    ) -> Result<Self> {
        let mut validators = HashMap::new();
        for tool in registry.list_tools() {
            let compiled = jsonschema::validator_for(&tool.input_schema).map_err(|e| {
                BridgeError::Config(format!("invalid inputSchema for tool '{}': {e}", tool.name))
            })?;
            validators.insert(tool.id, compiled);
        }
        Ok(Self {
            registry,
            backend,
            validators: Some(validators),
        })
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    #[must_use]
    pub fn validates_input(&self) -> bool {
        self.validators.is_some()
    }

    /// Invoke `tool_name` with the raw request body.
    ///
    /// # Errors
    ///
    /// - `UnknownTool` if the name is not registered (checked before the body is looked at)
    /// - `InvalidBody` if the body is not a JSON object
    /// - `InvalidInput` if validation is enabled and the payload violates the schema
    /// - `BackendUnavailable` if the backend call fails
    pub async fn invoke(&self, tool_name: &str, body: &[u8]) -> Result<InvocationSuccess> {
        tracing::info!(
            tool = %tool_name,
            payload = %String::from_utf8_lossy(body),
            "invoke"
        );

        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| BridgeError::UnknownTool(tool_name.to_string()))?
            .id;

        let payload = parse_payload(body)?;
        self.validate(tool, &payload)?;

        match self.backend.forward(tool, &payload).await {
            Ok(result) => Ok(InvocationSuccess {
                tool: tool_name.to_string(),
                result,
            }),
            Err(e) => {
                tracing::error!(tool = %tool, error = %e, "error invoking backend");
                Err(e)
            }
        }
    }

    fn validate(&self, tool: ToolId, payload: &Value) -> Result<()> {
        let Some(validator) = self.validators.as_ref().and_then(|v| v.get(&tool)) else {
            return Ok(());
        };

        let errors: Vec<String> = validator
            .iter_errors(payload)
            .map(|e| {
                let path = e.instance_path().to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();

        if errors.is_empty() {
            return Ok(());
        }
        Err(BridgeError::InvalidInput {
            tool: tool.name().to_string(),
            details: errors.join("; "),
        })
    }
}

/// Parse a request body into a JSON object; an empty (or whitespace-only) body is `{}`.
fn parse_payload(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| BridgeError::InvalidBody(e.to_string()))?;
    if !payload.is_object() {
        return Err(BridgeError::InvalidBody(
            "payload must be a JSON object".to_string(),
        ));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records forwarded calls and answers with a canned outcome.
    struct FakeBackend {
        calls: Mutex<Vec<(ToolId, Value)>>,
        fail: bool,
    }

    impl FakeBackend {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn calls(&self) -> Vec<(ToolId, Value)> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn forward(&self, tool: ToolId, payload: &Value) -> Result<Value> {
            self.calls.lock().expect("lock").push((tool, payload.clone()));
            if self.fail {
                return Err(BridgeError::BackendUnavailable(
                    "connection refused".to_string(),
                ));
            }
            Ok(json!({"status": "confirmed"}))
        }
    }

    fn dispatcher(backend: Arc<FakeBackend>) -> Dispatcher {
        Dispatcher::new(Arc::new(ToolRegistry::builtin()), backend)
    }

    #[tokio::test]
    async fn forwards_to_backend_and_wraps_result() {
        let backend = FakeBackend::new(false);
        let d = dispatcher(backend.clone());

        let out = d
            .invoke("retrieveAppointment", br#"{"appointmentId":"123"}"#)
            .await
            .expect("invoke");

        assert_eq!(
            out,
            InvocationSuccess {
                tool: "retrieveAppointment".to_string(),
                result: json!({"status": "confirmed"}),
            }
        );
        assert_eq!(
            backend.calls(),
            vec![(ToolId::RetrieveAppointment, json!({"appointmentId": "123"}))]
        );
    }

    #[tokio::test]
    async fn unknown_tool_wins_over_bad_body() {
        let backend = FakeBackend::new(false);
        let d = dispatcher(backend.clone());

        let err = d.invoke("doesNotExist", b"{not json").await.unwrap_err();
        assert!(matches!(err, BridgeError::UnknownTool(n) if n == "doesNotExist"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_body_is_an_empty_object() {
        let backend = FakeBackend::new(false);
        let d = dispatcher(backend.clone());

        d.invoke("retrieveAppointment", b"").await.expect("invoke");
        assert_eq!(backend.calls()[0].1, json!({}));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let backend = FakeBackend::new(false);
        let d = dispatcher(backend.clone());

        let err = d
            .invoke("retrieveAppointment", b"{\"appointmentId\":")
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidBody(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn non_object_payloads_are_rejected() {
        let backend = FakeBackend::new(false);
        let d = dispatcher(backend.clone());

        for body in ["null", "5", r#""x""#, "[1]", "true"] {
            let err = d
                .invoke("retrieveAppointment", body.as_bytes())
                .await
                .unwrap_err();
            assert!(
                matches!(&err, BridgeError::InvalidBody(m) if m == "payload must be a JSON object"),
                "{body}: {err}"
            );
        }
        assert!(backend.calls().is_empty());

        // Unknown tools still win over a non-object body.
        let err = d.invoke("doesNotExist", b"5").await.unwrap_err();
        assert!(matches!(err, BridgeError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn incomplete_payload_is_forwarded_without_validation() {
        let backend = FakeBackend::new(false);
        let d = dispatcher(backend.clone());
        assert!(!d.validates_input());

        d.invoke("modifyAppointment", br#"{"appointmentId":"1"}"#)
            .await
            .expect("invoke");
        assert_eq!(
            backend.calls(),
            vec![(ToolId::ModifyAppointment, json!({"appointmentId": "1"}))]
        );
    }

    #[tokio::test]
    async fn validation_rejects_incomplete_payload_before_forwarding() {
        let backend = FakeBackend::new(false);
        let d = Dispatcher::with_input_validation(
            Arc::new(ToolRegistry::builtin()),
            backend.clone(),
        )
        .expect("schemas compile");

        let err = d
            .invoke("modifyAppointment", br#"{"appointmentId":"1"}"#)
            .await
            .unwrap_err();
        match err {
            BridgeError::InvalidInput { tool, details } => {
                assert_eq!(tool, "modifyAppointment");
                assert!(details.contains("appointmentDate"), "{details}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(backend.calls().is_empty());

        d.invoke(
            "modifyAppointment",
            br#"{"appointmentId":"1","appointmentDate":"2025-01-02","appointmentTime":"10:00"}"#,
        )
        .await
        .expect("valid payload is forwarded");
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let d = dispatcher(FakeBackend::new(true));
        let err = d
            .invoke("retrieveAppointment", br#"{"appointmentId":"123"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::BackendUnavailable(m) if m == "connection refused"));
    }
}

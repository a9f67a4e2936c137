//! Execution engine: result types, wire format and the remote executor.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RunError;

pub mod controller;
pub mod remote;

pub use controller::{invoke, InvocationController, RunOutcome, RunPhase, RunTicket};
pub use remote::RemoteExecutor;

/// A named value returned by a run, tagged by how it should be displayed.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// HTML table markup, possibly entity-escaped.
    Table(String),
    /// Base64-encoded image bytes (PNG by convention).
    Image(String),
    Text(Value),
    Other { kind: String, content: Value },
}

impl Artifact {
    pub fn kind(&self) -> &str {
        match self {
            Artifact::Table(_) => "table",
            Artifact::Image(_) => "image",
            Artifact::Text(_) => "text",
            Artifact::Other { kind, .. } => kind,
        }
    }
}

/// `{ "type": ..., "content": ... }` as sent by the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireArtifact {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: Value,
}

impl From<WireArtifact> for Artifact {
    fn from(w: WireArtifact) -> Self {
        match w.kind.as_str() {
            "table" => Artifact::Table(value_to_string(w.content)),
            "image" => Artifact::Image(value_to_string(w.content)),
            "text" => Artifact::Text(w.content),
            _ => Artifact::Other { kind: w.kind, content: w.content },
        }
    }
}

impl From<&Artifact> for WireArtifact {
    fn from(a: &Artifact) -> Self {
        let content = match a {
            Artifact::Table(s) | Artifact::Image(s) => Value::String(s.clone()),
            Artifact::Text(v) | Artifact::Other { content: v, .. } => v.clone(),
        };
        WireArtifact { kind: a.kind().to_string(), content }
    }
}

fn value_to_string(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Response body of `POST /api/run_code/{session}/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireResponse {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub variables: Option<BTreeMap<String, WireArtifact>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    /// Console output, trimmed.
    pub output: String,
    pub variables: BTreeMap<String, Artifact>,
}

impl From<WireResponse> for ExecutionResult {
    fn from(w: WireResponse) -> Self {
        ExecutionResult {
            output: w.output.map(|s| s.trim().to_string()).unwrap_or_default(),
            variables: w
                .variables
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, Artifact::from(v)))
                .collect(),
        }
    }
}

impl ExecutionResult {
    pub fn to_wire(&self) -> WireResponse {
        WireResponse {
            output: Some(self.output.clone()),
            variables: Some(
                self.variables
                    .iter()
                    .map(|(k, v)| (k.clone(), WireArtifact::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Something that can run code for a session and return its result.
pub trait Executor {
    fn execute(
        &self,
        code: &str,
        session_id: &str,
    ) -> impl Future<Output = Result<ExecutionResult, RunError>> + Send;
}

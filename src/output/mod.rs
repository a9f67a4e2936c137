//! Output reconciliation: the latest run result and the user's variable selection.
//!
//! Console output, the variable mapping and the selection only change together,
//! through `begin_run`, `apply`, `fail`, `select` and `deselect`. A new result always
//! starts with an empty selection, so a name from an older run is never shown
//! against a newer mapping.

use std::collections::BTreeMap;

use crate::execution::{Artifact, ExecutionResult};

pub mod render;

pub use render::{ArtifactView, ImageInfo};

/// Id the view scrolls to after a selection. It is the variable name.
pub type ScrollAnchor = String;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputState {
    output: String,
    variables: BTreeMap<String, Artifact>,
    selected: Vec<String>,
}

impl OutputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State restored from storage: console text only, no mapping to select from.
    pub fn with_output(output: impl Into<String>) -> Self {
        Self { output: output.into(), ..Self::default() }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn variables(&self) -> &BTreeMap<String, Artifact> {
        &self.variables
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    /// Whether there is anything to show in the output pane.
    pub fn has_content(&self) -> bool {
        !self.output.is_empty() || !self.variables.is_empty()
    }

    /// A run was started: blank the console and drop the selection.
    pub fn begin_run(&mut self) {
        self.output.clear();
        self.selected.clear();
    }

    /// Replace everything with a fresh result.
    pub fn apply(&mut self, result: ExecutionResult) {
        self.output = result.output;
        self.variables = result.variables;
        self.selected.clear();
    }

    /// Replace everything with a failure message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.output = message.into();
        self.variables.clear();
        self.selected.clear();
    }

    /// Append `name` to the selection if it is a current variable and not already selected.
    /// Returns the anchor to scroll to, or `None` when `name` is unknown.
    pub fn select(&mut self, name: &str) -> Option<ScrollAnchor> {
        if !self.variables.contains_key(name) {
            return None;
        }
        if !self.is_selected(name) {
            self.selected.push(name.to_string());
        }
        Some(name.to_string())
    }

    pub fn deselect(&mut self, name: &str) {
        self.selected.retain(|s| s != name);
    }

    /// Selected entries in display order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.selected
            .iter()
            .filter_map(|name| self.variables.get(name).map(|a| (name.as_str(), a)))
    }

    /// Position of `anchor` among the selected entries.
    pub fn anchor_index(&self, anchor: &str) -> Option<usize> {
        self.selected.iter().position(|s| s == anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(names: &[&str]) -> ExecutionResult {
        ExecutionResult {
            output: "ok".into(),
            variables: names
                .iter()
                .map(|n| (n.to_string(), Artifact::Text(json!(n))))
                .collect(),
        }
    }

    fn assert_selection_is_subset(state: &OutputState) {
        for name in state.selected() {
            assert!(state.variables().contains_key(name), "{name} not in mapping");
        }
    }

    #[test]
    fn test_select_only_known_names_once() {
        let mut state = OutputState::new();
        state.apply(result(&["a", "b"]));
        assert_eq!(state.select("a").as_deref(), Some("a"));
        assert_eq!(state.select("a").as_deref(), Some("a"));
        assert_eq!(state.select("zzz"), None);
        assert_eq!(state.selected(), ["a"]);
        assert_selection_is_subset(&state);
    }

    #[test]
    fn test_deselect_then_select_moves_to_end() {
        let mut state = OutputState::new();
        state.apply(result(&["a", "b", "c"]));
        state.select("a");
        state.select("b");
        state.select("c");
        state.deselect("a");
        state.select("a");
        assert_eq!(state.selected(), ["b", "c", "a"]);
        state.deselect("missing");
        assert_eq!(state.selected(), ["b", "c", "a"]);
    }

    #[test]
    fn test_new_result_clears_selection() {
        let mut state = OutputState::new();
        state.apply(result(&["a", "b"]));
        state.select("a");
        state.select("b");
        state.apply(result(&["a"]));
        assert!(state.selected().is_empty());
        assert_selection_is_subset(&state);
    }

    #[test]
    fn test_failure_empties_mapping() {
        let mut state = OutputState::new();
        state.apply(result(&["a"]));
        state.select("a");
        state.fail("Server error: Internal Server Error");
        assert_eq!(state.output(), "Server error: Internal Server Error");
        assert!(state.variables().is_empty());
        assert!(state.selected().is_empty());
        assert!(state.has_content());
    }

    #[test]
    fn test_begin_run_blanks_output_and_selection() {
        let mut state = OutputState::new();
        state.apply(result(&["a"]));
        state.select("a");
        state.begin_run();
        assert_eq!(state.output(), "");
        assert!(state.selected().is_empty());
        assert!(state.variables().contains_key("a"));
    }

    #[test]
    fn test_text_variable_entry() {
        let wire = serde_json::from_value::<crate::execution::WireResponse>(json!({
            "output": "5\n",
            "variables": {"x": {"type": "text", "content": "5"}}
        }))
        .unwrap();
        let mut state = OutputState::new();
        state.apply(ExecutionResult::from(wire));
        let anchor = state.select("x").unwrap();
        assert_eq!(anchor, "x");
        let (name, artifact) = state.entries().next().unwrap();
        assert_eq!(name, "x");
        assert_eq!(ArtifactView::from_artifact(artifact), ArtifactView::Text("\"5\"".into()));
        assert_eq!(state.anchor_index("x"), Some(0));
    }
}

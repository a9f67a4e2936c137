//! Printers for headless runs: colored text and JSON.

use std::io::{self, Write};

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::execution::ExecutionResult;
use crate::output::{ArtifactView, OutputState};

pub struct TextPrinter {
    pub color: bool,
}

impl TextPrinter {
    pub fn print(&self, state: &OutputState) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write(&mut out, state)?;
        out.flush()?;
        Ok(())
    }

    pub fn write(&self, out: &mut impl Write, state: &OutputState) -> Result<()> {
        if !state.output().is_empty() {
            writeln!(out, "{}", self.heading("Console Output:"))?;
            writeln!(out, "{}", state.output())?;
        }

        if !state.variables().is_empty() {
            let names: Vec<&str> = state.variable_names().collect();
            writeln!(out, "{} {}", self.heading("Variables:"), names.join(", "))?;
        }

        for (name, artifact) in state.entries() {
            writeln!(out)?;
            let header = format!("{} ({})", name, artifact.kind());
            if self.color {
                writeln!(out, "{}", header.green().bold())?;
            } else {
                writeln!(out, "{}", header)?;
            }
            for line in ArtifactView::from_artifact(artifact).to_lines() {
                writeln!(out, "{}", line)?;
            }
        }
        Ok(())
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }
}

pub struct JsonPrinter;

impl JsonPrinter {
    pub fn print(&self, result: &ExecutionResult) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write(&mut out, result)?;
        out.flush()?;
        Ok(())
    }

    /// A failed run in the same shape: the message as `output`, no variables.
    pub fn print_failure(&self, message: &str) -> Result<()> {
        self.print(&failure_result(message))
    }

    pub fn write(&self, out: &mut impl Write, result: &ExecutionResult) -> Result<()> {
        writeln!(out, "{}", serde_json::to_string_pretty(&result.to_wire())?)?;
        Ok(())
    }
}

fn failure_result(message: &str) -> ExecutionResult {
    ExecutionResult { output: message.to_string(), ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::Artifact;
    use serde_json::json;

    #[test]
    fn test_plain_output_lists_selected_entries() {
        let mut state = OutputState::new();
        let mut result = ExecutionResult { output: "Done and dusted".into(), ..Default::default() };
        result.variables.insert("x".into(), Artifact::Text(json!("5")));
        result.variables.insert("y".into(), Artifact::Text(json!([1])));
        state.apply(result);
        state.select("x");

        let mut buf = Vec::new();
        TextPrinter { color: false }.write(&mut buf, &state).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Console Output:\nDone and dusted\nVariables: x, y\n\nx (text)\n\"5\"\n"
        );
    }

    #[test]
    fn test_json_failure_keeps_response_shape() {
        let mut buf = Vec::new();
        JsonPrinter
            .write(&mut buf, &failure_result("Server error: Internal Server Error"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            value,
            json!({"output": "Server error: Internal Server Error", "variables": {}})
        );
    }

    #[test]
    fn test_empty_state_prints_nothing() {
        let mut buf = Vec::new();
        TextPrinter { color: false }.write(&mut buf, &OutputState::new()).unwrap();
        assert!(buf.is_empty());
    }
}

//! Notebook entries supplied by the caller: data files and the lesson identifier.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the notebook collection. Only `type == "data"` entries are files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotebookEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content: Option<String>,
}

/// Read-only view of a data entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFile {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct Notebook {
    entries: Vec<NotebookEntry>,
    data_files: Vec<DataFile>,
}

impl Notebook {
    pub fn new(entries: Vec<NotebookEntry>) -> Self {
        let data_files = entries
            .iter()
            .filter(|e| e.kind == "data")
            .map(|e| DataFile {
                title: e.title.clone(),
                content: e.file_content.clone().unwrap_or_default(),
            })
            .collect();
        Self { entries, data_files }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<NotebookEntry> =
            serde_json::from_str(text).context("notebook must be a JSON array of entries")?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read notebook {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn entries(&self) -> &[NotebookEntry] {
        &self.entries
    }

    pub fn data_files(&self) -> &[DataFile] {
        &self.data_files
    }

    /// First lesson identifier found in the collection, as a path segment.
    pub fn session_id(&self) -> Option<String> {
        self.entries
            .iter()
            .filter_map(|e| e.lesson_number.as_ref())
            .find_map(lesson_to_string)
    }
}

fn lesson_to_string(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"type": "markdown", "title": "Intro", "lesson_number": 200},
        {"type": "data", "title": "sales.csv", "file_content": "<table><tr><td>1</td></tr></table>"},
        {"type": "data", "title": "test2.xlsx"}
    ]"#;

    #[test]
    fn test_data_files_are_the_tagged_subset() {
        let nb = Notebook::from_json(SAMPLE).unwrap();
        let titles: Vec<_> = nb.data_files().iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["sales.csv", "test2.xlsx"]);
        assert_eq!(nb.data_files()[1].content, "");
        assert_eq!(nb.entries().len(), 3);
    }

    #[test]
    fn test_session_id_from_number_or_string() {
        let nb = Notebook::from_json(SAMPLE).unwrap();
        assert_eq!(nb.session_id().as_deref(), Some("200"));

        let nb = Notebook::from_json(r#"[{"type":"data","title":"a"},{"lesson_number":" 12 "}]"#).unwrap();
        assert_eq!(nb.session_id().as_deref(), Some("12"));
    }

    #[test]
    fn test_missing_session_id() {
        assert_eq!(Notebook::default().session_id(), None);
        let nb = Notebook::from_json(r#"[{"type":"data","title":"a","lesson_number":null}]"#).unwrap();
        assert_eq!(nb.session_id(), None);
        let nb = Notebook::from_json(r#"[{"lesson_number":""}]"#).unwrap();
        assert_eq!(nb.session_id(), None);
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(Notebook::from_json(r#"{"type":"data"}"#).is_err());
    }
}

//! Per-artifact display dispatch.

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Value;

use crate::execution::Artifact;
use crate::html::{self, HtmlTable};

/// Decoded image payload plus what we could learn from its header.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub format: Option<String>,
    pub dimensions: Option<(u32, u32)>,
    pub bytes: Vec<u8>,
}

impl ImageInfo {
    pub fn decode(b64: &str) -> Result<Self> {
        // Tolerate a data URL prefix and wrapped lines.
        let payload = b64
            .trim()
            .split_once("base64,")
            .map(|(_, rest)| rest)
            .unwrap_or(b64.trim());
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64.decode(compact).context("image content is not valid base64")?;

        let reader = image::ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
        let format = reader.format().map(|f| format!("{:?}", f).to_uppercase());
        let dimensions = reader.into_dimensions().ok();
        Ok(Self { format, dimensions, bytes })
    }

    pub fn extension(&self) -> &str {
        match self.format.as_deref() {
            Some("JPEG") => "jpg",
            Some("GIF") => "gif",
            _ => "png",
        }
    }

    /// One-line description, e.g. `PNG image 1200x600, 45.2 KiB`.
    pub fn summary(&self) -> String {
        let format = self.format.as_deref().unwrap_or("unknown");
        let size = human_size(self.bytes.len());
        match self.dimensions {
            Some((w, h)) => format!("{} image {}x{}, {}", format, w, h, size),
            None => format!("{} image, {}", format, size),
        }
    }

    /// Write the bytes to `dir/<name>.<ext>` and return the path.
    pub fn save(&self, dir: &Path, name: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let file_name: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        let path = dir.join(format!("{}.{}", file_name, self.extension()));
        fs::write(&path, &self.bytes).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn human_size(n: usize) -> String {
    if n < 1024 {
        format!("{} B", n)
    } else if n < 1024 * 1024 {
        format!("{:.1} KiB", n as f64 / 1024.0)
    } else {
        format!("{:.1} MiB", n as f64 / (1024.0 * 1024.0))
    }
}

/// How one selected artifact is shown.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactView {
    Table(Vec<HtmlTable>),
    /// Table content with no `<table>` in it.
    Markup(String),
    Image(ImageInfo),
    InvalidImage(String),
    Text(String),
}

impl ArtifactView {
    pub fn from_artifact(artifact: &Artifact) -> Self {
        match artifact {
            Artifact::Table(markup) => {
                let tables = html::extract_tables(markup);
                if tables.is_empty() {
                    ArtifactView::Markup(html::to_text(markup))
                } else {
                    ArtifactView::Table(tables)
                }
            }
            Artifact::Image(b64) => match ImageInfo::decode(b64) {
                Ok(info) => ArtifactView::Image(info),
                Err(e) => ArtifactView::InvalidImage(format!("{:#}", e)),
            },
            Artifact::Text(v) | Artifact::Other { content: v, .. } => {
                ArtifactView::Text(display_value(v))
            }
        }
    }

    /// Plain-text lines for headless printing.
    pub fn to_lines(&self) -> Vec<String> {
        match self {
            ArtifactView::Table(tables) => {
                let mut lines = Vec::new();
                for (i, t) in tables.iter().enumerate() {
                    if i > 0 {
                        lines.push(String::new());
                    }
                    lines.extend(format_table(t));
                }
                lines
            }
            ArtifactView::Markup(text) | ArtifactView::Text(text) => {
                text.lines().map(str::to_string).collect()
            }
            ArtifactView::Image(info) => vec![info.summary()],
            ArtifactView::InvalidImage(err) => vec![format!("(unreadable image: {})", err)],
        }
    }
}

/// Pretty-printed JSON, strings and `null` included.
pub fn display_value(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Column widths for a table, measured in terminal cells.
pub fn column_widths(table: &HtmlTable) -> Vec<usize> {
    let mut widths = vec![0usize; table.column_count()];
    for row in std::iter::once(&table.headers).chain(table.rows.iter()) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(unicode_width::UnicodeWidthStr::width(cell.as_str()));
        }
    }
    widths
}

/// Fixed-width text rendering of a table.
pub fn format_table(table: &HtmlTable) -> Vec<String> {
    let widths = column_widths(table);
    let fmt_row = |row: &[String]| -> String {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let pad = w.saturating_sub(unicode_width::UnicodeWidthStr::width(cell));
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect();
        cells.join(" | ").trim_end().to_string()
    };

    let mut lines = Vec::new();
    if !table.headers.is_empty() {
        lines.push(fmt_row(&table.headers));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
    }
    lines.extend(table.rows.iter().map(|r| fmt_row(r)));
    lines
}

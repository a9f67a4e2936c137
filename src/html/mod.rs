//! Just enough HTML handling to show table artifacts and data-file previews in a terminal.
//!
//! Tables come from pandas `to_html`, sometimes entity-escaped. We decode the escaped
//! form, then pull `<table>` rows and cells out with a small tag scanner. Anything that
//! is not a table is reduced to its text.

/// A table pulled out of HTML markup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HtmlTable {
    /// Number of columns needed to hold the widest row.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }
}

/// Decode entity-escaped markup (`&lt;table&gt;...`) into markup.
/// Markup that already contains tags is returned unchanged.
pub fn decode_escaped(html: &str) -> String {
    let trimmed = html.trim_start();
    if trimmed.starts_with('<') || !html.contains("&lt;") {
        return html.to_string();
    }
    decode_entities(html)
}

/// Decode HTML entities in text.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    htmlescape::decode_html(text).unwrap_or_else(|_| decode_common_entities(text))
}

// Used when the strict decoder rejects stray ampersands.
fn decode_common_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&amp;", "&")
}

enum Token<'a> {
    Open(String),
    Close(String),
    Text(&'a str),
}

/// Split markup into open tags, close tags and text. Comments are dropped.
fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = html;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix("<!--") {
            rest = match stripped.find("-->") {
                Some(end) => &stripped[end + 3..],
                None => "",
            };
            continue;
        }
        if rest.starts_with('<') {
            let Some(end) = rest.find('>') else {
                tokens.push(Token::Text(rest));
                break;
            };
            let inner = rest[1..end].trim();
            rest = &rest[end + 1..];
            if let Some(name) = inner.strip_prefix('/') {
                tokens.push(Token::Close(tag_name(name)));
            } else if !inner.starts_with('!') && !inner.starts_with('?') {
                tokens.push(Token::Open(tag_name(inner)));
            }
            continue;
        }
        let end = rest.find('<').unwrap_or(rest.len());
        tokens.push(Token::Text(&rest[..end]));
        rest = &rest[end..];
    }
    tokens
}

fn tag_name(inner: &str) -> String {
    inner
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract every `<table>` in the markup. Escaped markup is decoded first.
pub fn extract_tables(html: &str) -> Vec<HtmlTable> {
    let html = decode_escaped(html);
    let mut tables = Vec::new();

    let mut table: Option<HtmlTable> = None;
    let mut in_thead = false;
    let mut row: Option<(Vec<String>, bool)> = None; // cells, all header cells
    let mut cell: Option<(String, bool)> = None; // text, is <th>

    for token in tokenize(&html) {
        match token {
            Token::Open(name) => match name.as_str() {
                "table" => {
                    table = Some(HtmlTable::default());
                    in_thead = false;
                }
                "thead" => in_thead = true,
                "tbody" => in_thead = false,
                "tr" if table.is_some() => row = Some((Vec::new(), true)),
                "td" | "th" if row.is_some() => {
                    // Previous cell left unclosed.
                    if let (Some((text, was_header)), Some((cells, all_header))) =
                        (cell.take(), row.as_mut())
                    {
                        cells.push(collapse_whitespace(&decode_entities(&text)));
                        *all_header &= was_header;
                    }
                    cell = Some((String::new(), name == "th"));
                }
                "br" => {
                    if let Some((text, _)) = cell.as_mut() {
                        text.push(' ');
                    }
                }
                _ => {}
            },
            Token::Close(name) => match name.as_str() {
                "td" | "th" => {
                    if let (Some((text, is_header)), Some((cells, all_header))) =
                        (cell.take(), row.as_mut())
                    {
                        cells.push(collapse_whitespace(&decode_entities(&text)));
                        *all_header &= is_header;
                    }
                }
                "tr" => {
                    if let (Some((text, is_header)), Some((cells, all_header))) =
                        (cell.take(), row.as_mut())
                    {
                        cells.push(collapse_whitespace(&decode_entities(&text)));
                        *all_header &= is_header;
                    }
                    if let (Some((cells, all_header)), Some(t)) = (row.take(), table.as_mut()) {
                        if cells.is_empty() {
                            continue;
                        }
                        let is_header_row = in_thead || (all_header && t.rows.is_empty());
                        if is_header_row && t.headers.is_empty() {
                            t.headers = cells;
                        } else {
                            t.rows.push(cells);
                        }
                    }
                }
                "thead" => in_thead = false,
                "table" => {
                    if let Some(t) = table.take() {
                        tables.push(t);
                    }
                    row = None;
                    cell = None;
                }
                _ => {}
            },
            Token::Text(text) => {
                if let Some((buf, _)) = cell.as_mut() {
                    buf.push_str(text);
                }
            }
        }
    }

    // Unterminated table: keep what we have.
    if let Some(t) = table {
        if !t.headers.is_empty() || !t.rows.is_empty() {
            tables.push(t);
        }
    }
    tables
}

/// Visible text of the markup, one line per block element.
pub fn to_text(html: &str) -> String {
    let html = decode_escaped(html);
    let mut out = String::new();
    for token in tokenize(&html) {
        match token {
            Token::Text(t) => {
                let t = collapse_whitespace(&decode_entities(t));
                if !t.is_empty() {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push(' ');
                    }
                    out.push_str(&t);
                }
            }
            Token::Open(name) | Token::Close(name) => {
                if matches!(
                    name.as_str(),
                    "br" | "p" | "div" | "tr" | "li" | "h1" | "h2" | "h3" | "h4" | "pre"
                ) && !out.is_empty()
                    && !out.ends_with('\n')
                {
                    out.push('\n');
                }
            }
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANDAS: &str = r#"<table border="1" class="dataframe">
  <thead>
    <tr style="text-align: right;">
      <th></th>
      <th>Category</th>
      <th>Values</th>
    </tr>
  </thead>
  <tbody>
    <tr>
      <th>0</th>
      <td>Category_1</td>
      <td>61</td>
    </tr>
    <tr>
      <th>1</th>
      <td>A &amp; B</td>
      <td>24</td>
    </tr>
  </tbody>
</table>"#;

    #[test]
    fn test_extract_pandas_table() {
        let tables = extract_tables(PANDAS);
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.headers, vec!["", "Category", "Values"]);
        assert_eq!(t.rows, vec![vec!["0", "Category_1", "61"], vec!["1", "A & B", "24"]]);
        assert_eq!(t.column_count(), 3);
    }

    #[test]
    fn test_escaped_table_is_decoded_first() {
        let escaped = "&lt;table&gt;&lt;tr&gt;&lt;th&gt;a&lt;/th&gt;&lt;/tr&gt;&lt;tr&gt;&lt;td&gt;1&lt;/td&gt;&lt;/tr&gt;&lt;/table&gt;";
        assert!(decode_escaped(escaped).starts_with("<table>"));
        let tables = extract_tables(escaped);
        assert_eq!(tables[0].headers, vec!["a"]);
        assert_eq!(tables[0].rows, vec![vec!["1"]]);
    }

    #[test]
    fn test_raw_markup_is_left_alone() {
        let raw = "<p>x &lt; y</p>";
        assert_eq!(decode_escaped(raw), raw);
        assert_eq!(to_text(raw), "x < y");
    }

    #[test]
    fn test_table_without_header_row() {
        let tables = extract_tables("<table><tr><td>1</td><td>2</td></tr><tr><td>3</td></tr></table>");
        assert!(tables[0].headers.is_empty());
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].column_count(), 2);
    }

    #[test]
    fn test_unclosed_cells_and_table() {
        let tables = extract_tables("<table><tr><td>a<td>b</tr><tr><td>c");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_to_text_blocks() {
        let text = to_text("<div>Hello<br/>world</div><!-- hidden --><p>bye</p>");
        assert_eq!(text, "Hello\nworld\nbye");
    }

    #[test]
    fn test_stray_ampersand_does_not_fail() {
        assert_eq!(decode_entities("fish & chips &amp; peas"), "fish & chips & peas");
    }
}

//! Marks well-known library names in a line of source.

const LIBRARIES: &[&str] = &[
    "pandas",
    "numpy",
    "matplotlib",
    "seaborn",
    "scipy",
    "sklearn",
    "tensorflow",
    "torch",
    "requests",
    "json",
    "sys",
    "os",
    "re",
    "pd",
    "matplotlib.pyplot",
    "plt",
];

pub fn is_library(word: &str) -> bool {
    LIBRARIES.contains(&word)
}

/// Split a line into `(segment, is_library)` pieces, covering the whole line.
/// Words are whitespace-separated; `plt.plot(` does not count as `plt`.
pub fn split_library_words(line: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut word_start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                push_word(line, start, i, &mut plain_start, &mut out);
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        push_word(line, start, line.len(), &mut plain_start, &mut out);
    }
    if plain_start < line.len() {
        out.push((&line[plain_start..], false));
    }
    out
}

// Emit the plain text before `line[start..end]` and the word itself when it is a library.
fn push_word<'a>(
    line: &'a str,
    start: usize,
    end: usize,
    plain_start: &mut usize,
    out: &mut Vec<(&'a str, bool)>,
) {
    let word = &line[start..end];
    if is_library(word) {
        if *plain_start < start {
            out.push((&line[*plain_start..start], false));
        }
        out.push((word, true));
        *plain_start = end;
    }
}

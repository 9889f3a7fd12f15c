//! Format-preserving model of a `.properties` file.
//!
//! A document is an ordered arena of [`Entry`] values plus a key → index side
//! map. Entries that are never touched keep the exact text they were parsed
//! from, so `serialize(parse(text)) == text` for every valid input.
//!
//! Supported syntax:
//! - `#` and `!` comment lines, blank lines
//! - `key=value`, `key: value` and `key value` pairs
//! - backslash continuation: a line ending in an odd number of backslashes
//!   continues on the next physical line (leading whitespace of the
//!   continuation line is not part of the value)
//!
//! Values are kept verbatim (escape sequences are not decoded). Continuation
//! lines are joined with `\n`, so a value containing `\n` renders as a
//! multi-line entry. Because nothing is escaped on output, [`PropertyDocument::put`]
//! refuses values that would not read back unchanged: a line starting with
//! whitespace, a line ending in an odd number of backslashes, or a carriage
//! return.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// One logical line-group of a properties file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Comment or blank line, stored with its line terminator.
    Trivia(String),
    /// Key/value pair, possibly spanning several physical lines.
    Pair(Pair),
}

impl Entry {
    fn render(&self) -> String {
        match self {
            Self::Trivia(raw) => raw.clone(),
            Self::Pair(pair) => pair.render(),
        }
    }

    fn is_terminated(&self) -> bool {
        match self {
            Self::Trivia(raw) => raw.is_empty() || raw.ends_with('\n'),
            Self::Pair(pair) => !pair.eol.is_empty(),
        }
    }

    fn terminate(&mut self, line_ending: &str) {
        match self {
            Self::Trivia(raw) => raw.push_str(line_ending),
            Self::Pair(pair) => {
                pair.eol = line_ending.to_string();
                if let Some(raw) = pair.raw.as_mut() {
                    raw.push_str(line_ending);
                }
            }
        }
    }
}

/// A key/value pair together with the formatting needed to reproduce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    key: String,
    value: String,
    /// Leading whitespace, key and separator of the first physical line.
    prefix: String,
    /// Leading whitespace used on continuation lines.
    indent: String,
    /// Terminator placed between continuation lines.
    line_break: String,
    /// Terminator of the last physical line (empty at end of file).
    eol: String,
    /// Original text; dropped once the value changes.
    raw: Option<String>,
    lines: usize,
}

impl Pair {
    /// Create a pair rendered in plain `key=value` form.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>, line_ending: &str) -> Self {
        let key = key.into();
        Self {
            prefix: format!("{key}="),
            key,
            value: value.into(),
            indent: String::new(),
            line_break: line_ending.to_string(),
            eol: line_ending.to_string(),
            raw: None,
            lines: 1,
        }
    }

    /// The key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The logical value (continuation lines joined with `\n`).
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the pair spans more than one line.
    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.lines > 1 || self.value.contains('\n')
    }

    /// Whether the pair still renders from its original text.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.raw.is_some()
    }

    fn set_value(&mut self, value: String) {
        if self.value != value {
            self.value = value;
            self.raw = None;
        }
    }

    fn render(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        let joint = format!("\\{}{}", self.line_break, self.indent);
        let body = self.value.split('\n').collect::<Vec<_>>().join(&joint);
        // an empty last line at end of file needs its terminator to exist
        let eol = if self.eol.is_empty() && self.value.ends_with('\n') {
            &self.line_break
        } else {
            &self.eol
        };
        format!("{}{}{}", self.prefix, body, eol)
    }
}

/// Ordered, format-preserving properties document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDocument {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    line_ending: String,
}

impl Default for PropertyDocument {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            line_ending: "\n".to_string(),
        }
    }
}

impl PropertyDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties text.
    ///
    /// # Errors
    ///
    /// Returns `MalformedProperties` if the last line ends with a
    /// continuation backslash.
    pub fn parse(text: &str) -> Result<Self> {
        let lines = split_lines(text);
        let mut doc = Self {
            line_ending: lines
                .iter()
                .map(|(_, eol)| *eol)
                .find(|eol| !eol.is_empty())
                .unwrap_or("\n")
                .to_string(),
            ..Self::default()
        };

        let mut i = 0;
        while i < lines.len() {
            let (content, eol) = lines[i];
            let trimmed = trim_leading(content);
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                doc.entries.push(Entry::Trivia(format!("{content}{eol}")));
                i += 1;
                continue;
            }

            let start = i;
            while continues(lines[i].0) {
                if i + 1 >= lines.len() {
                    return Err(Error::MalformedProperties {
                        line: i + 1,
                        message: "continuation backslash at end of file".to_string(),
                    });
                }
                i += 1;
            }
            let pair = parse_pair(&lines[start..=i]);
            doc.push_entry(Entry::Pair(pair));
            i += 1;
        }

        Ok(doc)
    }

    /// Render the document back to text.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.entries.iter().map(Entry::render).collect()
    }

    /// Value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pair(key).map(Pair::value)
    }

    /// The pair stored under `key`, if present.
    #[must_use]
    pub fn pair(&self, key: &str) -> Option<&Pair> {
        match self.index.get(key).map(|&i| &self.entries[i]) {
            Some(Entry::Pair(pair)) => Some(pair),
            _ => None,
        }
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Set the value for `key`.
    ///
    /// An existing key is updated in place (position and surrounding lines
    /// untouched, and its original text kept if the value is equal). A new
    /// key is appended after the last entry in plain `key=value` form.
    /// Returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if the value cannot be written so that it reads
    /// back unchanged.
    pub fn put(&mut self, key: &str, value: impl Into<String>) -> Result<Option<String>> {
        let value = value.into();
        check_writable(key, &value)?;
        if let Some(&i) = self.index.get(key) {
            if let Entry::Pair(pair) = &mut self.entries[i] {
                let old = pair.value.clone();
                pair.set_value(value);
                return Ok(Some(old));
            }
        }
        let pair = Pair::new(key, value, &self.line_ending);
        self.push_entry(Entry::Pair(pair));
        Ok(None)
    }

    /// Insert a pair with its formatting.
    ///
    /// Replaces the pair stored under the same key in place, or appends it
    /// at the end when the key is new.
    pub fn put_pair(&mut self, pair: Pair) {
        if let Some(&i) = self.index.get(&pair.key) {
            let mut entry = Entry::Pair(pair);
            if self.entries[i].is_terminated() && !entry.is_terminated() {
                entry.terminate(&self.line_ending);
            }
            self.entries[i] = entry;
        } else {
            self.push_entry(Entry::Pair(pair));
        }
    }

    /// Delete `key`. Remaining entries keep their relative order.
    ///
    /// Returns the removed value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let old = self.get(key).map(str::to_string)?;
        self.entries
            .retain(|entry| !matches!(entry, Entry::Pair(pair) if pair.key == key));
        self.reindex();
        Some(old)
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs().map(Pair::key)
    }

    /// Pairs in file order. When a key occurs more than once only the last
    /// occurrence (the effective one) is yielded.
    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.entries.iter().enumerate().filter_map(|(i, entry)| match entry {
            Entry::Pair(pair) if self.index.get(&pair.key) == Some(&i) => Some(pair),
            _ => None,
        })
    }

    /// All entries, comments included.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Drop earlier occurrences of repeated keys, keeping the effective one.
    ///
    /// Returns how many entries were removed.
    pub fn drop_shadowed(&mut self) -> usize {
        let before = self.entries.len();
        let index = &self.index;
        let mut position = 0;
        self.entries.retain(|entry| {
            let keep = match entry {
                Entry::Pair(pair) => index.get(&pair.key) == Some(&position),
                Entry::Trivia(_) => true,
            };
            position += 1;
            keep
        });
        self.reindex();
        before - self.entries.len()
    }

    /// Blank every value, keeping comments, blank lines and key order.
    pub fn blank_values(&mut self) {
        for entry in &mut self.entries {
            if let Entry::Pair(pair) = entry {
                pair.set_value(String::new());
            }
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the document holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Line terminator used for new entries.
    #[must_use]
    pub fn line_ending(&self) -> &str {
        &self.line_ending
    }

    fn push_entry(&mut self, entry: Entry) {
        let line_ending = self.line_ending.clone();
        if let Some(last) = self.entries.last_mut() {
            if !last.is_terminated() {
                last.terminate(&line_ending);
            }
        }
        if let Entry::Pair(pair) = &entry {
            self.index.insert(pair.key.clone(), self.entries.len());
        }
        self.entries.push(entry);
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            if let Entry::Pair(pair) = entry {
                self.index.insert(pair.key.clone(), i);
            }
        }
    }
}

/// Split into `(content, terminator)` pairs, keeping `\r\n` intact.
fn split_lines(text: &str) -> Vec<(&str, &str)> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find('\n') {
            Some(pos) => {
                let (content, eol) = if pos > 0 && rest.as_bytes()[pos - 1] == b'\r' {
                    (&rest[..pos - 1], &rest[pos - 1..=pos])
                } else {
                    (&rest[..pos], &rest[pos..=pos])
                };
                lines.push((content, eol));
                rest = &rest[pos + 1..];
            }
            None => {
                lines.push((rest, ""));
                rest = "";
            }
        }
    }
    lines
}

/// Reject values that would parse back differently.
fn check_writable(key: &str, value: &str) -> Result<()> {
    for line in value.split('\n') {
        let reason = if line.contains('\r') {
            "it contains a carriage return"
        } else if trim_leading(line).len() != line.len() {
            "a line starts with whitespace"
        } else if continues(line) {
            "a line ends with a single backslash"
        } else {
            continue;
        };
        return Err(Error::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        });
    }
    Ok(())
}

fn trim_leading(s: &str) -> &str {
    s.trim_start_matches([' ', '\t', '\x0c'])
}

/// A line continues when it ends in an odd number of backslashes.
fn continues(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

fn strip_continuation(line: &str) -> &str {
    if continues(line) { &line[..line.len() - 1] } else { line }
}

/// Offset where the key ends, honouring backslash escapes.
fn key_end(line: &str) -> usize {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if matches!(c, '=' | ':' | ' ' | '\t' | '\x0c') {
            return i;
        }
    }
    line.len()
}

/// Offset where the value starts, given the end of the key.
fn value_start(line: &str, from: usize) -> usize {
    let rest = &line[from..];
    let after_ws = rest.len() - trim_leading(rest).len();
    let mut pos = from + after_ws;
    if matches!(line[pos..].chars().next(), Some('=' | ':')) {
        pos += 1;
        pos += line[pos..].len() - trim_leading(&line[pos..]).len();
    }
    pos
}

fn parse_pair(lines: &[(&str, &str)]) -> Pair {
    let (first, first_eol) = lines[0];
    let first_body = strip_continuation(first);
    let lead = first_body.len() - trim_leading(first_body).len();
    let key_stop = lead + key_end(&first_body[lead..]);
    let start = value_start(first_body, key_stop);

    let mut segments = vec![first_body[start..].to_string()];
    let mut indent = String::new();
    for (n, (content, _)) in lines.iter().enumerate().skip(1) {
        let body = strip_continuation(content);
        let trimmed = trim_leading(body);
        if n == 1 {
            indent = body[..body.len() - trimmed.len()].to_string();
        }
        segments.push(trimmed.to_string());
    }

    let raw: String = lines.iter().map(|(c, e)| format!("{c}{e}")).collect();
    Pair {
        key: first_body[lead..key_stop].to_string(),
        value: segments.join("\n"),
        prefix: first_body[..start].to_string(),
        indent,
        line_break: first_eol.to_string(),
        eol: lines[lines.len() - 1].1.to_string(),
        raw: Some(raw),
        lines: lines.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Mail form\n\
                          ! legacy comment\n\
                          \n\
                          mail.subject = Contact form\n\
                          mail.body=Dear customer,\\\n    thank you.\\\n    Bye\n\
                          mail.to:office@example.com\n\
                          mail.cc   support\n";

    #[test]
    fn test_round_trip_preserves_bytes() {
        let doc = PropertyDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.serialize(), SAMPLE);
    }

    #[test]
    fn test_round_trip_crlf_and_missing_final_newline() {
        let text = "a=1\r\n# c\r\nb = two\\\r\n  lines";
        let doc = PropertyDocument::parse(text).unwrap();
        assert_eq!(doc.serialize(), text);
        assert_eq!(doc.get("b"), Some("two\nlines"));
        assert_eq!(doc.line_ending(), "\r\n");
    }

    #[test]
    fn test_separators() {
        let doc = PropertyDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.get("mail.subject"), Some("Contact form"));
        assert_eq!(doc.get("mail.to"), Some("office@example.com"));
        assert_eq!(doc.get("mail.cc"), Some("support"));
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_multiline_value() {
        let doc = PropertyDocument::parse(SAMPLE).unwrap();
        let pair = doc.pair("mail.body").unwrap();
        assert!(pair.is_multiline());
        assert_eq!(pair.value(), "Dear customer,\nthank you.\nBye");
    }

    #[test]
    fn test_escaped_separator_in_key() {
        let doc = PropertyDocument::parse("a\\=b=c\n").unwrap();
        assert_eq!(doc.get("a\\=b"), Some("c"));
    }

    #[test]
    fn test_even_backslashes_do_not_continue() {
        let doc = PropertyDocument::parse("path=C:\\\\\nnext=1\n").unwrap();
        assert_eq!(doc.get("path"), Some("C:\\\\"));
        assert_eq!(doc.get("next"), Some("1"));
    }

    #[test]
    fn test_unterminated_continuation_is_an_error() {
        let err = PropertyDocument::parse("a=1\nb=2\\").unwrap_err();
        assert!(matches!(err, Error::MalformedProperties { line: 2, .. }));
    }

    #[test]
    fn test_put_existing_keeps_formatting_of_others() {
        let mut doc = PropertyDocument::parse(SAMPLE).unwrap();
        let old = doc.put("mail.subject", "Inquiry").unwrap();
        assert_eq!(old.as_deref(), Some("Contact form"));
        let out = doc.serialize();
        assert_eq!(out, SAMPLE.replace("Contact form", "Inquiry"));
    }

    #[test]
    fn test_put_same_value_keeps_raw() {
        let mut doc = PropertyDocument::parse("k =  v\n").unwrap();
        doc.put("k", "v").unwrap();
        assert_eq!(doc.serialize(), "k =  v\n");
    }

    #[test]
    fn test_put_multiline_reuses_indent() {
        let mut doc = PropertyDocument::parse("k=a\\\n  b\n").unwrap();
        doc.put("k", "x\ny\nz").unwrap();
        assert_eq!(doc.serialize(), "k=x\\\n  y\\\n  z\n");
    }

    #[test]
    fn test_put_new_key_appends_plain() {
        let mut doc = PropertyDocument::parse("# head\na = 1\n").unwrap();
        assert!(doc.put("b", "2").unwrap().is_none());
        assert_eq!(doc.serialize(), "# head\na = 1\nb=2\n");
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_append_terminates_last_line() {
        let mut doc = PropertyDocument::parse("a=1").unwrap();
        doc.put("b", "2").unwrap();
        assert_eq!(doc.serialize(), "a=1\nb=2\n");
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut doc = PropertyDocument::parse("a=1\n# about b\nb=2\nc=3\n").unwrap();
        assert_eq!(doc.remove("b").as_deref(), Some("2"));
        assert_eq!(doc.serialize(), "a=1\n# about b\nc=3\n");
        assert_eq!(doc.get("c"), Some("3"));
        assert!(doc.remove("missing").is_none());
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let doc = PropertyDocument::parse("a=1\na=2\n").unwrap();
        assert_eq!(doc.get("a"), Some("2"));
        assert_eq!(doc.keys().count(), 1);
        assert_eq!(doc.serialize(), "a=1\na=2\n");
    }

    #[test]
    fn test_blank_values_keeps_layout() {
        let mut doc = PropertyDocument::parse("# c\na = 1\n\nb=2\n").unwrap();
        doc.blank_values();
        assert_eq!(doc.serialize(), "# c\na = \n\nb=\n");
    }

    #[test]
    fn test_empty_document() {
        let doc = PropertyDocument::parse("").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.serialize(), "");
    }

    #[test]
    fn test_put_rejects_values_that_would_not_read_back() {
        let mut doc = PropertyDocument::parse("path=x\nnext=Weiter\n").unwrap();
        for value in ["C:\\", "a\\\nb", " lead", "a\n  b", "a\rb"] {
            let err = doc.put("path", value).unwrap_err();
            assert!(matches!(err, Error::InvalidValue { .. }), "{value:?}");
        }
        assert_eq!(doc.serialize(), "path=x\nnext=Weiter\n");

        doc.put("path", "C:\\\\").unwrap();
        let reparsed = PropertyDocument::parse(&doc.serialize()).unwrap();
        assert_eq!(reparsed.get("path"), Some("C:\\\\"));
        assert_eq!(reparsed.get("next"), Some("Weiter"));
    }

    #[test]
    fn test_trailing_empty_line_at_end_of_file() {
        let mut doc = PropertyDocument::parse("k=v").unwrap();
        doc.put("k", "v\n").unwrap();
        let reparsed = PropertyDocument::parse(&doc.serialize()).unwrap();
        assert_eq!(reparsed.get("k"), Some("v\n"));
    }

    #[test]
    fn test_drop_shadowed_keeps_last_occurrence() {
        let mut doc = PropertyDocument::parse("# c\na=1\nb=2\na=3\n").unwrap();
        assert_eq!(doc.drop_shadowed(), 1);
        assert_eq!(doc.serialize(), "# c\nb=2\na=3\n");
        assert_eq!(doc.get("a"), Some("3"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_serialize_parse_is_identity(text in "[a-z=: #!\\\\\t\r\n]{0,80}") {
                if let Ok(doc) = PropertyDocument::parse(&text) {
                    prop_assert_eq!(doc.serialize(), text);
                }
            }

            #[test]
            fn prop_put_reads_back(value in "[a-zé =:#\\\\\t\n]{0,40}", newline in prop_oneof![Just("\n"), Just("\r\n")]) {
                let text = format!("a=1{newline}k=old{newline}z=2{newline}");
                let mut doc = PropertyDocument::parse(&text).unwrap();
                if doc.put("k", value.as_str()).is_ok() {
                    doc.put("new", value.as_str()).unwrap();
                    let reparsed = PropertyDocument::parse(&doc.serialize()).unwrap();
                    prop_assert_eq!(reparsed.get("k"), Some(value.as_str()));
                    prop_assert_eq!(reparsed.get("new"), Some(value.as_str()));
                    prop_assert_eq!(reparsed.get("a"), Some("1"));
                    prop_assert_eq!(reparsed.get("z"), Some("2"));
                }
            }
        }
    }
}

//! The managed region of a locale file: the lines between the start and end tag comments.
//!
//! Everything outside the region belongs to whoever wrote the file and is kept byte for byte.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::types::{
    LingoConfig,
    Replacement,
};

const KEY_SLOT: &str = "{{key}}";
const VALUE_SLOT: &str = "{{value}}";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("Start tag '{0}' not found")]
    MissingStartTag(String),

    #[error("End tag '{0}' not found after the start tag")]
    MissingEndTag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Key,
    Value,
}

/// A parsed `entry-template` such as `"{{key}}": "{{value}}",`.
///
/// Slots are substituted in a single pass, so a value containing `{{key}}` stays as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTemplate {
    segments: Vec<Segment>,
}

impl EntryTemplate {
    /// # Errors
    /// A message when a slot is missing or the template spans several lines.
    pub fn parse(template: &str) -> Result<Self, String> {
        if template.contains('\n') {
            return Err("The template must be a single line".to_string());
        }

        let mut segments = Vec::new();
        let mut rest = template;
        while !rest.is_empty() {
            let next_key = rest.find(KEY_SLOT);
            let next_value = rest.find(VALUE_SLOT);
            let (index, slot, segment) = match (next_key, next_value) {
                (Some(k), Some(v)) if v < k => (v, VALUE_SLOT, Segment::Value),
                (Some(k), _) => (k, KEY_SLOT, Segment::Key),
                (None, Some(v)) => (v, VALUE_SLOT, Segment::Value),
                (None, None) => {
                    segments.push(Segment::Text(rest.to_string()));
                    break;
                }
            };
            let (before, after) = rest.split_at(index);
            if !before.is_empty() {
                segments.push(Segment::Text(before.to_string()));
            }
            segments.push(segment);
            rest = after.get(slot.len()..).unwrap_or_default();
        }

        for (slot, segment) in [(KEY_SLOT, Segment::Key), (VALUE_SLOT, Segment::Value)] {
            if !segments.contains(&segment) {
                return Err(format!("The template must contain {slot}"));
            }
        }

        Ok(Self { segments })
    }

    #[must_use]
    pub fn render(&self, key: &str, value: &str) -> String {
        self.segments.iter().fold(String::new(), |mut line, segment| {
            match segment {
                Segment::Text(text) => line.push_str(text),
                Segment::Key => line.push_str(key),
                Segment::Value => line.push_str(value),
            }
            line
        })
    }
}

/// How managed-region entries are written.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub template: EntryTemplate,
    pub key_replaces: Vec<Replacement>,
    pub value_replaces: Vec<Replacement>,
    pub value_to_unicode: bool,
}

impl RenderOptions {
    /// # Errors
    /// The message of an invalid `entry-template`.
    pub fn from_config(config: &LingoConfig) -> Result<Self, String> {
        Ok(Self {
            template: EntryTemplate::parse(&config.entry_template)?,
            key_replaces: config.key_replaces.clone(),
            value_replaces: config.value_replaces.clone(),
            value_to_unicode: config.value_to_unicode,
        })
    }

    /// One line per entry, in key order.
    #[must_use]
    pub fn render_entries(&self, entries: &BTreeMap<String, String>) -> Vec<String> {
        entries
            .iter()
            .map(|(key, value)| {
                let key = apply_replaces(key, &self.key_replaces);
                let mut value = escape_string_content(&apply_replaces(value, &self.value_replaces));
                if self.value_to_unicode {
                    value = escape_non_ascii(&value);
                }
                self.template.render(&key, &value)
            })
            .collect()
    }
}

fn apply_replaces(text: &str, replaces: &[Replacement]) -> String {
    replaces
        .iter()
        .fold(text.to_string(), |text, replace| text.replace(&replace.from, &replace.to))
}

/// Escapes characters that would end or break a quoted literal.
#[must_use]
pub fn escape_string_content(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Writes every non-ASCII character as `\uXXXX` UTF-16 code units (uppercase hex).
///
/// # Examples
/// ```
/// use lingo_sync::external::region::escape_non_ascii;
///
/// assert_eq!(escape_non_ascii("Hi 你"), "Hi \\u4F60");
/// assert_eq!(escape_non_ascii("😀"), "\\uD83D\\uDE00");
/// ```
#[must_use]
pub fn escape_non_ascii(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0_u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{unit:04X}"));
            }
        }
    }
    escaped
}

/// Replaces the lines between each line containing `start_tag` and the next line containing
/// `end_tag` with `entries`. Every region in the file is rewritten and the tag lines are kept.
///
/// # Errors
/// `RegionError` when no start tag exists or a region is never closed.
pub fn splice_region(
    text: &str,
    start_tag: &str,
    end_tag: &str,
    entries: &[String],
) -> Result<String, RegionError> {
    let mut output = String::with_capacity(text.len());
    let mut regions = 0_usize;
    let mut inside = false;

    for line in text.split_inclusive('\n') {
        if inside {
            if line.contains(end_tag) {
                for entry in entries {
                    output.push_str(entry);
                    output.push('\n');
                }
                output.push_str(line);
                inside = false;
            }
            continue;
        }

        output.push_str(line);
        if line.contains(start_tag) {
            // a start tag on an unterminated last line cannot open a region
            if !line.ends_with('\n') {
                return Err(RegionError::MissingEndTag(end_tag.to_string()));
            }
            inside = true;
            regions += 1;
        }
    }

    if regions == 0 {
        return Err(RegionError::MissingStartTag(start_tag.to_string()));
    }
    if inside {
        return Err(RegionError::MissingEndTag(end_tag.to_string()));
    }
    if regions > 1 {
        tracing::debug!(regions, "Rewrote several managed regions");
    }
    Ok(output)
}

/// Contents of a new, empty locale file.
#[must_use]
pub fn skeleton(start_tag: &str, end_tag: &str) -> String {
    format!("let json = {{\n{start_tag}\n{end_tag}\n}}\nexport default json\n")
}

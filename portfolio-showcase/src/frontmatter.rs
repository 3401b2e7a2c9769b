//! README front matter extraction.
//!
//! Showcase projects describe themselves with a small header at the top of
//! their `README.md`:
//!
//! ```text
//! ---
//! title: "Link Checker"
//! description: "Finds broken links in Markdown"
//! showcase: true
//! order: 2
//! technologies:
//!   - "Rust"
//!   - "Tokio"
//! features:
//!   - "Parallel crawling"
//! ---
//! ```
//!
//! The grammar is line oriented. A line starting at column 0 with an
//! identifier character is a label (`key: value`); every other line is either
//! a list item (`- "value"`) or ignored. Malformed values fall back to their
//! defaults instead of rejecting the header.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Line that opens and closes a front matter block.
const DELIMITER: &str = "---";

/// Literal marker that opts a project into the showcase.
///
/// Matched verbatim; `showcase:true` or `Showcase: true` do not count.
const SHOWCASE_MARKER: &str = "showcase: true";

/// Metadata parsed from a repository README header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Display title, empty when absent.
    pub title: String,

    /// Short description, empty when absent.
    pub description: String,

    /// Whether the project opts into the showcase list.
    pub showcase: bool,

    /// Explicit ordering position, `0` when absent.
    pub order: u32,

    /// Technologies used, in declaration order.
    pub technologies: Vec<String>,

    /// Highlighted features, in declaration order.
    pub features: Vec<String>,
}

impl ProjectMetadata {
    /// Renders the metadata back into a front matter block.
    ///
    /// Feeding the output to [`extract_metadata`] yields an equal record as
    /// long as no string contains a double quote.
    #[must_use]
    pub fn to_front_matter(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{DELIMITER}");
        let _ = writeln!(out, "title: \"{}\"", self.title);
        let _ = writeln!(out, "description: \"{}\"", self.description);
        let _ = writeln!(out, "showcase: {}", self.showcase);
        let _ = writeln!(out, "order: {}", self.order);
        write_list(&mut out, "technologies", &self.technologies);
        write_list(&mut out, "features", &self.features);
        out.push_str(DELIMITER);
        out
    }
}

fn write_list(out: &mut String, label: &str, items: &[String]) {
    let _ = writeln!(out, "{label}:");
    for item in items {
        let _ = writeln!(out, "  - \"{item}\"");
    }
}

/// Extracts project metadata from README text.
///
/// Returns `None` when the text has no `---` delimited block. Only the first
/// block is considered. A leading byte order mark is ignored. Never fails on
/// malformed fields.
#[must_use]
pub fn extract_metadata(text: &str) -> Option<ProjectMetadata> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let block = find_block(text)?;
    Some(parse_block(&block))
}

/// Returns the lines between the first pair of delimiter lines.
fn find_block(text: &str) -> Option<Vec<&str>> {
    let mut lines = text.lines();
    lines.by_ref().find(|line| is_delimiter(line))?;

    let mut block = Vec::new();
    for line in lines {
        if is_delimiter(line) {
            return Some(block);
        }
        block.push(line);
    }

    // Opened but never closed.
    None
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// A classified line of the block.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// `key: value` starting at column 0.
    Label { key: &'a str, value: &'a str },
    /// Column 0 identifier text without a colon. Ends any open list.
    Bare,
    /// `- item`, with the marker already stripped.
    Item(&'a str),
    /// Blank or unrecognised line.
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let starts_label = line
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');

    if starts_label {
        return match line.split_once(':') {
            Some((key, value)) => Line::Label {
                key: key.trim(),
                value: value.trim(),
            },
            None => Line::Bare,
        };
    }

    match line.trim().strip_prefix('-') {
        Some(item) => Line::Item(unquote(item)),
        None => Line::Other,
    }
}

/// Strips whitespace and surrounding double quotes from a list item.
fn unquote(item: &str) -> &str {
    item.trim().trim_matches('"').trim()
}

/// List-valued field currently collecting items.
#[derive(Debug, Clone, Copy)]
enum ListField {
    Technologies,
    Features,
}

fn parse_block(lines: &[&str]) -> ProjectMetadata {
    let mut title = None;
    let mut description = None;
    let mut order = None;
    let mut technologies: Option<Vec<String>> = None;
    let mut features: Option<Vec<String>> = None;
    let mut current = None;

    for line in lines {
        match classify(line) {
            Line::Label { key, value } => {
                current = None;
                match key {
                    "title" => {
                        title.get_or_insert_with(|| quoted_value(value));
                    }
                    "description" => {
                        description.get_or_insert_with(|| quoted_value(value));
                    }
                    "order" => {
                        order.get_or_insert_with(|| leading_number(value));
                    }
                    "technologies" if technologies.is_none() => {
                        technologies = Some(Vec::new());
                        current = Some(ListField::Technologies);
                    }
                    "features" if features.is_none() => {
                        features = Some(Vec::new());
                        current = Some(ListField::Features);
                    }
                    _ => {}
                }
            }
            Line::Bare => current = None,
            Line::Item(item) if !item.is_empty() => {
                let list = match current {
                    Some(ListField::Technologies) => technologies.as_mut(),
                    Some(ListField::Features) => features.as_mut(),
                    None => None,
                };
                if let Some(list) = list {
                    list.push(item.to_string());
                }
            }
            Line::Item(_) | Line::Other => {}
        }
    }

    ProjectMetadata {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        showcase: lines.iter().any(|line| line.contains(SHOWCASE_MARKER)),
        order: order.unwrap_or_default(),
        technologies: technologies.unwrap_or_default(),
        features: features.unwrap_or_default(),
    }
}

/// Returns the text inside a leading `"..."`, or an empty string.
fn quoted_value(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.split_once('"'))
        .map(|(inner, _)| inner.to_string())
        .unwrap_or_default()
}

/// Parses the leading run of digits, `0` if there is none or it overflows.
fn leading_number(value: &str) -> u32 {
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().unwrap_or(0)
}

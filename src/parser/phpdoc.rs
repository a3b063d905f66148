//! Phpdoc block parser — line-by-line state machine.
//!
//! Recovers a one-line summary, a multi-paragraph description and an
//! ordered, repeatable tag table from a raw `/** ... */` block. The
//! summary/description boundary is inferred purely from blank-line
//! positioning: the first non-blank run is the summary, everything after
//! the first blank run up to the tags is the description.

use regex::Regex;
use std::sync::LazyLock;

// Leading comment decoration: whitespace followed by a single `*` at the
// start of each line. `\s*` may run across line breaks, which merges a
// whitespace-only line into the next one's asterisk strip.
static RE_LEADING_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*\*").unwrap());

/// One `@author` tag value, split into its recognizable parts.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
    pub homepage: Option<String>,
}

/// One link from an `@link` tag value (a single value may carry several,
/// comma-separated).
#[derive(Debug, PartialEq, Eq)]
pub struct Link {
    pub uri: String,
    pub text: Option<String>,
}

/// Parsed documentation block: summary, description and tag table.
///
/// Immutable once built; all accessors are total — absent tags yield
/// empty results, never errors.
#[derive(Debug, Default)]
pub struct DocComment {
    summary: String,
    desc: String,
    /// Tag name -> ordered values. A Vec of pairs keeps both tag
    /// insertion order and per-tag value order, which consumers rely on.
    tags: Vec<(String, Vec<String>)>,
}

impl DocComment {
    /// Parse a raw comment block. Total over all inputs: malformed or
    /// empty text yields an empty model.
    pub fn parse(raw: &str) -> DocComment {
        let mut doc = DocComment::default();

        let stripped = RE_LEADING_STAR.replace_all(raw, "");

        let mut summary_mode = false;
        let mut desc_mode = false;
        let mut tag_mode = false;
        // Cursor into the tag table for continuation lines: index of the
        // tag entry plus index of the value slot opened by the last `@`.
        let mut cur_slot: Option<(usize, usize)> = None;

        for raw_line in stripped.split('\n') {
            let mut line = raw_line.trim().to_string();

            // Comment delimiters act as blank lines, not content.
            if line == "/**" || line == "/" {
                line.clear();
            }

            if line.is_empty() {
                summary_mode = false;
                tag_mode = false;
                // A blank line inside a description separates paragraphs
                // rather than ending it.
                if desc_mode {
                    line.push_str("\n\n");
                }
            } else if line.starts_with('@') {
                desc_mode = false;
                tag_mode = true;

                let (name, rest) = match line[1..].split_once(' ') {
                    Some((name, rest)) => (name.to_string(), rest.to_string()),
                    None => (line[1..].to_string(), String::new()),
                };

                let idx = match doc.tags.iter().position(|(n, _)| *n == name) {
                    Some(idx) => idx,
                    None => {
                        doc.tags.push((name, Vec::new()));
                        doc.tags.len() - 1
                    }
                };
                doc.tags[idx].1.push(String::new());
                cur_slot = Some((idx, doc.tags[idx].1.len() - 1));

                line = rest;
            } else {
                // Summary always comes first; once it has content and a
                // blank line closed it, plain text belongs to the
                // description and the summary never reopens.
                if summary_mode || doc.summary.is_empty() {
                    summary_mode = true;
                } else {
                    desc_mode = true;
                }
            }

            // Accumulate into every active mode. In steady state exactly
            // one is active; tag continuation lines may feed a tag slot
            // and the summary or description at the same time.
            if summary_mode {
                doc.summary.push_str(&line);
            }
            if desc_mode {
                doc.desc.push_str(&line);
            }
            if tag_mode {
                if let Some((idx, slot)) = cur_slot {
                    doc.tags[idx].1[slot].push_str(&line);
                }
            }
        }

        doc.desc = doc.desc.trim_end().to_string();

        // `var` keeps only the type token of its last value; any trailing
        // text is folded into the description.
        if let Some(idx) = doc.tags.iter().position(|(n, _)| n == "var") {
            if let Some(last) = doc.tags[idx].1.pop() {
                let (type_token, trailing) = match last.split_once(' ') {
                    Some((t, rest)) => (t.to_string(), rest.to_string()),
                    None => (last, String::new()),
                };
                if !trailing.is_empty() {
                    doc.desc.push_str(&trailing);
                    doc.desc.push('\n');
                }
                doc.tags[idx].1 = vec![type_token];
            }
        }

        doc
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// Full tag table in encounter order.
    pub fn tags(&self) -> &[(String, Vec<String>)] {
        &self.tags
    }

    /// All values recorded for one tag, in encounter order. Empty slice
    /// if the tag never occurred.
    pub fn tag_values(&self, name: &str) -> &[String] {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Last recorded value for a tag. Later occurrences in a doc block
    /// are taken as corrections of earlier ones.
    pub fn last_tag(&self, name: &str) -> Option<&str> {
        self.tag_values(name).last().map(String::as_str)
    }

    /// Property type from the `var` tag (reduced to the bare type token
    /// during parsing).
    pub fn type_name(&self) -> Option<&str> {
        self.last_tag("var")
    }

    /// One `Author` per `@author` value, in encounter order. Tokens are
    /// classed as homepage (`http://` prefix), email (contains `@`) or
    /// name fragment.
    pub fn authors(&self) -> Vec<Author> {
        self.tag_values("author")
            .iter()
            .map(|value| {
                let mut author = Author::default();
                let mut name = String::new();
                for part in value.split(' ') {
                    if part.starts_with("http://") {
                        author.homepage = Some(part.to_string());
                    } else if part.contains('@') {
                        author.email = Some(part.to_string());
                    } else {
                        if !name.is_empty() {
                            name.push(' ');
                        }
                        name.push_str(part);
                    }
                }
                if !name.is_empty() {
                    author.name = Some(name);
                }
                author
            })
            .collect()
    }

    /// All `@internal` values joined with line breaks, empty if none.
    pub fn internal(&self) -> String {
        self.tag_values("internal").join("\n")
    }

    /// Links from all `@link` values, flattened in encounter order. Each
    /// value is split on commas first, then each fragment on its first
    /// space into uri and optional text.
    pub fn links(&self) -> Vec<Link> {
        let mut links = Vec::new();
        for value in self.tag_values("link") {
            for fragment in value.split(',') {
                let fragment = fragment.trim();
                let (uri, text) = match fragment.split_once(' ') {
                    Some((uri, text)) => (uri.to_string(), Some(text.to_string())),
                    None => (fragment.to_string(), None),
                };
                links.push(Link { uri, text });
            }
        }
        links
    }

    /// The tags not on the caller's known-list, preserving tag and value
    /// order. Used to surface a catch-all node for unrecognized tags.
    pub fn unknown_tags(&self, known: &[&str]) -> Vec<(&str, &[String])> {
        self.tags
            .iter()
            .filter(|(name, _)| !known.contains(&name.as_str()))
            .map(|(name, values)| (name.as_str(), values.as_slice()))
            .collect()
    }
}

//! Rich text to HTML conversion
//!
//! Rich text arrives from the CMS as a flat list of typed nodes. Each node
//! carries its text plus formatting spans whose offsets count UTF-16 code
//! units. Node types this renderer does not know are skipped, and their
//! extra fields are kept untouched in [`RichTextNode::extra`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::cms::types::null_as_default;
use crate::helpers::{html_escape, post_path};

/// URL schemes a hyperlink span may point to
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RichTextError {
    #[error("span {start}..{end} is outside text of length {len}")]
    InvalidSpan { start: usize, end: usize, len: usize },

    #[error("{kind} node is missing its {field}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

/// An ordered list of rich text nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<RichTextNode>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spans: Vec<Span>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RichText {
    /// Plain text of every node, joined by a space
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .map(|n| n.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render to HTML. Consecutive list items share one list element.
    /// Links to other documents resolve to post pages below `root`.
    pub fn as_html(&self, root: &str) -> Result<String, RichTextError> {
        let mut out = String::new();
        let mut open_list: Option<&'static str> = None;

        for node in &self.0 {
            let list_tag = match node.kind.as_str() {
                "list-item" => Some("ul"),
                "o-list-item" => Some("ol"),
                _ => None,
            };

            if open_list != list_tag {
                if let Some(tag) = open_list {
                    out.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list_tag {
                    out.push_str(&format!("<{}>", tag));
                }
                open_list = list_tag;
            }

            out.push_str(&render_node(node, root)?);
        }

        if let Some(tag) = open_list {
            out.push_str(&format!("</{}>", tag));
        }

        Ok(out)
    }
}

fn render_node(node: &RichTextNode, root: &str) -> Result<String, RichTextError> {
    let kind = node.kind.as_str();
    let html = match kind {
        "paragraph" => format!("<p>{}</p>", render_spans(node, root)?),
        "preformatted" => format!("<pre>{}</pre>", render_spans(node, root)?),
        "list-item" | "o-list-item" => format!("<li>{}</li>", render_spans(node, root)?),
        "image" => render_image(node)?,
        "embed" => render_embed(node),
        _ => match heading_level(kind) {
            Some(level) => format!("<h{level}>{}</h{level}>", render_spans(node, root)?),
            None => {
                tracing::debug!(kind, "Skipping unsupported rich text node");
                String::new()
            }
        },
    };
    Ok(html)
}

fn heading_level(kind: &str) -> Option<u8> {
    kind.strip_prefix("heading")
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=6).contains(n))
}

fn extra_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn render_image(node: &RichTextNode) -> Result<String, RichTextError> {
    let url = extra_str(&node.extra, "url").ok_or(RichTextError::MissingField {
        kind: "image",
        field: "url",
    })?;
    let alt = extra_str(&node.extra, "alt").unwrap_or("");
    Ok(format!(
        r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
        html_escape(url),
        html_escape(alt)
    ))
}

/// Embeds carry provider markup which is emitted as-is
fn render_embed(node: &RichTextNode) -> String {
    let oembed = node
        .extra
        .get("oembed")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
        html_escape(extra_str(&oembed, "embed_url").unwrap_or("")),
        html_escape(extra_str(&oembed, "type").unwrap_or("")),
        html_escape(&extra_str(&oembed, "provider_name").unwrap_or("").to_lowercase()),
        extra_str(&oembed, "html").unwrap_or("")
    )
}

/// Map each UTF-16 offset to a byte offset. Offsets that fall inside a
/// surrogate pair map to `None`.
fn utf16_to_byte_offsets(text: &str) -> Vec<Option<usize>> {
    let mut offsets = Vec::with_capacity(text.len() + 1);
    for (byte, ch) in text.char_indices() {
        offsets.push(Some(byte));
        for _ in 1..ch.len_utf16() {
            offsets.push(None);
        }
    }
    offsets.push(Some(text.len()));
    offsets
}

/// Whether a link target is relative or uses an allowed scheme. Browsers
/// ignore surrounding whitespace and embedded tabs or newlines when reading
/// the scheme, so those are stripped first.
fn is_safe_url(url: &str) -> bool {
    let normalized: String = url
        .trim_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect();

    match normalized.find([':', '/', '?', '#']) {
        Some(i) if normalized[i..].starts_with(':') => {
            let scheme = normalized[..i].to_ascii_lowercase();
            ALLOWED_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

fn span_tags(span: &Span, root: &str) -> Option<(String, &'static str)> {
    let data = span.data.as_ref().and_then(Value::as_object);
    match span.kind.as_str() {
        "strong" => Some(("<strong>".to_string(), "</strong>")),
        "em" => Some(("<em>".to_string(), "</em>")),
        "hyperlink" => {
            let data = data?;
            let href = match extra_str(data, "url") {
                Some(url) if is_safe_url(url) => url.to_string(),
                Some(url) => {
                    tracing::warn!(url, "Dropping link with a disallowed scheme");
                    return None;
                }
                None => format!(
                    "{}{}",
                    root.trim_end_matches('/'),
                    post_path(extra_str(data, "uid")?)
                ),
            };
            let target = match extra_str(data, "target") {
                Some("_blank") => r#" target="_blank" rel="noopener noreferrer""#,
                _ => "",
            };
            Some((format!(r#"<a href="{}"{}>"#, html_escape(&href), target), "</a>"))
        }
        "label" => {
            let label = data.and_then(|d| extra_str(d, "label")).unwrap_or("");
            Some((format!(r#"<span class="{}">"#, html_escape(label)), "</span>"))
        }
        _ => None,
    }
}

fn push_text(out: &mut String, text: &str) {
    out.push_str(&html_escape(text).replace('\n', "<br />"));
}

/// Apply formatting spans to the node text. The text is cut at every span
/// boundary and each piece is wrapped in the tags of the spans covering it,
/// so overlapping spans still produce well-nested markup.
fn render_spans(node: &RichTextNode, root: &str) -> Result<String, RichTextError> {
    let (text, spans) = (node.text.as_str(), node.spans.as_slice());
    let offsets = utf16_to_byte_offsets(text);
    let len = offsets.len() - 1;

    let mut boundaries = vec![0, len];
    for span in spans {
        let valid = span.start <= span.end
            && span.end <= len
            && offsets[span.start].is_some()
            && offsets[span.end].is_some();
        if !valid {
            return Err(RichTextError::InvalidSpan {
                start: span.start,
                end: span.end,
                len,
            });
        }
        boundaries.push(span.start);
        boundaries.push(span.end);
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let tags: Vec<Option<(String, &'static str)>> = spans.iter().map(|s| span_tags(s, root)).collect();
    let mut out = String::with_capacity(text.len());

    for window in boundaries.windows(2) {
        let (from, to) = (window[0], window[1]);
        // Boundaries are validated above
        let (Some(a), Some(b)) = (offsets[from], offsets[to]) else {
            continue;
        };

        let active: Vec<&(String, &'static str)> = spans
            .iter()
            .zip(&tags)
            .filter(|(s, _)| s.start <= from && s.end >= to)
            .filter_map(|(_, t)| t.as_ref())
            .collect();

        for (open, _) in &active {
            out.push_str(open);
        }
        push_text(&mut out, &text[a..b]);
        for (_, close) in active.iter().rev() {
            out.push_str(close);
        }
    }

    Ok(out)
}

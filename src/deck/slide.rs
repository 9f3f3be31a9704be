//! Announcement slide records and their rich-text payload

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Block node types rendered on their own line
const BLOCK_NODES: &[&str] = &[
    "paragraph",
    "heading",
    "listItem",
    "blockquote",
    "codeBlock",
    "horizontalRule",
];

/// A tiptap/ProseMirror style JSON document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Value);

impl RichText {
    /// Single paragraph document holding `text`
    #[must_use]
    pub fn paragraph(text: &str) -> Self {
        Self(json!({
            "type": "doc",
            "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": text }] }]
        }))
    }

    /// One paragraph per line of `text`
    #[must_use]
    pub fn from_lines(text: &str) -> Self {
        let paragraphs: Vec<Value> = text
            .lines()
            .map(|line| {
                if line.trim().is_empty() {
                    json!({ "type": "paragraph" })
                } else {
                    json!({ "type": "paragraph", "content": [{ "type": "text", "text": line }] })
                }
            })
            .collect();
        Self(json!({ "type": "doc", "content": paragraphs }))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// All text of the document joined with spaces
    #[must_use]
    pub fn plain_text(&self) -> String {
        node_text(&self.0)
    }

    /// Text split into display lines, one per block node
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        collect_lines(&self.0, &mut lines);
        lines
    }
}

fn node_text(node: &Value) -> String {
    let Some(obj) = node.as_object() else {
        return String::new();
    };
    if let Some(text) = obj.get("text").and_then(Value::as_str) {
        return text.to_string();
    }
    match obj.get("content").and_then(Value::as_array) {
        Some(children) => children
            .iter()
            .map(node_text)
            .collect::<Vec<_>>()
            .join(" "),
        None => String::new(),
    }
}

fn collect_lines(node: &Value, lines: &mut Vec<String>) {
    let Some(obj) = node.as_object() else {
        return;
    };
    let kind = obj.get("type").and_then(Value::as_str).unwrap_or_default();
    let children = obj.get("content").and_then(Value::as_array);

    let has_block_children = children.is_some_and(|c| {
        c.iter().any(|child| {
            child
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| BLOCK_NODES.contains(&t) || t.ends_with("List"))
        })
    });

    if BLOCK_NODES.contains(&kind) && !has_block_children {
        let text = inline_text(node);
        let prefix = if kind == "listItem" { "• " } else { "" };
        lines.push(format!("{prefix}{text}"));
        return;
    }

    if let Some(children) = children {
        for child in children {
            collect_lines(child, lines);
        }
    }
}

/// Inline text without the separator spaces `node_text` inserts
fn inline_text(node: &Value) -> String {
    let Some(obj) = node.as_object() else {
        return String::new();
    };
    if let Some(text) = obj.get("text").and_then(Value::as_str) {
        return text.to_string();
    }
    if obj.get("type").and_then(Value::as_str) == Some("hardBreak") {
        return " ".to_string();
    }
    obj.get("content")
        .and_then(Value::as_array)
        .map(|c| c.iter().map(inline_text).collect())
        .unwrap_or_default()
}

/// Where the logo sits on a slide
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoPlacement {
    #[default]
    None,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideLayout {
    #[serde(default)]
    pub logo: LogoPlacement,
    #[serde(default)]
    pub align: VerticalAlign,
}

/// Slide payload. Accepts both the structured form
/// `{title, body, layout}` and a bare rich-text document (older decks).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlideContent {
    pub title: Option<RichText>,
    pub body: RichText,
    pub layout: SlideLayout,
}

impl From<Value> for SlideContent {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut obj) if !obj.contains_key("type") => {
                let title = obj.remove("title").filter(|v| !v.is_null()).map(RichText);
                let body = obj
                    .remove("body")
                    .or_else(|| obj.remove("content"))
                    .map(RichText)
                    .unwrap_or_default();
                let layout = obj
                    .remove("layout")
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_default();
                Self {
                    title,
                    body,
                    layout,
                }
            }
            Value::Null => Self::default(),
            other => Self {
                title: None,
                body: RichText(other),
                layout: SlideLayout::default(),
            },
        }
    }
}

impl From<SlideContent> for Value {
    fn from(content: SlideContent) -> Self {
        let mut obj = Map::new();
        if let Some(title) = content.title {
            obj.insert("title".into(), title.0);
        }
        obj.insert("body".into(), content.body.0);
        obj.insert(
            "layout".into(),
            serde_json::to_value(content.layout).unwrap_or(Value::Null),
        );
        Value::Object(obj)
    }
}

impl Serialize for SlideContent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Value::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SlideContent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

fn default_true() -> bool {
    true
}

/// One announcement-board slide as stored by the deck source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementSlide {
    pub id: String,
    /// Label shown in slide lists
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: SlideContent,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

impl AnnouncementSlide {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: SlideContent::default(),
            is_visible: true,
        }
    }

    /// Title to display: the rich-text title when present, else the label
    #[must_use]
    pub fn display_title(&self) -> String {
        self.content
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.plain_text()))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.title.clone())
    }

    #[must_use]
    pub fn body_lines(&self) -> Vec<String> {
        self.content.body.lines()
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

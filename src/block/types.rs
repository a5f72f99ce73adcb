use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque block identity. Generated as a v4 UUID, never reused.
pub type BlockId = String;

/// Discriminant tag for every block variant.
///
/// Serialized as the snake_case tag the persistence service uses
/// (`heading_1`, `bulleted_list`, ...). Unknown tags decode to [`BlockType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    Text,
    Heading1,
    Heading2,
    Heading3,
    BulletedList,
    NumberedList,
    Checklist,
    Toggle,
    Code,
    Quote,
    Divider,
    Image,
    Bookmark,
    Embed,
    File,
    Page,
    Table,
}

impl BlockType {
    pub const ALL: [BlockType; 17] = [
        BlockType::Text,
        BlockType::Heading1,
        BlockType::Heading2,
        BlockType::Heading3,
        BlockType::BulletedList,
        BlockType::NumberedList,
        BlockType::Checklist,
        BlockType::Toggle,
        BlockType::Code,
        BlockType::Quote,
        BlockType::Divider,
        BlockType::Image,
        BlockType::Bookmark,
        BlockType::Embed,
        BlockType::File,
        BlockType::Page,
        BlockType::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading1 => "heading_1",
            Self::Heading2 => "heading_2",
            Self::Heading3 => "heading_3",
            Self::BulletedList => "bulleted_list",
            Self::NumberedList => "numbered_list",
            Self::Checklist => "checklist",
            Self::Toggle => "toggle",
            Self::Code => "code",
            Self::Quote => "quote",
            Self::Divider => "divider",
            Self::Image => "image",
            Self::Bookmark => "bookmark",
            Self::Embed => "embed",
            Self::File => "file",
            Self::Page => "page",
            Self::Table => "table",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == tag)
    }

    /// Resolves a wire tag, falling back to `Text` for anything unrecognized.
    pub fn from_tag(tag: &str) -> Self {
        Self::parse(tag).unwrap_or_else(|| {
            log::warn!("unknown block type {:?}, using text", tag);
            Self::Text
        })
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Self::BulletedList | Self::NumberedList | Self::Checklist
        )
    }
}

impl From<String> for BlockType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<BlockType> for String {
    fn from(ty: BlockType) -> Self {
        ty.as_str().to_string()
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formatting attributes of a span. Carried through edits untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFormat {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl TextFormat {
    pub fn is_plain(&self) -> bool {
        self == &TextFormat::default()
    }
}

/// A run of text plus its formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<TextFormat>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: None,
        }
    }

    pub fn formatted(text: impl Into<String>, format: TextFormat) -> Self {
        Self {
            text: text.into(),
            format: Some(format),
        }
    }

    pub(crate) fn same_format(&self, other: &RichText) -> bool {
        let a = self.format.as_ref().filter(|f| !f.is_plain());
        let b = other.format.as_ref().filter(|f| !f.is_plain());
        a == b
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub content: Vec<RichText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ListItem>,
}

impl ListItem {
    pub fn new(content: Vec<RichText>) -> Self {
        Self {
            content,
            checked: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub content: Vec<RichText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_span: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Variant payloads, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BlockContent {
    Text {
        content: Vec<RichText>,
    },
    #[serde(rename = "heading_1")]
    Heading1 {
        content: Vec<RichText>,
    },
    #[serde(rename = "heading_2")]
    Heading2 {
        content: Vec<RichText>,
    },
    #[serde(rename = "heading_3")]
    Heading3 {
        content: Vec<RichText>,
    },
    BulletedList {
        items: Vec<ListItem>,
    },
    NumberedList {
        items: Vec<ListItem>,
        #[serde(default = "default_list_start")]
        start: u32,
    },
    Checklist {
        items: Vec<ListItem>,
    },
    Toggle {
        summary: Vec<RichText>,
        #[serde(default = "default_true")]
        is_open: bool,
    },
    Code {
        content: String,
        language: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        caption: Vec<RichText>,
    },
    Quote {
        content: Vec<RichText>,
    },
    Divider,
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        caption: Vec<RichText>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alignment: Option<Alignment>,
    },
    Bookmark {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thumbnail: Option<String>,
    },
    Embed {
        url: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        caption: Vec<RichText>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },
    File {
        url: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    Page {
        page_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Table {
        rows: Vec<Vec<TableCell>>,
        #[serde(default)]
        has_header_row: bool,
        #[serde(default)]
        has_header_column: bool,
    },
}

fn default_list_start() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl BlockContent {
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Text { .. } => BlockType::Text,
            Self::Heading1 { .. } => BlockType::Heading1,
            Self::Heading2 { .. } => BlockType::Heading2,
            Self::Heading3 { .. } => BlockType::Heading3,
            Self::BulletedList { .. } => BlockType::BulletedList,
            Self::NumberedList { .. } => BlockType::NumberedList,
            Self::Checklist { .. } => BlockType::Checklist,
            Self::Toggle { .. } => BlockType::Toggle,
            Self::Code { .. } => BlockType::Code,
            Self::Quote { .. } => BlockType::Quote,
            Self::Divider => BlockType::Divider,
            Self::Image { .. } => BlockType::Image,
            Self::Bookmark { .. } => BlockType::Bookmark,
            Self::Embed { .. } => BlockType::Embed,
            Self::File { .. } => BlockType::File,
            Self::Page { .. } => BlockType::Page,
            Self::Table { .. } => BlockType::Table,
        }
    }

    /// The span sequence of variants whose text is a single rich-text run.
    pub fn spans(&self) -> Option<&[RichText]> {
        match self {
            Self::Text { content }
            | Self::Heading1 { content }
            | Self::Heading2 { content }
            | Self::Heading3 { content }
            | Self::Quote { content } => Some(content),
            Self::Toggle { summary, .. } => Some(summary),
            _ => None,
        }
    }

    pub fn spans_mut(&mut self) -> Option<&mut Vec<RichText>> {
        match self {
            Self::Text { content }
            | Self::Heading1 { content }
            | Self::Heading2 { content }
            | Self::Heading3 { content }
            | Self::Quote { content } => Some(content),
            Self::Toggle { summary, .. } => Some(summary),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[ListItem]> {
        match self {
            Self::BulletedList { items }
            | Self::NumberedList { items, .. }
            | Self::Checklist { items } => Some(items),
            _ => None,
        }
    }

    pub fn items_mut(&mut self) -> Option<&mut Vec<ListItem>> {
        match self {
            Self::BulletedList { items }
            | Self::NumberedList { items, .. }
            | Self::Checklist { items } => Some(items),
            _ => None,
        }
    }
}

/// One structural unit of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub parent_id: Option<BlockId>,
    #[serde(flatten)]
    pub content: BlockContent,
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        self.content.block_type()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_type_tags_round_trip() {
        for ty in BlockType::ALL {
            assert_eq!(BlockType::parse(ty.as_str()), Some(ty));
        }
    }

    #[test]
    fn unknown_tag_falls_back_to_text() {
        assert_eq!(BlockType::from_tag("kanban"), BlockType::Text);
        let ty: BlockType = serde_json::from_value(json!("whiteboard")).unwrap();
        assert_eq!(ty, BlockType::Text);
    }

    #[test]
    fn heading_serializes_with_underscored_tag() {
        let block = Block {
            id: "b1".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            parent_id: None,
            content: BlockContent::Heading1 {
                content: vec![RichText::plain("Title")],
            },
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "heading_1");
        assert_eq!(value["content"][0]["text"], "Title");
        assert_eq!(value["parentId"], serde_json::Value::Null);
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn variant_fields_use_camel_case() {
        let raw = json!({
            "id": "t1",
            "type": "table",
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z",
            "parentId": null,
            "rows": [[{"content": [{"text": "a"}], "colSpan": 2}]],
            "hasHeaderRow": true
        });
        let block: Block = serde_json::from_value(raw).unwrap();
        match &block.content {
            BlockContent::Table {
                rows,
                has_header_row,
                has_header_column,
            } => {
                assert_eq!(rows[0][0].col_span, Some(2));
                assert!(*has_header_row);
                assert!(!*has_header_column);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn divider_carries_no_payload() {
        let block = Block {
            id: "d".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            parent_id: Some("p".into()),
            content: BlockContent::Divider,
        };
        let value = serde_json::to_value(&block).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["type"], "divider");
        assert_eq!(obj.len(), 5); // id, createdAt, updatedAt, parentId, type
    }

    #[test]
    fn plain_format_compares_equal_to_none() {
        let a = RichText::plain("x");
        let b = RichText::formatted("y", TextFormat::default());
        assert!(a.same_format(&b));
        let bold = RichText::formatted(
            "z",
            TextFormat {
                bold: true,
                ..TextFormat::default()
            },
        );
        assert!(!a.same_format(&bold));
    }
}

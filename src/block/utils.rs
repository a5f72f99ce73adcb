use chrono::Utc;
use uuid::Uuid;

use super::types::{
    Block, BlockContent, BlockId, BlockType, ListItem, RichText, TableCell, TextFormat,
};

pub const DEFAULT_CODE_LANGUAGE: &str = "plaintext";

pub fn generate_id() -> BlockId {
    Uuid::new_v4().to_string()
}

/// Returns variant-appropriate empty content for `ty`.
pub fn default_content(ty: BlockType) -> BlockContent {
    let empty = || vec![RichText::plain("")];
    match ty {
        BlockType::Text => BlockContent::Text { content: empty() },
        BlockType::Heading1 => BlockContent::Heading1 { content: empty() },
        BlockType::Heading2 => BlockContent::Heading2 { content: empty() },
        BlockType::Heading3 => BlockContent::Heading3 { content: empty() },
        BlockType::BulletedList => BlockContent::BulletedList {
            items: vec![ListItem::new(empty())],
        },
        BlockType::NumberedList => BlockContent::NumberedList {
            items: vec![ListItem::new(empty())],
            start: 1,
        },
        BlockType::Checklist => BlockContent::Checklist {
            items: vec![ListItem {
                checked: Some(false),
                ..ListItem::new(empty())
            }],
        },
        BlockType::Toggle => BlockContent::Toggle {
            summary: empty(),
            is_open: true,
        },
        BlockType::Code => BlockContent::Code {
            content: String::new(),
            language: DEFAULT_CODE_LANGUAGE.to_string(),
            caption: Vec::new(),
        },
        BlockType::Quote => BlockContent::Quote { content: empty() },
        BlockType::Divider => BlockContent::Divider,
        BlockType::Image => BlockContent::Image {
            url: String::new(),
            caption: Vec::new(),
            width: None,
            height: None,
            alignment: None,
        },
        BlockType::Bookmark => BlockContent::Bookmark {
            url: String::new(),
            title: None,
            description: None,
            thumbnail: None,
        },
        BlockType::Embed => BlockContent::Embed {
            url: String::new(),
            caption: Vec::new(),
            width: None,
            height: None,
        },
        BlockType::File => BlockContent::File {
            url: String::new(),
            name: String::new(),
            size: None,
            mime_type: None,
        },
        BlockType::Page => BlockContent::Page {
            page_id: String::new(),
            title: None,
        },
        BlockType::Table => BlockContent::Table {
            rows: vec![vec![TableCell::default(), TableCell::default()]; 2],
            has_header_row: false,
            has_header_column: false,
        },
    }
}

/// Creates a fresh block of `ty`. Never fails.
pub fn create_block(ty: BlockType, parent_id: Option<BlockId>) -> Block {
    let now = Utc::now();
    Block {
        id: generate_id(),
        created_at: now,
        updated_at: now,
        parent_id,
        content: default_content(ty),
    }
}

/// Like [`create_block`], for a wire tag that may not name a known type.
pub fn create_block_from_tag(tag: &str, parent_id: Option<BlockId>) -> Block {
    create_block(BlockType::from_tag(tag), parent_id)
}

pub fn find_block_by_id<'a>(blocks: &'a [Block], id: &str) -> Option<&'a Block> {
    blocks.iter().find(|b| b.id == id)
}

pub fn find_block_index_by_id(blocks: &[Block], id: &str) -> Option<usize> {
    blocks.iter().position(|b| b.id == id)
}

pub fn spans_text(spans: &[RichText]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

fn items_text(items: &[ListItem]) -> String {
    items
        .iter()
        .map(|item| spans_text(&item.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flattens a block's text payload. Lists join items with `\n`;
/// variants without a text payload yield an empty string.
pub fn get_block_text_content(block: &Block) -> String {
    content_text(&block.content)
}

pub fn content_text(content: &BlockContent) -> String {
    match content {
        BlockContent::Text { content }
        | BlockContent::Heading1 { content }
        | BlockContent::Heading2 { content }
        | BlockContent::Heading3 { content }
        | BlockContent::Quote { content } => spans_text(content),
        BlockContent::Toggle { summary, .. } => spans_text(summary),
        BlockContent::BulletedList { items }
        | BlockContent::NumberedList { items, .. }
        | BlockContent::Checklist { items } => items_text(items),
        BlockContent::Code { content, .. } => content.clone(),
        BlockContent::Divider
        | BlockContent::Image { .. }
        | BlockContent::Bookmark { .. }
        | BlockContent::Embed { .. }
        | BlockContent::File { .. }
        | BlockContent::Page { .. }
        | BlockContent::Table { .. } => String::new(),
    }
}

/// Whether the variant carries editable text.
pub fn is_text_bearing(ty: BlockType) -> bool {
    match ty {
        BlockType::Text
        | BlockType::Heading1
        | BlockType::Heading2
        | BlockType::Heading3
        | BlockType::BulletedList
        | BlockType::NumberedList
        | BlockType::Checklist
        | BlockType::Toggle
        | BlockType::Code
        | BlockType::Quote => true,
        BlockType::Divider
        | BlockType::Image
        | BlockType::Bookmark
        | BlockType::Embed
        | BlockType::File
        | BlockType::Page
        | BlockType::Table => false,
    }
}

pub fn is_block_empty(block: &Block) -> bool {
    match &block.content {
        BlockContent::Text { .. }
        | BlockContent::Heading1 { .. }
        | BlockContent::Heading2 { .. }
        | BlockContent::Heading3 { .. }
        | BlockContent::Quote { .. }
        | BlockContent::Toggle { .. }
        | BlockContent::BulletedList { .. }
        | BlockContent::NumberedList { .. }
        | BlockContent::Checklist { .. }
        | BlockContent::Code { .. } => get_block_text_content(block).is_empty(),
        BlockContent::Divider => false,
        // Media and references count as empty until they point somewhere.
        BlockContent::Image { url, .. }
        | BlockContent::Bookmark { url, .. }
        | BlockContent::Embed { url, .. }
        | BlockContent::File { url, .. } => url.is_empty(),
        BlockContent::Page { page_id, .. } => page_id.is_empty(),
        BlockContent::Table { rows, .. } => rows
            .iter()
            .flatten()
            .all(|cell| spans_text(&cell.content).is_empty()),
    }
}

pub fn block_type_name(ty: BlockType) -> &'static str {
    match ty {
        BlockType::Text => "Text",
        BlockType::Heading1 => "Heading 1",
        BlockType::Heading2 => "Heading 2",
        BlockType::Heading3 => "Heading 3",
        BlockType::BulletedList => "Bulleted List",
        BlockType::NumberedList => "Numbered List",
        BlockType::Checklist => "Checklist",
        BlockType::Toggle => "Toggle",
        BlockType::Code => "Code",
        BlockType::Quote => "Quote",
        BlockType::Divider => "Divider",
        BlockType::Image => "Image",
        BlockType::Bookmark => "Bookmark",
        BlockType::Embed => "Embed",
        BlockType::File => "File",
        BlockType::Page => "Page Link",
        BlockType::Table => "Table",
    }
}

/// Builds content of `ty` holding `spans` as its text.
///
/// Span-bearing variants keep the spans as-is; lists get a single item;
/// code keeps only the flattened string. Variants without a text payload
/// ignore the spans.
pub fn content_with_spans(ty: BlockType, spans: Vec<RichText>) -> BlockContent {
    let spans = normalize_spans(spans);
    let mut content = default_content(ty);
    match &mut content {
        BlockContent::Text { content }
        | BlockContent::Heading1 { content }
        | BlockContent::Heading2 { content }
        | BlockContent::Heading3 { content }
        | BlockContent::Quote { content } => *content = spans,
        BlockContent::Toggle { summary, .. } => *summary = spans,
        BlockContent::BulletedList { items }
        | BlockContent::NumberedList { items, .. }
        | BlockContent::Checklist { items } => {
            if let Some(first) = items.first_mut() {
                first.content = spans;
            }
        }
        BlockContent::Code { content, .. } => *content = spans_text(&spans),
        BlockContent::Divider
        | BlockContent::Image { .. }
        | BlockContent::Bookmark { .. }
        | BlockContent::Embed { .. }
        | BlockContent::File { .. }
        | BlockContent::Page { .. }
        | BlockContent::Table { .. } => {}
    }
    content
}

pub fn content_with_text(ty: BlockType, text: &str) -> BlockContent {
    content_with_spans(ty, vec![RichText::plain(text)])
}

/// Replaces the text of `content` in place, keeping the other fields of the
/// variant (language, checked flag, toggle state). Only the changed range is
/// rewritten, so formatting and item flags outside it survive. Returns false
/// for variants without a text payload.
pub fn set_content_text(content: &mut BlockContent, text: &str) -> bool {
    let old = content_text(content);
    let (start, removed, inserted) = text_change(&old, text);
    match content {
        BlockContent::Text { content }
        | BlockContent::Heading1 { content }
        | BlockContent::Heading2 { content }
        | BlockContent::Heading3 { content }
        | BlockContent::Quote { content } => {
            *content = splice_spans(content, start, removed, &inserted);
            true
        }
        BlockContent::Toggle { summary, .. } => {
            *summary = splice_spans(summary, start, removed, &inserted);
            true
        }
        BlockContent::Checklist { items } => {
            splice_items(items, start, removed, &inserted, Some(false));
            true
        }
        BlockContent::BulletedList { items } | BlockContent::NumberedList { items, .. } => {
            splice_items(items, start, removed, &inserted, None);
            true
        }
        BlockContent::Code { content, .. } => {
            *content = text.to_string();
            true
        }
        BlockContent::Divider
        | BlockContent::Image { .. }
        | BlockContent::Bookmark { .. }
        | BlockContent::Embed { .. }
        | BlockContent::File { .. }
        | BlockContent::Page { .. }
        | BlockContent::Table { .. } => false,
    }
}

/// The char range where `old` and `new` differ, as
/// `(start, removed_len, inserted_text)`.
pub fn text_change(old: &str, new: &str) -> (usize, usize, String) {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let room = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(room)
        .take_while(|(a, b)| a == b)
        .count();
    let inserted = new[prefix..new.len() - suffix].iter().collect();
    (prefix, old.len() - prefix - suffix, inserted)
}

/// Format for text typed at a split point: the run it continues, else the
/// run it replaces or precedes.
fn inherited_format(head: &[RichText], rest: &[RichText]) -> Option<TextFormat> {
    head.last()
        .filter(|span| !span.text.is_empty())
        .or_else(|| rest.first())
        .and_then(|span| span.format.clone())
}

/// Replaces `removed` chars at `start` with `inserted`, keeping the
/// formatting of everything around the edit.
pub fn splice_spans(
    spans: &[RichText],
    start: usize,
    removed: usize,
    inserted: &str,
) -> Vec<RichText> {
    let (head, rest) = split_spans(spans, start);
    let (_, tail) = split_spans(&rest, removed);
    let middle = RichText {
        text: inserted.to_string(),
        format: inherited_format(&head, &rest),
    };
    normalize_spans(
        head.into_iter()
            .chain(std::iter::once(middle))
            .chain(tail)
            .collect(),
    )
}

/// Finds the item holding flattened offset `offset` and the offset inside it.
/// Items are separated by one `\n` in the flattened text.
pub fn locate_item(items: &[ListItem], offset: usize) -> (usize, usize) {
    let mut remaining = offset;
    for (index, item) in items.iter().enumerate() {
        let len = spans_text(&item.content).chars().count();
        if remaining <= len {
            return (index, remaining);
        }
        remaining -= len + 1;
    }
    match items.last() {
        Some(last) => (items.len() - 1, spans_text(&last.content).chars().count()),
        None => (0, 0),
    }
}

/// List version of [`splice_spans`]. Items outside the edited range are left
/// alone; a `\n` in `inserted` starts a new item with `new_flag`.
///
/// An item split with nothing before the cut hands its flag and nested items
/// to the piece that keeps its text, so a line opened above a checked item
/// does not take the check.
fn splice_items(
    items: &mut Vec<ListItem>,
    start: usize,
    removed: usize,
    inserted: &str,
    new_flag: Option<bool>,
) {
    if items.is_empty() {
        items.push(ListItem {
            checked: new_flag,
            ..ListItem::default()
        });
    }
    let (first, first_at) = locate_item(items, start);
    let (last, last_at) = locate_item(items, start + removed);
    let (head, rest) = split_spans(&items[first].content, first_at);
    let (_, tail) = split_spans(&items[last].content, last_at);
    let format = inherited_format(&head, &rest);

    let head_empty = spans_text(&head).is_empty();
    let tail_empty = spans_text(&tail).is_empty();
    let lines: Vec<&str> = inserted.split('\n').collect();
    let count = lines.len();

    let mut pieces: Vec<ListItem> = lines
        .iter()
        .enumerate()
        .map(|(k, line)| {
            let mut spans = Vec::new();
            if k == 0 {
                spans.extend(head.iter().cloned());
            }
            spans.push(RichText {
                text: line.to_string(),
                format: format.clone(),
            });
            if k == count - 1 {
                spans.extend(tail.iter().cloned());
            }
            ListItem {
                checked: new_flag,
                ..ListItem::new(normalize_spans(spans))
            }
        })
        .collect();

    let owner = if count > 1 && first == last && head_empty && !tail_empty {
        count - 1
    } else {
        0
    };
    pieces[owner].checked = items[first].checked;
    pieces[owner].children = items[first].children.clone();
    if first != last {
        if owner == count - 1 {
            pieces[owner]
                .children
                .extend(items[last].children.iter().cloned());
        } else {
            pieces[count - 1].checked = items[last].checked;
            pieces[count - 1].children = items[last].children.clone();
        }
    }
    items.splice(first..=last, pieces);
}

/// Drops empty spans and joins neighbours with identical formatting.
/// Always returns at least one span.
pub fn normalize_spans(spans: Vec<RichText>) -> Vec<RichText> {
    let mut out: Vec<RichText> = Vec::with_capacity(spans.len());
    for span in spans.into_iter().filter(|s| !s.text.is_empty()) {
        match out.last_mut() {
            Some(last) if last.same_format(&span) => last.text.push_str(&span.text),
            _ => out.push(span),
        }
    }
    if out.is_empty() {
        out.push(RichText::plain(""));
    }
    out
}

/// Splits a span sequence at a char offset (clamped to the text length).
pub fn split_spans(spans: &[RichText], offset: usize) -> (Vec<RichText>, Vec<RichText>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut remaining = offset;
    for span in spans {
        let len = span.text.chars().count();
        if remaining >= len {
            before.push(span.clone());
            remaining -= len;
        } else if remaining == 0 {
            after.push(span.clone());
        } else {
            let head: String = span.text.chars().take(remaining).collect();
            let tail: String = span.text.chars().skip(remaining).collect();
            before.push(RichText {
                text: head,
                format: span.format.clone(),
            });
            after.push(RichText {
                text: tail,
                format: span.format.clone(),
            });
            remaining = 0;
        }
    }
    (normalize_spans(before), normalize_spans(after))
}

pub fn concat_spans(head: &[RichText], tail: &[RichText]) -> Vec<RichText> {
    normalize_spans(head.iter().chain(tail.iter()).cloned().collect())
}

/// What a conversion could not carry over into the new variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionLoss {
    /// Multiple list items, nesting or checked flags collapsed to one run.
    ListStructure,
    /// Table cells were discarded.
    TableGrid,
    /// Span formatting could not be kept.
    Formatting,
    /// The new variant has no text payload; the text was discarded.
    Text,
    /// A url, file or page reference was discarded.
    Media,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub block: Block,
    pub losses: Vec<ConversionLoss>,
}

impl Conversion {
    pub fn is_lossy(&self) -> bool {
        !self.losses.is_empty()
    }
}

fn has_formatting(spans: &[RichText]) -> bool {
    spans
        .iter()
        .any(|s| s.format.as_ref().is_some_and(|f| !f.is_plain()))
}

fn conversion_losses(from: &BlockContent, to: BlockType) -> Vec<ConversionLoss> {
    let mut losses = Vec::new();
    let text = content_text(from);

    match from {
        BlockContent::BulletedList { items }
        | BlockContent::NumberedList { items, .. }
        | BlockContent::Checklist { items } => {
            let structured = items.len() > 1
                || items
                    .iter()
                    .any(|i| !i.children.is_empty() || i.checked == Some(true));
            if structured {
                losses.push(ConversionLoss::ListStructure);
            }
        }
        BlockContent::Table { rows, .. } => {
            let filled = rows
                .iter()
                .flatten()
                .any(|cell| !spans_text(&cell.content).is_empty());
            if filled && to != BlockType::Table {
                losses.push(ConversionLoss::TableGrid);
            }
        }
        BlockContent::Image { url, .. }
        | BlockContent::Bookmark { url, .. }
        | BlockContent::Embed { url, .. }
        | BlockContent::File { url, .. } => {
            if !url.is_empty() {
                losses.push(ConversionLoss::Media);
            }
        }
        BlockContent::Page { page_id, .. } => {
            if !page_id.is_empty() {
                losses.push(ConversionLoss::Media);
            }
        }
        _ => {}
    }

    let from_spans: Vec<RichText> = match from {
        BlockContent::BulletedList { items }
        | BlockContent::NumberedList { items, .. }
        | BlockContent::Checklist { items } => {
            items.iter().flat_map(|i| i.content.iter().cloned()).collect()
        }
        other => other.spans().map(<[RichText]>::to_vec).unwrap_or_default(),
    };
    if !text.is_empty() {
        if !is_text_bearing(to) {
            losses.push(ConversionLoss::Text);
        } else if to == BlockType::Code && has_formatting(&from_spans) {
            losses.push(ConversionLoss::Formatting);
        }
    }
    losses
}

/// Converts `block` to `new_type`, keeping identity, parent and creation
/// time. The new payload is seeded with the old text where the new variant
/// can hold text; spans are kept between span-bearing variants. Anything
/// that could not be carried over is reported in [`Conversion::losses`].
pub fn convert_block_type(block: &Block, new_type: BlockType) -> Conversion {
    if block.block_type() == new_type {
        return Conversion {
            block: block.clone(),
            losses: Vec::new(),
        };
    }

    let losses = conversion_losses(&block.content, new_type);
    let seed = match block.content.spans() {
        Some(spans) => spans.to_vec(),
        None => vec![RichText::plain(get_block_text_content(block))],
    };
    let content = content_with_spans(new_type, seed);

    if !losses.is_empty() {
        log::warn!(
            "lossy conversion of block {} from {} to {}: {:?}",
            block.id,
            block.block_type(),
            new_type,
            losses
        );
    }

    Conversion {
        block: Block {
            id: block.id.clone(),
            created_at: block.created_at,
            updated_at: Utc::now(),
            parent_id: block.parent_id.clone(),
            content,
        },
        losses,
    }
}

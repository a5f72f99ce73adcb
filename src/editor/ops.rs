//! Cursor-aware editing built on the store primitives.
//!
//! Offsets are char offsets into the block's flattened text (see
//! [`get_block_text_content`]); list items are separated by one `\n`.

use chrono::Utc;

use crate::block::utils::{
    concat_spans, content_with_spans, generate_id, is_text_bearing, locate_item, split_spans,
};
use crate::block::{
    convert_block_type, create_block, get_block_text_content, is_block_empty, tree, Block,
    BlockContent, BlockId, BlockType, Conversion, ListItem,
};
use crate::sync::types::BlockPatch;

use super::EditorState;

/// Where the cursor lands after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caret {
    pub block_id: BlockId,
    pub offset: usize,
}

impl Caret {
    fn new(block_id: impl Into<BlockId>, offset: usize) -> Self {
        Self {
            block_id: block_id.into(),
            offset,
        }
    }
}

impl EditorState {
    /// Splits the block at `offset`. The text after the cursor moves into a
    /// new block of the same type inserted right below, which gets focus.
    /// Blocks without text just get a fresh text block below them.
    pub fn split_block(&mut self, id: &str, offset: usize) -> Option<Caret> {
        let block = self.block(id)?.clone();

        let (head, tail) = match &block.content {
            BlockContent::Text { content }
            | BlockContent::Heading1 { content }
            | BlockContent::Heading2 { content }
            | BlockContent::Heading3 { content }
            | BlockContent::Quote { content } => {
                let (before, after) = split_spans(content, offset);
                (
                    BlockPatch::spans("content", &before),
                    content_with_spans(block.block_type(), after),
                )
            }
            BlockContent::Toggle { summary, .. } => {
                let (before, after) = split_spans(summary, offset);
                (
                    BlockPatch::spans("summary", &before),
                    content_with_spans(BlockType::Toggle, after),
                )
            }
            BlockContent::BulletedList { items }
            | BlockContent::NumberedList { items, .. }
            | BlockContent::Checklist { items }
                if !items.is_empty() =>
            {
                let (before, after) = split_items(items, offset);
                let content = match &block.content {
                    BlockContent::NumberedList { start, .. } => BlockContent::NumberedList {
                        start: start.saturating_add(
                            u32::try_from(before.len()).unwrap_or(u32::MAX),
                        ),
                        items: after,
                    },
                    BlockContent::Checklist { .. } => BlockContent::Checklist { items: after },
                    _ => BlockContent::BulletedList { items: after },
                };
                (items_patch(&before)?, content)
            }
            BlockContent::Code {
                content, language, ..
            } => {
                let before: String = content.chars().take(offset).collect();
                let after: String = content.chars().skip(offset).collect();
                (
                    BlockPatch::new().field("content", before.into()),
                    BlockContent::Code {
                        content: after,
                        language: language.clone(),
                        caption: Vec::new(),
                    },
                )
            }
            _ => {
                let paragraph = create_block(BlockType::Text, block.parent_id.clone());
                let new_id = self.insert_block(paragraph, Some(id))?;
                return Some(Caret::new(new_id, 0));
            }
        };

        if !self.update_block(id, head) {
            return None;
        }
        let new_id = self.insert_block(sibling_of(&block, tail), Some(id))?;
        Some(Caret::new(new_id, 0))
    }

    /// Appends the current block's text to the previous block in sequence
    /// and removes the current one. Both must be the same text-bearing type.
    pub fn merge_with_previous_block(&mut self) -> Option<Caret> {
        let id = self.current_block_id()?.to_string();
        let index = self.index_of(&id)?;
        if index == 0 {
            return None;
        }
        let current = self.blocks()[index].clone();
        let previous = self.blocks()[index - 1].clone();
        if current.block_type() != previous.block_type() || !is_text_bearing(current.block_type())
        {
            return None;
        }

        let caret_offset = get_block_text_content(&previous).chars().count();
        let patch = match (&previous.content, &current.content) {
            (BlockContent::Toggle { summary: head, .. }, BlockContent::Toggle { summary: tail, .. }) => {
                BlockPatch::spans("summary", &concat_spans(head, tail))
            }
            (
                BlockContent::Code { content: head, .. },
                BlockContent::Code { content: tail, .. },
            ) => BlockPatch::new().field("content", format!("{}{}", head, tail).into()),
            (prev, cur) => match (prev.spans(), cur.spans(), prev.items(), cur.items()) {
                (Some(head), Some(tail), _, _) => BlockPatch::spans("content", &concat_spans(head, tail)),
                (_, _, Some(head), Some(tail)) => items_patch(&join_items(head, tail))?,
                _ => return None,
            },
        };

        if !self.update_block(&previous.id, patch) {
            return None;
        }
        self.delete_block(&id);
        self.focus_block(&previous.id);
        Some(Caret::new(previous.id, caret_offset))
    }

    /// Backspace with the cursor at offset 0 of the current block: an empty
    /// block is removed, anything else is merged into the previous block.
    pub fn handle_backspace_at_block_start(&mut self) -> Option<Caret> {
        let id = self.current_block_id()?.to_string();
        let block = self.block(&id)?;
        if !is_block_empty(block) {
            return self.merge_with_previous_block();
        }

        let index = self.index_of(&id)?;
        if !self.delete_block(&id) {
            return None;
        }
        let target = self.blocks()[index.saturating_sub(1)].clone();
        self.focus_block(&target.id);
        let offset = get_block_text_content(&target).chars().count();
        Some(Caret::new(target.id, offset))
    }

    /// Nests the block under the block right before it in sequence.
    pub fn indent_block(&mut self, id: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if index == 0 {
            return false;
        }
        let previous = self.blocks()[index - 1].id.clone();
        if self.blocks()[index].parent_id.as_deref() == Some(previous.as_str()) {
            return false;
        }
        if tree::would_create_cycle(self.blocks(), id, &previous) {
            log::debug!("indent of {} under {} refused: would form a cycle", id, previous);
            return false;
        }
        self.update_block(id, BlockPatch::parent(Some(&previous)))
    }

    /// Moves the block one level up, next to its former parent.
    pub fn outdent_block(&mut self, id: &str) -> bool {
        let Some(parent_id) = self.block(id).and_then(|b| b.parent_id.clone()) else {
            return false;
        };
        let grandparent = self.block(&parent_id).and_then(|p| p.parent_id.clone());
        self.update_block(id, BlockPatch::parent(grandparent.as_deref()))
    }

    /// Converts the block to `new_type` in place. The returned conversion
    /// lists what could not be carried over.
    pub fn toggle_block_type(&mut self, id: &str, new_type: BlockType) -> Option<Conversion> {
        let block = self.block(id)?;
        let conversion = convert_block_type(block, new_type);
        if block.block_type() == new_type {
            return Some(conversion);
        }
        if !self.update_block(id, BlockPatch::content(&conversion.block.content)) {
            return None;
        }
        Some(conversion)
    }
}

fn sibling_of(block: &Block, content: BlockContent) -> Block {
    let now = Utc::now();
    Block {
        id: generate_id(),
        created_at: now,
        updated_at: now,
        parent_id: block.parent_id.clone(),
        content,
    }
}

fn items_patch(items: &[ListItem]) -> Option<BlockPatch> {
    let value = serde_json::to_value(items).ok()?;
    Some(BlockPatch::new().field("items", value))
}

/// The split item keeps its flag on both halves; nested items follow the
/// text after the cursor.
fn split_items(items: &[ListItem], offset: usize) -> (Vec<ListItem>, Vec<ListItem>) {
    let (index, local) = locate_item(items, offset);
    let item = &items[index];
    let (before, after) = split_spans(&item.content, local);

    let mut head = items[..index].to_vec();
    head.push(ListItem {
        content: before,
        checked: item.checked,
        children: Vec::new(),
    });

    let mut tail = vec![ListItem {
        content: after,
        checked: item.checked,
        children: item.children.clone(),
    }];
    tail.extend_from_slice(&items[index + 1..]);
    (head, tail)
}

fn join_items(head: &[ListItem], tail: &[ListItem]) -> Vec<ListItem> {
    let mut joined = head.to_vec();
    let mut rest = tail.iter();
    match (joined.last_mut(), rest.next()) {
        (Some(last), Some(first)) => {
            last.content = concat_spans(&last.content, &first.content);
            last.children.extend(first.children.iter().cloned());
        }
        (None, Some(first)) => joined.push(first.clone()),
        _ => {}
    }
    joined.extend(rest.cloned());
    joined
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::*;
    use super::*;
    use crate::block::utils::spans_text;
    use crate::block::{ConversionLoss, RichText, TextFormat};
    use crate::sync::types::Permission;
    use serde_json::json;

    fn bold(text: &str) -> RichText {
        RichText::formatted(
            text,
            TextFormat {
                bold: true,
                ..TextFormat::default()
            },
        )
    }

    #[test]
    fn heading_split_and_merge_scenario() {
        let mut editor = EditorState::new("doc");
        let b0 = editor.blocks()[0].id.clone();

        let b1 = editor.add_block(BlockType::Heading1, Some(&b0)).unwrap();
        assert_eq!(editor.blocks().len(), 2);
        assert_eq!(editor.current_block_id(), Some(b1.as_str()));
        assert_eq!(editor.focused_block_id(), Some(b1.as_str()));

        assert!(editor.update_block(
            &b1,
            BlockPatch::from_json(json!({"content": [{"text": "Title"}]})).unwrap()
        ));

        let caret = editor.split_block(&b1, 3).unwrap();
        let b2 = caret.block_id.clone();
        assert_eq!(text_of(&editor, &b1), "Tit");
        assert_eq!(text_of(&editor, &b2), "le");
        assert_eq!(editor.block(&b2).unwrap().block_type(), BlockType::Heading1);
        assert_eq!(editor.focused_block_id(), Some(b2.as_str()));

        let caret = editor.merge_with_previous_block().unwrap();
        assert_eq!(caret, Caret::new(b1.clone(), 3));
        assert_eq!(text_of(&editor, &b1), "Title");
        assert!(editor.block(&b2).is_none());
        assert_eq!(editor.focused_block_id(), Some(b1.as_str()));
        assert_eq!(editor.blocks().len(), 2);
    }

    #[test]
    fn split_then_merge_restores_text_at_every_offset() {
        let text = "héllo wörld";
        for k in 0..=text.chars().count() {
            let mut editor = editor_with(&[text]);
            editor.split_block("b0", k).unwrap();
            editor.merge_with_previous_block().unwrap();
            assert_eq!(editor.blocks().len(), 1, "offset {}", k);
            assert_eq!(text_of(&editor, "b0"), text, "offset {}", k);
        }
    }

    #[test]
    fn split_preserves_span_formatting() {
        let mut editor = editor_with(&[""]);
        editor.update_block("b0", BlockPatch::spans("content", &[RichText::plain("ab"), bold("cd")]));
        let caret = editor.split_block("b0", 3).unwrap();
        assert_eq!(
            editor.block("b0").unwrap().content.spans().unwrap(),
            &[RichText::plain("ab"), bold("c")]
        );
        assert_eq!(
            editor.block(&caret.block_id).unwrap().content.spans().unwrap(),
            &[bold("d")]
        );
    }

    #[test]
    fn split_offset_past_end_clamps() {
        let mut editor = editor_with(&["abc"]);
        let caret = editor.split_block("b0", 50).unwrap();
        assert_eq!(text_of(&editor, "b0"), "abc");
        assert_eq!(text_of(&editor, &caret.block_id), "");
    }

    #[test]
    fn split_keeps_parent() {
        let mut editor = editor_with(&["root", "child"]);
        editor.indent_block("b1");
        let caret = editor.split_block("b1", 2).unwrap();
        assert_eq!(
            editor.block(&caret.block_id).unwrap().parent_id.as_deref(),
            Some("b0")
        );
    }

    #[test]
    fn split_checklist_item_in_the_middle() {
        let mut block = make_block("l", BlockType::Checklist, "");
        block.content = BlockContent::Checklist {
            items: vec![
                ListItem {
                    checked: Some(true),
                    ..ListItem::new(vec![RichText::plain("milk")])
                },
                ListItem {
                    checked: Some(false),
                    ..ListItem::new(vec![RichText::plain("eggs")])
                },
            ],
        };
        let mut editor = editor_from(vec![block]);
        // "milk\neggs": offset 7 lands inside "eggs" after "eg"
        let caret = editor.split_block("l", 7).unwrap();
        assert_eq!(text_of(&editor, "l"), "milk\neg");
        assert_eq!(text_of(&editor, &caret.block_id), "gs");
        let tail = editor.block(&caret.block_id).unwrap();
        assert_eq!(tail.block_type(), BlockType::Checklist);
        assert_eq!(tail.content.items().unwrap()[0].checked, Some(false));

        editor.merge_with_previous_block().unwrap();
        assert_eq!(text_of(&editor, "l"), "milk\neggs");
        assert_eq!(editor.block("l").unwrap().content.items().unwrap().len(), 2);
    }

    #[test]
    fn split_numbered_list_continues_numbering() {
        let mut block = make_block("n", BlockType::NumberedList, "");
        block.content = BlockContent::NumberedList {
            items: vec![
                ListItem::new(vec![RichText::plain("one")]),
                ListItem::new(vec![RichText::plain("two")]),
            ],
            start: 1,
        };
        let mut editor = editor_from(vec![block]);
        // offset 4 is the start of "two": "one" and an empty item stay above
        let caret = editor.split_block("n", 4).unwrap();
        assert_eq!(text_of(&editor, "n"), "one\n");
        match &editor.block(&caret.block_id).unwrap().content {
            BlockContent::NumberedList { start, items } => {
                assert_eq!(*start, 3);
                assert_eq!(spans_text(&items[0].content), "two");
            }
            other => panic!("expected numbered list, got {:?}", other),
        }
    }

    #[test]
    fn split_numbered_list_saturates_huge_start() {
        let mut block = make_block("n", BlockType::NumberedList, "");
        block.content = BlockContent::NumberedList {
            items: vec![
                ListItem::new(vec![RichText::plain("one")]),
                ListItem::new(vec![RichText::plain("two")]),
            ],
            start: u32::MAX,
        };
        let mut editor = editor_from(vec![block]);
        let caret = editor.split_block("n", 4).unwrap();
        match &editor.block(&caret.block_id).unwrap().content {
            BlockContent::NumberedList { start, .. } => assert_eq!(*start, u32::MAX),
            other => panic!("expected numbered list, got {:?}", other),
        }
    }

    #[test]
    fn split_code_keeps_language() {
        let mut block = make_block("c", BlockType::Code, "");
        block.content = BlockContent::Code {
            content: "let a;\nlet b;".into(),
            language: "rust".into(),
            caption: Vec::new(),
        };
        let mut editor = editor_from(vec![block]);
        let caret = editor.split_block("c", 6).unwrap();
        assert_eq!(text_of(&editor, "c"), "let a;");
        match &editor.block(&caret.block_id).unwrap().content {
            BlockContent::Code {
                content, language, ..
            } => {
                assert_eq!(content, "\nlet b;");
                assert_eq!(language, "rust");
            }
            other => panic!("expected code, got {:?}", other),
        }
    }

    #[test]
    fn split_divider_opens_paragraph_below() {
        let mut editor = editor_from(vec![make_block("d", BlockType::Divider, ""), text_block("t", "after")]);
        let caret = editor.split_block("d", 0).unwrap();
        assert_eq!(ids(&editor)[1], caret.block_id);
        assert_eq!(editor.block(&caret.block_id).unwrap().block_type(), BlockType::Text);
        assert_eq!(editor.block("d").unwrap().content, BlockContent::Divider);
    }

    #[test]
    fn split_unknown_block_is_noop() {
        let mut editor = editor_with(&["a"]);
        assert!(editor.split_block("ghost", 0).is_none());
        assert_eq!(editor.blocks().len(), 1);
    }

    #[test]
    fn split_is_noop_when_read_only() {
        let mut editor = editor_with(&["abc"]);
        editor.set_permission(Permission::View);
        assert!(editor.split_block("b0", 1).is_none());
        assert_eq!(text_of(&editor, "b0"), "abc");
        assert_eq!(editor.blocks().len(), 1);
    }

    #[test]
    fn merge_across_types_is_noop() {
        let mut editor = editor_from(vec![
            make_block("h", BlockType::Heading2, "head"),
            text_block("t", "body"),
        ]);
        editor.focus_block("t");
        assert!(editor.merge_with_previous_block().is_none());
        assert_eq!(editor.blocks().len(), 2);
    }

    #[test]
    fn merge_first_block_is_noop() {
        let mut editor = editor_with(&["a", "b"]);
        editor.focus_block("b0");
        assert!(editor.merge_with_previous_block().is_none());
    }

    #[test]
    fn merge_coalesces_equal_formats() {
        let mut editor = editor_with(&["", ""]);
        editor.update_block("b0", BlockPatch::spans("content", &[bold("ab")]));
        editor.update_block("b1", BlockPatch::spans("content", &[bold("cd")]));
        editor.focus_block("b1");
        editor.merge_with_previous_block().unwrap();
        assert_eq!(
            editor.block("b0").unwrap().content.spans().unwrap(),
            &[bold("abcd")]
        );
    }

    #[test]
    fn merge_dividers_is_noop() {
        let mut editor = editor_from(vec![
            make_block("d1", BlockType::Divider, ""),
            make_block("d2", BlockType::Divider, ""),
        ]);
        editor.focus_block("d2");
        assert!(editor.merge_with_previous_block().is_none());
    }

    #[test]
    fn backspace_on_empty_block_deletes_and_focuses_previous() {
        let mut editor = editor_with(&["keep", ""]);
        editor.focus_block("b1");
        let caret = editor.handle_backspace_at_block_start().unwrap();
        assert_eq!(caret, Caret::new("b0", 4));
        assert_eq!(ids(&editor), vec!["b0"]);
        assert_eq!(editor.focused_block_id(), Some("b0"));
    }

    #[test]
    fn backspace_on_empty_first_block_focuses_new_first() {
        let mut editor = editor_with(&["", "next"]);
        editor.focus_block("b0");
        let caret = editor.handle_backspace_at_block_start().unwrap();
        assert_eq!(caret.block_id, "b1");
        assert_eq!(editor.focused_block_id(), Some("b1"));
    }

    #[test]
    fn backspace_on_only_empty_block_keeps_it() {
        let mut editor = EditorState::new("doc");
        assert!(editor.handle_backspace_at_block_start().is_none());
        assert_eq!(editor.blocks().len(), 1);
    }

    #[test]
    fn backspace_on_non_empty_block_merges() {
        let mut editor = editor_with(&["foo", "bar"]);
        editor.focus_block("b1");
        let caret = editor.handle_backspace_at_block_start().unwrap();
        assert_eq!(caret, Caret::new("b0", 3));
        assert_eq!(text_of(&editor, "b0"), "foobar");
    }

    #[test]
    fn backspace_on_non_empty_block_after_other_type_keeps_content() {
        let mut editor = editor_from(vec![
            make_block("q", BlockType::Quote, "quote"),
            text_block("t", "text"),
        ]);
        editor.focus_block("t");
        assert!(editor.handle_backspace_at_block_start().is_none());
        assert_eq!(text_of(&editor, "t"), "text");
    }

    #[test]
    fn indent_scenario() {
        let mut editor = editor_with(&["a", "b", "c"]);
        assert!(editor.indent_block("b1"));
        assert_eq!(editor.block("b1").unwrap().parent_id.as_deref(), Some("b0"));
        assert!(!editor.indent_block("b0"));
        assert_eq!(editor.block("b0").unwrap().parent_id, None);
    }

    #[test]
    fn indent_refuses_descendant_as_parent() {
        let mut editor = editor_with(&["a", "b"]);
        // b1 above b0 in sequence, but b1 is b0's child
        editor.update_block("b1", BlockPatch::parent(Some("b0")));
        editor.move_block_up("b1");
        assert_eq!(ids(&editor), vec!["b1", "b0"]);
        assert!(!editor.indent_block("b0"));
        for block in editor.blocks() {
            let chain = tree::ancestors(editor.blocks(), &block.id).unwrap();
            assert!(!chain.contains(&block.id));
        }
    }

    #[test]
    fn repeated_indent_builds_staircase() {
        let mut editor = editor_with(&["a", "b", "c"]);
        assert!(editor.indent_block("b1"));
        assert!(editor.indent_block("b2"));
        assert!(!editor.indent_block("b2"));
        assert_eq!(tree::depth(editor.blocks(), "b2"), 2);
    }

    #[test]
    fn outdent_moves_one_level_up() {
        let mut editor = editor_with(&["a", "b", "c"]);
        editor.indent_block("b1");
        editor.indent_block("b2");
        assert!(editor.outdent_block("b2"));
        assert_eq!(editor.block("b2").unwrap().parent_id.as_deref(), Some("b0"));
        assert!(editor.outdent_block("b2"));
        assert_eq!(editor.block("b2").unwrap().parent_id, None);
        assert!(!editor.outdent_block("b2"));
    }

    #[test]
    fn toggle_type_converts_in_place() {
        let mut editor = editor_with(&["x", "Title", "y"]);
        let conversion = editor.toggle_block_type("b1", BlockType::Heading2).unwrap();
        assert!(!conversion.is_lossy());
        assert_eq!(ids(&editor), vec!["b0", "b1", "b2"]);
        let block = editor.block("b1").unwrap();
        assert_eq!(block.block_type(), BlockType::Heading2);
        assert_eq!(get_block_text_content(block), "Title");
    }

    #[test]
    fn toggle_list_to_text_reports_loss() {
        let mut block = make_block("l", BlockType::BulletedList, "");
        block.content = BlockContent::BulletedList {
            items: vec![
                ListItem::new(vec![RichText::plain("a")]),
                ListItem::new(vec![RichText::plain("b")]),
            ],
        };
        let mut editor = editor_from(vec![block]);
        let conversion = editor.toggle_block_type("l", BlockType::Text).unwrap();
        assert_eq!(conversion.losses, vec![ConversionLoss::ListStructure]);
        assert_eq!(editor.block("l").unwrap().block_type(), BlockType::Text);
    }

    #[test]
    fn toggle_to_same_type_records_nothing() {
        let mut editor = editor_with(&["a"]);
        editor.toggle_block_type("b0", BlockType::Text).unwrap();
        assert_eq!(editor.revision(), 0);
    }
}

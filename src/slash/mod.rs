mod types;

mod bulleted;
mod checklist;
mod code;
mod divider;
mod h1;
mod h2;
mod h3;
mod numbered;
mod quote;
mod text;
mod toggle;

pub use types::*;

use crate::block::utils::is_text_bearing;
use crate::block::{get_block_text_content, is_block_empty, Block};
use crate::editor::{Caret, EditorState};

pub const TRIGGER: char = '/';

pub fn all_commands() -> Vec<SlashCommand> {
    vec![
        text::CMD,
        h1::CMD,
        h2::CMD,
        h3::CMD,
        bulleted::CMD,
        numbered::CMD,
        checklist::CMD,
        toggle::CMD,
        code::CMD,
        quote::CMD,
        divider::CMD,
    ]
}

/// Case-insensitive substring match on name or description, in catalog order.
pub fn filter(query: &str) -> Vec<SlashCommand> {
    all_commands()
        .into_iter()
        .filter(|c| c.matches(query))
        .collect()
}

/// Whether typing `ch` at `cursor` in `block` should open the menu: the
/// trigger character at the start of an empty text-bearing block.
pub fn detect_trigger(block: &Block, ch: char, cursor: usize) -> bool {
    ch == TRIGGER && cursor == 0 && is_text_bearing(block.block_type()) && is_block_empty(block)
}

impl SlashMenuState {
    pub fn open(block_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            query: String::new(),
            commands: all_commands(),
            selected: 0,
        }
    }

    /// Refilters the catalog; selection goes back to the first entry.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.commands = filter(query);
        self.selected = 0;
    }

    pub fn push_char(&mut self, ch: char) {
        let mut query = self.query.clone();
        query.push(ch);
        self.set_query(&query);
    }

    /// Removes the last query char. Returns `false` when the query was
    /// already empty, meaning the trigger itself was erased.
    pub fn pop_char(&mut self) -> bool {
        let mut query = self.query.clone();
        if query.pop().is_none() {
            return false;
        }
        self.set_query(&query);
        true
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.commands.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_command(&self) -> Option<&SlashCommand> {
        self.commands.get(self.selected)
    }

    /// Converts the triggering block to the selected command's type, with
    /// the `/query` text removed. `None` when nothing is selectable or the
    /// editor refused the change.
    pub fn accept(self, editor: &mut EditorState) -> Option<Caret> {
        let command = self.selected_command()?.clone();
        let block = editor.block(&self.block_id)?;

        let typed = format!("{}{}", TRIGGER, self.query);
        let text = get_block_text_content(block);
        let cleaned = match text.find(&typed) {
            Some(at) => format!("{}{}", &text[..at], &text[at + typed.len()..]),
            None => text.clone(),
        };
        if cleaned != text && !editor.set_block_text(&self.block_id, &cleaned) {
            return None;
        }

        let conversion = editor.toggle_block_type(&self.block_id, command.block_type)?;
        editor.focus_block(&self.block_id);
        log::debug!(
            "slash command {:?} turned {} into {}",
            command.name,
            self.block_id,
            command.block_type
        );
        let offset = get_block_text_content(&conversion.block).chars().count();
        Some(Caret {
            block_id: self.block_id,
            offset,
        })
    }

    /// Closes the menu without touching the document.
    pub fn cancel(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{create_block, BlockType};
    use crate::editor::test_helpers::{editor_with, text_of};
    use crate::sync::types::Permission;

    // --- filter tests ---

    #[test]
    fn filter_empty_returns_all() {
        assert_eq!(filter("").len(), all_commands().len());
    }

    #[test]
    fn filter_matches_name_case_insensitive() {
        let names: Vec<&str> = filter("HEAD").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Heading 1", "Heading 2", "Heading 3"]);
    }

    #[test]
    fn filter_matches_description() {
        let names: Vec<&str> = filter("snippet").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Code"]);
        let names: Vec<&str> = filter("to-do").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Checklist"]);
    }

    #[test]
    fn filter_keeps_catalog_order() {
        let names: Vec<&str> = filter("list").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Bulleted List", "Numbered List", "Checklist"]);
    }

    #[test]
    fn filter_no_match() {
        assert!(filter("zzz").is_empty());
    }

    #[test]
    fn all_commands_unique_names_and_types() {
        let cmds = all_commands();
        let mut names: Vec<&str> = cmds.iter().map(|c| c.name).collect();
        let mut types: Vec<&str> = cmds.iter().map(|c| c.block_type.as_str()).collect();
        names.sort();
        names.dedup();
        types.sort();
        types.dedup();
        assert_eq!(names.len(), cmds.len());
        assert_eq!(types.len(), cmds.len());
    }

    // --- trigger tests ---

    #[test]
    fn trigger_at_start_of_empty_block() {
        let block = create_block(BlockType::Text, None);
        assert!(detect_trigger(&block, '/', 0));
        assert!(!detect_trigger(&block, '/', 1));
        assert!(!detect_trigger(&block, 'a', 0));
    }

    #[test]
    fn no_trigger_in_non_empty_or_textless_block() {
        let editor = editor_with(&["hello"]);
        assert!(!detect_trigger(editor.block("b0").unwrap(), '/', 0));
        let divider = create_block(BlockType::Divider, None);
        assert!(!detect_trigger(&divider, '/', 0));
    }

    // --- selection tests ---

    #[test]
    fn selection_clamps_without_wrapping() {
        let mut menu = SlashMenuState::open("b0");
        menu.select_previous();
        assert_eq!(menu.selected, 0);
        for _ in 0..50 {
            menu.select_next();
        }
        assert_eq!(menu.selected, menu.commands.len() - 1);
    }

    #[test]
    fn typing_resets_selection() {
        let mut menu = SlashMenuState::open("b0");
        menu.select_next();
        menu.select_next();
        menu.push_char('h');
        assert_eq!(menu.selected, 0);
        assert_eq!(menu.query, "h");
        assert!(menu.pop_char());
        assert!(!menu.pop_char());
        assert_eq!(menu.commands.len(), all_commands().len());
    }

    #[test]
    fn empty_filter_has_no_selection() {
        let mut menu = SlashMenuState::open("b0");
        menu.set_query("qqq");
        menu.select_next();
        assert_eq!(menu.selected, 0);
        assert!(menu.selected_command().is_none());
    }

    // --- accept / cancel tests ---

    #[test]
    fn accept_converts_block_and_strips_query() {
        let mut editor = editor_with(&["intro", "/hea", "outro"]);
        let mut menu = SlashMenuState::open("b1");
        menu.set_query("hea");
        menu.select_next();
        let caret = menu.accept(&mut editor).unwrap();

        assert_eq!(caret.block_id, "b1");
        assert_eq!(editor.index_of("b1"), Some(1));
        let block = editor.block("b1").unwrap();
        assert_eq!(block.block_type(), BlockType::Heading2);
        assert_eq!(text_of(&editor, "b1"), "");
        assert_eq!(editor.focused_block_id(), Some("b1"));
    }

    #[test]
    fn accept_divider_on_trigger_block() {
        let mut editor = editor_with(&["/div"]);
        let mut menu = SlashMenuState::open("b0");
        menu.set_query("div");
        menu.accept(&mut editor).unwrap();
        assert_eq!(editor.block("b0").unwrap().block_type(), BlockType::Divider);
    }

    #[test]
    fn accept_without_match_is_noop() {
        let mut editor = editor_with(&["/zz"]);
        let mut menu = SlashMenuState::open("b0");
        menu.set_query("zz");
        assert!(menu.accept(&mut editor).is_none());
        assert_eq!(text_of(&editor, "b0"), "/zz");
    }

    #[test]
    fn accept_in_read_only_document_is_noop() {
        let mut editor = editor_with(&["/code"]);
        editor.set_permission(Permission::View);
        let mut menu = SlashMenuState::open("b0");
        menu.set_query("code");
        assert!(menu.accept(&mut editor).is_none());
        assert_eq!(editor.block("b0").unwrap().block_type(), BlockType::Text);
    }

    #[test]
    fn cancel_leaves_document_untouched() {
        let mut editor = editor_with(&["/hea"]);
        let mut menu = SlashMenuState::open("b0");
        menu.set_query("hea");
        menu.cancel();
        assert_eq!(text_of(&editor, "b0"), "/hea");
        assert_eq!(editor.revision(), 0);
        assert!(editor.take_outbound().is_empty());
    }
}

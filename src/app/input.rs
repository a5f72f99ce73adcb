use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::block::BlockType;
use crate::slash::{detect_trigger, SlashMenuState};

use super::state::AppState;

pub fn handle_key(state: &mut AppState, key: &KeyEvent) {
    if state.error_popup.is_some() {
        state.error_popup = None;
        return;
    }
    if state.slash.is_some() {
        handle_slash_key(state, key);
        return;
    }
    state.status_message = None;

    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
            state.should_quit = true;
        }
        (KeyModifiers::CONTROL, KeyCode::Char('t')) => toggle_focused(state),
        (KeyModifiers::ALT, KeyCode::Up) => {
            if let Some(id) = state.focused_id() {
                state.session.edit(|e| e.move_block_up(&id));
            }
        }
        (KeyModifiers::ALT, KeyCode::Down) => {
            if let Some(id) = state.focused_id() {
                state.session.edit(|e| e.move_block_down(&id));
            }
        }
        (KeyModifiers::NONE, KeyCode::Up) => focus_relative(state, -1),
        (KeyModifiers::NONE, KeyCode::Down) => focus_relative(state, 1),
        (KeyModifiers::NONE, KeyCode::Left) => state.buffer.move_left(),
        (KeyModifiers::NONE, KeyCode::Right) => state.buffer.move_right(),
        (KeyModifiers::ALT, KeyCode::Left) | (KeyModifiers::CONTROL, KeyCode::Left) => {
            state.buffer.move_word_left()
        }
        (KeyModifiers::ALT, KeyCode::Right) | (KeyModifiers::CONTROL, KeyCode::Right) => {
            state.buffer.move_word_right()
        }
        (KeyModifiers::NONE, KeyCode::Home) => state.buffer.move_line_start(),
        (KeyModifiers::NONE, KeyCode::End) => state.buffer.move_line_end(),
        (KeyModifiers::NONE, KeyCode::Enter) => split_focused(state),
        (KeyModifiers::SHIFT, KeyCode::Enter) => {
            state.edit_text(|b| b.insert_char('\n'));
        }
        (KeyModifiers::NONE, KeyCode::Backspace) => backspace(state),
        (KeyModifiers::NONE, KeyCode::Delete) => {
            state.edit_text(|b| b.delete_forward());
        }
        (KeyModifiers::NONE, KeyCode::Tab) => {
            if let Some(id) = state.focused_id() {
                state.session.edit(|e| e.indent_block(&id));
            }
        }
        (KeyModifiers::SHIFT, KeyCode::BackTab) | (KeyModifiers::NONE, KeyCode::BackTab) => {
            if let Some(id) = state.focused_id() {
                state.session.edit(|e| e.outdent_block(&id));
            }
        }
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => type_char(state, c),
        _ => {}
    }
}

fn type_char(state: &mut AppState, c: char) {
    let opens_menu = state
        .focused_block()
        .is_some_and(|block| detect_trigger(block, c, state.buffer.cursor));
    if !state.edit_text(|b| b.insert_char(c)) {
        return;
    }
    if opens_menu {
        if let Some(id) = state.focused_id() {
            state.slash = Some(SlashMenuState::open(id));
        }
    }
}

fn split_focused(state: &mut AppState) {
    let Some(id) = state.focused_id() else {
        return;
    };
    let offset = state.buffer.cursor;
    if let Some(caret) = state.session.edit(|e| e.split_block(&id, offset)) {
        state.focus(&caret);
    }
}

fn backspace(state: &mut AppState) {
    if state.buffer.cursor > 0 {
        state.edit_text(|b| b.delete_back());
        return;
    }
    let Some(id) = state.focused_id() else {
        return;
    };
    let caret = state.session.edit(|e| {
        e.set_current_block(Some(&id));
        e.handle_backspace_at_block_start()
    });
    if let Some(caret) = caret {
        state.focus(&caret);
    }
}

fn toggle_focused(state: &mut AppState) {
    let Some(block) = state.focused_block() else {
        return;
    };
    let id = block.id.clone();
    match block.block_type() {
        BlockType::Checklist => {
            let item = state.cursor_item();
            state.session.edit(|e| e.toggle_checked(&id, item));
        }
        BlockType::Toggle => {
            state.session.edit(|e| e.toggle_open(&id));
        }
        _ => {
            state.status_message = Some("Nothing to toggle here".into());
        }
    }
}

/// Moves focus to the previous/next block in view order.
fn focus_relative(state: &mut AppState, delta: isize) {
    let Some(current) = state.focused_id() else {
        return;
    };
    let target = {
        let visible = state.visible_blocks();
        let Some(idx) = visible.iter().position(|v| v.block.id == current) else {
            return;
        };
        let next = idx as isize + delta;
        if next < 0 || next as usize >= visible.len() {
            return;
        }
        visible[next as usize].block.id.clone()
    };
    state.focus_end(&target);
}

fn handle_slash_key(state: &mut AppState, key: &KeyEvent) {
    match (key.modifiers, key.code) {
        (KeyModifiers::NONE, KeyCode::Esc) => {
            if let Some(menu) = state.slash.take() {
                menu.cancel();
            }
        }
        (KeyModifiers::NONE, KeyCode::Up) => {
            if let Some(menu) = &mut state.slash {
                menu.select_previous();
            }
        }
        (KeyModifiers::NONE, KeyCode::Down) => {
            if let Some(menu) = &mut state.slash {
                menu.select_next();
            }
        }
        (KeyModifiers::NONE, KeyCode::Enter) => {
            let Some(menu) = state.slash.take() else {
                return;
            };
            if menu.commands.is_empty() {
                return;
            }
            if let Some(caret) = state.session.edit(|e| menu.accept(e)) {
                state.focus(&caret);
            }
        }
        (KeyModifiers::NONE, KeyCode::Backspace) => {
            let still_open = state.slash.as_mut().is_some_and(|menu| menu.pop_char());
            state.edit_text(|b| b.delete_back());
            if !still_open {
                state.slash = None;
            }
        }
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            if state.edit_text(|b| b.insert_char(c)) {
                if let Some(menu) = &mut state.slash {
                    menu.push_char(c);
                }
            }
        }
        _ => {}
    }
}

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Position;

use crate::tui::{rendering::PaneLayout, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    FocusLeft,
    FocusRight,
    ToggleFocus,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    Top,
    Bottom,
    ToggleAutoScroll,
    EnterFilter,
    ClearFilter,
    CycleSort,
    ToggleTextSelection,
    FilterChar(char),
    FilterBackspace,
    ExitFilter,
    ExitFilterMoveUp,
    ExitFilterMoveDown,
}

/// Translate a key press into an [`Action`]; the filter edit mode takes
/// precedence over navigation bindings.
pub fn map_key(key: KeyEvent, state: &AppState) -> Action {
    // Only handle the initial key press event. Ignore Repeat and Release
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    // Early catch for Ctrl + C so the app can exit from any mode.
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
        return Action::Quit;
    }

    if state.is_filter_editing() {
        return map_filter_key(key.code, ctrl);
    }
    if ctrl {
        return match key.code {
            KeyCode::Char('f') | KeyCode::Char('F') => Action::PageDown,
            KeyCode::Char('b') | KeyCode::Char('B') => Action::PageUp,
            KeyCode::Char('d') | KeyCode::Char('D') => Action::HalfPageDown,
            KeyCode::Char('u') | KeyCode::Char('U') => Action::HalfPageUp,
            _ => Action::None,
        };
    }
    map_navigation_key(key.code)
}

fn map_filter_key(code: KeyCode, ctrl: bool) -> Action {
    match code {
        KeyCode::Enter | KeyCode::Esc => Action::ExitFilter,
        KeyCode::Up => Action::ExitFilterMoveUp,
        KeyCode::Down => Action::ExitFilterMoveDown,
        KeyCode::Backspace => Action::FilterBackspace,
        KeyCode::Char(ch) if !ctrl && !ch.is_control() => Action::FilterChar(ch),
        _ => Action::None,
    }
}

fn map_navigation_key(code: KeyCode) -> Action {
    match code {
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') => Action::FocusLeft,
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') => Action::FocusRight,
        KeyCode::Tab => Action::ToggleFocus,
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => Action::MoveDown,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::Home | KeyCode::Char('g') => Action::Top,
        KeyCode::End | KeyCode::Char('G') => Action::Bottom,
        KeyCode::Char('a') | KeyCode::Char('A') => Action::ToggleAutoScroll,
        KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::Char('/') => Action::EnterFilter,
        KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Esc => Action::ClearFilter,
        KeyCode::Char('s') | KeyCode::Char('S') => Action::CycleSort,
        KeyCode::Char('t') | KeyCode::Char('T') => Action::ToggleTextSelection,
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        _ => Action::None,
    }
}

pub fn apply(state: &mut AppState, action: Action) {
    match action {
        Action::None => {}
        Action::Quit => state.stop(),
        Action::FocusLeft => state.focus_left(),
        Action::FocusRight => state.focus_right(),
        Action::ToggleFocus => state.toggle_focus(),
        Action::MoveUp => state.navigate_up(),
        Action::MoveDown => state.navigate_down(),
        Action::PageUp => state.page_up(),
        Action::PageDown => state.page_down(),
        Action::HalfPageUp => state.half_page_up(),
        Action::HalfPageDown => state.half_page_down(),
        Action::Top => state.go_to_top(),
        Action::Bottom => state.go_to_bottom(),
        Action::ToggleAutoScroll => state.toggle_auto_scroll(),
        Action::EnterFilter => state.enter_filter_mode(),
        Action::ClearFilter => state.clear_focused_filter(),
        Action::CycleSort => state.cycle_sort_mode(),
        Action::ToggleTextSelection => state.toggle_text_selection_mode(),
        Action::FilterChar(ch) => state.push_filter_char(ch),
        Action::FilterBackspace => state.pop_filter_char(),
        Action::ExitFilter => state.exit_filter_mode(),
        Action::ExitFilterMoveUp => {
            state.exit_filter_mode();
            state.navigate_up();
        }
        Action::ExitFilterMoveDown => {
            state.exit_filter_mode();
            state.navigate_down();
        }
    }
}

/// Left clicks select a list row or focus the detail pane. Ignored while
/// text selection mode hands the mouse back to the terminal.
pub fn handle_mouse(state: &mut AppState, event: MouseEvent, layout: &PaneLayout) {
    if state.text_selection_mode || event.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let pos = Position::new(event.column, event.row);

    if layout.list_rows.contains(pos) {
        let row = usize::from(pos.y - layout.list_rows.y);
        state.select_index(state.scroll_offset + row);
    } else if layout.list.contains(pos) {
        state.focus_left();
    } else if layout.details.contains(pos) {
        state.focus_right();
    }
}

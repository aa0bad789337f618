use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    core::buffer::RequestBuffer,
    log::entry::{Entry, Request},
    tui::{filter::Filter, sort::SortMode},
    utils::ansi::strip_ansi,
};

/// Viewport height used until the first frame has been measured.
const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Left,
    Right,
}

/// Everything the renderer and the input dispatcher share. No I/O happens here.
#[derive(Debug)]
pub struct AppState {
    pub requests: Vec<Arc<Request>>,
    pub main_filter: Filter,
    pub detail_filter: Filter,
    pub sort: SortMode,
    pub focus: Focus,

    pub selected: usize,
    pub scroll_offset: usize,
    pub detail_scroll_offset: usize,
    pub auto_scroll: bool,
    pub text_selection_mode: bool,

    /// Rows of the request list measured on the last frame.
    pub list_height: usize,
    /// Rows of the detail pane measured on the last frame.
    pub detail_height: usize,

    pub log_file: String,
    running: Arc<AtomicBool>,
    seen_generation: Option<u64>,
}

impl AppState {
    pub fn new(log_file: impl Into<String>, running: Arc<AtomicBool>) -> Self {
        Self {
            requests: Vec::new(),
            main_filter: Filter::new(),
            detail_filter: Filter::new(),
            sort: SortMode::default(),
            focus: Focus::Left,
            selected: 0,
            scroll_offset: 0,
            detail_scroll_offset: 0,
            auto_scroll: true,
            text_selection_mode: false,
            list_height: DEFAULT_VIEWPORT_HEIGHT,
            detail_height: DEFAULT_VIEWPORT_HEIGHT,
            log_file: log_file.into(),
            running,
            seen_generation: None,
        }
    }

    /// Take a fresh snapshot when the buffer changed since the last call.
    /// Returns whether the request list was replaced.
    pub fn sync_from(&mut self, buffer: &RequestBuffer) -> bool {
        if self.seen_generation == Some(buffer.generation()) {
            return false;
        }
        self.seen_generation = Some(buffer.generation());
        self.requests = buffer.snapshot();
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn toggle_auto_scroll(&mut self) {
        self.auto_scroll = !self.auto_scroll;
    }

    pub fn toggle_text_selection_mode(&mut self) {
        self.text_selection_mode = !self.text_selection_mode;
    }

    pub fn cycle_sort_mode(&mut self) {
        self.sort = self.sort.cycle();
    }

    // Focus

    pub fn focus_left(&mut self) {
        self.focus = Focus::Left;
    }

    pub fn focus_right(&mut self) {
        self.focus = Focus::Right;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Left => Focus::Right,
            Focus::Right => Focus::Left,
        };
    }

    pub fn is_left_focused(&self) -> bool {
        self.focus == Focus::Left
    }

    // Filters

    pub fn clear_filter(&mut self) {
        self.main_filter.clear();
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn clear_detail_filter(&mut self) {
        self.detail_filter.clear();
        self.detail_scroll_offset = 0;
    }

    pub fn clear_focused_filter(&mut self) {
        match self.focus {
            Focus::Left => self.clear_filter(),
            Focus::Right => self.clear_detail_filter(),
        }
    }

    pub fn enter_filter_mode(&mut self) {
        match self.focus {
            Focus::Left => self.main_filter.enter_mode(),
            Focus::Right => self.detail_filter.enter_mode(),
        }
    }

    pub fn exit_filter_mode(&mut self) {
        self.main_filter.exit_mode();
        self.detail_filter.exit_mode();
    }

    pub fn is_filter_editing(&self) -> bool {
        self.main_filter.is_active() || self.detail_filter.is_active()
    }

    fn after_filter_edit(&mut self) {
        if self.main_filter.is_active() {
            self.selected = 0;
            self.scroll_offset = 0;
        } else if self.detail_filter.is_active() {
            self.detail_scroll_offset = 0;
        }
    }

    pub fn push_filter_char(&mut self, ch: char) {
        if self.main_filter.is_active() {
            self.main_filter.push(ch);
        } else if self.detail_filter.is_active() {
            self.detail_filter.push(ch);
        } else {
            return;
        }
        self.after_filter_edit();
    }

    pub fn pop_filter_char(&mut self) {
        if self.main_filter.is_active() {
            self.main_filter.pop();
        } else if self.detail_filter.is_active() {
            self.detail_filter.pop();
        } else {
            return;
        }
        self.after_filter_edit();
    }

    // Derived views

    /// Requests passing the main filter, in the current sort order.
    pub fn filtered_requests(&self) -> Vec<Arc<Request>> {
        let filter = &self.main_filter;
        let mut filtered: Vec<Arc<Request>> = if filter.is_present() {
            self.requests
                .iter()
                .filter(|req| {
                    filter.matches(&req.path)
                        || filter.matches(&req.method)
                        || req.controller.as_deref().is_some_and(|c| filter.matches(c))
                        || req.action.as_deref().is_some_and(|a| filter.matches(a))
                        || req.status.is_some_and(|s| filter.matches(&s.to_string()))
                        || filter.matches(req.request_id())
                })
                .cloned()
                .collect()
        } else {
            self.requests.clone()
        };
        self.sort.sort_requests(&mut filtered);
        filtered
    }

    pub fn current_request(&self) -> Option<Arc<Request>> {
        self.filtered_requests().get(self.selected).cloned()
    }

    fn last_index(&self) -> usize {
        self.filtered_requests().len().saturating_sub(1)
    }

    /// Related logs passing the detail filter, in their original order.
    ///
    /// A matching call line also keeps the entry after it; a matching query
    /// also keeps the call line right before it.
    pub fn filter_related_logs<'a>(&self, related: &'a [Entry]) -> Vec<&'a Entry> {
        if !self.detail_filter.is_present() {
            return related.iter().collect();
        }

        let mut keep = BTreeSet::new();
        for (idx, entry) in related.iter().enumerate() {
            if !self.detail_filter.matches(&strip_ansi(entry.content())) {
                continue;
            }
            keep.insert(idx);
            match entry {
                Entry::CallLine(_) if idx + 1 < related.len() => {
                    keep.insert(idx + 1);
                }
                Entry::Query(_) if idx > 0 && matches!(related[idx - 1], Entry::CallLine(_)) => {
                    keep.insert(idx - 1);
                }
                _ => {}
            }
        }
        keep.into_iter().map(|idx| &related[idx]).collect()
    }

    // Scrolling

    /// Move the list window the least amount that keeps the selection visible.
    pub fn adjust_scroll_for_selection(&mut self, visible_height: usize) {
        if !self.is_left_focused() {
            return;
        }
        let visible_height = visible_height.max(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected + 1 - visible_height;
        }
    }

    /// Pin the selection to the newest request while auto-scroll is on.
    pub fn adjust_auto_scroll(&mut self, visible_height: usize) {
        if !self.auto_scroll {
            return;
        }
        let total = self.filtered_requests().len();
        if total == 0 {
            return;
        }
        self.selected = total - 1;
        self.scroll_offset = (self.selected + 1).saturating_sub(visible_height.max(1));
    }

    pub fn adjust_scroll_bounds(&mut self, visible_height: usize) {
        let max_offset = self
            .filtered_requests()
            .len()
            .saturating_sub(visible_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    pub fn clamp_detail_scroll(&mut self, total_lines: usize, visible_height: usize) {
        let max_scroll = total_lines.saturating_sub(visible_height);
        self.detail_scroll_offset = self.detail_scroll_offset.min(max_scroll);
    }

    // Navigation

    fn select(&mut self, index: usize) {
        self.selected = index.min(self.last_index());
        self.auto_scroll = false;
        self.adjust_scroll_for_selection(self.list_height);
    }

    fn scroll_detail_by(&mut self, delta: isize) {
        self.detail_scroll_offset = self.detail_scroll_offset.saturating_add_signed(delta);
    }

    fn move_by(&mut self, delta: isize) {
        match self.focus {
            Focus::Left => self.select(self.selected.saturating_add_signed(delta)),
            Focus::Right => self.scroll_detail_by(delta),
        }
    }

    pub fn navigate_up(&mut self) {
        self.move_by(-1);
    }

    pub fn navigate_down(&mut self) {
        self.move_by(1);
    }

    fn page_size(&self) -> isize {
        let height = match self.focus {
            Focus::Left => self.list_height,
            Focus::Right => self.detail_height,
        };
        height.max(1) as isize
    }

    pub fn page_down(&mut self) {
        self.move_by(self.page_size());
    }

    pub fn page_up(&mut self) {
        self.move_by(-self.page_size());
    }

    pub fn half_page_down(&mut self) {
        self.move_by((self.page_size() / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.move_by(-(self.page_size() / 2).max(1));
    }

    pub fn go_to_top(&mut self) {
        match self.focus {
            Focus::Left => self.select(0),
            Focus::Right => self.detail_scroll_offset = 0,
        }
    }

    /// The detail offset is clamped to the content by the next frame.
    pub fn go_to_bottom(&mut self) {
        match self.focus {
            Focus::Left => self.select(usize::MAX),
            Focus::Right => self.detail_scroll_offset = usize::MAX,
        }
    }

    /// Select an absolute filtered index, as a click in the list does.
    pub fn select_index(&mut self, index: usize) {
        self.focus_left();
        self.select(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::parser::Collection;

    fn request_lines(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                format!(
                    r#"{{"method":"GET","path":"/items/{i}","status":200,"request_id":"req-{i}","timestamp":"2025-01-01T10:00:{:02}Z"}}"#,
                    i % 60
                )
            })
            .collect()
    }

    fn state_with(count: usize) -> AppState {
        let mut state = AppState::new("test.log", Arc::new(AtomicBool::new(true)));
        state.requests = Collection::parse(request_lines(count))
            .into_requests()
            .into_iter()
            .map(Arc::new)
            .collect();
        state
    }

    #[test]
    fn test_auto_scroll_then_up() {
        let mut state = state_with(50);
        state.adjust_auto_scroll(20);
        assert_eq!(state.selected, 49);
        assert_eq!(state.scroll_offset, 30);

        state.list_height = 20;
        state.navigate_up();
        assert_eq!(state.selected, 48);
        assert!(!state.auto_scroll);
        assert_eq!(state.scroll_offset, 30);
    }

    #[test]
    fn test_navigation_on_empty_list_stays_at_zero() {
        let mut state = state_with(0);
        state.navigate_down();
        state.go_to_bottom();
        assert_eq!(state.selected, 0);
        assert!(state.current_request().is_none());
    }

    #[test]
    fn test_scroll_for_selection_moves_minimally() {
        let mut state = state_with(30);
        state.list_height = 10;
        state.selected = 0;
        state.page_down();
        assert_eq!(state.selected, 10);
        assert_eq!(state.scroll_offset, 1);
        state.go_to_top();
        assert_eq!(state.scroll_offset, 0);
        state.go_to_bottom();
        assert_eq!(state.selected, 29);
        assert_eq!(state.scroll_offset, 20);
    }

    #[test]
    fn test_typing_into_main_filter_resets_selection() {
        let mut state = state_with(12);
        state.selected = 9;
        state.scroll_offset = 4;
        state.enter_filter_mode();
        for ch in "items/1".chars() {
            state.push_filter_char(ch);
        }
        assert_eq!(state.selected, 0);
        assert_eq!(state.scroll_offset, 0);
        // /items/1, /items/10, /items/11
        assert_eq!(state.filtered_requests().len(), 3);
    }

    #[test]
    fn test_main_filter_matches_status_and_id() {
        let mut state = state_with(3);
        state.main_filter.push('2');
        assert_eq!(state.filtered_requests().len(), 3);
        state.clear_filter();
        for ch in "REQ-1".chars() {
            state.main_filter.push(ch);
        }
        assert_eq!(state.filtered_requests().len(), 1);
    }

    #[test]
    fn test_focus_routes_filter_and_navigation() {
        let mut state = state_with(5);
        state.focus_right();
        state.enter_filter_mode();
        assert!(state.detail_filter.is_active());
        assert!(!state.main_filter.is_active());
        state.push_filter_char('x');
        state.exit_filter_mode();

        state.selected = 2;
        state.navigate_down();
        assert_eq!(state.selected, 2);
        assert_eq!(state.detail_scroll_offset, 1);
        state.clear_focused_filter();
        assert!(!state.detail_filter.is_present());
        assert_eq!(state.detail_scroll_offset, 0);
    }

    #[test]
    fn test_detail_filter_keeps_call_line_pairs() {
        let batch = [
            r#"{"method":"GET","path":"/u","status":200,"request_id":"p","timestamp":"2025-01-01T10:00:00Z"}"#,
            r#"{"request_id":"p","message":"↳ app/models/user.rb:3:in 'find'","timestamp":"2025-01-01T10:00:01Z"}"#,
            r#"{"request_id":"p","message":"User Load (1.0ms)  SELECT * FROM users","timestamp":"2025-01-01T10:00:02Z"}"#,
            r#"{"request_id":"p","message":"Rendered users/show","timestamp":"2025-01-01T10:00:03Z"}"#,
            r#"{"request_id":"p","message":"↳ app/models/post.rb:9:in 'load'","timestamp":"2025-01-01T10:00:04Z"}"#,
            r#"{"request_id":"p","message":"Post Load (2.0ms)  SELECT * FROM posts","timestamp":"2025-01-01T10:00:05Z"}"#,
        ];
        let request = Collection::parse(batch).into_requests().remove(0);
        let mut state = AppState::new("t", Arc::new(AtomicBool::new(true)));

        for ch in "users".chars() {
            state.detail_filter.push(ch);
        }
        let kept: Vec<&str> = state
            .filter_related_logs(&request.related_logs)
            .into_iter()
            .map(Entry::content)
            .collect();
        assert_eq!(
            kept,
            vec![
                "↳ app/models/user.rb:3:in 'find'",
                "User Load (1.0ms)  SELECT * FROM users",
                "Rendered users/show",
            ]
        );

        state.clear_detail_filter();
        for ch in "post.rb".chars() {
            state.detail_filter.push(ch);
        }
        let kept = state.filter_related_logs(&request.related_logs);
        assert_eq!(kept.len(), 2);
        assert!(kept[1].as_query().is_some());
    }

    #[test]
    fn test_sync_from_buffer_only_on_change() {
        let mut buffer = RequestBuffer::new(10);
        buffer.append_and_trim(Collection::parse(request_lines(2)).into_requests());
        let mut state = AppState::new("t", Arc::new(AtomicBool::new(true)));
        assert!(state.sync_from(&buffer));
        assert!(!state.sync_from(&buffer));
        assert_eq!(state.requests.len(), 2);
    }

    #[test]
    fn test_bounds_and_detail_clamp() {
        let mut state = state_with(5);
        state.scroll_offset = 40;
        state.adjust_scroll_bounds(3);
        assert_eq!(state.scroll_offset, 2);

        state.detail_scroll_offset = usize::MAX;
        state.clamp_detail_scroll(12, 5);
        assert_eq!(state.detail_scroll_offset, 7);
        state.clamp_detail_scroll(3, 5);
        assert_eq!(state.detail_scroll_offset, 0);
    }

    #[test]
    fn test_detail_filter_edit_resets_detail_scroll() {
        let mut state = state_with(3);
        state.focus_right();
        state.detail_scroll_offset = 7;
        state.selected = 2;
        state.enter_filter_mode();
        assert!(state.detail_filter.is_active());

        state.push_filter_char('s');
        assert_eq!(state.detail_scroll_offset, 0);
        assert_eq!(state.selected, 2);

        state.detail_scroll_offset = 4;
        state.pop_filter_char();
        assert_eq!(state.detail_scroll_offset, 0);
        assert_eq!(state.detail_filter.text(), "");
    }

    #[test]
    fn test_half_page_moves_both_panes() {
        let mut state = state_with(30);
        state.list_height = 10;
        state.detail_height = 9;

        state.half_page_down();
        assert_eq!(state.selected, 5);
        state.half_page_down();
        assert_eq!(state.selected, 10);
        state.half_page_up();
        assert_eq!(state.selected, 5);
        assert_eq!(state.detail_scroll_offset, 0);

        state.focus_right();
        state.half_page_down();
        assert_eq!(state.detail_scroll_offset, 4);
        assert_eq!(state.selected, 5);
        state.half_page_up();
        state.half_page_up();
        assert_eq!(state.detail_scroll_offset, 0);
    }
}

use ratatui::{prelude::*, widgets::*};

use crate::tui::state::AppState;

pub const HEADER_HEIGHT: u16 = 5;

fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

pub fn render_header(f: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let accent = Style::default().fg(Color::Green);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let title = Line::from(vec![
        Span::styled(
            " LogBench",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - Rails Log Viewer"),
    ]);
    let file = Line::from(Span::styled(state.log_file.clone(), accent)).centered();

    let total = state.requests.len();
    let stats = if state.main_filter.is_present() {
        Line::from(vec![
            Span::styled(state.filtered_requests().len().to_string(), accent),
            Span::raw(" found ("),
            Span::styled(total.to_string(), accent),
            Span::raw(" total) "),
        ])
    } else {
        Line::from(vec![
            Span::raw("Requests: "),
            Span::styled(total.to_string(), accent),
            Span::raw(" "),
        ])
    }
    .right_aligned();

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[0]);
    f.render_widget(Paragraph::new(title), top[0]);
    f.render_widget(Paragraph::new(file), top[1]);
    f.render_widget(Paragraph::new(stats), top[2]);

    let help = Line::from(vec![
        Span::styled(" a:Auto-scroll(", dim),
        Span::styled(on_off(state.auto_scroll), accent),
        Span::styled(") | f:Filter | c:Clear filter | s:Sort(", dim),
        Span::styled(state.sort.to_string(), accent),
        Span::styled(") | t:Text selection(", dim),
        Span::styled(on_off(state.text_selection_mode), accent),
        Span::styled(") | q:Quit", dim),
    ]);
    let nav = Line::from(Span::styled(
        " ←→/hl:Switch Pane | ↑↓/jk/Click:Navigate | g/G:Top/End",
        dim,
    ));
    f.render_widget(Paragraph::new(help), rows[1]);
    f.render_widget(Paragraph::new(nav), rows[2]);
}

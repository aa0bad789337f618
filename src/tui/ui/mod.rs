pub mod ansi;
pub mod details;
pub mod header;
pub mod request_list;
pub mod scrollbar;

use ratatui::{prelude::*, widgets::*};

pub const LABEL: Style = Style::new().fg(Color::Cyan);
pub const FILTER: Style = Style::new().fg(Color::Yellow);

pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        "PUT" => Color::Blue,
        "DELETE" => Color::Red,
        _ => Color::White,
    }
}

pub fn status_color(status: u16) -> Color {
    match status {
        200..=299 => Color::Green,
        300..=399 => Color::Yellow,
        400..=599 => Color::Red,
        _ => Color::White,
    }
}

/// Bordered pane with a title that lights up while the pane has focus and an
/// optional right-aligned filter display.
pub fn pane_block(title: &str, focused: bool, filter: Option<String>) -> Block<'static> {
    let title_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Line::from(Span::styled(format!(" {title} "), title_style)));
    if let Some(filter) = filter {
        block = block.title_top(
            Line::from(Span::styled(format!(" Filter: {filter} "), FILTER)).right_aligned(),
        );
    }
    block
}

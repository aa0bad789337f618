use ratatui::{prelude::*, widgets::*};
use unicode_width::UnicodeWidthChar;

use crate::{
    log::entry::Request,
    tui::{
        state::AppState,
        ui::{method_color, pane_block, scrollbar::render_scrollbar, status_color},
    },
};

const METHOD_WIDTH: usize = 9;
const STATUS_WIDTH: usize = 7;
const TIME_WIDTH: usize = 7;

/// Geometry of the list after drawing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListGeometry {
    pub pane: Rect,
    pub rows: Rect,
}

fn truncate_to_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str(&" ".repeat(width - used));
    out
}

fn path_width(row_width: usize) -> usize {
    row_width.saturating_sub(METHOD_WIDTH + 1 + STATUS_WIDTH + TIME_WIDTH)
}

fn column_header(row_width: usize) -> Line<'static> {
    let text = format!(
        " {:<m$}{:<p$} {:<s$}{}",
        "METHOD",
        "PATH",
        "STATUS",
        "TIME",
        m = METHOD_WIDTH - 1,
        p = path_width(row_width),
        s = STATUS_WIDTH,
    );
    Line::from(Span::styled(
        text,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::DIM),
    ))
}

fn request_row(request: &Request, row_width: usize, selected: bool) -> Line<'static> {
    let method = format!(" {} ", truncate_to_width(&request.method, METHOD_WIDTH - 2));
    let path = truncate_to_width(&request.path, path_width(row_width));
    let status = request
        .status
        .map(|s| format!("{s:>3}"))
        .unwrap_or_default();
    let duration = request
        .duration_ms
        .map(|d| format!("{}ms", d as i64))
        .unwrap_or_default();

    if selected {
        let text = format!(
            "{method}{path} {status:<sw$}{duration:<tw$}",
            sw = STATUS_WIDTH,
            tw = TIME_WIDTH
        );
        return Line::from(Span::styled(
            text,
            Style::default().fg(Color::White).bg(Color::Blue),
        ));
    }

    let status_style = request
        .status
        .map(|s| Style::default().fg(status_color(s)))
        .unwrap_or_default();
    Line::from(vec![
        Span::styled(
            method,
            Style::default()
                .fg(method_color(&request.method))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(path),
        Span::raw(" "),
        Span::styled(format!("{status:<sw$}", sw = STATUS_WIDTH), status_style),
        Span::styled(
            format!("{duration:<tw$}", tw = TIME_WIDTH),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ])
}

/// Draw the request list. Scroll state is adjusted to the measured height
/// first, so the rows drawn are always the rows the state points at.
pub fn render_request_list(f: &mut Frame, area: Rect, state: &mut AppState) -> ListGeometry {
    let filter = (state.main_filter.is_present() || state.main_filter.is_active())
        .then(|| state.main_filter.cursor_display());
    let block = pane_block("Request Logs", state.is_left_focused(), filter);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return ListGeometry { pane: area, rows: Rect::default() };
    }

    let row_width = usize::from(inner.width.saturating_sub(1));
    let header_area = Rect { height: 1, ..inner };
    let rows = Rect {
        y: inner.y + 1,
        height: inner.height - 1,
        ..inner
    };
    f.render_widget(Paragraph::new(column_header(row_width)), header_area);

    let visible = usize::from(rows.height);
    state.list_height = visible.max(1);

    let filtered = state.filtered_requests();
    if filtered.is_empty() {
        let middle = Rect {
            y: rows.y + rows.height / 2,
            height: rows.height.min(1),
            ..rows
        };
        f.render_widget(
            Paragraph::new(Span::styled(
                "  No requests found",
                Style::default().add_modifier(Modifier::DIM),
            )),
            middle,
        );
        return ListGeometry { pane: area, rows };
    }

    state.adjust_auto_scroll(visible);
    state.adjust_scroll_bounds(visible);

    let lines: Vec<Line> = filtered
        .iter()
        .enumerate()
        .skip(state.scroll_offset)
        .take(visible)
        .map(|(idx, request)| request_row(request, row_width, idx == state.selected))
        .collect();
    let row_area = Rect {
        width: inner.width.saturating_sub(1),
        ..rows
    };
    f.render_widget(Paragraph::new(lines), row_area);

    let bar = Rect {
        x: rows.x + rows.width.saturating_sub(1),
        width: 1,
        ..rows
    };
    render_scrollbar(f.buffer_mut(), bar, state.scroll_offset, filtered.len());

    ListGeometry { pane: area, rows }
}

//! The request detail pane and its per-request line cache.

use std::collections::HashMap;

use ratatui::{prelude::*, widgets::*};
use serde_json::{Map, Value};

use crate::{
    log::entry::{Entry, Params, Request},
    tui::{
        state::AppState,
        ui::{ansi::ansi_line, method_color, pane_block, scrollbar::render_scrollbar, status_color, LABEL},
    },
    utils::ansi::{has_ansi_codes, wrap_text},
};

const CACHE_LIMIT: usize = 256;

/// Everything that changes the built lines of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DetailKey {
    related_count: usize,
    filter: String,
    width: u16,
}

#[derive(Debug, Default)]
pub struct DetailCache {
    entries: HashMap<String, (DetailKey, Vec<Line<'static>>)>,
    builds: usize,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines for `request`, rebuilt only when its key changed.
    pub fn lines(&mut self, request: &Request, state: &AppState, width: u16) -> &[Line<'static>] {
        let key = DetailKey {
            related_count: request.related_logs.len(),
            filter: state.detail_filter.text().to_string(),
            width,
        };
        let id = request.request_id();

        let fresh = matches!(self.entries.get(id), Some((cached, _)) if *cached == key);
        if !fresh {
            if self.entries.len() >= CACHE_LIMIT {
                self.entries.clear();
            }
            self.builds += 1;
            let lines = build_detail_lines(request, state, usize::from(width));
            self.entries.insert(id.to_string(), (key, lines));
        }
        self.entries
            .get(id)
            .map(|(_, lines)| lines.as_slice())
            .unwrap_or_default()
    }

    /// How many times lines were built rather than served from the cache.
    pub fn builds(&self) -> usize {
        self.builds
    }
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), LABEL)
}

fn bold_label(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), LABEL.add_modifier(Modifier::BOLD)))
}

/// Split by character count, the way the path and params are shown.
fn chunk_chars(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(plain_value).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) => format_object(map, 1),
        other => other.to_string(),
    }
}

/// `{ key: value, ... }`, with objects nested deeper than two levels elided.
fn format_object(map: &Map<String, Value>, depth: usize) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }
    if depth > 2 {
        return "{...}".to_string();
    }
    let pairs: Vec<String> = map
        .iter()
        .map(|(key, value)| {
            let formatted = match value {
                Value::Object(nested) => format_object(nested, depth + 1),
                other => plain_value(other),
            };
            format!("{key}: {formatted}")
        })
        .collect();
    format!("{{ {} }}", pairs.join(", "))
}

pub fn format_params(params: &Params) -> String {
    match params {
        Params::Raw(text) => text.clone(),
        Params::Structured(Value::Object(map)) if map.is_empty() => "{}".to_string(),
        Params::Structured(Value::Object(map)) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{key}: {}", plain_value(value)))
                .collect();
            format!("{{ {} }}", pairs.join(", "))
        }
        Params::Structured(other) => plain_value(other),
    }
}

fn push_wrapped_entry(lines: &mut Vec<Line<'static>>, entry: &Entry, width: usize) {
    let content = entry.content();
    let colored = has_ansi_codes(content);
    for chunk in wrap_text(content, width.saturating_sub(4)) {
        let padded = format!("  {chunk}");
        lines.push(if colored {
            ansi_line(&padded)
        } else {
            Line::raw(padded)
        });
    }
    if !matches!(entry, Entry::Query(_)) {
        lines.push(Line::default());
    }
}

fn push_related_section(lines: &mut Vec<Line<'static>>, request: &Request, state: &AppState, width: usize) {
    if request.related_logs.is_empty() {
        return;
    }
    let stats = request.query_stats();
    let summary_style = Style::default().fg(Color::White);

    lines.push(Line::default());
    lines.push(bold_label("Query Summary:"));
    if stats.total_queries > 0 {
        let mut summary = format!("  {} queries", stats.total_queries);
        if stats.total_time_ms > 0.0 {
            summary.push_str(&format!(" ({:.1}ms total", stats.total_time_ms));
            if stats.cached_queries > 0 {
                summary.push_str(&format!(", {} cached", stats.cached_queries));
            }
            summary.push(')');
        } else if stats.cached_queries > 0 {
            summary.push_str(&format!(" ({} cached)", stats.cached_queries));
        }
        lines.push(Line::styled(summary, summary_style));

        let breakdown: Vec<String> = stats
            .breakdown()
            .into_iter()
            .map(|(count, name)| format!("{count} {name}"))
            .collect();
        if !breakdown.is_empty() {
            lines.push(Line::styled(format!("  {}", breakdown.join(", ")), summary_style));
        }
    }
    lines.push(Line::default());

    let shown = state.filter_related_logs(&request.related_logs);
    if state.detail_filter.is_present() {
        let bold = LABEL.add_modifier(Modifier::BOLD);
        lines.push(Line::from(vec![
            Span::styled("Related Logs ", bold),
            Span::styled(
                format!("({}/{} shown)", shown.len(), request.related_logs.len()),
                Style::default().add_modifier(Modifier::DIM),
            ),
            Span::styled(":", bold),
        ]));
    } else {
        lines.push(bold_label("Related Logs:"));
    }

    for entry in shown {
        push_wrapped_entry(lines, entry, width);
    }
}

/// All lines of the detail pane for `request` at content `width`.
pub fn build_detail_lines(request: &Request, state: &AppState, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![Line::default()];

    lines.push(Line::from(vec![
        label("Method: "),
        Span::styled(
            request.method.clone(),
            Style::default()
                .fg(method_color(&request.method))
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    let prefix = "Path: ";
    let first_width = width.saturating_sub(prefix.len()).max(1);
    let path: Vec<char> = request.path.chars().collect();
    let (head, tail) = path.split_at(first_width.min(path.len()));
    lines.push(Line::from(vec![
        label(prefix),
        Span::raw(head.iter().collect::<String>()),
    ]));
    for chunk in chunk_chars(&tail.iter().collect::<String>(), width) {
        lines.push(Line::raw(chunk));
    }

    if let Some(status) = request.status {
        let mut spans = vec![
            label("Status: "),
            Span::styled(status.to_string(), Style::default().fg(status_color(status))),
        ];
        if let Some(duration) = request.duration_ms {
            spans.push(label(" | Duration: "));
            spans.push(Span::raw(format!("{duration}ms")));
        }
        lines.push(Line::from(spans));
    }

    if let Some(controller) = &request.controller {
        let action = request.action.as_deref().unwrap_or_default();
        lines.push(Line::from(vec![
            label("Controller: "),
            Span::raw(format!("{controller}#{action}")),
        ]));
    }

    lines.push(Line::from(vec![
        label("Request ID: "),
        Span::raw(request.request_id().to_string()),
    ]));

    if let Some(params) = &request.params {
        lines.push(Line::default());
        lines.push(bold_label("Params:"));
        for chunk in chunk_chars(&format_params(params), width.saturating_sub(2)) {
            lines.push(Line::raw(format!("  {chunk}")));
        }
    }

    push_related_section(&mut lines, request, state, width);
    lines
}

/// Draw the detail pane, clamping the detail scroll to the built content.
/// Returns the pane area.
pub fn render_details(f: &mut Frame, area: Rect, state: &mut AppState, cache: &mut DetailCache) -> Rect {
    let filter = (state.detail_filter.is_present() || state.detail_filter.is_active())
        .then(|| state.detail_filter.cursor_display());
    let block = pane_block("Request Details", !state.is_left_focused(), filter)
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let visible = usize::from(inner.height);
    state.detail_height = visible.max(1);
    if inner.width < 2 || inner.height == 0 {
        return area;
    }

    let Some(request) = state.current_request() else {
        return area;
    };
    let width = inner.width - 1;
    let lines = cache.lines(&request, state, width);
    let total = lines.len();
    state.clamp_detail_scroll(total, visible);

    let shown: Vec<Line> = lines
        .iter()
        .skip(state.detail_scroll_offset)
        .take(visible)
        .cloned()
        .collect();
    f.render_widget(Paragraph::new(shown), Rect { width, ..inner });

    let bar = Rect {
        x: inner.x + width,
        width: 1,
        ..inner
    };
    render_scrollbar(f.buffer_mut(), bar, state.detail_scroll_offset, total);
    area
}

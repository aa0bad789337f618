use ratatui::{prelude::*, text::Span};

use crate::utils::ansi::{segments, sgr_params, Segment};

/// Apply one SGR parameter list on top of `style`.
fn apply_sgr(style: Style, params: &[u16]) -> Style {
    params.iter().fold(style, |style, code| match code {
        0 => Style::default(),
        1 => style.add_modifier(Modifier::BOLD),
        2 => style.add_modifier(Modifier::DIM),
        3 => style.add_modifier(Modifier::ITALIC),
        4 => style.add_modifier(Modifier::UNDERLINED),
        22 => style.remove_modifier(Modifier::BOLD | Modifier::DIM),
        23 => style.remove_modifier(Modifier::ITALIC),
        24 => style.remove_modifier(Modifier::UNDERLINED),
        30 => style.fg(Color::Black),
        31 => style.fg(Color::Red),
        32 => style.fg(Color::Green),
        33 => style.fg(Color::Yellow),
        34 => style.fg(Color::Blue),
        35 => style.fg(Color::Magenta),
        36 => style.fg(Color::Cyan),
        37 => style.fg(Color::Gray),
        39 => style.fg(Color::Reset),
        90 => style.fg(Color::DarkGray),
        91 => style.fg(Color::LightRed),
        92 => style.fg(Color::LightGreen),
        93 => style.fg(Color::LightYellow),
        94 => style.fg(Color::LightBlue),
        95 => style.fg(Color::LightMagenta),
        96 => style.fg(Color::LightCyan),
        97 => style.fg(Color::White),
        _ => style,
    })
}

/// Convert text carrying SGR sequences into a styled line.
pub fn ansi_line(text: &str) -> Line<'static> {
    let mut style = Style::default();
    let mut spans = Vec::new();
    for segment in segments(text) {
        match segment {
            Segment::Sgr(seq) => style = apply_sgr(style, &sgr_params(seq)),
            Segment::Text(run) => spans.push(Span::styled(run.to_string(), style)),
        }
    }
    Line::from(spans)
}

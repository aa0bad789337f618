use ratatui::{buffer::Buffer, prelude::*};

/// Thumb `(start, length)` in rows, or `None` when everything fits.
pub fn thumb(visible: usize, offset: usize, total: usize) -> Option<(usize, usize)> {
    if total <= visible || visible == 0 {
        return None;
    }
    let length = (visible * visible / total).max(1);
    let start = offset * visible / total;
    Some((start, length))
}

/// Draw a proportional thumb in the single-column `area`.
pub fn render_scrollbar(buf: &mut Buffer, area: Rect, offset: usize, total: usize) {
    let visible = usize::from(area.height);
    let Some((start, length)) = thumb(visible, offset, total) else {
        return;
    };
    let style = Style::default().fg(Color::Cyan);
    for row in start..(start + length).min(visible) {
        if let Some(cell) = buf.cell_mut((area.x, area.y + row as u16)) {
            cell.set_symbol("█").set_style(style);
        }
    }
}

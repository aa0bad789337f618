use anyhow::{anyhow, Result};
use std::{io, sync::Once, time::Duration};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, buffer::Buffer, layout::*, prelude::*};

use crate::{
    core::buffer::SharedBuffer,
    tui::{
        input::{apply, handle_mouse, map_key},
        state::AppState,
        ui::{
            details::{render_details, DetailCache},
            header::{render_header, HEADER_HEIGHT},
            request_list::render_request_list,
        },
    },
};

/// Screen regions of the last frame, used to route mouse clicks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaneLayout {
    pub list: Rect,
    /// Request rows only, without borders and the column header.
    pub list_rows: Rect,
    pub details: Rect,
}

/// Draw one frame. The state's scroll positions are fitted to the measured
/// panes while drawing.
pub fn render_ui(frame: &mut Frame, state: &mut AppState, cache: &mut DetailCache) -> PaneLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(3)])
        .split(frame.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[1]);

    render_header(frame, main_chunks[0], state);
    let list = render_request_list(frame, panes[0], state);
    let details = render_details(frame, panes[1], state, cache);

    PaneLayout {
        list: list.pane,
        list_rows: list.rows,
        details,
    }
}

/// Plain text of a rendered buffer, one line per row.
pub fn screen_text(buffer: &Buffer) -> String {
    let area = buffer.area();
    let mut content = String::new();
    for y in 0..area.height {
        for x in 0..area.width {
            content.push_str(buffer[(x, y)].symbol());
        }
        if y + 1 < area.height {
            content.push('\n');
        }
    }
    content
}

fn set_mouse_capture(enabled: bool) -> Result<()> {
    if enabled {
        crossterm::execute!(io::stdout(), EnableMouseCapture)?;
    } else {
        crossterm::execute!(io::stdout(), DisableMouseCapture)?;
    }
    Ok(())
}

type RestoreStep = (&'static str, fn() -> io::Result<()>);

/// Run every step even when an earlier one fails. Returns the first failure.
fn run_restore_steps(steps: impl IntoIterator<Item = RestoreStep>) -> Result<()> {
    let mut first_err = None;
    for (name, step) in steps {
        if let Err(err) = step() {
            log::warn!("Failed to {name}: {err}");
            if first_err.is_none() {
                first_err = Some(anyhow!("Failed to {}: {}", name, err));
            }
        }
    }
    first_err.map_or(Ok(()), Err)
}

fn restore_terminal() -> Result<()> {
    let steps: [RestoreStep; 3] = [
        ("leave the alternate screen", || {
            crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        }),
        ("disable mouse capture", || {
            crossterm::execute!(io::stdout(), DisableMouseCapture)
        }),
        ("disable raw mode", crossterm::terminal::disable_raw_mode),
    ];
    run_restore_steps(steps)
}

/// Restores the terminal on panic before the previous hook prints.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = restore_terminal();
            previous(info);
        }));
    });
}

/// Raw mode plus alternate screen. Dropping the guard restores the terminal
/// on every early return.
struct TerminalGuard {
    restored: bool,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        let guard = Self { restored: false };
        crossterm::execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(guard)
    }

    fn restore(mut self) -> Result<()> {
        self.restored = true;
        restore_terminal()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.restored {
            let _ = restore_terminal();
        }
    }
}

/// Own the terminal until the run flag is cleared. The terminal is restored
/// whether the loop ends cleanly, with an error or with a panic.
pub(crate) fn run_rendering_loop(
    buffer: SharedBuffer,
    mut state: AppState,
    input_timeout: Duration,
) -> Result<()> {
    install_panic_hook();
    let guard = TerminalGuard::enter()?;

    let result = (|| -> Result<()> {
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        let mut cache = DetailCache::new();
        let mut layout = PaneLayout::default();
        while state.is_running() {
            if state.sync_from(&buffer.read()) {
                log::debug!("Snapshot refreshed: {} requests", state.requests.len());
            }

            terminal.draw(|frame| {
                layout = render_ui(frame, &mut state, &mut cache);
            })?;

            if !crossterm::event::poll(input_timeout)? {
                continue;
            }
            match crossterm::event::read()? {
                Event::Key(key) => {
                    let selection_before = state.text_selection_mode;
                    let action = map_key(key, &state);
                    apply(&mut state, action);
                    if state.text_selection_mode != selection_before {
                        set_mouse_capture(!state.text_selection_mode)?;
                    }
                }
                Event::Mouse(event) => handle_mouse(&mut state, event, &layout),
                _ => {}
            }
        }

        terminal.clear()?;
        Ok(())
    })();

    let restored = guard.restore();
    result.and(restored)
}

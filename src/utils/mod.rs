//! Text helpers shared by the parser and the renderer.

pub mod ansi;

pub use ansi::{has_ansi_codes, strip_ansi, visible_width, wrap_text};

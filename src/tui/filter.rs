/// Case-insensitive substring filter with an edit mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    text: String,
    active: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_mode(&mut self) {
        self.active = true;
    }

    pub fn exit_mode(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_present(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    pub fn pop(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn clear_and_exit(&mut self) {
        self.clear();
        self.exit_mode();
    }

    /// Empty text matches everything.
    pub fn matches(&self, candidate: &str) -> bool {
        self.text.is_empty() || candidate.to_lowercase().contains(&self.text.to_lowercase())
    }

    /// Text with a block cursor while editing.
    pub fn cursor_display(&self) -> String {
        if self.active {
            format!("{}█", self.text)
        } else {
            self.text.clone()
        }
    }
}

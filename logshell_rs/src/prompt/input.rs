//! The editable prompt line: text, cursor, and suggestion filtering.
//!
//! Candidates are full command paths ("macros list") plus builtin names.
//! Filtering is prefix-based and case-insensitive. When the input ends with
//! a space only the next word of each match is offered; otherwise the whole
//! matching path is shown. Completions are de-duplicated before rendering.

use crossterm::event::{KeyCode, KeyEvent};

use crate::colors::Painter;

#[derive(Debug, Default)]
pub struct InputLine {
    text: String,
    /// Cursor position in characters.
    cursor: usize,
    /// Candidate paths rebuilt on every pwd change.
    candidates: Vec<String>,
    width: u16,
}

impl InputLine {
    pub fn new() -> Self {
        Self {
            width: 80,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    pub fn set_candidates(&mut self, mut candidates: Vec<String>) {
        candidates.sort();
        candidates.dedup();
        self.candidates = candidates;
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    /// Clear and hand back the current line.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Apply one key to the line. Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.text.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let at = self.byte_offset(self.cursor - 1);
                    self.text.remove(at);
                    self.cursor -= 1;
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.text.chars().count() {
                    let at = self.byte_offset(self.cursor);
                    self.text.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.cursor < self.text.chars().count() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.chars().count(),
            KeyCode::Tab => self.complete(),
            _ => return false,
        }
        true
    }

    /// Accept the completion when it is unambiguous.
    fn complete(&mut self) {
        let completions = self.completions();
        if completions.len() != 1 {
            return;
        }
        let only = &completions[0];
        if self.text.ends_with(' ') {
            let text = format!("{}{only}", self.text);
            self.set_text(&text);
        } else {
            self.set_text(&only.clone());
        }
    }

    /// Filtered completions for the current text, per the space/next-word
    /// rule. Already de-duplicated.
    pub fn completions(&self) -> Vec<String> {
        if self.text.trim().is_empty() {
            return Vec::new();
        }
        let needle = self.text.to_ascii_lowercase();
        let mut out: Vec<String> = Vec::new();
        for candidate in &self.candidates {
            let lower = candidate.to_ascii_lowercase();
            if !lower.starts_with(needle.trim_start()) || lower == needle {
                continue;
            }
            let entry = if self.text.ends_with(' ') {
                // Only the next word is interesting.
                match candidate
                    .get(self.text.trim_start().len()..)
                    .and_then(|rest| rest.split_whitespace().next())
                {
                    Some(word) => word.to_string(),
                    None => continue,
                }
            } else {
                candidate.clone()
            };
            if !out.contains(&entry) {
                out.push(entry);
            }
        }
        out
    }

    /// The completions joined for display under the prompt.
    pub fn completions_display(&self, painter: &Painter) -> String {
        let completions = self.completions();
        if completions.is_empty() {
            return String::new();
        }
        painter.dim(&completions.join("  "))
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn input_with(candidates: &[&str], text: &str) -> InputLine {
        let mut input = InputLine::new();
        input.set_candidates(candidates.iter().map(|s| s.to_string()).collect());
        input.set_text(text);
        input
    }

    #[test]
    fn typing_moves_cursor() {
        let mut input = InputLine::new();
        input.handle_key(&key(KeyCode::Char('a')));
        input.handle_key(&key(KeyCode::Char('b')));
        assert_eq!(input.text(), "ab");
        assert_eq!(input.cursor(), 2);
        input.handle_key(&key(KeyCode::Left));
        input.handle_key(&key(KeyCode::Char('x')));
        assert_eq!(input.text(), "axb");
    }

    #[test]
    fn backspace_at_cursor() {
        let mut input = input_with(&[], "abc");
        input.handle_key(&key(KeyCode::Backspace));
        assert_eq!(input.text(), "ab");
    }

    #[test]
    fn partial_word_matches_whole_paths() {
        let input = input_with(&["Bnav", "Bnav BAaction", "Bnav BCaction", "Cnav"], "Bn");
        assert_eq!(
            input.completions(),
            vec!["Bnav", "Bnav BAaction", "Bnav BCaction"]
        );
    }

    #[test]
    fn trailing_space_shows_next_word_only() {
        let input = input_with(&["Bnav BAaction", "Bnav BCaction", "Bnav"], "Bnav ");
        assert_eq!(input.completions(), vec!["BAaction", "BCaction"]);
    }

    #[test]
    fn completions_are_deduplicated() {
        let input = input_with(&["Bnav BAaction x", "Bnav BAaction y"], "Bnav ");
        assert_eq!(input.completions(), vec!["BAaction"]);
    }

    #[test]
    fn exact_match_is_not_offered() {
        let input = input_with(&["Bnav"], "Bnav");
        assert!(input.completions().is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let input = input_with(&["Bnav"], "bn");
        assert_eq!(input.completions(), vec!["Bnav"]);
    }

    #[test]
    fn empty_input_offers_nothing() {
        let input = input_with(&["Bnav"], "");
        assert!(input.completions().is_empty());
    }

    #[test]
    fn tab_completes_unambiguous() {
        let mut input = input_with(&["Bnav BAaction", "Bnav BCaction"], "Bnav BA");
        input.handle_key(&key(KeyCode::Tab));
        assert_eq!(input.text(), "Bnav BAaction");
    }

    #[test]
    fn take_clears_line() {
        let mut input = input_with(&[], "pwd");
        assert_eq!(input.take(), "pwd");
        assert_eq!(input.text(), "");
        assert_eq!(input.cursor(), 0);
    }
}

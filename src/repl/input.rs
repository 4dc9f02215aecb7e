//! Input handler for REPL using rustyline
//!
//! Provides readline functionality with line editing and persistent history.

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::History;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// History file name under the home directory
pub const HISTORY_FILE: &str = ".docbuddy_history";

const DEFAULT_PROMPT: &str = "docbuddy> ";

/// What the user typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    /// Trimmed, possibly empty, line
    Line(String),
    /// Ctrl-C; the current line is discarded
    Interrupted,
    /// Ctrl-D
    Eof,
}

/// Input handler managing readline interface and command history
pub struct InputHandler {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    prompt: String,
}

impl InputHandler {
    /// Create new input handler without persistent history
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("Failed to initialize line editor")?;

        Ok(InputHandler {
            editor,
            history_path: None,
            prompt: DEFAULT_PROMPT.to_string(),
        })
    }

    /// Create input handler with persistent history
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut handler = Self::new()?;

        if history_file.exists() {
            let _ = handler.editor.load_history(&history_file);
        }
        handler.history_path = Some(history_file);
        Ok(handler)
    }

    /// `~/.docbuddy_history`, if a home directory exists
    pub fn default_history_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(HISTORY_FILE))
    }

    /// Set custom prompt
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Read a line of input from user
    pub fn read_line(&mut self) -> Result<InputLine> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(InputLine::Line(trimmed.to_string()))
            }
            Err(ReadlineError::Interrupted) => Ok(InputLine::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputLine::Eof),
            Err(err) => Err(err).context("Readline error"),
        }
    }

    /// Save history to disk
    pub fn save_history(&mut self) -> Result<()> {
        if let Some(ref path) = self.history_path {
            self.editor
                .save_history(path)
                .with_context(|| format!("Failed to save history to {}", path.display()))?;
        }
        Ok(())
    }

    pub fn clear_history(&mut self) {
        let _ = self.editor.history_mut().clear();
    }

    pub fn history_len(&self) -> usize {
        self.editor.history().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_input_handler_creation() {
        let handler = InputHandler::new().unwrap();
        assert_eq!(handler.prompt, DEFAULT_PROMPT);
        assert!(handler.history_path.is_none());
    }

    #[test]
    fn test_custom_prompt() {
        let mut handler = InputHandler::new().unwrap();
        handler.set_prompt("ask> ");
        assert_eq!(handler.prompt, "ask> ");
    }

    #[test]
    fn test_history_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let history_path = temp_dir.path().join("history");

        {
            let mut handler = InputHandler::with_history(history_path.clone()).unwrap();
            let _ = handler.editor.add_history_entry("What was revenue?");
            let _ = handler.editor.add_history_entry("/docs");
            handler.save_history().unwrap();
        }

        assert!(history_path.exists());

        let handler = InputHandler::with_history(history_path).unwrap();
        assert_eq!(handler.history_len(), 2);
    }

    #[test]
    fn test_clear_history() {
        let mut handler = InputHandler::new().unwrap();
        let _ = handler.editor.add_history_entry("test");
        assert_eq!(handler.history_len(), 1);

        handler.clear_history();
        assert_eq!(handler.history_len(), 0);
    }

    #[test]
    fn test_save_without_path_is_noop() {
        let mut handler = InputHandler::new().unwrap();
        assert!(handler.save_history().is_ok());
    }
}

use std::io::Write;

use colored::Colorize;
use spindle_engine::IoAdapter;

/// Width at which paragraphs are wrapped for the terminal.
const WRAP_COLUMNS: usize = 78;

/// Writes game output to stdout, wrapping paragraphs and highlighting
/// location headers.
#[derive(Debug, Default)]
pub struct ConsoleIo;

impl ConsoleIo {
    /// A stdout adapter.
    pub fn new() -> Self {
        Self
    }
}

impl IoAdapter for ConsoleIo {
    fn write(&mut self, paragraph: &str) {
        // Location headers come through as "[Name]".
        if paragraph.starts_with('[') && paragraph.ends_with(']') {
            println!("\n{}", paragraph.bold());
            return;
        }
        for line in wrap(paragraph, WRAP_COLUMNS) {
            println!("{line}");
        }
    }

    fn write_prompt(&mut self, prompt: &str) {
        print!("{}", prompt.cyan());
        let _ = std::io::stdout().flush();
    }
}

fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > columns {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_column_limit() {
        let text = "the quick brown fox jumps over the lazy dog";
        for line in wrap(text, 15) {
            assert!(line.len() <= 15);
        }
    }

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        assert_eq!(wrap("hello there", 40), vec!["hello there".to_string()]);
    }
}

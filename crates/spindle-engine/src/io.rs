use std::sync::{Arc, Mutex};

/// Where player-facing text ends up.
///
/// The driver owns one adapter and flushes the session's buffered
/// paragraphs through it once per loop iteration. Implementations decide
/// presentation: the console adapter wraps and colors, the capture adapter
/// used in tests just records.
pub trait IoAdapter: Send {
    /// Write one paragraph of output.
    fn write(&mut self, paragraph: &str);

    /// Write an input prompt, without a trailing newline.
    fn write_prompt(&mut self, prompt: &str);
}

#[derive(Debug, Default)]
struct CaptureState {
    paragraphs: Vec<String>,
    prompts: Vec<String>,
}

/// An adapter that records everything written, for tests and scripting.
///
/// Clones share the same capture buffer, so a test can hand one clone to
/// the driver and inspect the other after the run.
#[derive(Debug, Clone, Default)]
pub struct CaptureIo {
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureIo {
    /// A fresh, empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, joined with blank lines.
    pub fn transcript(&self) -> String {
        self.state
            .lock()
            .map(|s| s.paragraphs.join("\n\n"))
            .unwrap_or_default()
    }

    /// The prompts written so far.
    pub fn prompts(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.prompts.clone())
            .unwrap_or_default()
    }
}

impl IoAdapter for CaptureIo {
    fn write(&mut self, paragraph: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.paragraphs.push(paragraph.to_string());
        }
    }

    fn write_prompt(&mut self, prompt: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.prompts.push(prompt.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_capture() {
        let capture = CaptureIo::new();
        let mut writer: Box<dyn IoAdapter> = Box::new(capture.clone());
        writer.write("hello");
        writer.write_prompt("> ");
        assert_eq!(capture.transcript(), "hello");
        assert_eq!(capture.prompts(), vec!["> ".to_string()]);
    }
}

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::io::IoAdapter;

/// Result of waiting on the player's input queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputWait {
    /// A line arrived.
    Ready(String),
    /// The wait deadline passed with no input.
    TimedOut,
    /// The input side hung up and the queue is drained.
    Disconnected,
}

#[derive(Debug, Default)]
struct ChannelState {
    queue: VecDeque<String>,
    disconnected: bool,
}

#[derive(Debug, Default)]
struct Channel {
    state: Mutex<ChannelState>,
    ready: Condvar,
}

/// The producer side of a session's input queue.
///
/// The reading thread (stdin, a test script) holds one of these and pushes
/// lines as they arrive; the driver thread blocks on the session. Clones
/// feed the same queue.
#[derive(Debug, Clone)]
pub struct InputHandle {
    channel: Arc<Channel>,
}

impl InputHandle {
    /// Queue a line of input and wake the driver.
    pub fn push(&self, line: impl Into<String>) {
        if let Ok(mut state) = self.channel.state.lock() {
            state.queue.push_back(line.into());
            self.channel.ready.notify_all();
        }
    }

    /// Signal that no more input will ever arrive. Queued lines are still
    /// delivered before the driver sees the disconnect.
    pub fn disconnect(&self) {
        if let Ok(mut state) = self.channel.state.lock() {
            state.disconnected = true;
            self.channel.ready.notify_all();
        }
    }
}

/// The player's connection: an input queue fed from another thread and a
/// paragraph-buffered output stream.
///
/// Output accumulates as paragraphs and reaches the adapter only on
/// [`Session::flush`], so a burst of story text arrives as one coherent
/// block. The prompt is a flag, not a paragraph: requesting it twice
/// before a flush still prints it once.
#[derive(Debug)]
pub struct Session {
    channel: Arc<Channel>,
    paragraphs: Vec<String>,
    prompt: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh session with an empty queue and buffer.
    pub fn new() -> Self {
        Self {
            channel: Arc::new(Channel::default()),
            paragraphs: Vec::new(),
            prompt: None,
        }
    }

    /// A handle for the thread that produces input lines.
    pub fn input_handle(&self) -> InputHandle {
        InputHandle {
            channel: Arc::clone(&self.channel),
        }
    }

    /// Block until a line arrives, the timeout passes, or the producer
    /// disconnects. `None` waits forever.
    pub fn wait_input(&self, timeout: Option<Duration>) -> InputWait {
        let Ok(mut state) = self.channel.state.lock() else {
            return InputWait::Disconnected;
        };
        loop {
            if let Some(line) = state.queue.pop_front() {
                return InputWait::Ready(line);
            }
            if state.disconnected {
                return InputWait::Disconnected;
            }
            match timeout {
                None => {
                    state = match self.channel.ready.wait(state) {
                        Ok(guard) => guard,
                        Err(_) => return InputWait::Disconnected,
                    };
                }
                Some(limit) => {
                    let (guard, result) = match self.channel.ready.wait_timeout(state, limit) {
                        Ok(pair) => pair,
                        Err(_) => return InputWait::Disconnected,
                    };
                    state = guard;
                    if result.timed_out() && state.queue.is_empty() {
                        return if state.disconnected {
                            InputWait::Disconnected
                        } else {
                            InputWait::TimedOut
                        };
                    }
                }
            }
        }
    }

    /// Pop a queued line without blocking.
    pub fn try_input(&self) -> Option<String> {
        self.channel
            .state
            .lock()
            .ok()
            .and_then(|mut state| state.queue.pop_front())
    }

    /// Buffer a paragraph of output.
    pub fn print(&mut self, paragraph: impl Into<String>) {
        self.paragraphs.push(paragraph.into());
    }

    /// Buffer several paragraphs of output.
    pub fn print_all<I, S>(&mut self, paragraphs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for paragraph in paragraphs {
            self.paragraphs.push(paragraph.into());
        }
    }

    /// Request that the given prompt be shown at the next flush.
    /// Idempotent between flushes; the latest prompt text wins.
    pub fn request_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = Some(prompt.into());
    }

    /// Push buffered paragraphs (and the pending prompt, if any) to the
    /// adapter, emptying the buffer.
    pub fn flush(&mut self, io: &mut dyn IoAdapter) {
        for paragraph in self.paragraphs.drain(..) {
            io.write(&paragraph);
        }
        if let Some(prompt) = self.prompt.take() {
            io.write_prompt(&prompt);
        }
    }

    /// Whether any output is waiting to be flushed.
    pub fn has_pending_output(&self) -> bool {
        !self.paragraphs.is_empty() || self.prompt.is_some()
    }
}

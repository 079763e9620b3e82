//! Progress reporting.
//!
//! Components report human-readable progress lines through a [`Progress`]
//! sink handed to them by the caller. Lines are emitted in the order the
//! work happens; the wording of several of them is relied on by callers.

/// Sink for progress messages.
pub trait Progress {
    fn emit(&mut self, message: &str);
}

/// Collects messages, mostly for tests.
impl Progress for Vec<String> {
    fn emit(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Discards all messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {
    fn emit(&mut self, _message: &str) {}
}

/// Forwards each message to a closure.
pub struct FnProgress<F: FnMut(&str)>(pub F);

impl<F: FnMut(&str)> Progress for FnProgress<F> {
    fn emit(&mut self, message: &str) {
        (self.0)(message)
    }
}

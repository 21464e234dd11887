//! The stdio proxy session state machine: `starting -> running -> draining
//! -> closed`. Kept as a small atomic so it can be read from the lifecycle
//! task without locking while the pump tasks run independently.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Running,
    Draining,
    Closed,
}

impl SessionState {
    fn to_u8(self) -> u8 {
        match self {
            SessionState::Starting => 0,
            SessionState::Running => 1,
            SessionState::Draining => 2,
            SessionState::Closed => 3,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => SessionState::Starting,
            1 => SessionState::Running,
            2 => SessionState::Draining,
            _ => SessionState::Closed,
        }
    }
}

/// Shared, lock-free session state. `starting` is the initial value;
/// transitions only ever move forward (there is no path back from
/// `draining` to `running`).
pub struct SharedSessionState(AtomicU8);

impl Default for SharedSessionState {
    fn default() -> Self {
        Self(AtomicU8::new(SessionState::Starting.to_u8()))
    }
}

impl SharedSessionState {
    #[must_use]
    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: SessionState) {
        self.0.store(state.to_u8(), Ordering::SeqCst);
    }

    /// In `draining` or `closed`, the pipeline stops processing new
    /// messages (in-flight ones still complete).
    #[must_use]
    pub fn accepts_new_messages(&self) -> bool {
        matches!(self.get(), SessionState::Starting | SessionState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_starting_state() {
        assert_eq!(SharedSessionState::default().get(), SessionState::Starting);
    }

    #[test]
    fn transitions_are_observable() {
        let state = SharedSessionState::default();
        state.set(SessionState::Running);
        assert_eq!(state.get(), SessionState::Running);
        assert!(state.accepts_new_messages());
        state.set(SessionState::Draining);
        assert!(!state.accepts_new_messages());
        state.set(SessionState::Closed);
        assert_eq!(state.get(), SessionState::Closed);
    }
}

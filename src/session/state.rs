//! Session state machine.

/// Lifecycle state of a logical session.
///
/// Only `Active` sessions live in the registry; the terminal states are
/// reported on the record handed back when a session is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Session is in use.
    #[default]
    Active,
    /// Session was terminated by `endSessions` or `killSessions`.
    Ended,
    /// Session was idle for longer than the timeout.
    Expired,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Active -> Ended
    /// - Active -> Expired
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!((*self, target), (Active, Ended) | (Active, Expired))
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `false` and leaves the state unchanged if the transition is
    /// not allowed.
    pub fn transition_to(&mut self, target: SessionState) -> bool {
        if self.can_transition_to(target) {
            *self = target;
            true
        } else {
            false
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let mut state = SessionState::Active;
        assert!(state.transition_to(SessionState::Ended));
        assert_eq!(state, SessionState::Ended);

        let mut state = SessionState::Active;
        assert!(state.transition_to(SessionState::Expired));
        assert_eq!(state, SessionState::Expired);
    }

    #[test]
    fn test_no_transition_from_terminal() {
        for terminal in [SessionState::Ended, SessionState::Expired] {
            let mut state = terminal;
            assert!(!state.transition_to(SessionState::Active));
            assert!(!state.transition_to(SessionState::Ended));
            assert!(!state.transition_to(SessionState::Expired));
            assert_eq!(state, terminal);
        }
    }

    #[test]
    fn test_is_terminal() {
        assert!(!SessionState::Active.is_terminal());
        assert!(SessionState::Ended.is_terminal());
        assert!(SessionState::Expired.is_terminal());
    }

    #[test]
    fn test_default() {
        assert_eq!(SessionState::default(), SessionState::Active);
    }
}

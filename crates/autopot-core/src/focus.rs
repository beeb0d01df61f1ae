//! Foreground gating.

use tracing::info;

use crate::gauge::GaugeState;
use crate::input::WindowQuery;

/// Result of one focus check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusStatus {
    pub focused: bool,
    pub just_lost_focus: bool,
    pub just_gained_focus: bool,
}

/// Tracks whether the game window has focus.
///
/// Starts out assuming focus, so the first check against an unfocused window
/// reports a loss.
#[derive(Debug, Clone)]
pub struct FocusGate {
    window_title: String,
    focused: bool,
}

impl FocusGate {
    pub fn new(window_title: impl Into<String>) -> Self {
        Self {
            window_title: window_title.into(),
            focused: true,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Query `window` and update the gate.
    ///
    /// Losing focus clears the stability timer in `state`; the learned maximum
    /// survives.
    pub fn check_focus<W>(&mut self, window: &W, state: &mut GaugeState) -> FocusStatus
    where
        W: WindowQuery + ?Sized,
    {
        let focused = window.is_foreground(&self.window_title);
        let status = FocusStatus {
            focused,
            just_lost_focus: self.focused && !focused,
            just_gained_focus: !self.focused && focused,
        };

        if status.just_lost_focus {
            state.clear_stability();
            info!("Game window '{}' lost focus, pausing", self.window_title);
        } else if status.just_gained_focus {
            info!("Game window '{}' focused, resuming", self.window_title);
        }

        self.focused = focused;
        status
    }

    /// Back to the initial (focused) assumption.
    pub fn reset(&mut self) {
        self.focused = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::mock::ScriptedWindow;
    use std::time::Instant;

    #[test]
    fn test_focus_transitions() {
        let window = ScriptedWindow::scripted([true, false, false, true, true], true);
        let mut gate = FocusGate::new("Last Epoch");
        let mut state = GaugeState::default();

        let statuses: Vec<_> = (0..5).map(|_| gate.check_focus(&window, &mut state)).collect();

        let lost: Vec<_> = statuses.iter().map(|s| s.just_lost_focus).collect();
        let gained: Vec<_> = statuses.iter().map(|s| s.just_gained_focus).collect();
        assert_eq!(lost, vec![false, true, false, false, false]);
        assert_eq!(gained, vec![false, false, false, true, false]);
        assert_eq!(window.queries()[0], "Last Epoch");
    }

    #[test]
    fn test_losing_focus_clears_stability_only() {
        let window = ScriptedWindow::fixed(false);
        let mut gate = FocusGate::new("Game");
        let mut state = GaugeState::default();
        state.adopt_max(1000.0, 0.6);
        state.last_stable_value = Some(950.0);
        state.stable_since = Some(Instant::now());

        let status = gate.check_focus(&window, &mut state);

        assert!(!status.focused);
        assert!(status.just_lost_focus);
        assert_eq!(state.last_stable_value, None);
        assert_eq!(state.stable_since, None);
        assert_eq!(state.current_max, Some(1000.0));
    }

    #[test]
    fn test_staying_unfocused_does_not_replay_loss() {
        let window = ScriptedWindow::fixed(false);
        let mut gate = FocusGate::new("Game");
        let mut state = GaugeState::default();

        assert!(gate.check_focus(&window, &mut state).just_lost_focus);

        state.last_stable_value = Some(1.0);
        let status = gate.check_focus(&window, &mut state);
        assert!(!status.just_lost_focus);
        assert_eq!(state.last_stable_value, Some(1.0));
    }
}

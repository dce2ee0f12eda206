//! Reconnect scheduling state.
//!
//! Pure bookkeeping, no timers: the connection task asks `on_close()` whether
//! and when to retry, and reports back with `timer_fired()`.

use std::time::Duration;

/// Delay before the first reconnect attempt
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);
/// Upper bound for the doubling delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30000);

/// Exponential backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
}

impl BackoffConfig {
    /// `max` is raised to `initial` if it is smaller.
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY)
    }
}

/// Backoff state of one reconnecting client.
///
/// Invariant: `initial <= current_delay <= max`, and at most one reconnect
/// attempt is pending at a time.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    config: BackoffConfig,
    current_delay: Duration,
    should_reconnect: bool,
    pending: bool,
}

impl ReconnectState {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            current_delay: config.initial,
            should_reconnect: false,
            pending: false,
        }
    }

    /// User asked to connect: automatic reconnects are enabled again.
    pub fn connect(&mut self) {
        self.should_reconnect = true;
        self.pending = false;
    }

    /// Connection opened: the next failure starts from the initial delay.
    pub fn on_open(&mut self) {
        self.current_delay = self.config.initial;
    }

    /// Connection closed or failed.
    ///
    /// Returns the delay before the next attempt, or `None` when reconnecting
    /// is disabled or an attempt is already scheduled.
    pub fn on_close(&mut self) -> Option<Duration> {
        if !self.should_reconnect || self.pending {
            return None;
        }

        self.pending = true;
        let delay = self.current_delay;
        self.current_delay = (self.current_delay * 2).min(self.config.max);
        Some(delay)
    }

    /// The scheduled attempt is starting.
    pub fn timer_fired(&mut self) {
        self.pending = false;
    }

    /// User asked to disconnect: cancel the pending attempt and stop retrying.
    pub fn disconnect(&mut self) {
        self.should_reconnect = false;
        self.pending = false;
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    pub fn should_reconnect(&self) -> bool {
        self.should_reconnect
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn connected() -> ReconnectState {
        let mut state = ReconnectState::new(BackoffConfig::default());
        state.connect();
        state
    }

    #[test]
    fn test_backoff_sequence() {
        let mut state = connected();

        let delays: Vec<u64> = (0..8)
            .map(|_| {
                let delay = state.on_close().unwrap();
                state.timer_fired();
                delay.as_millis() as u64
            })
            .collect();

        assert_eq!(
            delays,
            vec![1000, 2000, 4000, 8000, 16000, 30000, 30000, 30000]
        );
    }

    #[test]
    fn test_open_resets_delay() {
        let mut state = connected();
        state.on_close();
        state.timer_fired();
        state.on_close();
        state.timer_fired();
        assert_eq!(state.current_delay(), ms(4000));

        state.on_open();
        assert_eq!(state.on_close(), Some(ms(1000)));
    }

    #[test]
    fn test_single_pending_attempt() {
        let mut state = connected();
        assert_eq!(state.on_close(), Some(ms(1000)));
        // A second close before the timer fires schedules nothing.
        assert_eq!(state.on_close(), None);
        assert!(state.is_pending());

        state.timer_fired();
        assert_eq!(state.on_close(), Some(ms(2000)));
    }

    #[test]
    fn test_disconnect_stops_retries() {
        let mut state = connected();
        state.on_close();
        state.disconnect();

        assert!(!state.is_pending());
        assert_eq!(state.on_close(), None);

        state.connect();
        assert!(state.on_close().is_some());
    }

    #[test]
    fn test_never_connected_does_not_retry() {
        let mut state = ReconnectState::new(BackoffConfig::default());
        assert_eq!(state.on_close(), None);
    }

    #[test]
    fn test_custom_bounds() {
        let mut state = ReconnectState::new(BackoffConfig::new(ms(300), ms(1000)));
        state.connect();

        let mut delays = Vec::new();
        for _ in 0..4 {
            delays.push(state.on_close().unwrap());
            state.timer_fired();
        }
        assert_eq!(delays, vec![ms(300), ms(600), ms(1000), ms(1000)]);
        assert_eq!(BackoffConfig::new(ms(500), ms(10)).max, ms(500));
    }
}

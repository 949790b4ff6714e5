//! Loop region policy

use super::Transport;

/// Loop window as fractions of the track length
///
/// The bounds are stored as given; a window with `end <= start` is simply
/// inactive. This allows setting both ends in any order before enabling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Looper {
    start: f64,
    end: f64,
    enabled: bool,
}

impl Looper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_start(&mut self, start: f64) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: f64) {
        self.end = end;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the loop can trigger at all
    #[inline]
    pub fn is_active(&self) -> bool {
        self.enabled && self.end > self.start
    }

    /// Seek back to the loop start if the transport has reached the loop end
    ///
    /// Runs once after each rendered block. Returns `true` if it seeked.
    pub fn after_block(&self, transport: &mut Transport) -> bool {
        if !self.is_active() {
            return false;
        }
        let Ok(position) = transport.position_relative() else {
            return false;
        };
        if position < self.end {
            return false;
        }

        let target = self.start.max(0.0) * transport.length() as f64;
        transport.seek_samples(target as u64);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_util::constant_track;

    fn loaded_transport(length: usize) -> Transport {
        let mut transport = Transport::new();
        transport.load(constant_track(0.1, length, 1000).source().clone());
        transport
    }

    #[test]
    fn test_seeks_to_start_when_end_reached() {
        let mut looper = Looper::new();
        looper.set_start(0.2);
        looper.set_end(0.5);
        looper.set_enabled(true);

        let mut transport = loaded_transport(1000);
        transport.seek_samples(499);
        assert!(!looper.after_block(&mut transport));
        assert_eq!(transport.position(), 499);

        transport.seek_samples(500);
        assert!(looper.after_block(&mut transport));
        assert_eq!(transport.position(), 200);
    }

    #[test]
    fn test_disabled_loop_never_triggers() {
        let mut looper = Looper::new();
        looper.set_start(0.2);
        looper.set_end(0.5);

        let mut transport = loaded_transport(1000);
        transport.seek_samples(900);
        assert!(!looper.after_block(&mut transport));
        assert_eq!(transport.position(), 900);
    }

    #[test]
    fn test_inverted_or_empty_window_never_triggers() {
        let mut transport = loaded_transport(1000);
        transport.seek_samples(1000);

        for (start, end) in [(0.5, 0.2), (0.4, 0.4)] {
            let mut looper = Looper::new();
            looper.set_start(start);
            looper.set_end(end);
            looper.set_enabled(true);
            assert!(!looper.is_active());
            assert!(!looper.after_block(&mut transport));
            assert_eq!(transport.position(), 1000);
        }
    }

    #[test]
    fn test_empty_transport_is_ignored() {
        let mut looper = Looper::new();
        looper.set_end(0.5);
        looper.set_enabled(true);
        assert!(!looper.after_block(&mut Transport::new()));
    }
}

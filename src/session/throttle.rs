//! Pointer drag throttling

use std::time::{Duration, Instant};

use super::messages::{PointerEvent, PointerPhase};

/// Drag events per second admitted during a gesture
pub const POINTER_RATE_HZ: u32 = 90;

/// Drops drag events that arrive sooner than the interval after the last
/// admitted one. Down and up events always pass.
#[derive(Debug, Clone)]
pub struct PointerThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for PointerThrottle {
    fn default() -> Self {
        Self::new(POINTER_RATE_HZ)
    }
}

impl PointerThrottle {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / rate_hz.max(1),
            last: None,
        }
    }

    pub fn admit(&mut self, event: &PointerEvent) -> bool {
        match event.phase {
            PointerPhase::Down | PointerPhase::Up => {
                self.last = Some(event.timestamp);
                true
            }
            PointerPhase::Drag => {
                let due = self
                    .last
                    .is_none_or(|last| event.timestamp.saturating_duration_since(last) >= self.interval);
                if due {
                    self.last = Some(event.timestamp);
                }
                due
            }
        }
    }
}

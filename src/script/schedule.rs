//! Time schedules

use serde::{Deserialize, Serialize};

use crate::utils::constants::SCHEDULE_TOLERANCE;

/// Fire at `t_start`, then every `t_period` until `t_end`
///
/// Without a period the schedule fires once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub t_start: f64,
    #[serde(default)]
    pub t_end: Option<f64>,
    #[serde(default)]
    pub t_period: Option<f64>,
}

impl Schedule {
    pub fn once(t_start: f64) -> Self {
        Self {
            t_start,
            t_end: None,
            t_period: None,
        }
    }

    pub fn periodic(t_start: f64, t_period: f64, t_end: Option<f64>) -> Self {
        Self {
            t_start,
            t_end,
            t_period: Some(t_period),
        }
    }

    /// Time of the next firing after `fired` firings, if there is one
    pub fn next(&self, fired: usize) -> Option<f64> {
        let t_next = match self.t_period {
            Some(period) if period > 0.0 => self.t_start + fired as f64 * period,
            _ if fired == 0 => self.t_start,
            _ => return None,
        };
        match self.t_end {
            Some(t_end) if t_next > t_end + SCHEDULE_TOLERANCE => None,
            _ => Some(t_next),
        }
    }

    /// True when a firing is due at time `t`
    pub fn due(&self, t: f64, fired: usize) -> bool {
        self.next(fired)
            .is_some_and(|t_next| t + SCHEDULE_TOLERANCE >= t_next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_once() {
        let s = Schedule::once(1.0);
        assert!(!s.due(0.5, 0));
        assert!(s.due(1.0, 0));
        assert!(!s.due(2.0, 1));
    }

    #[test]
    fn test_periodic_with_end() {
        let s = Schedule::periodic(1.0, 0.5, Some(2.0));
        assert_eq!(s.next(0), Some(1.0));
        assert_eq!(s.next(2), Some(2.0));
        assert_eq!(s.next(3), None);
        // accumulated clock error stays within the slack
        assert!(s.due(0.1 * 10.0 - 1e-12, 0));
    }
}

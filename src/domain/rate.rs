//! Rate definitions over a hierarchy of time windows.
//!
//! A [`RateDefinition`] expresses how many events are permitted within each
//! of five fixed window granularities. Definitions are plain values: they
//! can be scaled, summed, and validated, but carry no usage state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A fixed time granularity over which a usage threshold applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateWindow {
    /// One second
    Second,
    /// One minute
    Minute,
    /// One hour
    Hour,
    /// One day
    Day,
    /// One week
    Week,
}

impl RateWindow {
    /// All windows, finest first.
    pub const ALL: [RateWindow; 5] = [
        RateWindow::Second,
        RateWindow::Minute,
        RateWindow::Hour,
        RateWindow::Day,
        RateWindow::Week,
    ];

    /// Length of this window.
    pub fn duration(&self) -> Duration {
        match self {
            RateWindow::Second => Duration::from_secs(1),
            RateWindow::Minute => Duration::from_secs(60),
            RateWindow::Hour => Duration::from_secs(60 * 60),
            RateWindow::Day => Duration::from_secs(24 * 60 * 60),
            RateWindow::Week => Duration::from_secs(7 * 24 * 60 * 60),
        }
    }

    /// Stable name used in metric tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateWindow::Second => "second",
            RateWindow::Minute => "minute",
            RateWindow::Hour => "hour",
            RateWindow::Day => "day",
            RateWindow::Week => "week",
        }
    }

    /// Position in [`RateWindow::ALL`]; used to index per-window state.
    pub(crate) fn index(&self) -> usize {
        match self {
            RateWindow::Second => 0,
            RateWindow::Minute => 1,
            RateWindow::Hour => 2,
            RateWindow::Day => 3,
            RateWindow::Week => 4,
        }
    }
}

impl fmt::Display for RateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced by [`RateDefinition::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateDefinitionError {
    /// A threshold was negative.
    NegativeThreshold(RateWindow),
    /// A threshold was NaN or infinite.
    NonFiniteThreshold(RateWindow),
}

impl fmt::Display for RateDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateDefinitionError::NegativeThreshold(w) => {
                write!(f, "per-{} threshold must not be negative", w)
            }
            RateDefinitionError::NonFiniteThreshold(w) => {
                write!(f, "per-{} threshold must be finite", w)
            }
        }
    }
}

impl std::error::Error for RateDefinitionError {}

/// Immutable policy expressing allowed event counts per time window.
///
/// Thresholds are optional per window; an unset window is unlimited.
/// Fractional thresholds are meaningful: `per_second: Some(0.005)` permits
/// no events in almost every one-second window, which is how very low
/// sustained rates are expressed against fixed windows.
///
/// Advisory invariant (not enforced here): a finer window's threshold,
/// extrapolated to a coarser window's length, should be able to reach the
/// coarser threshold; otherwise the coarser limit is dead configuration.
/// See `LimitsConfig::validate` for the warning path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateDefinition {
    /// Events permitted per one-second window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_second: Option<f64>,
    /// Events permitted per one-minute window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_minute: Option<f64>,
    /// Events permitted per one-hour window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_hour: Option<f64>,
    /// Events permitted per one-day window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_day: Option<f64>,
    /// Events permitted per one-week window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_week: Option<f64>,
}

impl RateDefinition {
    /// Threshold for a window, if configured.
    pub fn threshold(&self, window: RateWindow) -> Option<f64> {
        match window {
            RateWindow::Second => self.per_second,
            RateWindow::Minute => self.per_minute,
            RateWindow::Hour => self.per_hour,
            RateWindow::Day => self.per_day,
            RateWindow::Week => self.per_week,
        }
    }

    /// Windows that carry a threshold, finest first.
    pub fn limited_windows(&self) -> impl Iterator<Item = (RateWindow, f64)> + '_ {
        RateWindow::ALL
            .into_iter()
            .filter_map(|w| self.threshold(w).map(|t| (w, t)))
    }

    /// True if no window carries a threshold.
    pub fn is_empty(&self) -> bool {
        self.limited_windows().next().is_none()
    }

    /// Scale every threshold by a factor.
    pub fn times(&self, factor: f64) -> RateDefinition {
        self.map(|t| t * factor)
    }

    /// Element-wise sum. A window limited on only one side keeps that
    /// side's threshold.
    pub fn plus(&self, other: &RateDefinition) -> RateDefinition {
        let add = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => Some(a + b),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        RateDefinition {
            per_second: add(self.per_second, other.per_second),
            per_minute: add(self.per_minute, other.per_minute),
            per_hour: add(self.per_hour, other.per_hour),
            per_day: add(self.per_day, other.per_day),
            per_week: add(self.per_week, other.per_week),
        }
    }

    /// Apply a function to every configured threshold.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> RateDefinition {
        RateDefinition {
            per_second: self.per_second.map(&f),
            per_minute: self.per_minute.map(&f),
            per_hour: self.per_hour.map(&f),
            per_day: self.per_day.map(&f),
            per_week: self.per_week.map(&f),
        }
    }

    /// Reject negative or non-finite thresholds.
    pub fn validate(&self) -> Result<(), RateDefinitionError> {
        for (window, threshold) in self.limited_windows() {
            if !threshold.is_finite() {
                return Err(RateDefinitionError::NonFiniteThreshold(window));
            }
            if threshold < 0.0 {
                return Err(RateDefinitionError::NegativeThreshold(window));
            }
        }
        Ok(())
    }
}

/// Five-window definition derived from a daily event budget.
///
/// The cross-window ratios are anchored at a 23-events/day baseline
/// (week 115, day 23, hour 3, minute 0.07, second 0.005) and scale
/// linearly with the requested budget.
pub fn standard_ratio_rate_definition(events_per_day: f64) -> RateDefinition {
    let ratio = events_per_day / 23.0;
    RateDefinition {
        per_week: Some(115.0 * ratio),
        per_day: Some(23.0 * ratio),
        per_hour: Some(3.0 * ratio),
        per_minute: Some(0.07 * ratio),
        per_second: Some(0.005 * ratio),
    }
}

/// Composes a per-actor-scaled definition with a constant baseline.
///
/// The effective limits for a scope with `n` active users are
/// `per_user × n + constant`, summed element-wise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerUserRateDefinition {
    /// Definition applied once per active user.
    pub per_user: RateDefinition,
    /// Baseline definition every scope gets regardless of user count.
    pub constant: RateDefinition,
}

impl PerUserRateDefinition {
    /// Create a per-user composition.
    pub fn new(per_user: RateDefinition, constant: RateDefinition) -> Self {
        Self { per_user, constant }
    }

    /// Effective limits for a scope with the given active-user count.
    pub fn rate_limits(&self, n_users: u64) -> RateDefinition {
        self.per_user.times(n_users as f64).plus(&self.constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_durations_ascend() {
        let mut previous = Duration::ZERO;
        for window in RateWindow::ALL {
            assert!(window.duration() > previous);
            previous = window.duration();
        }
    }

    #[test]
    fn test_threshold_lookup() {
        let def = RateDefinition {
            per_day: Some(50.0),
            per_second: Some(1.0),
            ..Default::default()
        };

        assert_eq!(def.threshold(RateWindow::Day), Some(50.0));
        assert_eq!(def.threshold(RateWindow::Second), Some(1.0));
        assert_eq!(def.threshold(RateWindow::Week), None);
    }

    #[test]
    fn test_limited_windows_finest_first() {
        let def = RateDefinition {
            per_week: Some(100.0),
            per_second: Some(1.0),
            ..Default::default()
        };

        let windows: Vec<_> = def.limited_windows().map(|(w, _)| w).collect();
        assert_eq!(windows, vec![RateWindow::Second, RateWindow::Week]);
    }

    #[test]
    fn test_times_scales_all_thresholds() {
        let def = RateDefinition {
            per_day: Some(10.0),
            per_hour: Some(2.0),
            ..Default::default()
        };

        let scaled = def.times(3.0);
        assert_eq!(scaled.per_day, Some(30.0));
        assert_eq!(scaled.per_hour, Some(6.0));
        assert_eq!(scaled.per_week, None);
    }

    #[test]
    fn test_plus_is_element_wise_union() {
        let a = RateDefinition {
            per_day: Some(10.0),
            per_hour: Some(5.0),
            ..Default::default()
        };
        let b = RateDefinition {
            per_day: Some(40.0),
            per_minute: Some(2.0),
            ..Default::default()
        };

        let sum = a.plus(&b);
        assert_eq!(sum.per_day, Some(50.0));
        assert_eq!(sum.per_hour, Some(5.0));
        assert_eq!(sum.per_minute, Some(2.0));
        assert_eq!(sum.per_week, None);
    }

    #[test]
    fn test_empty_definition() {
        assert!(RateDefinition::default().is_empty());
        assert!(!standard_ratio_rate_definition(23.0).is_empty());
    }

    #[test]
    fn test_validate_rejects_negative() {
        let def = RateDefinition {
            per_minute: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(
            def.validate(),
            Err(RateDefinitionError::NegativeThreshold(RateWindow::Minute))
        );
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let def = RateDefinition {
            per_hour: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(
            def.validate(),
            Err(RateDefinitionError::NonFiniteThreshold(RateWindow::Hour))
        );
    }

    #[test]
    fn test_standard_ratio_baseline() {
        let def = standard_ratio_rate_definition(23.0);
        assert_eq!(def.per_week, Some(115.0));
        assert_eq!(def.per_day, Some(23.0));
        assert_eq!(def.per_hour, Some(3.0));
        assert_eq!(def.per_minute, Some(0.07));
        assert_eq!(def.per_second, Some(0.005));
    }

    #[test]
    fn test_standard_ratio_scales_linearly() {
        let def = standard_ratio_rate_definition(46.0);
        assert_eq!(def.per_week, Some(230.0));
        assert_eq!(def.per_day, Some(46.0));
    }

    #[test]
    fn test_per_user_rate_limits() {
        let per_user = PerUserRateDefinition::new(
            standard_ratio_rate_definition(46.0),
            RateDefinition {
                per_week: Some(100.0),
                per_day: Some(50.0),
                per_hour: Some(30.0),
                per_minute: Some(10.0),
                per_second: Some(1.0),
            },
        );

        // Zero users falls back to the constant baseline.
        assert_eq!(per_user.rate_limits(0).per_day, Some(50.0));

        // Ten users: 10 * 46 + 50.
        assert_eq!(per_user.rate_limits(10).per_day, Some(510.0));
    }

    #[test]
    fn test_toml_round_trip() {
        let def = RateDefinition {
            per_hour: Some(17000.0),
            per_minute: Some(400.0),
            per_second: Some(30.0),
            ..Default::default()
        };

        let encoded = toml::to_string(&def).unwrap();
        let decoded: RateDefinition = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, def);
    }
}

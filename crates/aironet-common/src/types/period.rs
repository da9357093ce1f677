//! Reward period records

use serde::{Deserialize, Serialize};

/// An administrator-defined span distributing a fixed AIRO pool across a
/// fixed number of weekly windows. `[start_week, end_week)` is the window
/// the next distribution tick settles; the engine advances it in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardPeriod {
    pub id: String,
    /// Total AIRO distributed over the whole period.
    pub total: f64,
    /// `total / total_weeks`, fixed to 6 decimals at creation.
    pub weekly_reward: f64,
    pub total_weeks: i64,
    /// Windows still to distribute; the period is finished at 0.
    pub weeks_left: i64,
    pub start_date: i64,
    pub end_date: i64,
    pub start_week: i64,
    pub end_week: i64,
    pub timestamp_created: i64,
    pub timestamp_updated: i64,
}

impl RewardPeriod {
    /// Active: running right now with windows left to pay.
    pub fn is_active(&self, now: i64) -> bool {
        self.start_date <= now && self.end_date >= now && self.weeks_left > 0
    }

    /// Upcoming: scheduled entirely in the future.
    pub fn is_upcoming(&self, now: i64) -> bool {
        self.start_date > now && self.weeks_left > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start_date: i64, end_date: i64, weeks_left: i64) -> RewardPeriod {
        RewardPeriod {
            id: "p1".into(),
            total: 700.0,
            weekly_reward: 100.0,
            total_weeks: 7,
            weeks_left,
            start_date,
            end_date,
            start_week: start_date,
            end_week: start_date + 600,
            timestamp_created: start_date,
            timestamp_updated: start_date,
        }
    }

    #[test]
    fn active_and_upcoming_are_disjoint() {
        let now = 10_000;
        let active = period(now - 100, now + 100, 3);
        assert!(active.is_active(now));
        assert!(!active.is_upcoming(now));

        let upcoming = period(now + 50, now + 500, 3);
        assert!(!upcoming.is_active(now));
        assert!(upcoming.is_upcoming(now));

        let exhausted = period(now - 100, now + 100, 0);
        assert!(!exhausted.is_active(now));
        assert!(!exhausted.is_upcoming(now));
    }
}

//! Health and uptime scoring
//!
//! Two pure functions shared by the distribution engine and the uptime
//! dashboard. Health compares what a miner still holds against everything
//! it has ever been paid; uptime normalizes a window's sample count into a
//! one-decimal coefficient.

/// Health score in `[50, 100]`.
///
/// A miner holding all of its lifetime rewards scores 100, one that
/// withdrew everything scores 50. A miner that was never rewarded scores
/// 100; a top-up can never push the score above 100 because the held
/// balance is capped at `total_rewards`.
pub fn health(total_rewards: f64, current_airo: f64) -> f64 {
    if total_rewards == 0.0 {
        return 100.0;
    }
    let held = total_rewards.min(current_airo);
    50.0 * (held / total_rewards) + 50.0
}

/// Uptime coefficient for one window, rounded to one decimal: `observed`
/// ready samples against the `expected` count of a fully-up device.
///
/// 0.0 with no samples, 1.0 when fully up. A device that reports more
/// often than expected scores above 1.0.
pub fn uptime_coefficient(observed: u64, expected: u64) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    (observed as f64 / expected as f64 * 10.0).round() / 10.0
}

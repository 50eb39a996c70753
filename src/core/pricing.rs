//! Credit pricing for generation jobs.
//!
//! Cost is a per-second rate looked up by (voice tier, frame interval),
//! multiplied by media duration. The pre-submission estimate applies a 1.2x
//! safety factor so the gate never under-reserves relative to the final
//! charge; post-completion settlement bills the measured duration with no
//! factor. Both round up to whole credits.

use crate::core::models::{FrameInterval, VoiceTier};

/// Safety multiplier applied to pre-submission estimates.
pub const ESTIMATE_SAFETY_FACTOR: f64 = 1.2;

/// Per-second credit rates, by frame interval, for standard and premium
/// voice tiers. Shorter intervals generate more frames and cost more.
const RATE_TABLE: &[(FrameInterval, f64, f64)] = &[
    (FrameInterval::Three, 4.1, 10.6),
    (FrameInterval::Four, 3.5, 10.2),
    (FrameInterval::Five, 3.3, 9.7),
    (FrameInterval::Six, 2.8, 9.4),
];

/// Look up the per-second credit rate for a tier and interval.
#[must_use]
pub fn rate_per_second(tier: VoiceTier, interval: FrameInterval) -> f64 {
    let &(_, standard, premium) = RATE_TABLE
        .iter()
        .find(|(i, _, _)| *i == interval)
        .unwrap_or(&RATE_TABLE[2]);
    match tier {
        VoiceTier::Standard => standard,
        VoiceTier::Premium => premium,
    }
}

/// Actual credit cost: measured duration times the rate, rounded up.
#[must_use]
pub fn actual_credits(duration_secs: f64, tier: VoiceTier, interval: FrameInterval) -> u64 {
    charge(duration_secs, tier, interval, 1.0)
}

/// Pre-submission estimate: requested duration times the rate, padded by
/// the safety factor, rounded up.
#[must_use]
pub fn estimate_credits(duration_secs: f64, tier: VoiceTier, interval: FrameInterval) -> u64 {
    charge(duration_secs, tier, interval, ESTIMATE_SAFETY_FACTOR)
}

fn charge(duration_secs: f64, tier: VoiceTier, interval: FrameInterval, factor: f64) -> u64 {
    let duration = duration_secs.max(0.0);
    let cost = duration * rate_per_second(tier, interval) * factor;
    // f64 -> u64 after ceil; cost is non-negative and far below 2^53
    cost.ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_table_matches_published_rates() {
        assert!((rate_per_second(VoiceTier::Standard, FrameInterval::Three) - 4.1).abs() < 1e-9);
        assert!((rate_per_second(VoiceTier::Premium, FrameInterval::Three) - 10.6).abs() < 1e-9);
        assert!((rate_per_second(VoiceTier::Standard, FrameInterval::Six) - 2.8).abs() < 1e-9);
        assert!((rate_per_second(VoiceTier::Premium, FrameInterval::Five) - 9.7).abs() < 1e-9);
    }

    #[test]
    fn actual_cost_standard_voice_five_second_interval() {
        // 25s * 3.3/s = 82.5 -> 83
        assert_eq!(
            actual_credits(25.0, VoiceTier::Standard, FrameInterval::Five),
            83
        );
    }

    #[test]
    fn actual_cost_premium_voice_three_second_interval() {
        // 30s * 10.6/s = 318
        assert_eq!(
            actual_credits(30.0, VoiceTier::Premium, FrameInterval::Three),
            318
        );
    }

    #[test]
    fn actual_rounds_up_for_every_table_entry() {
        let duration = 17.0;
        for &(interval, standard, premium) in RATE_TABLE {
            assert_eq!(
                actual_credits(duration, VoiceTier::Standard, interval),
                (duration * standard).ceil() as u64
            );
            assert_eq!(
                actual_credits(duration, VoiceTier::Premium, interval),
                (duration * premium).ceil() as u64
            );
        }
    }

    #[test]
    fn estimate_never_undercharges_same_length_run() {
        for &(interval, _, _) in RATE_TABLE {
            for tier in [VoiceTier::Standard, VoiceTier::Premium] {
                for duration in [1.0, 12.5, 25.0, 30.0, 60.0, 181.4] {
                    assert!(
                        estimate_credits(duration, tier, interval)
                            >= actual_credits(duration, tier, interval),
                        "estimate under actual for {tier} at {}s interval, {duration}s",
                        interval.as_secs()
                    );
                }
            }
        }
    }

    #[test]
    fn negative_and_zero_durations_cost_nothing() {
        assert_eq!(
            actual_credits(0.0, VoiceTier::Standard, FrameInterval::Five),
            0
        );
        assert_eq!(
            actual_credits(-3.0, VoiceTier::Premium, FrameInterval::Three),
            0
        );
    }
}

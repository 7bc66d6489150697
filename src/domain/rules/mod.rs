// Domain rules - Bitrate budgeting policy

use crate::domain::errors::RejectionReason;
use crate::domain::model::*;

/// Below this total bitrate nothing meaningful can be encoded (bps)
pub const TOTAL_BITRATE_LOWER_BOUND: f64 = 11_000.0;
/// Lowest audio bitrate the planner snaps up to (bps)
pub const MIN_AUDIO_BITRATE: f64 = 32_000.0;
/// Highest audio bitrate the planner allows after rescaling (bps)
pub const MAX_AUDIO_BITRATE: f64 = 256_000.0;
/// Video bitrate below which quality is poor; only used for the advisory (bps)
pub const MIN_VIDEO_BITRATE: f64 = 100_000.0;
/// Plans whose video share falls under this are rejected (bps)
pub const VIDEO_BITRATE_COLLAPSE: f64 = 1_000.0;
/// 2^30 / 10^9; compensates for container overhead when converting KB to bitrate
pub const BINARY_CORRECTION_FACTOR: f64 = 1.073741824;

/// Audio may take at most 1/AUDIO_SHARE_DIVISOR of the total before rescaling
const AUDIO_SHARE_DIVISOR: f64 = 10.0;

/// Turns a probe and a size budget into a video/audio bitrate split.
///
/// Pure computation; the steps run in a fixed order:
///
/// 1. derive the total bitrate the budget allows over the duration
/// 2. reject when that is below [`TOTAL_BITRATE_LOWER_BOUND`]
/// 3. attach a [`QualityAdvisory`] when the budget is under the size needed
///    for minimum audio plus minimum video
/// 4. if the source audio would take more than a tenth of the total, rescale
///    it to a tenth and clamp into `[MIN_AUDIO_BITRATE, MAX_AUDIO_BITRATE]`
/// 5. give the rest to video, rejecting when it collapses
///
/// Audio already within a tenth of the total is passed through untouched,
/// even when it lies outside the clamp range.
pub struct BitratePlanner;

impl BitratePlanner {
    /// Total bitrate (bps) that fills `budget` over `duration_seconds`
    pub fn target_total_bitrate(budget: &SizeBudget, duration_seconds: f64) -> f64 {
        (budget.upper_bound_kilobytes as f64 * 1024.0 * 8.0)
            / (BINARY_CORRECTION_FACTOR * duration_seconds)
    }

    /// Smallest size (KB) that still affords minimum audio and video bitrates
    pub fn best_min_size_kb(duration_seconds: f64) -> f64 {
        (MIN_AUDIO_BITRATE + MIN_VIDEO_BITRATE) * BINARY_CORRECTION_FACTOR * duration_seconds
            / (8.0 * 1024.0)
    }

    /// Plan the bitrate split, or explain why no plan fits the budget
    pub fn plan(probe: &MediaProbe, budget: &SizeBudget) -> Result<BitratePlan, RejectionReason> {
        let target_total = Self::target_total_bitrate(budget, probe.duration_seconds);
        if target_total < TOTAL_BITRATE_LOWER_BOUND {
            return Err(RejectionReason::BudgetTooSmall {
                target_total_bitrate_bps: target_total,
                lower_bound_bps: TOTAL_BITRATE_LOWER_BOUND,
            });
        }

        let best_min_size = Self::best_min_size_kb(probe.duration_seconds);
        let advisory = if (budget.upper_bound_kilobytes as f64) < best_min_size {
            Some(QualityAdvisory {
                recommended_min_kilobytes: best_min_size as u64,
            })
        } else {
            None
        };

        let audio_bitrate = Self::audio_share(probe.audio_bitrate_bps, target_total);

        let video_bitrate = target_total - audio_bitrate;
        if video_bitrate < VIDEO_BITRATE_COLLAPSE {
            return Err(RejectionReason::VideoBitrateCollapse {
                video_bitrate_bps: video_bitrate,
            });
        }

        Ok(BitratePlan {
            video_bitrate_bps: video_bitrate,
            audio_bitrate_bps: audio_bitrate,
            target_total_bitrate_bps: target_total,
            advisory,
        })
    }

    fn audio_share(source_audio: f64, target_total: f64) -> f64 {
        if AUDIO_SHARE_DIVISOR * source_audio <= target_total {
            return source_audio;
        }

        let rescaled = target_total / AUDIO_SHARE_DIVISOR;
        if rescaled < MIN_AUDIO_BITRATE && MIN_AUDIO_BITRATE < target_total {
            MIN_AUDIO_BITRATE
        } else if rescaled > MAX_AUDIO_BITRATE {
            MAX_AUDIO_BITRATE
        } else {
            rescaled
        }
    }
}

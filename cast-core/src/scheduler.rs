//! Per-session frame pacing policy, consulted once per host loop tick.
//!
//! Mono sessions have no external driver of "a new pose exists" (the idle
//! scene keeps animating), so a wall-clock limiter caps them at the capture
//! rate. Stereo sessions are paced by the remote head-pose stream itself,
//! so they render only when fresh camera data arrived.

use crate::session::{PeerSession, ViewMode};

/// What the scheduler wants done for one session this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Stereo decision pending, wait window still open.
    Wait,
    /// Stereo wait expired: commit mono now. No frame this tick; the first
    /// one follows a full interval later.
    ForceMonoCommit,
    /// Mono frame interval elapsed: render with the current pose.
    EmitMono,
    /// Fresh stereo camera data: render with the stored matrices.
    EmitStereo,
    /// Committed, nothing due.
    Idle,
}

/// Fixed frame interval for the mono rate limiter.
pub fn frame_interval_ms(capture_fps: u32) -> u64 {
    1000 / u64::from(capture_fps.max(1))
}

/// Decide what one session should do at `now_ms`.
pub fn assess<C, D>(
    session: &PeerSession<C, D>,
    now_ms: u64,
    stereo_wait_ms: u64,
    interval_ms: u64,
) -> Verdict {
    let Some(commitment) = session.commitment() else {
        if now_ms.saturating_sub(session.started_ms()) >= stereo_wait_ms {
            return Verdict::ForceMonoCommit;
        }
        return Verdict::Wait;
    };
    match commitment.mode() {
        ViewMode::Mono => {
            if now_ms.saturating_sub(commitment.last_render_ms()) >= interval_ms {
                Verdict::EmitMono
            } else {
                Verdict::Idle
            }
        }
        ViewMode::Stereo => {
            // A stereo session with no stored matrices has nothing valid to
            // render, fresh or not.
            if session.is_fresh() && session.stereo_frame().is_some() {
                Verdict::EmitStereo
            } else {
                Verdict::Idle
            }
        }
    }
}

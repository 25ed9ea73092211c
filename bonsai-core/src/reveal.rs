//! Reveal timing after a snapshot is mounted.
//!
//! Two schedules exist side by side:
//! 1. The stage timer ([`RevealStage`], [`RevealTimer`]) decides *whether*
//!    a shape exists at all: branches from 0.5 s, leaves from 1.5 s.
//! 2. The stagger ([`branch_delay`], [`leaf_delay`], [`progress`]) decides
//!    how far into its entrance animation a visible shape is.
//!
//! A host needs both; neither is derived from the other.

use serde::Serialize;

use crate::{mastery::MasteryTree, types::Seconds, types::ShapeId};

/// Branches appear this long after mount.
pub const BRANCHES_AT: Seconds = 0.5;
/// Eligible leaves appear this long after mount.
pub const LEAVES_AT: Seconds = 1.5;

pub const GROUND_DURATION: Seconds = 0.5;
pub const TRUNK_DURATION: Seconds = 1.0;
pub const BRANCH_DURATION: Seconds = 1.0;
pub const LEAF_DURATION: Seconds = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RevealStage {
    Pending,
    BranchesVisible,
    AllVisible,
}

impl RevealStage {
    /// Stage reached `elapsed` seconds after mount.
    pub fn at(elapsed: Seconds) -> Self {
        if elapsed >= LEAVES_AT {
            RevealStage::AllVisible
        } else if elapsed >= BRANCHES_AT {
            RevealStage::BranchesVisible
        } else {
            RevealStage::Pending
        }
    }

    /// Mount-relative time at which the following stage fires.
    pub fn next_at(self) -> Option<Seconds> {
        match self {
            RevealStage::Pending => Some(BRANCHES_AT),
            RevealStage::BranchesVisible => Some(LEAVES_AT),
            RevealStage::AllVisible => None,
        }
    }

    #[inline]
    pub fn branches_visible(self) -> bool {
        self >= RevealStage::BranchesVisible
    }

    #[inline]
    pub fn leaves_visible(self) -> bool {
        self == RevealStage::AllVisible
    }
}

/// Branch ids visible at `stage`: none, then all of them at once.
pub fn visible_branches(tree: &MasteryTree, stage: RevealStage) -> Vec<ShapeId> {
    if stage.branches_visible() {
        tree.branch_ids()
    } else {
        Vec::new()
    }
}

/// Concept ids visible at `stage`: none until the last stage, then every
/// concept with `mastery > 0.3`.
pub fn visible_leaves(tree: &MasteryTree, stage: RevealStage) -> Vec<ShapeId> {
    if stage.leaves_visible() {
        tree.eligible_concept_ids()
    } else {
        Vec::new()
    }
}

/// Host-owned stage timer.
///
/// The host calls [`RevealTimer::poll`] with its clock on every frame.
/// [`RevealTimer::restart`] starts over from [`RevealStage::Pending`] when
/// the snapshot changes; [`RevealTimer::cancel`] stops all further
/// transitions on teardown.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealTimer {
    mounted_at: Seconds,
    stage: RevealStage,
    cancelled: bool,
}

impl RevealTimer {
    pub fn start(now: Seconds) -> Self {
        Self {
            mounted_at: now,
            stage: RevealStage::Pending,
            cancelled: false,
        }
    }

    pub fn restart(&mut self, now: Seconds) {
        tracing::debug!(from = ?self.stage, "restarting reveal timer");
        *self = Self::start(now);
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn stage(&self) -> RevealStage {
        self.stage
    }

    /// Seconds since mount, never negative.
    pub fn elapsed(&self, now: Seconds) -> Seconds {
        (now - self.mounted_at).max(0.0)
    }

    /// Advances the stage from the host's clock.
    ///
    /// 1. A cancelled timer never fires again.
    /// 2. The stage for `now` is computed with [`RevealStage::at`] from the
    ///    time elapsed since mount.
    /// 3. Stages only move forward; the timer keeps the later one.
    ///
    /// A late poll may skip straight from `Pending` to `AllVisible`.
    ///
    /// ### Parameters
    /// - `now` - Current host time, on the same clock as `mounted_at`.
    ///
    /// ### Returns
    /// The new stage if it changed since the last poll, otherwise `None`.
    pub fn poll(&mut self, now: Seconds) -> Option<RevealStage> {
        if self.cancelled {
            return None;
        }
        let stage = RevealStage::at(self.elapsed(now));
        if stage > self.stage {
            tracing::debug!(?stage, elapsed = self.elapsed(now), "reveal stage fired");
            self.stage = stage;
            Some(stage)
        } else {
            None
        }
    }

    /// Absolute time of the next pending transition, if any.
    pub fn next_deadline(&self) -> Option<Seconds> {
        if self.cancelled {
            return None;
        }
        self.stage.next_at().map(|t| self.mounted_at + t)
    }
}

/// Entrance delay of the branch at `index`.
#[inline]
pub fn branch_delay(index: usize) -> Seconds {
    0.8 + index as Seconds * 0.1
}

/// Entrance delay of concept `c_index` on the branch at `branch_index`.
#[inline]
pub fn leaf_delay(branch_index: usize, c_index: usize) -> Seconds {
    1.5 + branch_index as Seconds * 0.2 + c_index as Seconds * 0.1
}

/// Linear animation progress in `[0, 1]`.
///
/// A zero `duration` jumps straight to 1 once `delay` has passed.
pub fn progress(elapsed: Seconds, delay: Seconds, duration: Seconds) -> f32 {
    let local = elapsed - delay;
    if local <= 0.0 {
        0.0
    } else if duration <= 0.0 {
        1.0
    } else {
        (local / duration).min(1.0) as f32
    }
}

/// Cubic ease-out.
pub fn ease_out(p: f32) -> f32 {
    let q = 1.0 - p.clamp(0.0, 1.0);
    1.0 - q * q * q
}

//! Per-peer session records and the registry that owns them.

use std::collections::HashMap;
use std::fmt;

use crate::pose::{Pose, StereoFrame};

/// Opaque stable peer identifier, unique among concurrently connected
/// viewers. Assigned by the signaling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Output mode of a committed session. Fixed for the life of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Mono,
    Stereo,
}

/// Render targets and pacing state that exist only once the stereo decision
/// has been made. Holding them together in one `Option` keeps
/// "targets exist iff decided" out of reach of bugs.
#[derive(Debug)]
pub struct Commitment<C, D> {
    mode: ViewMode,
    color: C,
    depth: D,
    /// Mono pacing stamp; advanced by exactly one frame interval per
    /// emitted frame so missed ticks catch up without drift.
    last_render_ms: u64,
}

impl<C, D> Commitment<C, D> {
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn color(&self) -> &C {
        &self.color
    }

    pub fn depth(&self) -> &D {
        &self.depth
    }

    pub fn last_render_ms(&self) -> u64 {
        self.last_render_ms
    }

    pub(crate) fn advance_render_stamp(&mut self, interval_ms: u64) {
        self.last_render_ms = self.last_render_ms.saturating_add(interval_ms);
    }
}

/// State for one connected remote viewer.
///
/// Camera data is accepted in any phase: matrices sent before the stereo
/// decision are retained and take effect at commit time. Render targets and
/// the view mode appear only with [`Commitment`].
#[derive(Debug)]
pub struct PeerSession<C, D> {
    started_ms: u64,
    pose: Pose,
    stereo_frame: Option<StereoFrame>,
    last_timestamp: i64,
    fresh: bool,
    commitment: Option<Commitment<C, D>>,
}

impl<C, D> PeerSession<C, D> {
    /// New undecided session, first observed at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            started_ms: now_ms,
            pose: Pose::default(),
            stereo_frame: None,
            last_timestamp: 0,
            fresh: false,
            commitment: None,
        }
    }

    pub fn started_ms(&self) -> u64 {
        self.started_ms
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn stereo_frame(&self) -> Option<&StereoFrame> {
        self.stereo_frame.as_ref()
    }

    pub fn last_timestamp(&self) -> i64 {
        self.last_timestamp
    }

    /// True when camera data arrived since the last emitted stereo frame.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn commitment(&self) -> Option<&Commitment<C, D>> {
        self.commitment.as_ref()
    }

    pub(crate) fn commitment_mut(&mut self) -> Option<&mut Commitment<C, D>> {
        self.commitment.as_mut()
    }

    pub fn is_committed(&self) -> bool {
        self.commitment.is_some()
    }

    /// Apply a mono look-at update.
    pub fn set_look_at(&mut self, pose: Pose) {
        self.pose = pose;
        self.fresh = true;
    }

    /// Apply a stereo camera update.
    pub fn set_stereo_frame(&mut self, frame: StereoFrame) {
        self.stereo_frame = Some(frame);
        self.fresh = true;
    }

    /// Apply a stereo prediction update. Accepted only when the timestamp
    /// differs from the last accepted one; duplicates (retransmits) are
    /// dropped so they never re-trigger a frame. Returns whether the update
    /// was accepted.
    pub fn apply_prediction(&mut self, frame: StereoFrame, timestamp: i64) -> bool {
        if timestamp == self.last_timestamp {
            return false;
        }
        self.last_timestamp = timestamp;
        self.stereo_frame = Some(frame);
        self.fresh = true;
        true
    }

    pub(crate) fn clear_fresh(&mut self) {
        self.fresh = false;
    }

    /// Commit the stereo decision with freshly allocated targets. A mono
    /// commit seeds the default pose (discarding any early look-at, as the
    /// wire protocol promises defaults until the client drives the camera)
    /// and stamps the pacing clock at `now_ms`.
    ///
    /// Callers must not commit twice; the mode is fixed once decided.
    pub(crate) fn commit(
        &mut self,
        mode: ViewMode,
        color: C,
        depth: D,
        default_pose: Pose,
        now_ms: u64,
    ) {
        debug_assert!(self.commitment.is_none());
        if mode == ViewMode::Mono {
            self.pose = default_pose;
        }
        self.commitment = Some(Commitment {
            mode,
            color,
            depth,
            last_render_ms: now_ms,
        });
    }
}

/// Registry of sessions keyed by peer identifier. One record per live peer;
/// records appear at first roster observation and disappear when the peer
/// drops off the roster.
pub struct SessionStore<C, D> {
    sessions: HashMap<PeerId, PeerSession<C, D>>,
}

impl<C, D> SessionStore<C, D> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, peer_id: PeerId) -> Option<&PeerSession<C, D>> {
        self.sessions.get(&peer_id)
    }

    pub fn get_mut(&mut self, peer_id: PeerId) -> Option<&mut PeerSession<C, D>> {
        self.sessions.get_mut(&peer_id)
    }

    /// Fetch the session for `peer_id`, creating an undecided one stamped at
    /// `now_ms` on first sight. Returns whether the session was created.
    pub fn ensure(&mut self, peer_id: PeerId, now_ms: u64) -> (&mut PeerSession<C, D>, bool) {
        let mut created = false;
        let session = self.sessions.entry(peer_id).or_insert_with(|| {
            created = true;
            PeerSession::new(now_ms)
        });
        (session, created)
    }

    /// Drop sessions whose peers no longer appear in the transport roster.
    /// Returns the identifiers removed.
    pub fn retain_roster(&mut self, roster: &[PeerId]) -> Vec<PeerId> {
        let mut removed = Vec::new();
        self.sessions.retain(|id, _| {
            let live = roster.contains(id);
            if !live {
                removed.push(*id);
            }
            live
        });
        removed
    }
}

impl<C, D> Default for SessionStore<C, D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    fn frame(tag: f32) -> StereoFrame {
        StereoFrame {
            projection_left: Mat4::from_scale(Vec3::splat(tag)),
            view_left: Mat4::IDENTITY,
            projection_right: Mat4::IDENTITY,
            view_right: Mat4::IDENTITY,
        }
    }

    #[test]
    fn new_session_is_undecided() {
        let s: PeerSession<(), ()> = PeerSession::new(42);
        assert_eq!(s.started_ms(), 42);
        assert!(!s.is_committed());
        assert!(!s.is_fresh());
        assert!(s.stereo_frame().is_none());
        assert_eq!(s.last_timestamp(), 0);
    }

    #[test]
    fn look_at_marks_fresh() {
        let mut s: PeerSession<(), ()> = PeerSession::new(0);
        let pose = Pose {
            eye: Vec3::new(1.0, 2.0, 3.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
        };
        s.set_look_at(pose);
        assert!(s.is_fresh());
        assert_eq!(*s.pose(), pose);
    }

    #[test]
    fn prediction_dedup_by_timestamp() {
        let mut s: PeerSession<(), ()> = PeerSession::new(0);
        assert!(s.apply_prediction(frame(1.0), 100));
        assert!(s.is_fresh());
        s.clear_fresh();

        // Retransmit with the same timestamp: dropped, matrices untouched.
        assert!(!s.apply_prediction(frame(2.0), 100));
        assert!(!s.is_fresh());
        assert_eq!(s.stereo_frame().unwrap(), &frame(1.0));

        assert!(s.apply_prediction(frame(3.0), 101));
        assert!(s.is_fresh());
        assert_eq!(s.last_timestamp(), 101);
    }

    #[test]
    fn mono_commit_seeds_default_pose() {
        let mut s: PeerSession<u8, u8> = PeerSession::new(0);
        s.set_look_at(Pose {
            eye: Vec3::splat(9.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
        });
        let default_pose = Pose::default();
        s.commit(ViewMode::Mono, 1, 2, default_pose, 500);
        let c = s.commitment().unwrap();
        assert_eq!(c.mode(), ViewMode::Mono);
        assert_eq!(c.last_render_ms(), 500);
        assert_eq!(*s.pose(), default_pose);
    }

    #[test]
    fn stereo_commit_keeps_early_matrices() {
        let mut s: PeerSession<u8, u8> = PeerSession::new(0);
        s.set_stereo_frame(frame(4.0));
        s.commit(ViewMode::Stereo, 1, 2, Pose::default(), 500);
        assert!(s.is_fresh());
        assert_eq!(s.stereo_frame().unwrap(), &frame(4.0));
    }

    #[test]
    fn render_stamp_advances_by_interval() {
        let mut s: PeerSession<u8, u8> = PeerSession::new(0);
        s.commit(ViewMode::Mono, 1, 2, Pose::default(), 1000);
        s.commitment_mut().unwrap().advance_render_stamp(16);
        assert_eq!(s.commitment().unwrap().last_render_ms(), 1016);
    }

    #[test]
    fn store_creates_once_and_prunes() {
        let mut store: SessionStore<(), ()> = SessionStore::new();
        let a = PeerId(7);
        let b = PeerId(3);

        let (_, created) = store.ensure(a, 10);
        assert!(created);
        let (s, created) = store.ensure(a, 99);
        assert!(!created);
        assert_eq!(s.started_ms(), 10);

        store.ensure(b, 20);
        assert_eq!(store.len(), 2);

        let removed = store.retain_roster(&[b]);
        assert_eq!(removed, vec![a]);
        assert_eq!(store.len(), 1);
        assert!(store.get(b).is_some());
    }
}

//! Host-driven API: StreamCore receives the peer roster, the clock, and
//! data-channel messages from the host, and returns frame jobs to render
//! and transmit.

use glam::{Mat4, Vec3};
use tracing::{debug, error, info, trace};

use crate::config::StreamConfig;
use crate::pose::Pose;
use crate::protocol::Command;
use crate::scheduler::{self, Verdict};
use crate::session::{PeerId, PeerSession, SessionStore, ViewMode};
use crate::target::{allocate_target_pair, TargetFactory};
use crate::wire;

// Stereo scenes sit two meters in front of the viewer for image
// stabilization; mono scenes stay at the origin.
const STEREO_SCENE_Z: f32 = -2.0;

/// Camera parameters for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraInput {
    /// Mono look-at camera.
    Mono { eye: Vec3, look_at: Vec3, up: Vec3 },
    /// Per-eye projection×view composites.
    Stereo { left: Mat4, right: Mat4 },
}

/// One frame to produce: everything the host needs to drive the scene
/// renderer and hand the result to the transport, fire-and-forget.
#[derive(Debug)]
pub struct FrameJob<C, D> {
    pub peer_id: PeerId,
    pub camera: CameraInput,
    /// Where to place the scene for this frame.
    pub scene_position: Vec3,
    pub color: C,
    pub depth: D,
    /// Transport sync tag: stereo frames carry the last accepted prediction
    /// timestamp, mono frames are untagged.
    pub timestamp: Option<i64>,
}

/// Main coordinator. The host calls [`Self::on_channel_message`] as
/// data-channel text arrives and [`Self::tick`] once per idle loop
/// iteration, on one thread; both complete synchronously.
pub struct StreamCore<F: TargetFactory> {
    config: StreamConfig,
    factory: F,
    default_pose: Pose,
    sessions: SessionStore<F::Color, F::Depth>,
}

impl<F: TargetFactory> StreamCore<F> {
    /// `default_pose` is the scene renderer's resting camera, used for mono
    /// sessions until the client drives the camera itself.
    pub fn new(config: StreamConfig, factory: F, default_pose: Pose) -> Self {
        Self {
            config,
            factory,
            default_pose,
            sessions: SessionStore::new(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    pub fn session(&self, peer_id: PeerId) -> Option<&PeerSession<F::Color, F::Depth>> {
        self.sessions.get(peer_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Entry point for inbound data-channel text. Never fails outward:
    /// malformed messages, unknown types, and messages for peers the
    /// scheduler has not yet observed are dropped without touching any
    /// session.
    pub fn on_channel_message(&mut self, peer_id: PeerId, raw: &str, now_ms: u64) {
        let Some(session) = self.sessions.get_mut(peer_id) else {
            trace!(%peer_id, "dropping message for unknown peer");
            return;
        };
        let command = match wire::decode_message(raw) {
            Ok(command) => command,
            Err(err) => {
                trace!(%peer_id, error = %err, "dropping undecodable message");
                return;
            }
        };
        match command {
            Command::StereoRendering { stereo } => {
                if session.is_committed() {
                    trace!(%peer_id, "stereo decision already made, ignoring");
                    return;
                }
                match allocate_target_pair(
                    &mut self.factory,
                    self.config.width,
                    self.config.height,
                    stereo,
                ) {
                    Ok((color, depth)) => {
                        let mode = if stereo {
                            ViewMode::Stereo
                        } else {
                            ViewMode::Mono
                        };
                        session.commit(mode, color, depth, self.default_pose, now_ms);
                        info!(%peer_id, ?mode, "session committed");
                    }
                    Err(err) => {
                        error!(
                            %peer_id,
                            error = %err,
                            "render target allocation failed, stereo decision still pending"
                        );
                    }
                }
            }
            Command::CameraLookAt { pose } => session.set_look_at(pose),
            Command::CameraStereo { frame } => session.set_stereo_frame(frame),
            Command::CameraStereoPrediction { frame, timestamp } => {
                if !session.apply_prediction(frame, timestamp) {
                    trace!(%peer_id, timestamp, "duplicate prediction dropped");
                }
            }
        }
    }

    /// Entry point for one host idle-loop iteration. Observes the transport
    /// roster (creating sessions for new peers, dropping sessions for gone
    /// ones), force-commits mono for peers that never sent their stereo
    /// decision, and returns the frames due this tick — at most one per
    /// peer.
    pub fn tick(&mut self, roster: &[PeerId], now_ms: u64) -> Vec<FrameJob<F::Color, F::Depth>> {
        for removed in self.sessions.retain_roster(roster) {
            debug!(peer_id = %removed, "peer left, session dropped");
        }

        let interval_ms = scheduler::frame_interval_ms(self.config.capture_fps);
        let mut jobs = Vec::new();
        for &peer_id in roster {
            let (session, created) = self.sessions.ensure(peer_id, now_ms);
            if created {
                debug!(%peer_id, "session created, stereo decision pending");
            }
            match scheduler::assess(session, now_ms, self.config.stereo_wait_ms, interval_ms) {
                Verdict::Wait | Verdict::Idle => {}
                Verdict::ForceMonoCommit => {
                    match allocate_target_pair(
                        &mut self.factory,
                        self.config.width,
                        self.config.height,
                        false,
                    ) {
                        Ok((color, depth)) => {
                            session.commit(
                                ViewMode::Mono,
                                color,
                                depth,
                                self.default_pose,
                                now_ms,
                            );
                            info!(%peer_id, "no stereo decision in time, mono stream started");
                        }
                        Err(err) => {
                            error!(
                                %peer_id,
                                error = %err,
                                "render target allocation failed, stereo decision still pending"
                            );
                        }
                    }
                    // No frame on the commit tick; pacing starts here.
                }
                Verdict::EmitMono => {
                    let pose = *session.pose();
                    if let Some(commitment) = session.commitment_mut() {
                        commitment.advance_render_stamp(interval_ms);
                        jobs.push(FrameJob {
                            peer_id,
                            camera: CameraInput::Mono {
                                eye: pose.eye,
                                look_at: pose.look_at,
                                up: pose.up,
                            },
                            scene_position: Vec3::ZERO,
                            color: commitment.color().clone(),
                            depth: commitment.depth().clone(),
                            timestamp: None,
                        });
                    }
                }
                Verdict::EmitStereo => {
                    if let (Some(frame), Some(commitment)) =
                        (session.stereo_frame().copied(), session.commitment())
                    {
                        let (left, right) = frame.eye_composites();
                        jobs.push(FrameJob {
                            peer_id,
                            camera: CameraInput::Stereo { left, right },
                            scene_position: Vec3::new(0.0, 0.0, STEREO_SCENE_Z),
                            color: commitment.color().clone(),
                            depth: commitment.depth().clone(),
                            timestamp: Some(session.last_timestamp()),
                        });
                        session.clear_fresh();
                    }
                }
            }
        }
        jobs
    }
}

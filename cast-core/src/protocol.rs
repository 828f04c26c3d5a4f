//! Data-channel command set: typed commands a remote viewer can send.

use crate::pose::{Pose, StereoFrame};

/// Message type for the one-shot stereo/mono decision.
pub const TYPE_STEREO_RENDERING: &str = "stereo-rendering";
/// Message type for a mono look-at camera update.
pub const TYPE_CAMERA_LOOKAT: &str = "camera-transform-lookat";
/// Message type for a per-eye stereo camera update.
pub const TYPE_CAMERA_STEREO: &str = "camera-transform-stereo";
/// Message type for a timestamped stereo prediction update.
pub const TYPE_CAMERA_STEREO_PREDICTION: &str = "camera-transform-stereo-prediction";

/// All commands carried over the data channel. Envelope is JSON
/// `{"type", "body"}`; body grammar is comma-separated numbers (see wire
/// module).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// One-shot stereo/mono decision for the session.
    StereoRendering { stereo: bool },
    /// Mono camera placement: eye, focus, up.
    CameraLookAt { pose: Pose },
    /// Per-eye stereo matrices.
    CameraStereo { frame: StereoFrame },
    /// Per-eye stereo matrices with a prediction timestamp for dedup.
    CameraStereoPrediction { frame: StereoFrame, timestamp: i64 },
}

impl Command {
    /// The wire `type` string for this command.
    pub fn type_str(&self) -> &'static str {
        match self {
            Command::StereoRendering { .. } => TYPE_STEREO_RENDERING,
            Command::CameraLookAt { .. } => TYPE_CAMERA_LOOKAT,
            Command::CameraStereo { .. } => TYPE_CAMERA_STEREO,
            Command::CameraStereoPrediction { .. } => TYPE_CAMERA_STEREO_PREDICTION,
        }
    }
}

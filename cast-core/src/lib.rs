//! CubeCast remote-rendering session core.
//! Host-driven: no I/O; the host feeds the peer roster, the clock, and
//! inbound data-channel text, and receives frame jobs to render and send.

pub mod config;
pub mod core;
pub mod logging;
pub mod pose;
pub mod protocol;
pub mod scheduler;
pub mod session;
pub mod target;
pub mod wire;

pub use crate::config::StreamConfig;
pub use crate::core::{CameraInput, FrameJob, StreamCore};
pub use crate::pose::{Pose, StereoFrame};
pub use crate::protocol::Command;
pub use crate::session::{PeerId, PeerSession, SessionStore, ViewMode};
pub use crate::target::{SurfaceDesc, SurfaceFormat, SurfaceUsage, TargetFactory};
pub use crate::wire::{decode_message, encode_message, WireError};

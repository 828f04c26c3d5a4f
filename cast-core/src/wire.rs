//! Wire codec: JSON `{"type", "body"}` envelope around a comma-separated
//! numeric body. Decoding is atomic: fields accumulate in locals and a
//! command is produced only when every required field parsed.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::pose::{mat4_from_row_major, mat4_to_row_major, Pose, StereoFrame};
use crate::protocol::{
    Command, TYPE_CAMERA_LOOKAT, TYPE_CAMERA_STEREO, TYPE_CAMERA_STEREO_PREDICTION,
    TYPE_STEREO_RENDERING,
};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    body: String,
}

/// Error decoding a data-channel message. Callers drop the message; no
/// session state changes on any of these.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("unknown message type `{0}`")]
    UnknownType(String),
    #[error("body ended before field {index}")]
    MissingField { index: usize },
    #[error("field {index} is not a number: `{value}`")]
    BadNumber { index: usize, value: String },
}

/// Cursor over the comma-separated body. Consumes fields left to right and
/// ignores anything after the last one it is asked for.
struct FieldCursor<'a> {
    fields: std::str::Split<'a, char>,
    index: usize,
}

impl<'a> FieldCursor<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            fields: body.split(','),
            index: 0,
        }
    }

    fn next_raw(&mut self) -> Result<&'a str, WireError> {
        let index = self.index;
        self.index += 1;
        self.fields
            .next()
            .ok_or(WireError::MissingField { index })
    }

    fn next_f32(&mut self) -> Result<f32, WireError> {
        let index = self.index;
        let raw = self.next_raw()?;
        raw.trim().parse().map_err(|_| WireError::BadNumber {
            index,
            value: raw.to_owned(),
        })
    }

    fn next_i64(&mut self) -> Result<i64, WireError> {
        let index = self.index;
        let raw = self.next_raw()?;
        raw.trim().parse().map_err(|_| WireError::BadNumber {
            index,
            value: raw.to_owned(),
        })
    }

    fn next_mat4(&mut self) -> Result<Mat4, WireError> {
        let mut values = [0f32; 16];
        for v in values.iter_mut() {
            *v = self.next_f32()?;
        }
        Ok(mat4_from_row_major(&values))
    }
}

/// Decode one data-channel message into a [`Command`].
pub fn decode_message(raw: &str) -> Result<Command, WireError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    let mut cursor = FieldCursor::new(&envelope.body);
    match envelope.kind.as_str() {
        TYPE_STEREO_RENDERING => {
            let flag = cursor.next_i64()?;
            Ok(Command::StereoRendering { stereo: flag == 1 })
        }
        TYPE_CAMERA_LOOKAT => {
            let eye = glam::Vec3::new(cursor.next_f32()?, cursor.next_f32()?, cursor.next_f32()?);
            let look_at =
                glam::Vec3::new(cursor.next_f32()?, cursor.next_f32()?, cursor.next_f32()?);
            let up = glam::Vec3::new(cursor.next_f32()?, cursor.next_f32()?, cursor.next_f32()?);
            Ok(Command::CameraLookAt {
                pose: Pose { eye, look_at, up },
            })
        }
        TYPE_CAMERA_STEREO => {
            let frame = next_stereo_frame(&mut cursor)?;
            Ok(Command::CameraStereo { frame })
        }
        TYPE_CAMERA_STEREO_PREDICTION => {
            let frame = next_stereo_frame(&mut cursor)?;
            let timestamp = cursor.next_i64()?;
            Ok(Command::CameraStereoPrediction { frame, timestamp })
        }
        other => Err(WireError::UnknownType(other.to_owned())),
    }
}

fn next_stereo_frame(cursor: &mut FieldCursor<'_>) -> Result<StereoFrame, WireError> {
    Ok(StereoFrame {
        projection_left: cursor.next_mat4()?,
        view_left: cursor.next_mat4()?,
        projection_right: cursor.next_mat4()?,
        view_right: cursor.next_mat4()?,
    })
}

/// Encode a [`Command`] into the JSON envelope a server expects. Used by
/// clients and round-trip tests.
pub fn encode_message(command: &Command) -> String {
    let body = match command {
        Command::StereoRendering { stereo } => format!("{},", i32::from(*stereo)),
        Command::CameraLookAt { pose } => join_floats(
            [pose.eye, pose.look_at, pose.up]
                .iter()
                .flat_map(|v| v.to_array()),
        ),
        Command::CameraStereo { frame } => join_floats(frame_floats(frame)),
        Command::CameraStereoPrediction { frame, timestamp } => {
            let mut body = join_floats(frame_floats(frame));
            body.push(',');
            body.push_str(&timestamp.to_string());
            body
        }
    };
    let envelope = Envelope {
        kind: command.type_str().to_owned(),
        body,
    };
    // Two strings in, a flat JSON object out; cannot fail.
    serde_json::to_string(&envelope).unwrap_or_default()
}

fn frame_floats(frame: &StereoFrame) -> impl Iterator<Item = f32> {
    [
        mat4_to_row_major(&frame.projection_left),
        mat4_to_row_major(&frame.view_left),
        mat4_to_row_major(&frame.projection_right),
        mat4_to_row_major(&frame.view_right),
    ]
    .into_iter()
    .flatten()
}

fn join_floats(values: impl Iterator<Item = f32>) -> String {
    values
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::Rng;

    fn random_frame() -> StereoFrame {
        let mut rng = rand::thread_rng();
        let mut mat = || {
            let vals: [f32; 16] = std::array::from_fn(|_| rng.gen_range(-10.0f32..10.0));
            mat4_from_row_major(&vals)
        };
        StereoFrame {
            projection_left: mat(),
            view_left: mat(),
            projection_right: mat(),
            view_right: mat(),
        }
    }

    #[test]
    fn decode_stereo_rendering_flag() {
        let on = decode_message(r#"{"type":"stereo-rendering","body":"1,"}"#).unwrap();
        assert_eq!(on, Command::StereoRendering { stereo: true });
        let off = decode_message(r#"{"type":"stereo-rendering","body":"0,"}"#).unwrap();
        assert_eq!(off, Command::StereoRendering { stereo: false });
    }

    #[test]
    fn decode_lookat_partitions_fields() {
        let raw = r#"{"type":"camera-transform-lookat","body":"1,2,3,4,5,6,7,8,9"}"#;
        let cmd = decode_message(raw).unwrap();
        assert_eq!(
            cmd,
            Command::CameraLookAt {
                pose: Pose {
                    eye: Vec3::new(1.0, 2.0, 3.0),
                    look_at: Vec3::new(4.0, 5.0, 6.0),
                    up: Vec3::new(7.0, 8.0, 9.0),
                }
            }
        );
    }

    #[test]
    fn decode_ignores_trailing_fields() {
        let raw = r#"{"type":"camera-transform-lookat","body":"1,2,3,4,5,6,7,8,9,99,98"}"#;
        assert!(decode_message(raw).is_ok());
    }

    #[test]
    fn short_body_is_missing_field() {
        let raw = r#"{"type":"camera-transform-lookat","body":"1,2,3,4"}"#;
        assert!(matches!(
            decode_message(raw),
            Err(WireError::MissingField { index: 4 })
        ));
    }

    #[test]
    fn bad_number_is_rejected() {
        let raw = r#"{"type":"camera-transform-lookat","body":"1,2,potato,4,5,6,7,8,9"}"#;
        assert!(matches!(
            decode_message(raw),
            Err(WireError::BadNumber { index: 2, .. })
        ));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let raw = r#"{"type":"mouse-event","body":"1,2"}"#;
        assert!(matches!(decode_message(raw), Err(WireError::UnknownType(t)) if t == "mouse-event"));
    }

    #[test]
    fn bad_envelope_is_rejected() {
        assert!(matches!(
            decode_message("not json"),
            Err(WireError::Envelope(_))
        ));
        // Valid JSON but no body key.
        assert!(matches!(
            decode_message(r#"{"type":"stereo-rendering"}"#),
            Err(WireError::Envelope(_))
        ));
    }

    #[test]
    fn lookat_roundtrip() {
        let cmd = Command::CameraLookAt {
            pose: Pose {
                eye: Vec3::new(0.5, -1.25, 3.0),
                look_at: Vec3::new(0.0, 0.0, -2.0),
                up: Vec3::Y,
            },
        };
        assert_eq!(decode_message(&encode_message(&cmd)).unwrap(), cmd);
    }

    #[test]
    fn stereo_roundtrip() -> anyhow::Result<()> {
        let cmd = Command::CameraStereo {
            frame: random_frame(),
        };
        assert_eq!(decode_message(&encode_message(&cmd))?, cmd);
        Ok(())
    }

    #[test]
    fn prediction_roundtrip_keeps_timestamp() -> anyhow::Result<()> {
        let cmd = Command::CameraStereoPrediction {
            frame: random_frame(),
            timestamp: 1_234_567_890_123,
        };
        let raw = encode_message(&cmd);
        // 64 matrix fields plus the trailing timestamp.
        let envelope: serde_json::Value = serde_json::from_str(&raw)?;
        assert_eq!(
            envelope["body"]
                .as_str()
                .expect("body is a string")
                .split(',')
                .count(),
            65
        );
        assert_eq!(decode_message(&raw)?, cmd);
        Ok(())
    }

    #[test]
    fn prediction_missing_timestamp_is_rejected() {
        let frame = random_frame();
        let stereo = encode_message(&Command::CameraStereo { frame });
        // Same 64 floats, but labeled as a prediction: the timestamp field
        // is absent.
        let relabeled = stereo.replace(
            "camera-transform-stereo",
            "camera-transform-stereo-prediction",
        );
        assert!(matches!(
            decode_message(&relabeled),
            Err(WireError::MissingField { index: 64 })
        ));
    }
}

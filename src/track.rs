//! Animation track categories and header decoding.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ActorError, ActorResult};

/// One of the six independent animation channels of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimKind {
    /// Skeletal pose.
    Bck,
    /// Texture-scroll matrices.
    Btk,
    /// Color-register tracks.
    Brk,
    /// Pattern-register (material color) tracks.
    Bpk,
    /// Texture pattern index.
    Btp,
    /// Shape visibility.
    Bva,
}

impl AnimKind {
    pub const ALL: [AnimKind; 6] = [
        AnimKind::Bck,
        AnimKind::Btk,
        AnimKind::Brk,
        AnimKind::Bpk,
        AnimKind::Btp,
        AnimKind::Bva,
    ];

    /// File extension used when looking the track up in an archive.
    pub fn extension(self) -> &'static str {
        match self {
            AnimKind::Bck => "bck",
            AnimKind::Btk => "btk",
            AnimKind::Brk => "brk",
            AnimKind::Bpk => "bpk",
            AnimKind::Btp => "btp",
            AnimKind::Bva => "bva",
        }
    }

    /// Column prefix used by animation keeper tables (`BckName`, ...).
    pub fn column_prefix(self) -> &'static str {
        match self {
            AnimKind::Bck => "Bck",
            AnimKind::Btk => "Btk",
            AnimKind::Brk => "Brk",
            AnimKind::Bpk => "Bpk",
            AnimKind::Btp => "Btp",
            AnimKind::Bva => "Bva",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn file_name(self, animation_name: &str) -> String {
        format!("{animation_name}.{}", self.extension())
    }

    fn chunk_magic(self) -> &'static [u8; 4] {
        match self {
            AnimKind::Bck => b"ANK1",
            AnimKind::Btk => b"TTK1",
            AnimKind::Brk => b"TRK1",
            AnimKind::Bpk => b"PAK1",
            AnimKind::Btp => b"TPT1",
            AnimKind::Bva => b"VAF1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LoopMode {
    #[default]
    Once,
    OnceAndReset,
    Repeat,
    MirroredOnce,
    MirroredRepeat,
}

impl LoopMode {
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(LoopMode::Once),
            1 => Some(LoopMode::OnceAndReset),
            2 => Some(LoopMode::Repeat),
            3 => Some(LoopMode::MirroredOnce),
            4 => Some(LoopMode::MirroredRepeat),
            _ => None,
        }
    }

    /// Maps an unbounded controller frame onto a track of `duration` frames.
    pub fn frame_at(self, frame: f32, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 0.0;
        }
        let frame = frame.max(0.0);
        match self {
            LoopMode::Once => frame.min(duration),
            LoopMode::OnceAndReset => {
                if frame >= duration {
                    0.0
                } else {
                    frame
                }
            }
            LoopMode::Repeat => frame % duration,
            LoopMode::MirroredOnce => {
                if frame >= duration * 2.0 {
                    0.0
                } else if frame >= duration {
                    duration * 2.0 - frame
                } else {
                    frame
                }
            }
            LoopMode::MirroredRepeat => {
                let phase = frame % (duration * 2.0);
                if phase >= duration {
                    duration * 2.0 - phase
                } else {
                    phase
                }
            }
        }
    }
}

/// Decoded track ready to be bound onto a model channel. The keyframe
/// payload stays opaque to the actor core.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimTrack {
    pub kind: AnimKind,
    pub name: String,
    pub loop_mode: LoopMode,
    pub duration: f32,
    pub data: Arc<[u8]>,
}

/// Turns archive bytes into a bindable track.
pub trait TrackDecoder: Send + Sync {
    fn decode(&self, kind: AnimKind, name: &str, data: Arc<[u8]>) -> ActorResult<AnimTrack>;
}

const J3D_HEADER_SIZE: usize = 0x20;

/// Reads the J3D file header and the first chunk's loop mode and duration.
///
/// Layout: `J3D1` + `<ext>1` magic, first chunk at 0x20 whose magic names
/// the track type, loop mode byte at chunk+0x08, big-endian `u16` duration
/// at chunk+0x0A.
#[derive(Debug, Clone, Copy, Default)]
pub struct J3dTrackDecoder;

impl TrackDecoder for J3dTrackDecoder {
    fn decode(&self, kind: AnimKind, name: &str, data: Arc<[u8]>) -> ActorResult<AnimTrack> {
        let fail = |message: String| ActorError::Track {
            name: kind.file_name(name),
            message,
        };

        if data.len() < J3D_HEADER_SIZE + 0x0C {
            return Err(fail(format!("file too small ({} bytes)", data.len())));
        }
        let expected = format!("J3D1{}1", kind.extension());
        if &data[..8] != expected.as_bytes() {
            return Err(fail(format!(
                "bad magic {:?}, expected {expected}",
                String::from_utf8_lossy(&data[..8])
            )));
        }
        let chunk = &data[J3D_HEADER_SIZE..];
        if &chunk[..4] != kind.chunk_magic() {
            return Err(fail(format!(
                "bad chunk {:?}",
                String::from_utf8_lossy(&chunk[..4])
            )));
        }
        let loop_mode = LoopMode::from_raw(chunk[0x08])
            .ok_or_else(|| fail(format!("unknown loop mode {}", chunk[0x08])))?;
        let duration = u16::from_be_bytes([chunk[0x0A], chunk[0x0B]]) as f32;

        Ok(AnimTrack {
            kind,
            name: name.to_string(),
            loop_mode,
            duration,
            data,
        })
    }
}

/// Builds a minimal J3D animation file: header plus the first chunk header.
#[cfg(test)]
pub(crate) fn j3d_track_bytes(kind: AnimKind, loop_mode: u8, duration: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"J3D1");
    data.extend_from_slice(kind.extension().as_bytes());
    data.push(b'1');
    data.resize(J3D_HEADER_SIZE, 0);
    data.extend_from_slice(kind.chunk_magic());
    data.extend_from_slice(&0x20u32.to_be_bytes());
    data.push(loop_mode);
    data.push(0);
    data.extend_from_slice(&duration.to_be_bytes());
    data.resize(J3D_HEADER_SIZE + 0x20, 0);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(kind: AnimKind, bytes: Vec<u8>) -> ActorResult<AnimTrack> {
        J3dTrackDecoder.decode(kind, "Wait", Arc::from(bytes.into_boxed_slice()))
    }

    #[test]
    fn decodes_loop_mode_and_duration() {
        let track = decode(AnimKind::Btk, j3d_track_bytes(AnimKind::Btk, 2, 90)).unwrap();
        assert_eq!(track.kind, AnimKind::Btk);
        assert_eq!(track.loop_mode, LoopMode::Repeat);
        assert_eq!(track.duration, 90.0);
    }

    #[test]
    fn rejects_mismatched_kind() {
        let err = decode(AnimKind::Bck, j3d_track_bytes(AnimKind::Brk, 0, 10)).unwrap_err();
        assert!(matches!(err, ActorError::Track { ref name, .. } if name == "Wait.bck"));
    }

    #[test]
    fn rejects_truncated_file() {
        assert!(decode(AnimKind::Bva, b"J3D1bva1".to_vec()).is_err());
    }

    #[test]
    fn loop_modes_map_frames() {
        assert_eq!(LoopMode::Once.frame_at(15.0, 10.0), 10.0);
        assert_eq!(LoopMode::OnceAndReset.frame_at(15.0, 10.0), 0.0);
        assert_eq!(LoopMode::Repeat.frame_at(15.0, 10.0), 5.0);
        assert_eq!(LoopMode::MirroredOnce.frame_at(15.0, 10.0), 5.0);
        assert_eq!(LoopMode::MirroredOnce.frame_at(25.0, 10.0), 0.0);
        assert_eq!(LoopMode::MirroredRepeat.frame_at(25.0, 10.0), 5.0);
        assert_eq!(LoopMode::Repeat.frame_at(3.0, 0.0), 0.0);
    }
}

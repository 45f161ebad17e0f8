use glam::{Mat4, Vec3};

use crate::camera::{ViewerInput, FPS};
use crate::light::ActorLightInfo;
use crate::track::{AnimKind, AnimTrack};

/// Sink that receives decoded tracks. Binding replaces whatever was bound
/// to the same channel and leaves the other channels untouched.
pub trait AnimationBinder {
    fn bind(&mut self, track: AnimTrack);
}

/// Drives the animation clock of a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationController {
    pub fps: f32,
    /// Offset added to the clock so that identical models do not animate
    /// in lockstep. Actors seed it from their name and placement.
    pub phase_frames: f32,
    time_frames: f32,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self {
            fps: FPS,
            phase_frames: 0.0,
            time_frames: 0.0,
        }
    }
}

impl AnimationController {
    pub fn set_time_from_viewer_input(&mut self, input: &ViewerInput) {
        self.set_time_in_milliseconds(input.time_ms);
    }

    pub fn set_time_in_milliseconds(&mut self, time_ms: f32) {
        self.time_frames = time_ms / 1000.0 * self.fps + self.phase_frames;
    }

    pub fn time_in_frames(&self) -> f32 {
        self.time_frames
    }
}

/// Live model state of an actor: bound tracks, base matrix and the results
/// of the last render-prepare pass.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub name: String,
    pub animation_controller: AnimationController,
    pub model_matrix: Mat4,
    pub base_scale: Vec3,
    pub visible: bool,
    pub light: Option<ActorLightInfo>,
    bound: [Option<AnimTrack>; 6],
    pose: [Option<f32>; 6],
}

impl ModelInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            animation_controller: AnimationController::default(),
            model_matrix: Mat4::IDENTITY,
            base_scale: Vec3::ONE,
            visible: true,
            light: None,
            bound: Default::default(),
            pose: [None; 6],
        }
    }

    pub fn bound_track(&self, kind: AnimKind) -> Option<&AnimTrack> {
        self.bound[kind.index()].as_ref()
    }

    /// Frame resolved for `kind` by the last [`ModelInstance::calc_anim`].
    pub fn current_frame(&self, kind: AnimKind) -> Option<f32> {
        self.pose[kind.index()]
    }

    /// Resolves the current frame of every bound track from the controller
    /// clock.
    pub fn calc_anim(&mut self) {
        let time = self.animation_controller.time_in_frames();
        for kind in AnimKind::ALL {
            self.pose[kind.index()] = self.bound[kind.index()]
                .as_ref()
                .map(|track| track.loop_mode.frame_at(time, track.duration));
        }
    }
}

impl AnimationBinder for ModelInstance {
    fn bind(&mut self, track: AnimTrack) {
        let index = track.kind.index();
        self.pose[index] = None;
        self.bound[index] = Some(track);
    }
}

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::camera::ViewerInput;
use crate::model::ModelInstance;

/// Semantic light slot an actor is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LightType {
    #[default]
    None,
    Player,
    Strong,
    Weak,
    Planet,
}

/// Resolved lighting for one actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorLightInfo {
    pub light_type: LightType,
    pub ambient: Vec4,
    pub color0: Vec4,
    pub color1: Vec4,
}

impl ActorLightInfo {
    /// Writes the light onto the model. `set_ambient` is false for area
    /// lights, whose ambient term comes from the model's own material.
    pub fn set_on_model_instance(&self, model: &mut ModelInstance, set_ambient: bool) {
        let mut info = *self;
        if !set_ambient {
            if let Some(previous) = model.light {
                info.ambient = previous.ambient;
            } else {
                info.ambient = Vec4::ZERO;
            }
        }
        model.light = Some(info);
    }
}

/// Scene-wide light lookup supplied by the host.
pub trait LightDirector {
    /// Light slot the named actor is drawn in; `LightType::None` disables
    /// lighting.
    fn find_light_type(&self, actor_name: &str) -> LightType;

    /// Light info of the default area light for `light_type`.
    fn default_area_light(&self, light_type: LightType) -> Option<ActorLightInfo>;
}

/// Per-actor light controller, used instead of the area light when an actor
/// owns one.
pub trait ActorLightCtrl {
    fn update(&mut self, delta_frames: f32);

    fn load_light(&self, model: &mut ModelInstance, input: &ViewerInput);
}

/// Director handing out one fixed light per type. Types without an entry
/// resolve to no light.
#[derive(Debug, Clone, Default)]
pub struct FixedLightDirector {
    pub light_type: LightType,
    pub lights: Vec<ActorLightInfo>,
}

impl LightDirector for FixedLightDirector {
    fn find_light_type(&self, _actor_name: &str) -> LightType {
        self.light_type
    }

    fn default_area_light(&self, light_type: LightType) -> Option<ActorLightInfo> {
        self.lights
            .iter()
            .find(|light| light.light_type == light_type)
            .copied()
    }
}

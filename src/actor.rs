//! Live actors: transform, lifecycle flags and optional components.
//!
//! The host drives every actor with two passes per displayed frame:
//! [`Actor::movement`] advances simulation state, and
//! [`Actor::calc_view_and_entry`] prepares the model for drawing. The second
//! pass only writes to the model's cached matrices, pose, visibility and
//! light, so it can run at any cadence.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use glam::{Mat4, Vec3};
use log::debug;

use crate::archive::ResourceArchive;
use crate::camera::{Frustum, ViewerInput};
use crate::effect::EffectKeeper;
use crate::error::{ActorError, ActorResult};
use crate::keeper::{AnimKeeper, AnimKeeperCache};
use crate::light::{ActorLightCtrl, LightDirector, LightType};
use crate::model::ModelInstance;
use crate::nerve::{NerveTable, Spine};
use crate::placement::{
    euler_from_matrix, make_mtx_srt, radians, PlacementInfo, ScenarioSwitch, ZoneAndLayer,
};
use crate::rail::RailRider;
use crate::registry::{try_start_all, AnimStarter, AnimationRegistry};
use crate::track::{AnimKind, TrackDecoder};

const NO_NERVE: &str = "actor has no nerve; call init_nerve first";

/// Animation clocks start somewhere in `[0, ANIM_PHASE_RANGE)` frames.
const ANIM_PHASE_RANGE: u64 = 1500;

/// `T * Rz * Ry * Rx` from an actor's translation and rotation (radians).
pub fn make_mtx_tr(translation: Vec3, rotation: Vec3) -> Mat4 {
    make_mtx_srt(Vec3::ONE, rotation, translation)
}

pub struct Actor<N = u32> {
    pub name: String,
    pub zone_and_layer: ZoneAndLayer,

    pub translation: Vec3,
    /// Radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub velocity: Vec3,

    pub visible_alive: bool,
    visible_scenario: bool,
    pub visible_model: bool,
    pub bounding_sphere_radius: Option<f32>,

    spine: Option<Spine<N>>,
    registry: Option<AnimationRegistry>,
    model: Option<ModelInstance>,
    anim_keeper: Option<Arc<AnimKeeper>>,
    light_ctrl: Option<Box<dyn ActorLightCtrl>>,
    effect_keeper: Option<Box<dyn EffectKeeper>>,
    rail_rider: Option<RailRider>,
}

impl<N: fmt::Debug> fmt::Debug for Actor<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("zone_and_layer", &self.zone_and_layer)
            .field("translation", &self.translation)
            .field("velocity", &self.velocity)
            .field("visible_alive", &self.visible_alive)
            .field("visible_scenario", &self.visible_scenario)
            .field("visible_model", &self.visible_model)
            .field("spine", &self.spine)
            .field("has_model", &self.model.is_some())
            .field("has_anim_keeper", &self.anim_keeper.is_some())
            .finish()
    }
}

impl<N: Copy + PartialEq> Actor<N> {
    pub fn new(name: impl Into<String>, zone_and_layer: ZoneAndLayer) -> Self {
        Self {
            name: name.into(),
            zone_and_layer,
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            visible_alive: true,
            visible_scenario: true,
            visible_model: true,
            bounding_sphere_radius: None,
            spine: None,
            registry: None,
            model: None,
            anim_keeper: None,
            light_ctrl: None,
            effect_keeper: None,
            rail_rider: None,
        }
    }

    /// Builds an actor from placement data: model and animations from
    /// `archive`, transform placed through `zone_mtx`, then the placement's
    /// initial action, if any.
    pub fn from_placement(
        info: &PlacementInfo,
        zone_mtx: Mat4,
        archive: Arc<dyn ResourceArchive>,
        decoder: Arc<dyn TrackDecoder>,
        keepers: &AnimKeeperCache,
    ) -> Self {
        let mut actor = Self::new(info.name.clone(), info.zone_and_layer);
        actor.init_model_manager_with_anm(archive, decoder, keepers);
        actor.init_default_pos(info, zone_mtx);
        actor.velocity = info.velocity;
        actor.bounding_sphere_radius = info.radius;
        if let Some(action) = &info.action {
            if !actor.start_action(action) {
                debug!("{}: no animation found for action {action}", actor.name);
            }
        }
        actor
    }

    pub fn make_actor_appeared(&mut self) {
        self.visible_alive = true;
    }

    pub fn make_actor_dead(&mut self) {
        self.visible_alive = false;
    }

    pub fn is_dead(&self) -> bool {
        !self.visible_alive
    }

    pub fn is_visible_scenario(&self) -> bool {
        self.visible_scenario
    }

    pub fn scenario_changed(&mut self, scenario: &dyn ScenarioSwitch) {
        self.visible_scenario = scenario.check_alive_scenario(self.zone_and_layer);
    }

    /// Binds the actor to its object archive, creates the model and picks
    /// up the archive's animation keeper table, if it has one.
    pub fn init_model_manager_with_anm(
        &mut self,
        archive: Arc<dyn ResourceArchive>,
        decoder: Arc<dyn TrackDecoder>,
        keepers: &AnimKeeperCache,
    ) {
        self.model = Some(ModelInstance::new(archive.label()));
        self.anim_keeper = keepers.get_or_create(&*archive);
        self.registry = Some(AnimationRegistry::new(archive, decoder));
        self.calc_base_mtx_init();
    }

    /// Reads translation, rotation (degrees in the data) and scale from
    /// placement, transformed by the zone's placement matrix.
    pub fn init_default_pos(&mut self, info: &PlacementInfo, zone_mtx: Mat4) {
        self.translation = zone_mtx.transform_point3(info.position);
        let local = make_mtx_tr(Vec3::ZERO, radians(info.rotation));
        self.rotation = euler_from_matrix(zone_mtx * local);
        self.scale = info.scale;
        self.calc_base_mtx_init();
    }

    fn calc_base_mtx_init(&mut self) {
        let phase = self.anim_phase();
        if let Some(model) = &mut self.model {
            model.model_matrix = make_mtx_tr(self.translation, self.rotation);
            model.base_scale = self.scale;
            model.animation_controller.phase_frames = phase;
        }
    }

    /// Whole-frame clock offset derived from name and placement, stable
    /// across runs.
    fn anim_phase(&self) -> f32 {
        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        for component in self.translation.to_array() {
            component.to_bits().hash(&mut hasher);
        }
        (hasher.finish() % ANIM_PHASE_RANGE) as f32
    }

    pub fn init_light_ctrl(&mut self, light_ctrl: Box<dyn ActorLightCtrl>) {
        self.light_ctrl = Some(light_ctrl);
    }

    pub fn init_effect_keeper(&mut self, effect_keeper: Box<dyn EffectKeeper>) {
        self.effect_keeper = Some(effect_keeper);
    }

    pub fn init_rail_rider(&mut self, rail_rider: RailRider) {
        self.rail_rider = Some(rail_rider);
    }

    /// Attaches a state machine starting in `nerve`.
    pub fn init_nerve(&mut self, nerve: N) {
        self.spine = Some(Spine::new(nerve));
    }

    pub fn set_nerve(&mut self, nerve: N) -> ActorResult<()> {
        self.spine
            .as_mut()
            .ok_or(ActorError::InvalidState(NO_NERVE))?
            .set_nerve(nerve);
        Ok(())
    }

    pub fn current_nerve(&self) -> ActorResult<N> {
        self.spine
            .as_ref()
            .map(Spine::current_nerve)
            .ok_or(ActorError::InvalidState(NO_NERVE))
    }

    pub fn nerve_step(&self) -> ActorResult<f32> {
        self.spine
            .as_ref()
            .map(Spine::nerve_step)
            .ok_or(ActorError::InvalidState(NO_NERVE))
    }

    pub fn spine(&self) -> Option<&Spine<N>> {
        self.spine.as_ref()
    }

    pub fn model(&self) -> Option<&ModelInstance> {
        self.model.as_ref()
    }

    pub fn anim_keeper(&self) -> Option<&Arc<AnimKeeper>> {
        self.anim_keeper.as_ref()
    }

    pub fn rail_rider(&self) -> Option<&RailRider> {
        self.rail_rider.as_ref()
    }

    pub fn rail_rider_mut(&mut self) -> Option<&mut RailRider> {
        self.rail_rider.as_mut()
    }

    pub fn base_mtx(&self) -> Option<Mat4> {
        self.model.as_ref().map(|model| model.model_matrix)
    }

    /// Plays `action` through the keeper table, falling back to
    /// name-matched files when the actor has no table or the table has no
    /// such action. Returns `true` when something started.
    pub fn start_action(&mut self, action: &str) -> bool {
        if let Some(keeper) = self.anim_keeper.clone() {
            if keeper.start(self, action) {
                return true;
            }
        }
        self.try_start_all_anim(action)
    }

    pub fn try_start_all_anim(&mut self, name: &str) -> bool {
        try_start_all(self, name)
    }

    /// Starts a skeletal animation and tells the effect keeper about it.
    pub fn start_bck(&mut self, name: &str) -> bool {
        let played = self.start_channel(AnimKind::Bck, name);
        if played {
            if let Some(effect_keeper) = &mut self.effect_keeper {
                effect_keeper.change_bck(name);
            }
        }
        played
    }

    fn start_channel(&mut self, kind: AnimKind, name: &str) -> bool {
        match (&self.registry, &mut self.model) {
            (Some(registry), Some(model)) => registry.try_start(model, kind, name),
            _ => false,
        }
    }

    /// Simulation tick. Dead actors are left untouched.
    ///
    /// `delta_frames` must be finite and non-negative.
    pub fn movement(&mut self, delta_frames: f32) {
        if !self.visible_alive {
            return;
        }

        if let Some(spine) = &mut self.spine {
            spine.update(delta_frames);
        }

        self.translation += self.velocity * delta_frames;

        if let Some(effect_keeper) = &mut self.effect_keeper {
            effect_keeper.update_sync_bck_effect();
            effect_keeper.set_visible_scenario(self.visible_alive && self.visible_scenario);
        }

        if let Some(light_ctrl) = &mut self.light_ctrl {
            light_ctrl.update(delta_frames);
        }
    }

    pub fn get_actor_visible(&self, frustum: &Frustum) -> bool {
        if !(self.visible_scenario && self.visible_alive) {
            return false;
        }
        match self.bounding_sphere_radius {
            Some(radius) => frustum.contains_sphere(self.translation, radius),
            None => true,
        }
    }

    /// Render-prepare pass: base matrix, animation pose, visibility and
    /// lighting. Does nothing for actors without a model.
    pub fn calc_view_and_entry(&mut self, input: &ViewerInput, lights: &dyn LightDirector) {
        let visible = self.visible_model && self.get_actor_visible(&input.frustum);
        let Some(model) = &mut self.model else {
            return;
        };

        model.base_scale = self.scale;
        model.model_matrix = make_mtx_tr(self.translation, self.rotation);
        model.animation_controller.set_time_from_viewer_input(input);
        model.calc_anim();

        model.visible = visible;
        if !visible {
            return;
        }

        if let Some(light_ctrl) = &self.light_ctrl {
            light_ctrl.load_light(model, input);
        } else {
            let light_type = lights.find_light_type(&self.name);
            if light_type != LightType::None {
                if let Some(info) = lights.default_area_light(light_type) {
                    info.set_on_model_instance(model, false);
                }
            }
        }
    }
}

impl<N: Copy + Eq + Hash> Actor<N> {
    /// Runs the handler registered for the current nerve. Returns `false`
    /// when the actor has no nerve or the table has no handler for it.
    pub fn execute_nerve(&mut self, table: &NerveTable<N, Actor<N>>) -> bool {
        match self.spine.as_ref().map(Spine::current_nerve) {
            Some(nerve) => table.execute(nerve, self),
            None => false,
        }
    }
}

impl<N: Copy + PartialEq> AnimStarter for Actor<N> {
    fn start_anim(&mut self, kind: AnimKind, name: &str) -> bool {
        match kind {
            AnimKind::Bck => self.start_bck(name),
            _ => self.start_channel(kind, name),
        }
    }
}

//! Frame-driven actor core.
//!
//! The crate models the part of a scene graph that evolves over time
//! independently of rendering: nerve state machines, animation keeper
//! tables, name-matched animation lookup, actor lifecycle and actor pools.
//! Archives, track decoders, cameras and lights are reached through small
//! traits so hosts can plug in their own implementations and the core stays
//! testable without a GPU.

pub mod actor;
pub mod archive;
pub mod camera;
pub mod effect;
pub mod error;
pub mod group;
pub mod keeper;
pub mod light;
pub mod model;
pub mod nerve;
pub mod placement;
pub mod rail;
pub mod registry;
pub mod table;
pub mod track;

pub use actor::{make_mtx_tr, Actor};
pub use archive::{MemoryArchive, PackedArchive, ResourceArchive, SubArchive};
pub use camera::{Frustum, ViewerInput, FPS};
pub use effect::EffectKeeper;
pub use error::{ActorError, ActorResult};
pub use group::{ActorGroup, Liveness};
pub use keeper::{AnimKeeper, AnimKeeperCache};
pub use light::{ActorLightCtrl, ActorLightInfo, FixedLightDirector, LightDirector, LightType};
pub use model::{AnimationBinder, ModelInstance};
pub use nerve::{NerveTable, Spine};
pub use placement::{LayerId, LayerMask, Placement, PlacementInfo, ScenarioSwitch, ZoneAndLayer};
pub use rail::RailRider;
pub use registry::{AnimStarter, AnimationRegistry, FORCE_REPEAT_ANIM_NAME};
pub use table::InfoTable;
pub use track::{AnimKind, AnimTrack, J3dTrackDecoder, LoopMode, TrackDecoder};

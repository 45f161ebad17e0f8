//! Name-matched animation lookup against an actor's archive.

use std::sync::Arc;

use log::{debug, warn};

use crate::archive::ResourceArchive;
use crate::model::AnimationBinder;
use crate::track::{AnimKind, LoopMode, TrackDecoder};

/// Skeletal animations with this name (compared case-insensitively) always
/// loop, whatever loop mode the file was authored with. Idle animations in
/// shipped data rely on it.
pub const FORCE_REPEAT_ANIM_NAME: &str = "wait";

/// Something that can start one animation channel by name.
pub trait AnimStarter {
    /// Returns `true` when a resource for `kind` named `name` was found and
    /// bound.
    fn start_anim(&mut self, kind: AnimKind, name: &str) -> bool;
}

/// Starts `name` on all six channels independently. Returns `true` when any
/// channel found a resource.
pub fn try_start_all<S: AnimStarter + ?Sized>(starter: &mut S, name: &str) -> bool {
    AnimKind::ALL
        .iter()
        .fold(false, |any, kind| starter.start_anim(*kind, name) || any)
}

/// Archive plus decoder that resolves `<name>.<ext>` resources into bound
/// tracks.
#[derive(Clone)]
pub struct AnimationRegistry {
    archive: Arc<dyn ResourceArchive>,
    decoder: Arc<dyn TrackDecoder>,
}

impl std::fmt::Debug for AnimationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationRegistry")
            .field("archive", &self.archive.label())
            .finish()
    }
}

impl AnimationRegistry {
    pub fn new(archive: Arc<dyn ResourceArchive>, decoder: Arc<dyn TrackDecoder>) -> Self {
        Self { archive, decoder }
    }

    pub fn archive(&self) -> &Arc<dyn ResourceArchive> {
        &self.archive
    }

    /// Binds `<name>.<ext>` onto `binder` if the archive has it.
    ///
    /// A missing file returns `false` without touching `binder`. A file that
    /// fails to decode is logged and also counts as a miss.
    pub fn try_start(&self, binder: &mut dyn AnimationBinder, kind: AnimKind, name: &str) -> bool {
        let file_name = kind.file_name(name);
        let Some(data) = self.archive.find_file_data(&file_name) else {
            return false;
        };

        let mut track = match self.decoder.decode(kind, name, data) {
            Ok(track) => track,
            Err(err) => {
                warn!("{}: {err}", self.archive.label());
                return false;
            }
        };
        if kind == AnimKind::Bck && name.eq_ignore_ascii_case(FORCE_REPEAT_ANIM_NAME) {
            track.loop_mode = LoopMode::Repeat;
        }
        debug!("{}: bound {file_name}", self.archive.label());
        binder.bind(track);
        true
    }

    /// Pairs the registry with a binder so it can be driven as an
    /// [`AnimStarter`].
    pub fn starter<'a>(&'a self, binder: &'a mut dyn AnimationBinder) -> BoundStarter<'a> {
        BoundStarter {
            registry: self,
            binder,
        }
    }
}

pub struct BoundStarter<'a> {
    registry: &'a AnimationRegistry,
    binder: &'a mut dyn AnimationBinder,
}

impl AnimStarter for BoundStarter<'_> {
    fn start_anim(&mut self, kind: AnimKind, name: &str) -> bool {
        self.registry.try_start(&mut *self.binder, kind, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use crate::model::ModelInstance;
    use crate::track::{j3d_track_bytes, J3dTrackDecoder};

    fn registry(archive: MemoryArchive) -> AnimationRegistry {
        AnimationRegistry::new(Arc::new(archive), Arc::new(J3dTrackDecoder))
    }

    #[test]
    fn missing_resource_has_no_side_effect() {
        let registry = registry(MemoryArchive::new("Kuribo"));
        let mut model = ModelInstance::new("Kuribo");
        assert!(!registry.try_start(&mut model, AnimKind::Bck, "Run"));
        assert!(model.bound_track(AnimKind::Bck).is_none());
    }

    #[test]
    fn wait_forces_repeat_on_skeletal_channel() {
        let archive = MemoryArchive::new("Kuribo")
            .with_file("Wait.bck", j3d_track_bytes(AnimKind::Bck, 0, 40))
            .with_file("wait.bck", j3d_track_bytes(AnimKind::Bck, 1, 40))
            .with_file("Wait.btk", j3d_track_bytes(AnimKind::Btk, 0, 40));
        let registry = registry(archive);
        let mut model = ModelInstance::new("Kuribo");

        for name in ["Wait", "wait"] {
            assert!(registry.try_start(&mut model, AnimKind::Bck, name));
            let track = model.bound_track(AnimKind::Bck).unwrap();
            assert_eq!(track.loop_mode, LoopMode::Repeat);
        }

        assert!(registry.try_start(&mut model, AnimKind::Btk, "Wait"));
        assert_eq!(
            model.bound_track(AnimKind::Btk).unwrap().loop_mode,
            LoopMode::Once
        );
    }

    #[test]
    fn other_skeletal_names_keep_authored_loop_mode() {
        let archive =
            MemoryArchive::new("Kuribo").with_file("Waiting.bck", j3d_track_bytes(AnimKind::Bck, 0, 5));
        let registry = registry(archive);
        let mut model = ModelInstance::new("Kuribo");
        assert!(registry.try_start(&mut model, AnimKind::Bck, "Waiting"));
        assert_eq!(
            model.bound_track(AnimKind::Bck).unwrap().loop_mode,
            LoopMode::Once
        );
    }

    #[test]
    fn undecodable_resource_counts_as_miss() {
        let archive = MemoryArchive::new("Kuribo").with_file("Run.bck", b"garbage".to_vec());
        let registry = registry(archive);
        let mut model = ModelInstance::new("Kuribo");
        assert!(!registry.try_start(&mut model, AnimKind::Bck, "Run"));
        assert!(model.bound_track(AnimKind::Bck).is_none());
    }

    #[test]
    fn try_start_all_reports_any_hit() {
        let archive = MemoryArchive::new("Kuribo")
            .with_file("Run.bva", j3d_track_bytes(AnimKind::Bva, 2, 10));
        let registry = registry(archive);
        let mut model = ModelInstance::new("Kuribo");

        assert!(try_start_all(&mut registry.starter(&mut model), "Run"));
        assert!(model.bound_track(AnimKind::Bva).is_some());
        assert!(!try_start_all(&mut registry.starter(&mut model), "Jump"));
    }

    #[test]
    fn try_start_all_attempts_every_channel() {
        let mut archive = MemoryArchive::new("Kuribo");
        for kind in AnimKind::ALL {
            archive.insert(kind.file_name("Spin"), j3d_track_bytes(kind, 0, 10));
        }
        let registry = registry(archive);
        let mut model = ModelInstance::new("Kuribo");

        assert!(try_start_all(&mut registry.starter(&mut model), "Spin"));
        for kind in AnimKind::ALL {
            assert!(model.bound_track(kind).is_some(), "{kind:?} not bound");
        }
    }
}

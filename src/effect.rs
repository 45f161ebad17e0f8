/// Particle-effect bookkeeping attached to an actor. Effects themselves are
/// emitted by the host's effect system.
pub trait EffectKeeper {
    /// Skeletal animation `name` just started; effects synced to it restart.
    fn change_bck(&mut self, name: &str);

    /// Advances effects keyed to skeletal animation frames.
    fn update_sync_bck_effect(&mut self);

    fn set_visible_scenario(&mut self, visible: bool);
}

/// Keeper that only records what it was told. Useful when a host has no
/// effect system but still wants to observe the calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingEffectKeeper {
    pub current_bck: Option<String>,
    pub sync_updates: u32,
    pub visible: bool,
}

impl EffectKeeper for RecordingEffectKeeper {
    fn change_bck(&mut self, name: &str) {
        self.current_bck = Some(name.to_string());
    }

    fn update_sync_bck_effect(&mut self) {
        self.sync_updates += 1;
    }

    fn set_visible_scenario(&mut self, visible: bool) {
        self.visible = visible;
    }
}

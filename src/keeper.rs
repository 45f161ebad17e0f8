//! Per-actor-class animation keeper tables.
//!
//! A keeper maps an action name (`"Run"`, `"Wait"`, ...) to the animation
//! each of the six channels should play for it. Tables are parsed once and
//! shared read-only between every actor of a class through
//! [`AnimKeeperCache`].

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;

use crate::archive::ResourceArchive;
use crate::error::{ActorError, ActorResult};
use crate::registry::AnimStarter;
use crate::table::{InfoIter, InfoTable};
use crate::track::AnimKind;

/// Table location used by the first game's archives.
pub const ANIM_CTRL_TABLE: &str = "ActorAnimCtrl.bcsv";
/// Table location used by the second game, which moved it to a subfolder.
pub const ANIM_CTRL_TABLE_IN_INFO_DIR: &str = "ActorInfo/ActorAnimCtrl.bcsv";

const ACTION_NAME_COLUMN: &str = "ActorAnimName";

/// Channel override for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimDataInfo {
    /// Animation to play; empty means "use the action name".
    pub name: String,
    /// `-1` when unspecified.
    pub start_frame: i32,
    pub is_keep_anim: bool,
}

impl AnimDataInfo {
    fn read(iter: &InfoIter<'_>, kind: AnimKind) -> Self {
        let prefix = kind.column_prefix();
        let name = iter
            .value_string(&format!("{prefix}Name"))
            .unwrap_or_default()
            .to_string();
        let start_frame = iter
            .value_number(&format!("{prefix}StartFrame"))
            .map(|value| value as i32)
            .unwrap_or(-1);
        let is_keep_anim = iter
            .value_number(&format!("{prefix}IsKeepAnim"))
            .map(|value| value as i32 != -1)
            .unwrap_or(false);
        Self {
            name,
            start_frame,
            is_keep_anim,
        }
    }
}

/// One table row: an action and its six channel overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimKeeperInfo {
    /// Lower-cased at parse time.
    pub action_name: String,
    channels: [AnimDataInfo; 6],
}

impl AnimKeeperInfo {
    fn read(iter: &InfoIter<'_>) -> ActorResult<Self> {
        let action_name = iter
            .value_string(ACTION_NAME_COLUMN)
            .ok_or_else(|| ActorError::MissingField {
                column: ACTION_NAME_COLUMN.to_string(),
                record: iter.record(),
            })?
            .to_lowercase();
        let channels = AnimKind::ALL.map(|kind| AnimDataInfo::read(iter, kind));
        Ok(Self {
            action_name,
            channels,
        })
    }

    pub fn data(&self, kind: AnimKind) -> &AnimDataInfo {
        &self.channels[kind.index()]
    }

    /// Animation name `kind` plays for this action.
    pub fn anim_name(&self, kind: AnimKind) -> &str {
        let data = self.data(kind);
        if data.name.is_empty() {
            &self.action_name
        } else {
            &data.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimKeeper {
    infos: Vec<AnimKeeperInfo>,
}

impl AnimKeeper {
    /// Reads every record. Any record without an action name aborts the
    /// whole table.
    pub fn build(mut iter: InfoIter<'_>) -> ActorResult<Self> {
        let mut infos = Vec::with_capacity(iter.num_records());
        for record in 0..iter.num_records() {
            iter.set_record(record);
            infos.push(AnimKeeperInfo::read(&iter)?);
        }
        Ok(Self { infos })
    }

    pub fn from_bytes(data: &[u8]) -> ActorResult<Self> {
        let table = InfoTable::from_bytes(data)?;
        Self::build(table.iter())
    }

    /// Locates the keeper table in `archive`. Archives without a table, or
    /// with one that does not parse, yield `None`.
    pub fn try_create(archive: &dyn ResourceArchive) -> Option<Self> {
        let data = find_table(archive)?;
        match Self::from_bytes(&data) {
            Ok(keeper) => Some(keeper),
            Err(err) => {
                warn!("{}: ignoring animation keeper table: {err}", archive.label());
                None
            }
        }
    }

    pub fn infos(&self) -> &[AnimKeeperInfo] {
        &self.infos
    }

    /// First row whose action matches `action` case-insensitively.
    pub fn find(&self, action: &str) -> Option<&AnimKeeperInfo> {
        let action = action.to_lowercase();
        self.infos.iter().find(|info| info.action_name == action)
    }

    /// Starts every channel listed for `action`. Returns `false` when the
    /// table has no such action; individual channel misses are ignored.
    pub fn start<S: AnimStarter + ?Sized>(&self, starter: &mut S, action: &str) -> bool {
        let Some(info) = self.find(action) else {
            return false;
        };
        for kind in AnimKind::ALL {
            starter.start_anim(kind, info.anim_name(kind));
        }
        true
    }
}

fn find_table(archive: &dyn ResourceArchive) -> Option<Arc<[u8]>> {
    archive
        .find_file_data(ANIM_CTRL_TABLE)
        .or_else(|| archive.find_file_data(ANIM_CTRL_TABLE_IN_INFO_DIR))
}

/// Keeper tables keyed by their content, so every actor sharing a table
/// shares one parsed copy. Clones share the same storage.
#[derive(Debug, Default, Clone)]
pub struct AnimKeeperCache {
    keepers: Arc<RwLock<HashMap<Arc<[u8]>, Option<Arc<AnimKeeper>>>>>,
}

impl AnimKeeperCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the keeper for `archive`'s table, parsing it on first use.
    /// Tables that fail to parse are remembered as absent.
    pub fn get_or_create(&self, archive: &dyn ResourceArchive) -> Option<Arc<AnimKeeper>> {
        let data = find_table(archive)?;
        if let Some(cached) = self.keepers.read().get(&data) {
            debug!("{}: animation keeper cache hit", archive.label());
            return cached.clone();
        }

        let keeper = match AnimKeeper::from_bytes(&data) {
            Ok(keeper) => Some(Arc::new(keeper)),
            Err(err) => {
                warn!("{}: ignoring animation keeper table: {err}", archive.label());
                None
            }
        };
        self.keepers
            .write()
            .entry(data)
            .or_insert(keeper)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.keepers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keepers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;

    #[derive(Default)]
    struct Recorder {
        started: Vec<(AnimKind, String)>,
        available: Vec<(AnimKind, String)>,
    }

    impl AnimStarter for Recorder {
        fn start_anim(&mut self, kind: AnimKind, name: &str) -> bool {
            self.started.push((kind, name.to_string()));
            self.available
                .iter()
                .any(|(k, n)| *k == kind && n == name)
        }
    }

    fn keeper(text: &str) -> AnimKeeper {
        AnimKeeper::build(InfoTable::parse(text).unwrap().iter()).unwrap()
    }

    #[test]
    fn empty_override_falls_back_to_action_name() {
        let keeper = keeper("ActorAnimName,BckName,BckStartFrame\nRun,,-1\n");
        let mut recorder = Recorder {
            available: vec![(AnimKind::Bck, "run".to_string())],
            ..Recorder::default()
        };

        assert!(keeper.start(&mut recorder, "run"));
        assert_eq!(recorder.started.len(), 6);
        assert!(recorder
            .started
            .iter()
            .all(|(_, name)| name == "run"));
    }

    #[test]
    fn start_is_case_insensitive() {
        let keeper = keeper("ActorAnimName\tBtkName\nWait\tWaitGlow\n");
        let mut upper = Recorder::default();
        let mut lower = Recorder::default();
        assert!(keeper.start(&mut upper, "Wait"));
        assert!(keeper.start(&mut lower, "wait"));
        assert_eq!(upper.started, lower.started);
        assert!(upper
            .started
            .contains(&(AnimKind::Btk, "WaitGlow".to_string())));
    }

    #[test]
    fn first_matching_row_wins() {
        let keeper = keeper("ActorAnimName,BckName\nJump,JumpA\njump,JumpB\n");
        assert_eq!(keeper.infos().len(), 2);
        assert_eq!(keeper.find("JUMP").unwrap().anim_name(AnimKind::Bck), "JumpA");
    }

    #[test]
    fn unknown_action_starts_nothing() {
        let keeper = keeper("ActorAnimName\nWait\n");
        let mut recorder = Recorder::default();
        assert!(!keeper.start(&mut recorder, "Run"));
        assert!(recorder.started.is_empty());
    }

    #[test]
    fn missing_action_column_aborts_build() {
        let table = InfoTable::parse("BckName\nRun\n").unwrap();
        let err = AnimKeeper::build(table.iter()).unwrap_err();
        assert_eq!(
            err,
            ActorError::MissingField {
                column: "ActorAnimName".to_string(),
                record: 0
            }
        );
    }

    #[test]
    fn row_details_are_parsed() {
        let keeper = keeper(
            "ActorAnimName,BrkName,BrkStartFrame,BrkIsKeepAnim,BvaIsKeepAnim\nHit,Flash,12,0,-1\n",
        );
        let info = keeper.find("hit").unwrap();
        let brk = info.data(AnimKind::Brk);
        assert_eq!(brk.name, "Flash");
        assert_eq!(brk.start_frame, 12);
        assert!(brk.is_keep_anim);
        assert!(!info.data(AnimKind::Bva).is_keep_anim);
        assert_eq!(info.data(AnimKind::Bck).start_frame, -1);
    }

    #[test]
    fn try_create_checks_both_locations() {
        let primary = MemoryArchive::new("a").with_file(ANIM_CTRL_TABLE, b"ActorAnimName\nWait\n".to_vec());
        let nested = MemoryArchive::new("b")
            .with_file(ANIM_CTRL_TABLE_IN_INFO_DIR, b"ActorAnimName\nRun\n".to_vec());
        let none = MemoryArchive::new("c");
        let broken = MemoryArchive::new("d").with_file(ANIM_CTRL_TABLE, b"BckName\nRun\n".to_vec());

        assert!(AnimKeeper::try_create(&primary).unwrap().find("wait").is_some());
        assert!(AnimKeeper::try_create(&nested).unwrap().find("run").is_some());
        assert!(AnimKeeper::try_create(&none).is_none());
        assert!(AnimKeeper::try_create(&broken).is_none());
    }

    #[test]
    fn byte_order_mark_does_not_hide_action_column() {
        let archive = MemoryArchive::new("Kuribo").with_file(
            ANIM_CTRL_TABLE,
            b"\xEF\xBB\xBFActorAnimName,BckName\nRun,RunA\n".to_vec(),
        );
        let keeper = AnimKeeper::try_create(&archive).unwrap();
        assert_eq!(keeper.find("run").unwrap().anim_name(AnimKind::Bck), "RunA");
    }

    #[test]
    fn cache_remembers_broken_tables_as_absent() {
        let archive = MemoryArchive::new("Kuribo").with_file(ANIM_CTRL_TABLE, b"BckName\nRun\n".to_vec());
        let cache = AnimKeeperCache::new();

        assert!(cache.get_or_create(&archive).is_none());
        assert!(cache.get_or_create(&archive).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_shares_parsed_tables() {
        let table = b"ActorAnimName\nWait\n".to_vec();
        let first = MemoryArchive::new("Kuribo").with_file(ANIM_CTRL_TABLE, table.clone());
        let second = MemoryArchive::new("Kuribo2").with_file(ANIM_CTRL_TABLE, table);
        let cache = AnimKeeperCache::new();

        let a = cache.get_or_create(&first).unwrap();
        let b = cache.clone().get_or_create(&second).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert!(cache.get_or_create(&MemoryArchive::new("empty")).is_none());
    }
}

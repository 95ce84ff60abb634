//! Named motion configurations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::service::MotionService;
use super::types::{BlendMode, MotionConfig, MotionParams, MotionType};
use crate::error::CameraError;
use crate::events::{CameraEvent, EventBus};
use crate::persistence::{self, backfill_field, KeyValueStore, Migrate, MOTION_PRESETS_KEY};

/// A saved motion setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionPreset {
    pub name: String,
    pub motion_type: MotionType,
    #[serde(default)]
    pub params: MotionParams,
    #[serde(default)]
    pub blend_mode: BlendMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MotionPreset {
    pub fn new(name: impl Into<String>, motion_type: MotionType, config: MotionConfig) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            motion_type,
            params: config.params.clamped(),
            blend_mode: config.blend_mode,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn config(&self) -> MotionConfig {
        MotionConfig {
            params: self.params,
            blend_mode: self.blend_mode,
        }
    }
}

impl Migrate for MotionPreset {
    fn migrate(item: &mut Value, from_version: u32) {
        if from_version < 2 {
            backfill_field(item, "updated_at", "created_at");
        }
    }
}

/// In-memory motion preset collection, keyed by name
pub struct MotionPresetLibrary {
    presets: Vec<MotionPreset>,
    events: EventBus,
}

impl MotionPresetLibrary {
    pub fn new(events: EventBus) -> Self {
        Self {
            presets: Vec::new(),
            events,
        }
    }

    pub fn list(&self) -> &[MotionPreset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MotionPreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Capture the service's current motion under `name`.
    ///
    /// Saving over an existing name keeps its creation time.
    pub fn save(&mut self, name: &str, motion: &MotionService) -> &MotionPreset {
        let preset = MotionPreset::new(name, motion.motion_type(), motion.config());
        self.insert(preset)
    }

    /// Insert or replace a preset by name
    pub fn insert(&mut self, mut preset: MotionPreset) -> &MotionPreset {
        let name = preset.name.clone();
        let index = match self.presets.iter().position(|p| p.name == name) {
            Some(index) => {
                preset.created_at = self.presets[index].created_at;
                preset.updated_at = Utc::now();
                self.presets[index] = preset;
                index
            }
            None => {
                self.presets.push(preset);
                self.presets.len() - 1
            }
        };
        info!("Saved motion preset '{}'", name);
        self.events.emit(CameraEvent::MotionPresetSaved { name });
        &self.presets[index]
    }

    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.presets.len();
        self.presets.retain(|p| p.name != name);
        let removed = self.presets.len() < before;
        if removed {
            self.events.emit(CameraEvent::MotionPresetDeleted {
                name: name.to_string(),
            });
        }
        removed
    }

    /// Start the preset's motion on `motion`
    pub fn apply(&self, name: &str, motion: &mut MotionService) -> Result<(), CameraError> {
        let preset = self
            .get(name)
            .ok_or_else(|| CameraError::UnknownPreset(name.to_string()))?;
        motion.start(preset.motion_type, Some(preset.config()));
        self.events.emit(CameraEvent::MotionPresetApplied {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Replace the collection with the stored one; failures leave it empty
    pub fn load(&mut self, store: &dyn KeyValueStore) -> usize {
        self.presets = persistence::load_collection(store, MOTION_PRESETS_KEY);
        info!("Loaded {} motion presets", self.presets.len());
        self.presets.len()
    }

    pub fn persist(&self, store: &mut dyn KeyValueStore) -> bool {
        let saved = persistence::save_collection(store, MOTION_PRESETS_KEY, &self.presets);
        if !saved {
            warn!("Motion presets were not persisted");
        }
        saved
    }

    pub fn clear(&mut self) {
        self.presets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionDefaults;
    use crate::motion::MotionParam;
    use crate::persistence::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (MotionPresetLibrary, MotionService, EventBus) {
        let events = EventBus::new();
        (
            MotionPresetLibrary::new(events.clone()),
            MotionService::new(MotionDefaults::default(), events.clone()),
            events,
        )
    }

    #[test]
    fn test_save_apply_delete() {
        let (mut library, mut motion, events) = setup();
        let names = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&names);
        let _sub = events.subscribe_to("preset:", move |event| log.borrow_mut().push(event.name()));

        motion.start(MotionType::Spiral, None);
        motion.set_parameter(MotionParam::SpiralLoops, 5.0);
        library.save("swirl", &motion);
        motion.stop();

        library.apply("swirl", &mut motion).unwrap();
        assert_eq!(motion.motion_type(), MotionType::Spiral);
        assert_eq!(motion.params().spiral_loops, 5.0);
        assert!(motion.is_running());

        assert!(library.delete("swirl"));
        assert_eq!(
            library.apply("swirl", &mut motion),
            Err(CameraError::UnknownPreset("swirl".into()))
        );
        assert_eq!(*names.borrow(), vec!["preset:saved", "preset:applied", "preset:deleted"]);
    }

    #[test]
    fn test_resave_keeps_created_at() {
        let (mut library, motion, _) = setup();
        let created = library.save("a", &motion).created_at;
        let again = library.save("a", &motion);
        assert_eq!(again.created_at, created);
        assert!(again.updated_at >= created);
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_persist_round_trip() {
        let (mut library, motion, events) = setup();
        library.save("one", &motion);
        library.save("two", &motion);
        let mut store = MemoryStore::new();
        assert!(library.persist(&mut store));

        let mut restored = MotionPresetLibrary::new(events);
        assert_eq!(restored.load(&store), 2);
        assert_eq!(restored.list(), library.list());
    }

    #[test]
    fn test_version_one_backfills_updated_at() {
        let json = r#"{
            "version": 1,
            "presets": [{
                "name": "legacy",
                "motion_type": "orbit",
                "created_at": "2024-03-01T12:00:00Z"
            }]
        }"#;
        let mut store = MemoryStore::new();
        store.write(MOTION_PRESETS_KEY, json).unwrap();

        let (mut library, _, _) = setup();
        assert_eq!(library.load(&store), 1);
        let preset = library.get("legacy").unwrap();
        assert_eq!(preset.updated_at, preset.created_at);
        assert_eq!(preset.params, MotionParams::default());
    }

    #[test]
    fn test_storage_failure_degrades_to_empty() {
        let (mut library, motion, _) = setup();
        library.save("kept", &motion);
        assert_eq!(library.load(&MemoryStore::unavailable()), 0);

        let mut broken = MemoryStore::new();
        broken.write(MOTION_PRESETS_KEY, "{not json").unwrap();
        assert_eq!(library.load(&broken), 0);
        assert!(!library.persist(&mut MemoryStore::unavailable()));
    }
}

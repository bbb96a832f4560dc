//! The editable object list of one level.
//!
//! `EditSession` is the only owner of the live list. Viewers never borrow
//! it: they subscribe and get an immutable `Arc<[LevelObject]>` snapshot
//! over a channel every time the session publishes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::model::{Level, LevelObject, SourceLocation, SourceType, Vec3};
use crate::writer::patch::{self, SaveReport};

pub type Snapshot = Arc<[LevelObject]>;

#[derive(Debug)]
pub struct EditSession {
    objects: Vec<LevelObject>,
    /// Directory holding the level's `script.c`, when known.
    level_dir: Option<PathBuf>,
    config: EditorConfig,
    subscribers: Vec<Sender<Snapshot>>,
}

impl EditSession {
    pub fn new(objects: Vec<LevelObject>, config: EditorConfig) -> Self {
        Self {
            objects,
            level_dir: None,
            config,
            subscribers: Vec::new(),
        }
    }

    pub fn from_level(level: Level, level_dir: &Path, config: EditorConfig) -> Self {
        Self {
            level_dir: Some(level_dir.to_path_buf()),
            ..Self::new(level.objects, config)
        }
    }

    pub fn objects(&self) -> &[LevelObject] {
        &self.objects
    }

    pub fn get(&self, index: usize) -> Option<&LevelObject> {
        self.objects.get(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot {
        self.objects.iter().cloned().collect()
    }

    /// A receiver that immediately holds the current snapshot and gets a new
    /// one on every `publish`.
    pub fn subscribe(&mut self) -> Receiver<Snapshot> {
        let (tx, rx) = mpsc::channel();
        if tx.send(self.snapshot()).is_ok() {
            self.subscribers.push(tx);
        }
        rx
    }

    /// Hands the current list to every subscriber, forgetting the ones
    /// that went away.
    pub fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.subscribers.retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
        tracing::trace!(subscribers = self.subscribers.len(), "snapshot published");
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut LevelObject> {
        let len = self.objects.len();
        self.objects
            .get_mut(index)
            .ok_or(EditorError::IndexOutOfRange { index, len })
    }

    pub fn replace(&mut self, index: usize, obj: LevelObject) -> Result<()> {
        *self.get_mut(index)? = obj;
        Ok(())
    }

    pub fn append(&mut self, obj: LevelObject) -> usize {
        self.objects.push(obj);
        self.objects.len() - 1
    }

    /// Flags an object for removal; its text goes away on the next save.
    pub fn mark_deleted(&mut self, index: usize) -> Result<()> {
        self.get_mut(index)?.is_deleted = true;
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<()> {
        self.mark_deleted(index)
    }

    /// Adds `obj` as a new object, choosing its target file when it has none.
    pub fn create(&mut self, mut obj: LevelObject) -> Result<usize> {
        if obj.file().is_none() {
            let file = self.target_file(obj.source_type, obj.area_index).ok_or_else(|| EditorError::NoTargetFile {
                kind: obj.source_type,
                model: obj.model_name.clone(),
            })?;
            obj.source = Some(SourceLocation::unsaved(file));
        } else if let Some(loc) = obj.source.as_mut() {
            loc.offset = 0;
            loc.length = 0;
        }
        obj.is_new = true;
        obj.is_deleted = false;
        tracing::debug!(kind = ?obj.source_type, model = %obj.model_name, "object created");
        Ok(self.append(obj))
    }

    pub fn move_to(&mut self, index: usize, position: Vec3) -> Result<()> {
        self.get_mut(index)?.position = position;
        Ok(())
    }

    pub fn rotate(&mut self, index: usize, rotation: Vec3) -> Result<()> {
        self.get_mut(index)?.rotation = rotation;
        Ok(())
    }

    /// Macro and special objects are written through their preset, so a new
    /// model only shows up in the file for objects without one.
    pub fn set_model(&mut self, index: usize, model: impl Into<String>) -> Result<()> {
        self.get_mut(index)?.model_name = model.into();
        Ok(())
    }

    /// Sets the behavior and returns the index of the object carrying it.
    ///
    /// Macro and special objects take their behavior from a preset, so they
    /// are replaced: the original is deleted and a normal object with the
    /// same placement is created in the level script.
    pub fn set_behavior(&mut self, index: usize, behavior: impl Into<String>) -> Result<usize> {
        let behavior = behavior.into();
        let obj = self.get_mut(index)?;
        if obj.behavior == behavior {
            return Ok(index);
        }
        if !matches!(obj.source_type, SourceType::Macro | SourceType::Special) {
            obj.behavior = behavior;
            return Ok(index);
        }

        let old = obj.clone();
        let script = self
            .target_file(SourceType::Normal, old.area_index)
            .ok_or_else(|| EditorError::NoTargetFile {
                kind: SourceType::Normal,
                model: old.model_name.clone(),
            })?;
        let converted = LevelObject {
            position: old.position,
            rotation: old.rotation,
            params: old.params,
            area_index: old.area_index,
            ..LevelObject::new_unsaved(SourceType::Normal, old.model_name.clone(), behavior, script)
        };
        self.objects[index].is_deleted = true;
        tracing::info!(from = ?old.source_type, model = %old.model_name, "converted to a normal object");
        Ok(self.append(converted))
    }

    /// Writes all pending changes, then drops the objects whose text is gone
    /// and publishes the result.
    pub fn save(&mut self) -> SaveReport {
        let report = patch::save(&mut self.objects, &self.config);
        self.objects.retain(|o| !(o.is_deleted && !o.is_persisted()));
        self.publish();
        report
    }

    /// File a new object of `kind` in `area` should be written to.
    fn target_file(&self, kind: SourceType, area: i32) -> Option<PathBuf> {
        let same_kind = |o: &&LevelObject| o.source_type == kind && o.file().is_some();
        let sibling = self
            .objects
            .iter()
            .filter(same_kind)
            .find(|o| o.area_index == area)
            .or_else(|| self.objects.iter().find(same_kind))
            .and_then(LevelObject::file);
        if let Some(file) = sibling {
            return Some(file.to_path_buf());
        }

        let level_dir = self.level_dir()?;
        let area = area.max(1);
        Some(match kind {
            SourceType::Normal | SourceType::Mario => level_dir.join(&self.config.script_file),
            SourceType::Macro => self.config.area_file(&level_dir, area, &self.config.macro_file),
            SourceType::Special => self.config.area_file(&level_dir, area, &self.config.collision_file),
        })
    }

    fn level_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.level_dir {
            return Some(dir.clone());
        }
        self.objects
            .iter()
            .filter_map(LevelObject::file)
            .find_map(|file| self.config.script_for(file))
            .and_then(|script| script.parent().map(Path::to_path_buf))
    }
}

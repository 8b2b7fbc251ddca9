//! Storage ports and the sequence lifecycle service.
//!
//! Persistence and diagram lookup are injected as traits so generation can be tested
//! without a database. Hosts implement [`SequenceStore`] and [`DiagramSource`] over their
//! own backends; the in-memory versions here back tests and single-process tools.

use std::sync::{Arc, RwLock};

use hashbrown::HashMap;

use crate::config::EngineConfig;
use crate::diagram::Diagram;
use crate::error::AnimationError;
use crate::ids::{PlayId, SequenceId};
use crate::sequence::{AnimationSequence, CreateSequenceRequest, SequencePatch};

type Result<T> = std::result::Result<T, AnimationError>;

/// Durable home of animation sequences.
///
/// Each call is atomic per sequence id; concurrent writers to one id are last-write-wins.
pub trait SequenceStore: Send + Sync {
    fn insert(&self, sequence: AnimationSequence) -> Result<()>;
    fn get(&self, id: SequenceId) -> Result<Option<AnimationSequence>>;
    fn list_for_play(&self, play: &PlayId) -> Result<Vec<AnimationSequence>>;
    /// Run `f` on the stored sequence under the store's lock and return the result.
    /// Nothing is written when `f` fails.
    fn modify(
        &self,
        id: SequenceId,
        f: &mut dyn FnMut(&mut AnimationSequence) -> Result<()>,
    ) -> Result<AnimationSequence>;
    fn remove(&self, id: SequenceId) -> Result<Option<AnimationSequence>>;

    fn default_for_play(&self, play: &PlayId) -> Result<Option<AnimationSequence>> {
        Ok(self.list_for_play(play)?.into_iter().find(|s| s.is_default))
    }

    /// Insert `sequence` and settle its play's default flag.
    ///
    /// `Some(true)` takes the flag from any sibling, `Some(false)` leaves it alone and
    /// `None` takes it only when the play has no default. Backends that can should do
    /// this under one lock; the provided version is not atomic.
    fn insert_resolving_default(
        &self,
        mut sequence: AnimationSequence,
        make_default: Option<bool>,
    ) -> Result<AnimationSequence> {
        let siblings = self.list_for_play(&sequence.play_id)?;
        sequence.is_default =
            make_default.unwrap_or_else(|| !siblings.iter().any(|s| s.is_default));
        if sequence.is_default {
            for s in siblings.iter().filter(|s| s.is_default) {
                self.modify(s.id, &mut |s| {
                    s.is_default = false;
                    Ok(())
                })?;
            }
        }
        self.insert(sequence.clone())?;
        Ok(sequence)
    }

    /// Flag `id` as the default of its play and clear every sibling.
    fn mark_default(&self, id: SequenceId) -> Result<AnimationSequence> {
        let seq = self
            .get(id)?
            .ok_or_else(|| AnimationError::SequenceNotFound { id: id.to_string() })?;
        for s in self.list_for_play(&seq.play_id)? {
            if s.is_default && s.id != id {
                self.modify(s.id, &mut |s| {
                    s.is_default = false;
                    Ok(())
                })?;
            }
        }
        self.modify(id, &mut |s| {
            s.is_default = true;
            Ok(())
        })
    }
}

/// Supplies the diagram owned by a play.
pub trait DiagramSource: Send + Sync {
    fn diagram(&self, play: &PlayId) -> Result<Option<Diagram>>;
}

impl<T: SequenceStore + ?Sized> SequenceStore for Arc<T> {
    fn insert(&self, sequence: AnimationSequence) -> Result<()> {
        (**self).insert(sequence)
    }
    fn get(&self, id: SequenceId) -> Result<Option<AnimationSequence>> {
        (**self).get(id)
    }
    fn list_for_play(&self, play: &PlayId) -> Result<Vec<AnimationSequence>> {
        (**self).list_for_play(play)
    }
    fn modify(
        &self,
        id: SequenceId,
        f: &mut dyn FnMut(&mut AnimationSequence) -> Result<()>,
    ) -> Result<AnimationSequence> {
        (**self).modify(id, f)
    }
    fn remove(&self, id: SequenceId) -> Result<Option<AnimationSequence>> {
        (**self).remove(id)
    }
    fn default_for_play(&self, play: &PlayId) -> Result<Option<AnimationSequence>> {
        (**self).default_for_play(play)
    }
    fn insert_resolving_default(
        &self,
        sequence: AnimationSequence,
        make_default: Option<bool>,
    ) -> Result<AnimationSequence> {
        (**self).insert_resolving_default(sequence, make_default)
    }
    fn mark_default(&self, id: SequenceId) -> Result<AnimationSequence> {
        (**self).mark_default(id)
    }
}

impl<T: DiagramSource + ?Sized> DiagramSource for Arc<T> {
    fn diagram(&self, play: &PlayId) -> Result<Option<Diagram>> {
        (**self).diagram(play)
    }
}

fn poisoned() -> AnimationError {
    AnimationError::Storage {
        reason: "store lock poisoned".into(),
    }
}

/// Sequences kept in insertion order behind a lock.
#[derive(Debug, Default)]
pub struct MemorySequenceStore {
    items: RwLock<Vec<AnimationSequence>>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SequenceStore for MemorySequenceStore {
    fn insert(&self, sequence: AnimationSequence) -> Result<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        if let Some(slot) = items.iter_mut().find(|s| s.id == sequence.id) {
            *slot = sequence;
        } else {
            items.push(sequence);
        }
        Ok(())
    }

    fn get(&self, id: SequenceId) -> Result<Option<AnimationSequence>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.iter().find(|s| s.id == id).cloned())
    }

    fn list_for_play(&self, play: &PlayId) -> Result<Vec<AnimationSequence>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.iter().filter(|s| &s.play_id == play).cloned().collect())
    }

    fn modify(
        &self,
        id: SequenceId,
        f: &mut dyn FnMut(&mut AnimationSequence) -> Result<()>,
    ) -> Result<AnimationSequence> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let slot = items
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AnimationError::SequenceNotFound { id: id.to_string() })?;
        let mut draft = slot.clone();
        f(&mut draft)?;
        *slot = draft.clone();
        Ok(draft)
    }

    fn remove(&self, id: SequenceId) -> Result<Option<AnimationSequence>> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let pos = items.iter().position(|s| s.id == id);
        Ok(pos.map(|i| items.remove(i)))
    }

    fn insert_resolving_default(
        &self,
        mut sequence: AnimationSequence,
        make_default: Option<bool>,
    ) -> Result<AnimationSequence> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let play = sequence.play_id.clone();
        let has_default = items.iter().any(|s| s.play_id == play && s.is_default);
        sequence.is_default = make_default.unwrap_or(!has_default);
        if sequence.is_default {
            for s in items.iter_mut().filter(|s| s.play_id == play) {
                s.is_default = false;
            }
        }
        match items.iter_mut().find(|s| s.id == sequence.id) {
            Some(slot) => *slot = sequence.clone(),
            None => items.push(sequence.clone()),
        }
        Ok(sequence)
    }

    fn mark_default(&self, id: SequenceId) -> Result<AnimationSequence> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let play = items
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.play_id.clone())
            .ok_or_else(|| AnimationError::SequenceNotFound { id: id.to_string() })?;
        let mut marked = None;
        for s in items.iter_mut().filter(|s| s.play_id == play) {
            s.is_default = s.id == id;
            if s.is_default {
                marked = Some(s.clone());
            }
        }
        marked.ok_or_else(|| AnimationError::SequenceNotFound { id: id.to_string() })
    }
}

#[derive(Debug, Default)]
pub struct MemoryDiagramSource {
    diagrams: RwLock<HashMap<PlayId, Diagram>>,
}

impl MemoryDiagramSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, play: impl Into<PlayId>, diagram: Diagram) -> Result<()> {
        let mut map = self.diagrams.write().map_err(|_| poisoned())?;
        map.insert(play.into(), diagram);
        Ok(())
    }

    pub fn with(self, play: impl Into<PlayId>, diagram: Diagram) -> Self {
        if let Ok(mut map) = self.diagrams.write() {
            map.insert(play.into(), diagram);
        }
        self
    }
}

impl DiagramSource for MemoryDiagramSource {
    fn diagram(&self, play: &PlayId) -> Result<Option<Diagram>> {
        let map = self.diagrams.read().map_err(|_| poisoned())?;
        Ok(map.get(play).cloned())
    }
}

/// Create/read/update/delete of sequences over injected storage.
#[derive(Debug)]
pub struct SequenceLibrary<S, D> {
    store: S,
    diagrams: D,
    cfg: EngineConfig,
}

impl<S: SequenceStore, D: DiagramSource> SequenceLibrary<S, D> {
    /// Fails when `cfg` does not validate.
    pub fn new(store: S, diagrams: D, cfg: EngineConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            store,
            diagrams,
            cfg,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn diagram_for(&self, play: &PlayId) -> Result<Diagram> {
        self.diagrams
            .diagram(play)?
            .ok_or_else(|| AnimationError::PlayNotFound {
                play_id: play.to_string(),
            })
    }

    /// Validate, generate and store a new sequence.
    pub fn create(&self, request: CreateSequenceRequest) -> Result<AnimationSequence> {
        let diagram = self.diagram_for(&request.play_id)?;
        let settings = request.settings.unwrap_or_default();
        let mut sequence = AnimationSequence::generate(
            request.play_id.clone(),
            &diagram,
            request.name,
            request.duration,
            settings,
            &self.cfg,
        )?;
        sequence.description = request.description;
        let sequence = self
            .store
            .insert_resolving_default(sequence, request.is_default)?;
        log::info!(
            "created sequence {} for play {} ({} frames, default={})",
            sequence.id,
            sequence.play_id,
            sequence.frames.len(),
            sequence.is_default
        );
        Ok(sequence)
    }

    /// The requested sequence, or the play's default when `id` is `None`.
    /// Absence is `Ok(None)` so callers can create on demand.
    pub fn read(&self, play: &PlayId, id: Option<SequenceId>) -> Result<Option<AnimationSequence>> {
        match id {
            Some(id) => Ok(self.store.get(id)?.filter(|s| &s.play_id == play)),
            None => self.store.default_for_play(play),
        }
    }

    pub fn list(&self, play: &PlayId) -> Result<Vec<AnimationSequence>> {
        self.store.list_for_play(play)
    }

    /// Replace the patched fields. A new `duration` does not resample frames;
    /// call [`Self::regenerate`] to bring them back in line.
    pub fn update(&self, id: SequenceId, patch: SequencePatch) -> Result<AnimationSequence> {
        patch.validate(&self.cfg)?;
        let cfg = &self.cfg;
        let mut patch = Some(patch);
        let updated = self.store.modify(id, &mut |seq| match patch.take() {
            Some(p) => seq.apply_patch(p, cfg),
            None => Ok(()),
        })?;
        log::info!("updated sequence {id}");
        Ok(updated)
    }

    /// Hard delete.
    pub fn delete(&self, id: SequenceId) -> Result<()> {
        match self.store.remove(id)? {
            Some(seq) => {
                log::info!("deleted sequence {} of play {}", id, seq.play_id);
                Ok(())
            }
            None => Err(AnimationError::SequenceNotFound { id: id.to_string() }),
        }
    }

    /// Flag `id` as its play's default and clear the previous default.
    pub fn set_default(&self, id: SequenceId) -> Result<AnimationSequence> {
        let seq = self.store.mark_default(id)?;
        log::info!("sequence {} is now the default of play {}", id, seq.play_id);
        Ok(seq)
    }

    /// Re-run generation against the play's current diagram at the stored duration and fps.
    pub fn regenerate(&self, id: SequenceId) -> Result<AnimationSequence> {
        let seq = self
            .store
            .get(id)?
            .ok_or_else(|| AnimationError::SequenceNotFound { id: id.to_string() })?;
        let diagram = self.diagram_for(&seq.play_id)?;
        let cfg = &self.cfg;
        self.store.modify(id, &mut |s| s.regenerate(&diagram, cfg))
    }

    /// The play's default sequence, creating one named `name` if none exists.
    pub fn read_or_create_default(
        &self,
        play: &PlayId,
        name: &str,
        duration_ms: f64,
    ) -> Result<AnimationSequence> {
        if let Some(existing) = self.read(play, None)? {
            return Ok(existing);
        }
        let mut request = CreateSequenceRequest::new(play.clone(), name, duration_ms);
        request.is_default = Some(true);
        self.create(request)
    }
}

//! Per-kind migration outcomes.

use rustc_hash::FxHashMap;

use super::entity::EntityKind;

/// Terminal state of a single entity in a migration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Already stored remotely; nothing was done.
    AlreadyRemote,
    /// Moved to remote storage in this pass.
    Moved,
    /// The move was attempted and rejected.
    Failed,
}

/// What happened to every entity of one kind across all projects.
///
/// Purely additive: entities are only ever recorded, never removed.
///
/// # Examples
///
/// ```
/// use i2r_core::{EntityKind, EntityState, KindOutcome};
///
/// let mut outcome = KindOutcome::new(EntityKind::Pipeline);
/// outcome.record("pipe1", EntityState::Moved);
/// outcome.record("pipe2", EntityState::Failed);
/// assert_eq!(outcome.processed, 2);
/// assert_eq!(outcome.failed, vec!["pipe2".to_owned()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindOutcome {
    /// The kind this outcome covers.
    pub kind: EntityKind,
    /// Number of entities that reached a terminal state.
    pub processed: usize,
    /// Display names of moved entities.
    pub moved: Vec<String>,
    /// Display names of entities that were already remote.
    pub already_remote: Vec<String>,
    /// Display names of entities whose move failed.
    pub failed: Vec<String>,
}

impl KindOutcome {
    /// Creates an empty outcome for `kind`.
    #[must_use]
    pub const fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            processed: 0,
            moved: Vec::new(),
            already_remote: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Records one entity's terminal state.
    pub fn record(&mut self, name: impl Into<String>, state: EntityState) {
        self.processed += 1;
        let name = name.into();
        match state {
            EntityState::AlreadyRemote => self.already_remote.push(name),
            EntityState::Moved => self.moved.push(name),
            EntityState::Failed => self.failed.push(name),
        }
    }

    /// Returns `true` if no entity of this kind failed.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcomes for every kind processed in a run.
#[derive(Debug, Default, Clone)]
pub struct MigrationOutcome {
    by_kind: FxHashMap<EntityKind, KindOutcome>,
}

impl MigrationOutcome {
    /// Creates an empty outcome.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutable outcome for `kind`, creating it on first use.
    pub fn kind_mut(&mut self, kind: EntityKind) -> &mut KindOutcome {
        self.by_kind
            .entry(kind)
            .or_insert_with(|| KindOutcome::new(kind))
    }

    /// Returns the outcome for `kind`, if that kind was processed.
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> Option<&KindOutcome> {
        self.by_kind.get(&kind)
    }

    /// Returns processed kinds in run order.
    pub fn iter(&self) -> impl Iterator<Item = &KindOutcome> {
        EntityKind::ALL
            .iter()
            .filter_map(|kind| self.by_kind.get(kind))
    }

    /// Total number of failed entities across all kinds.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.by_kind.values().map(|o| o.failed.len()).sum()
    }
}

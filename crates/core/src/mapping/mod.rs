//! Local-to-remote identifier mapping.
//!
//! One [`IdMapping`] table per reference category, grouped in an
//! [`IdentifierCache`] that lives for a single integration run. Entries are
//! write-once: a local id that has been mapped keeps its remote id for the
//! rest of the run.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference entity categories synchronized with the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Advertiser,
    Brand,
    Channel,
    TargetAudience,
}

impl EntityKind {
    /// Categories in the order dictionaries are synchronized.
    pub const SYNC_ORDER: [EntityKind; 4] = [
        EntityKind::Advertiser,
        EntityKind::Brand,
        EntityKind::Channel,
        EntityKind::TargetAudience,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Advertiser => "advertiser",
            EntityKind::Brand => "brand",
            EntityKind::Channel => "channel",
            EntityKind::TargetAudience => "target_audience",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MappingError {
    /// The local id is already mapped to a different remote id.
    #[error("{kind} {local_id} already mapped to remote {existing}, refusing remote {attempted}")]
    Conflict {
        kind: EntityKind,
        local_id: u64,
        existing: u64,
        attempted: u64,
    },

    /// Several local ids point at the same remote id.
    #[error("remote {kind} {remote_id} is mapped from several local ids: {local_ids:?}")]
    AmbiguousReverse {
        kind: EntityKind,
        remote_id: u64,
        local_ids: Vec<u64>,
    },
}

/// Write-once mapping table for one entity category.
#[derive(Debug, Clone)]
pub struct IdMapping {
    kind: EntityKind,
    entries: HashMap<u64, u64>,
}

impl IdMapping {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn get(&self, local_id: u64) -> Option<u64> {
        self.entries.get(&local_id).copied()
    }

    pub fn contains(&self, local_id: u64) -> bool {
        self.entries.contains_key(&local_id)
    }

    /// Record a mapping. Re-inserting the same pair is a no-op; changing an
    /// existing entry is rejected.
    pub fn insert(&mut self, local_id: u64, remote_id: u64) -> Result<(), MappingError> {
        match self.entries.get(&local_id) {
            Some(&existing) if existing == remote_id => Ok(()),
            Some(&existing) => Err(MappingError::Conflict {
                kind: self.kind,
                local_id,
                existing,
                attempted: remote_id,
            }),
            None => {
                self.entries.insert(local_id, remote_id);
                Ok(())
            }
        }
    }

    /// Find the local id mapped to `remote_id`.
    pub fn local_for(&self, remote_id: u64) -> Result<Option<u64>, MappingError> {
        let mut local_ids: Vec<u64> = self
            .entries
            .iter()
            .filter(|&(_, &remote)| remote == remote_id)
            .map(|(&local, _)| local)
            .collect();

        match local_ids.len() {
            0 => Ok(None),
            1 => Ok(local_ids.pop()),
            _ => {
                local_ids.sort_unstable();
                Err(MappingError::AmbiguousReverse {
                    kind: self.kind,
                    remote_id,
                    local_ids,
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All mapping tables for one integration run.
#[derive(Debug, Clone)]
pub struct IdentifierCache {
    pub advertisers: IdMapping,
    pub brands: IdMapping,
    pub channels: IdMapping,
    pub target_audiences: IdMapping,
}

impl Default for IdentifierCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierCache {
    pub fn new() -> Self {
        Self {
            advertisers: IdMapping::new(EntityKind::Advertiser),
            brands: IdMapping::new(EntityKind::Brand),
            channels: IdMapping::new(EntityKind::Channel),
            target_audiences: IdMapping::new(EntityKind::TargetAudience),
        }
    }

    pub fn table(&self, kind: EntityKind) -> &IdMapping {
        match kind {
            EntityKind::Advertiser => &self.advertisers,
            EntityKind::Brand => &self.brands,
            EntityKind::Channel => &self.channels,
            EntityKind::TargetAudience => &self.target_audiences,
        }
    }

    pub fn table_mut(&mut self, kind: EntityKind) -> &mut IdMapping {
        match kind {
            EntityKind::Advertiser => &mut self.advertisers,
            EntityKind::Brand => &mut self.brands,
            EntityKind::Channel => &mut self.channels,
            EntityKind::TargetAudience => &mut self.target_audiences,
        }
    }

    pub fn remote_id(&self, kind: EntityKind, local_id: u64) -> Option<u64> {
        self.table(kind).get(local_id)
    }

    /// Seed a table from preset pairs (e.g. from configuration).
    pub fn seed(
        &mut self,
        kind: EntityKind,
        pairs: impl IntoIterator<Item = (u64, u64)>,
    ) -> Result<(), MappingError> {
        let table = self.table_mut(kind);
        for (local, remote) in pairs {
            table.insert(local, remote)?;
        }
        Ok(())
    }

    pub fn total_entries(&self) -> usize {
        EntityKind::SYNC_ORDER
            .iter()
            .map(|kind| self.table(*kind).len())
            .sum()
    }
}

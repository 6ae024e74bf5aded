//! Hierarchy reconciliation between the source's two-level tree (space
//! groups containing spaces) and the destination's flat collection list
//! with parent pointers.
//!
//! [`LookupTable::build`] merges groups and spaces into one name-keyed row
//! set with every root ahead of every child. [`reconcile`] then walks the
//! rows once, reusing destination collections that already carry the same
//! name and creating the rest. Because roots come first, a child's parent
//! always has a destination id by the time the child is reached.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::contract::{Collection, HelpCenter, NewCollection, Space, SpaceGroup};
use crate::http::ApiError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The same name is used twice across groups and spaces. Rows are keyed
    /// by name, so the two nodes cannot be told apart.
    #[error("name {name:?} is used by more than one space group or space")]
    DuplicateName { name: String },
    #[error("space {name:?} belongs to unknown space group {parent:?}")]
    UnknownParent { name: String, parent: String },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("collection {name:?} cannot be created: parent {parent:?} has no destination id")]
    UnresolvedParent { name: String, parent: String },
    #[error("failed to create collection {name:?}: {source}")]
    Create {
        name: String,
        #[source]
        source: ApiError,
    },
}

/// One source node on its way to the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupRow {
    pub name: String,
    pub parent_name: Option<String>,
    pub source_id: u64,
    pub source_parent_id: Option<u64>,
    pub destination_id: Option<String>,
    pub destination_parent_id: Option<String>,
}

impl LookupRow {
    pub fn is_root(&self) -> bool {
        self.parent_name.is_none()
    }
}

/// Unresolved rows, roots first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    rows: Vec<LookupRow>,
}

impl LookupTable {
    pub fn build(groups: &[SpaceGroup], spaces: &[Space]) -> Result<Self, LookupError> {
        let mut names: HashSet<&str> = HashSet::new();
        let mut rows = Vec::with_capacity(groups.len() + spaces.len());

        for group in groups {
            if !names.insert(group.name.as_str()) {
                return Err(LookupError::DuplicateName {
                    name: group.name.clone(),
                });
            }
            rows.push(LookupRow {
                name: group.name.clone(),
                parent_name: None,
                source_id: group.id,
                source_parent_id: None,
                destination_id: None,
                destination_parent_id: None,
            });
        }

        let group_names: HashSet<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        let group_name_by_id: HashMap<u64, &str> =
            groups.iter().map(|g| (g.id, g.name.as_str())).collect();

        for space in spaces {
            if !names.insert(space.name.as_str()) {
                return Err(LookupError::DuplicateName {
                    name: space.name.clone(),
                });
            }
            let parent_name = space.space_group_name.clone().or_else(|| {
                space
                    .space_group_id
                    .and_then(|id| group_name_by_id.get(&id).map(|n| n.to_string()))
            });
            if let Some(parent) = &parent_name {
                if !group_names.contains(parent.as_str()) {
                    return Err(LookupError::UnknownParent {
                        name: space.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            rows.push(LookupRow {
                name: space.name.clone(),
                source_parent_id: parent_name.as_ref().and(space.space_group_id),
                parent_name,
                source_id: space.id,
                destination_id: None,
                destination_parent_id: None,
            });
        }

        // Stable: groups keep their order, spaces keep theirs.
        rows.sort_by_key(|row| !row.is_root());
        debug!(rows = rows.len(), "Built collection lookup table");
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[LookupRow] {
        &self.rows
    }

    pub fn get(&self, name: &str) -> Option<&LookupRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRow {
    pub name: String,
    pub parent_name: Option<String>,
    pub source_id: u64,
    pub source_parent_id: Option<u64>,
    pub destination_id: String,
    pub destination_parent_id: Option<String>,
}

/// Lookup table after reconciliation: every row has a destination id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLookup {
    rows: Vec<ResolvedRow>,
    created: usize,
    reused: usize,
}

impl ResolvedLookup {
    pub fn rows(&self) -> &[ResolvedRow] {
        &self.rows
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    pub fn destination_id(&self, name: &str) -> Option<&str> {
        self.get(name).map(|row| row.destination_id.as_str())
    }

    /// Collections created by this run.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Rows matched to a collection that already existed.
    pub fn reused(&self) -> usize {
        self.reused
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resolve every row of `table` against `existing`, creating what is missing.
///
/// Name matching is exact. The first existing collection wins when the
/// destination already holds duplicates.
pub async fn reconcile<H>(
    table: LookupTable,
    existing: &[Collection],
    destination: &H,
) -> Result<ResolvedLookup, ReconcileError>
where
    H: HelpCenter + ?Sized,
{
    let mut existing_by_name: HashMap<&str, &Collection> = HashMap::new();
    for collection in existing {
        match existing_by_name.entry(collection.name.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(collection);
            }
            Entry::Occupied(_) => {
                warn!(name = %collection.name, collection_id = %collection.id, "Destination holds several collections with this name");
            }
        }
    }

    let mut resolved_ids: HashMap<String, String> = HashMap::new();
    let mut rows = Vec::with_capacity(table.len());
    let (mut created, mut reused) = (0usize, 0usize);

    for row in table.rows {
        let destination_parent_id = match &row.parent_name {
            None => None,
            Some(parent) => match resolved_ids.get(parent) {
                Some(id) => Some(id.clone()),
                None => {
                    return Err(ReconcileError::UnresolvedParent {
                        name: row.name.clone(),
                        parent: parent.clone(),
                    })
                }
            },
        };

        let destination_id = match row.destination_id {
            Some(id) => id,
            None => match existing_by_name.get(row.name.as_str()) {
                Some(collection) => {
                    info!(name = %row.name, collection_id = %collection.id, "Reusing existing collection");
                    reused += 1;
                    collection.id.clone()
                }
                None => {
                    let req = NewCollection {
                        name: row.name.clone(),
                        parent_id: destination_parent_id.clone(),
                    };
                    let collection = destination.create_collection(req).await.map_err(|source| {
                        ReconcileError::Create {
                            name: row.name.clone(),
                            source,
                        }
                    })?;
                    created += 1;
                    collection.id
                }
            },
        };

        resolved_ids.insert(row.name.clone(), destination_id.clone());
        rows.push(ResolvedRow {
            name: row.name,
            parent_name: row.parent_name,
            source_id: row.source_id,
            source_parent_id: row.source_parent_id,
            destination_id,
            destination_parent_id,
        });
    }

    info!(rows = rows.len(), created, reused, "Reconciled collection hierarchy");
    Ok(ResolvedLookup {
        rows,
        created,
        reused,
    })
}

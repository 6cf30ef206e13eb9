//! Typed per-grid and per-edge field storage.
//!
//! [`FieldStore`] maps `(FieldOwner, name)` to an owned `Vec<f64>`. It is
//! passed explicitly to every component that reads or writes state; the
//! store itself knows nothing about grid sizes, so callers validate
//! lengths with [`FieldStore::require_sized`].

use std::fmt;

use indexmap::IndexMap;

use crate::error::FieldError;
use crate::id::FieldOwner;

/// Where the values of a field live on its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldLocation {
    /// One entry (times components) per cell.
    Cells,
    /// One entry (times components) per face.
    Faces,
    /// One entry (times components) per incidence pair of an edge.
    Pairs,
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cells => write!(f, "cells"),
            Self::Faces => write!(f, "faces"),
            Self::Pairs => write!(f, "incidence pairs"),
        }
    }
}

/// Fully-qualified name of a stored field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldKey {
    /// Grid or edge the field is attached to.
    pub owner: FieldOwner,
    /// Field name.
    pub name: String,
}

impl FieldKey {
    /// Build a key from an owner and a name.
    pub fn new(owner: impl Into<FieldOwner>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A stored field: location, component count, and values.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldEntry {
    location: FieldLocation,
    components: usize,
    values: Vec<f64>,
}

impl FieldEntry {
    /// Where the values live.
    pub fn location(&self) -> FieldLocation {
        self.location
    }

    /// Number of values per cell/face/pair.
    pub fn components(&self) -> usize {
        self.components
    }

    /// The raw values, `components` consecutive entries per item.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of cells/faces/pairs covered.
    pub fn item_count(&self) -> usize {
        self.values.len() / self.components.max(1)
    }
}

/// Explicit data store for the grid hierarchy.
///
/// Fields are grouped by owner and kept in insertion order, so exporters
/// and debug output see a stable ordering across runs.
#[derive(Clone, Debug, Default)]
pub struct FieldStore {
    owners: IndexMap<FieldOwner, IndexMap<String, FieldEntry>>,
}

impl FieldStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored fields across all owners.
    pub fn len(&self) -> usize {
        self.owners.values().map(IndexMap::len).sum()
    }

    /// Whether the store holds no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace a field, returning the previous values if any.
    ///
    /// `components` of zero is treated as one.
    pub fn insert(
        &mut self,
        owner: impl Into<FieldOwner>,
        name: impl Into<String>,
        location: FieldLocation,
        components: usize,
        values: Vec<f64>,
    ) -> Option<Vec<f64>> {
        let entry = FieldEntry {
            location,
            components: components.max(1),
            values,
        };
        self.owners
            .entry(owner.into())
            .or_default()
            .insert(name.into(), entry)
            .map(|old| old.values)
    }

    /// Insert a scalar cell field.
    pub fn insert_cells(
        &mut self,
        owner: impl Into<FieldOwner>,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Option<Vec<f64>> {
        self.insert(owner, name, FieldLocation::Cells, 1, values)
    }

    /// Insert a face field with `components` values per face.
    pub fn insert_faces(
        &mut self,
        owner: impl Into<FieldOwner>,
        name: impl Into<String>,
        components: usize,
        values: Vec<f64>,
    ) -> Option<Vec<f64>> {
        self.insert(owner, name, FieldLocation::Faces, components, values)
    }

    /// Look up a field entry.
    pub fn entry(&self, owner: impl Into<FieldOwner>, name: &str) -> Option<&FieldEntry> {
        self.owners.get(&owner.into()).and_then(|m| m.get(name))
    }

    /// Read a field's values.
    pub fn get(&self, owner: impl Into<FieldOwner>, name: &str) -> Option<&[f64]> {
        self.entry(owner, name).map(FieldEntry::values)
    }

    /// Mutable access to a field's values. The length cannot change.
    pub fn get_mut(&mut self, owner: impl Into<FieldOwner>, name: &str) -> Option<&mut [f64]> {
        self.owners
            .get_mut(&owner.into())
            .and_then(|m| m.get_mut(name))
            .map(|e| e.values.as_mut_slice())
    }

    /// Whether a field exists.
    pub fn contains(&self, owner: impl Into<FieldOwner>, name: &str) -> bool {
        self.entry(owner, name).is_some()
    }

    /// Remove a field, returning its values.
    pub fn remove(&mut self, owner: impl Into<FieldOwner>, name: &str) -> Option<Vec<f64>> {
        self.owners
            .get_mut(&owner.into())
            .and_then(|m| m.shift_remove(name))
            .map(|e| e.values)
    }

    /// Read a field, failing with [`FieldError::Missing`] if absent.
    pub fn require(&self, owner: impl Into<FieldOwner>, name: &str) -> Result<&[f64], FieldError> {
        let owner = owner.into();
        self.get(owner, name).ok_or_else(|| FieldError::Missing {
            owner,
            name: name.to_string(),
        })
    }

    /// Read a field and check its location and total length.
    pub fn require_sized(
        &self,
        owner: impl Into<FieldOwner>,
        name: &str,
        location: FieldLocation,
        expected_len: usize,
    ) -> Result<&[f64], FieldError> {
        let owner = owner.into();
        let entry = self.entry(owner, name).ok_or_else(|| FieldError::Missing {
            owner,
            name: name.to_string(),
        })?;
        if entry.location != location {
            return Err(FieldError::WrongLocation {
                owner,
                name: name.to_string(),
                expected: location,
            });
        }
        if entry.values.len() != expected_len {
            return Err(FieldError::SizeMismatch {
                owner,
                name: name.to_string(),
                expected: expected_len,
                actual: entry.values.len(),
            });
        }
        Ok(&entry.values)
    }

    /// Iterate over all fields as `(owner, name, entry)`.
    pub fn iter(&self) -> impl Iterator<Item = (FieldOwner, &str, &FieldEntry)> {
        self.owners
            .iter()
            .flat_map(|(owner, m)| m.iter().map(move |(n, e)| (*owner, n.as_str(), e)))
    }

    /// Names of the fields attached to one owner, in insertion order.
    pub fn names_of(&self, owner: impl Into<FieldOwner>) -> Vec<&str> {
        self.owners
            .get(&owner.into())
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

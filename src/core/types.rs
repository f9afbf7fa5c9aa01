//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Social identity group of a person
///
/// Fixed at creation and immutable for the person's lifetime. Venue
/// affinities and the personal affinity matrix are indexed by these groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityGroup {
    QueerWoman,
    NonQueerWoman,
    QueerNonWoman,
}

impl IdentityGroup {
    /// All groups, in canonical index order
    pub const ALL: [IdentityGroup; 3] = [
        IdentityGroup::QueerWoman,
        IdentityGroup::NonQueerWoman,
        IdentityGroup::QueerNonWoman,
    ];

    /// Number of identity groups
    pub const COUNT: usize = 3;

    /// Canonical index of this group (row/column into group-keyed arrays)
    pub fn index(self) -> usize {
        match self {
            IdentityGroup::QueerWoman => 0,
            IdentityGroup::NonQueerWoman => 1,
            IdentityGroup::QueerNonWoman => 2,
        }
    }

    /// Short label used in logs and CSV headers
    pub fn label(self) -> &'static str {
        match self {
            IdentityGroup::QueerWoman => "QW",
            IdentityGroup::NonQueerWoman => "NQW",
            IdentityGroup::QueerNonWoman => "QNW",
        }
    }
}

/// A value per identity group
///
/// The crate's per-group vector type: affinities, population ratios, and
/// visitor counts are all `GroupMap`s. Indexable by `IdentityGroup` directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMap<T>(pub [T; IdentityGroup::COUNT]);

impl<T> GroupMap<T> {
    /// Build a map by evaluating `f` for every group
    pub fn from_fn(mut f: impl FnMut(IdentityGroup) -> T) -> Self {
        Self(IdentityGroup::ALL.map(&mut f))
    }

    /// Iterate `(group, &value)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (IdentityGroup, &T)> {
        IdentityGroup::ALL.iter().copied().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> GroupMap<U> {
        GroupMap(std::array::from_fn(|i| f(&self.0[i])))
    }
}

impl GroupMap<f64> {
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl GroupMap<u32> {
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

impl<T> std::ops::Index<IdentityGroup> for GroupMap<T> {
    type Output = T;
    fn index(&self, g: IdentityGroup) -> &T {
        &self.0[g.index()]
    }
}

impl<T> std::ops::IndexMut<IdentityGroup> for GroupMap<T> {
    fn index_mut(&mut self, g: IdentityGroup) -> &mut T {
        &mut self.0[g.index()]
    }
}

/// Identifier of a venue: its index into the model's venue list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueId(pub usize);

/// Identifier of a person: its index into the model's population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonId(pub u32);

/// Round counter (simulation time unit)
pub type Round = u64;

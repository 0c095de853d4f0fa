// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! In-memory shapes shared by both the PBF and XML readers.

/// An immutable `(key, value)` pair attached to a [Node], [Way] or [Relation].
///
/// Order within the owning feature is the order of appearance in the source.
pub type Tag = (String, String);

/// Metadata shared by [Node], [Way] and [Relation].
///
/// All fields are absent (`None`) when the source does not carry them -
/// this is common for extracts that strip history/authorship data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub version: Option<u32>,
    pub changeset: Option<i64>,
    pub uid: Option<i64>,
    pub user: Option<String>,
    /// `YYYY-MM-DDTHH:MM:SSZ`, always UTC.
    pub timestamp: Option<String>,
}

/// Represents an [OSM node](https://wiki.openstreetmap.org/wiki/Node).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub meta: Metadata,
    pub tags: Vec<Tag>,
}

/// Represents an [OSM way](https://wiki.openstreetmap.org/wiki/Way).
///
/// Node references carry no resolution - they are bare ids into whatever
/// node stream preceded this way.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
    pub meta: Metadata,
    pub tags: Vec<Tag>,
}

/// Type of the feature a [RelationMember] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    Node,
    Way,
    Relation,
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Way => write!(f, "way"),
            Self::Relation => write!(f, "relation"),
        }
    }
}

/// A member of an [OSM relation](https://wiki.openstreetmap.org/wiki/Relation).
#[derive(Debug, Clone, PartialEq)]
pub struct RelationMember {
    pub member_type: FeatureType,
    pub id: i64,
    pub role: String,
}

/// Represents an [OSM relation](https://wiki.openstreetmap.org/wiki/Relation).
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub members: Vec<RelationMember>,
    pub meta: Metadata,
    pub tags: Vec<Tag>,
}

/// Union over all three kinds of features a reader can yield.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

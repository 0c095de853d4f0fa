// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::model::{Node, Relation, Way};

/// Whether a parse loop should continue or stop after a callback returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Continue delivering features.
    Continue,
    /// Stop the stream. [crate::OsmReader::parse] will return `Ok(Control::Abort)`
    /// without a corrupt-data error.
    Abort,
}

/// Callback surface for streaming OSM features out of an [crate::OsmReader].
///
/// Every method has a default no-op implementation returning [Control::Continue],
/// so a consumer only overrides the kinds of feature it cares about - the Rust
/// equivalent of passing a nil callback pointer per feature kind.
pub trait OsmSink {
    fn node(&mut self, node: &Node) -> Control {
        let _ = node;
        Control::Continue
    }

    fn way(&mut self, way: &Way) -> Control {
        let _ = way;
        Control::Continue
    }

    fn relation(&mut self, relation: &Relation) -> Control {
        let _ = relation;
        Control::Continue
    }
}

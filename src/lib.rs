// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Streaming reader for [OpenStreetMap](https://www.openstreetmap.org/) data.
//!
//! Accepts both the verbose XML form (`.osm`, optionally gzip/bzip2
//! compressed) and the compact binary PBF form (`.osm.pbf`), and delivers a
//! uniform stream of nodes, ways and relations to a consumer through an
//! [OsmSink]. The XML path is a thin wrapper over an off-the-shelf event
//! parser; the PBF path is a hand-written Protocol Buffers wire-format
//! decoder - there is no `.proto` file or codegen crate anywhere in this
//! dependency tree.
//!
//! # Example
//!
//! ```no_run
//! use osmstream::{Control, Node, OsmReader, OsmSink, Relation, Way};
//!
//! struct Counter {
//!     nodes: usize,
//! }
//!
//! impl OsmSink for Counter {
//!     fn node(&mut self, _node: &Node) -> Control {
//!         self.nodes += 1;
//!         Control::Continue
//!     }
//! }
//!
//! let mut reader = OsmReader::open("map.osm.pbf").expect("failed to open map.osm.pbf");
//! let mut counter = Counter { nodes: 0 };
//! reader.parse(&mut counter).expect("failed to parse map.osm.pbf");
//! println!("{} nodes", counter.nodes);
//! ```

mod error;
mod format;
mod model;
mod pbf;
mod reader;
mod sink;
mod xml;

pub use error::Error;
pub use format::FileFormat;
pub use model::{Feature, FeatureType, Metadata, Node, Relation, RelationMember, Tag, Way};
pub use reader::OsmReader;
pub use sink::{Control, OsmSink};

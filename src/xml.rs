// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Event-driven reader for [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML).
//!
//! This is the second-class path: an off-the-shelf XML event parser
//! ([quick_xml]) feeds attribute values into the same [crate::model] shapes
//! the PBF decoder reconstructs, so both backends dispatch through the same
//! callback marshaller.

use std::io;
use std::str::from_utf8;

use crate::model::{Feature, FeatureType, Metadata, Node, Relation, RelationMember, Way};

pub use quick_xml::Error;

/// Parser is a trait for objects which can read XML events, to paper over
/// the mismatch between [quick_xml::Reader::read_event] on buffered data
/// and [quick_xml::Reader::read_event_into] on arbitrary [io::BufRead]s.
trait Parser {
    fn read_event(&mut self) -> quick_xml::Result<quick_xml::events::Event<'_>>;
}

struct IoParser<R: io::BufRead> {
    inner: quick_xml::Reader<R>,
    buf: Vec<u8>,
}

impl<R: io::BufRead> IoParser<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: quick_xml::Reader::from_reader(reader),
            buf: Vec::new(),
        }
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    fn read_event(&mut self) -> quick_xml::Result<quick_xml::events::Event<'_>> {
        self.inner.read_event_into(&mut self.buf)
    }
}

struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl Parser for BufParser<'_> {
    fn read_event(&mut self) -> quick_xml::Result<quick_xml::events::Event<'_>> {
        self.0.read_event()
    }
}

/// Streams [Feature]s out of an OSM XML document.
struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

/// Returns an iterator over all features from an OSM XML reader.
pub(crate) fn features_from_io<R: io::BufRead + 'static>(
    reader: R,
) -> Box<dyn Iterator<Item = Result<Feature, Error>>> {
    Box::new(Reader::from_io(reader))
}

impl<P: Parser> Reader<P> {
    fn new(parser: P) -> Self {
        Self { parser, eof: false }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<Feature, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut current: Option<Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => return Some(Err(e)),
            };

            match event {
                quick_xml::events::Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => {
                        if let Some(n) = parse_node(&start) {
                            return Some(Ok(Feature::Node(n)));
                        }
                    }
                    // "way" and "relation" can't be self-closing in valid OSM XML.
                    b"tag" => {
                        if let Some(tags) = feature_tags(&mut current) {
                            if let Some((k, v)) = parse_tag(&start) {
                                tags.push((k, v));
                            }
                        }
                    }
                    b"nd" => {
                        if let Some(nodes) = feature_nodes(&mut current) {
                            if let Some(r) = parse_nd(&start) {
                                nodes.push(r);
                            }
                        }
                    }
                    b"member" => {
                        if let Some(members) = feature_members(&mut current) {
                            if let Some(m) = parse_member(&start) {
                                members.push(m);
                            }
                        }
                    }
                    _ => {}
                },

                quick_xml::events::Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => current = parse_node(&start).map(Feature::Node),
                    b"way" => current = parse_way(&start).map(Feature::Way),
                    b"relation" => current = parse_relation(&start).map(Feature::Relation),
                    _ => {}
                },

                quick_xml::events::Event::End(end) => {
                    if matches!(end.local_name().as_ref(), b"node" | b"way" | b"relation") {
                        if let Some(f) = current.take() {
                            return Some(Ok(f));
                        }
                    }
                }

                quick_xml::events::Event::Eof => self.eof = true,

                _ => {}
            }
        }

        current.map(Ok)
    }
}

impl<'a> Reader<BufParser<'a>> {
    pub fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    pub fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

struct Attrs {
    id: Option<i64>,
    lat: Option<f64>,
    lon: Option<f64>,
    meta: Metadata,
}

fn parse_attrs(start: &quick_xml::events::BytesStart<'_>) -> Attrs {
    let mut a = Attrs {
        id: None,
        lat: None,
        lon: None,
        meta: Metadata::default(),
    };

    for attr in start.attributes().flatten() {
        let Ok(value) = from_utf8(&attr.value) else {
            continue;
        };
        match attr.key.as_ref() {
            b"id" => a.id = value.parse().ok(),
            b"lat" => a.lat = value.parse().ok(),
            b"lon" => a.lon = value.parse().ok(),
            b"version" => a.meta.version = value.parse().ok(),
            b"changeset" => a.meta.changeset = value.parse().ok(),
            b"uid" => a.meta.uid = value.parse().ok(),
            b"user" => a.meta.user = Some(value.to_string()),
            b"timestamp" => a.meta.timestamp = Some(value.to_string()),
            _ => {}
        }
    }

    a
}

fn parse_node(start: &quick_xml::events::BytesStart<'_>) -> Option<Node> {
    let a = parse_attrs(start);
    Some(Node {
        id: a.id?,
        lat: a.lat?,
        lon: a.lon?,
        meta: a.meta,
        tags: Vec::new(),
    })
}

fn parse_way(start: &quick_xml::events::BytesStart<'_>) -> Option<Way> {
    let a = parse_attrs(start);
    Some(Way {
        id: a.id?,
        nodes: Vec::new(),
        meta: a.meta,
        tags: Vec::new(),
    })
}

fn parse_relation(start: &quick_xml::events::BytesStart<'_>) -> Option<Relation> {
    let a = parse_attrs(start);
    Some(Relation {
        id: a.id?,
        members: Vec::new(),
        meta: a.meta,
        tags: Vec::new(),
    })
}

fn parse_tag(start: &quick_xml::events::BytesStart<'_>) -> Option<(String, String)> {
    let mut k = None;
    let mut v = None;
    for attr in start.attributes().flatten() {
        match attr.key.as_ref() {
            b"k" => k = from_utf8(&attr.value).ok().map(str::to_string),
            b"v" => v = from_utf8(&attr.value).ok().map(str::to_string),
            _ => {}
        }
    }
    k.map(|k| (k, v.unwrap_or_default()))
}

fn parse_nd(start: &quick_xml::events::BytesStart<'_>) -> Option<i64> {
    start
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"ref")
        .and_then(|a| from_utf8(&a.value).ok()?.parse().ok())
}

fn parse_member(start: &quick_xml::events::BytesStart<'_>) -> Option<RelationMember> {
    let mut id = None;
    let mut member_type = None;
    let mut role = None;
    for attr in start.attributes().flatten() {
        match attr.key.as_ref() {
            b"ref" => id = from_utf8(&attr.value).ok()?.parse().ok(),
            b"type" => member_type = parse_feature_type(&attr.value),
            b"role" => role = from_utf8(&attr.value).ok().map(str::to_string),
            _ => {}
        }
    }
    Some(RelationMember {
        member_type: member_type?,
        id: id?,
        role: role.unwrap_or_default(),
    })
}

fn parse_feature_type(s: &[u8]) -> Option<FeatureType> {
    match s {
        b"node" => Some(FeatureType::Node),
        b"way" => Some(FeatureType::Way),
        b"relation" => Some(FeatureType::Relation),
        _ => None,
    }
}

fn feature_tags(f: &mut Option<Feature>) -> Option<&mut Vec<(String, String)>> {
    match f {
        Some(Feature::Node(n)) => Some(&mut n.tags),
        Some(Feature::Way(w)) => Some(&mut w.tags),
        Some(Feature::Relation(r)) => Some(&mut r.tags),
        None => None,
    }
}

fn feature_nodes(f: &mut Option<Feature>) -> Option<&mut Vec<i64>> {
    match f {
        Some(Feature::Way(w)) => Some(&mut w.nodes),
        _ => None,
    }
}

fn feature_members(f: &mut Option<Feature>) -> Option<&mut Vec<RelationMember>> {
    match f {
        Some(Feature::Relation(r)) => Some(&mut r.members),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="43.7384" lon="7.4246" version="3" changeset="100" uid="7" user="alice" timestamp="2020-09-13T12:26:40Z">
    <tag k="amenity" v="cafe"/>
  </node>
  <node id="2" lat="43.7390" lon="7.4250"/>
  <way id="10" version="1">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="residential"/>
  </way>
  <relation id="100">
    <member type="way" ref="10" role=""/>
    <member type="node" ref="1" role="stop"/>
    <tag k="type" v="route"/>
  </relation>
</osm>
"#;

    fn collect(r: Reader<BufParser<'_>>) -> (Vec<Node>, Vec<Way>, Vec<Relation>) {
        let mut nodes = Vec::new();
        let mut ways = Vec::new();
        let mut relations = Vec::new();
        for f in r {
            match f.unwrap() {
                Feature::Node(n) => nodes.push(n),
                Feature::Way(w) => ways.push(w),
                Feature::Relation(r) => relations.push(r),
            }
        }
        (nodes, ways, relations)
    }

    #[test]
    fn parses_nodes_ways_relations_from_buffer() {
        let (nodes, ways, relations) = collect(Reader::from_buffer(SIMPLE));

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, 1);
        assert_eq!(nodes[0].lat, 43.7384);
        assert_eq!(nodes[0].lon, 7.4246);
        assert_eq!(nodes[0].tags, vec![("amenity".to_string(), "cafe".to_string())]);
        assert_eq!(nodes[0].meta.version, Some(3));
        assert_eq!(nodes[0].meta.changeset, Some(100));
        assert_eq!(nodes[0].meta.uid, Some(7));
        assert_eq!(nodes[0].meta.user.as_deref(), Some("alice"));
        assert_eq!(nodes[0].meta.timestamp.as_deref(), Some("2020-09-13T12:26:40Z"));
        assert!(nodes[1].meta.version.is_none());

        assert_eq!(ways.len(), 1);
        assert_eq!(ways[0].nodes, vec![1, 2]);
        assert_eq!(ways[0].tags, vec![("highway".to_string(), "residential".to_string())]);

        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].members.len(), 2);
        assert_eq!(relations[0].members[0].member_type, FeatureType::Way);
        assert_eq!(relations[0].members[1].role, "stop");
    }

    #[test]
    fn parses_from_io_identically_to_buffer() {
        let (nodes_io, ways_io, relations_io) =
            collect_io(Reader::from_io(io::BufReader::new(SIMPLE)));
        let (nodes_buf, ways_buf, relations_buf) = collect(Reader::from_buffer(SIMPLE));
        assert_eq!(nodes_io, nodes_buf);
        assert_eq!(ways_io, ways_buf);
        assert_eq!(relations_io, relations_buf);
    }

    fn collect_io<R: io::BufRead>(r: Reader<IoParser<R>>) -> (Vec<Node>, Vec<Way>, Vec<Relation>) {
        let mut nodes = Vec::new();
        let mut ways = Vec::new();
        let mut relations = Vec::new();
        for f in r {
            match f.unwrap() {
                Feature::Node(n) => nodes.push(n),
                Feature::Way(w) => ways.push(w),
                Feature::Relation(r) => relations.push(r),
            }
        }
        (nodes, ways, relations)
    }
}

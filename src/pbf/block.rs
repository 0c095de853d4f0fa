// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Decoding of a single `PrimitiveBlock` (the unit of work inside an
//! `OSMData` blob) into a flat stream of [Feature]s.

use std::rc::Rc;

use super::wire::{parse_sint32_packed, parse_sint64_packed, parse_uint32_packed, Reader, WireType};
use super::Error;
use crate::model::{Feature, FeatureType, Metadata, Node, Relation, RelationMember, Way};

/// Per-block intern pool. Reference-counted because it's shared by every
/// feature reconstructed from the block without any of them owning it
/// outright - the pool itself is dropped once the last feature borrowing
/// from it (during reconstruction) is gone.
pub type StringTable = Rc<Vec<String>>;

/// Resolves a StringTable index. An out-of-range index is corrupt input
/// (spec: "StringTable indices in any decoded field must lie within the
/// current block's table or are treated as corruption"), not a silent default.
fn get_string(table: &[String], idx: u32) -> Result<String, Error> {
    table
        .get(idx as usize)
        .cloned()
        .ok_or(Error::StringTableIndexOutOfRange(idx))
}

/// Converts raw on-wire integer coordinates/timestamps into their decoded
/// units, honouring a block's `granularity`/`lat_offset`/`lon_offset`/
/// `date_granularity` fields rather than hard-coding the common defaults.
#[derive(Clone, Copy)]
struct Scaling {
    granularity: i64,
    lat_offset: i64,
    lon_offset: i64,
    date_granularity: i64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            granularity: 100,
            lat_offset: 0,
            lon_offset: 0,
            date_granularity: 1000,
        }
    }
}

impl Scaling {
    fn lat(&self, raw: i64) -> f64 {
        (self.lat_offset + self.granularity * raw) as f64 * 1e-9
    }

    fn lon(&self, raw: i64) -> f64 {
        (self.lon_offset + self.granularity * raw) as f64 * 1e-9
    }

    /// Converts a delta-accumulated raw timestamp into epoch milliseconds,
    /// then formats it the way the reference decoder's `gmtime`+`sprintf`
    /// pipeline does.
    fn timestamp(&self, raw: i64) -> String {
        let millis = raw * self.date_granularity;
        format_timestamp(millis.div_euclid(1000))
    }
}

/// Formats a Unix timestamp (seconds) as `YYYY-MM-DDTHH:MM:SSZ`, without
/// pulling in a date/time crate for a single conversion.
fn format_timestamp(epoch_secs: i64) -> String {
    let days = epoch_secs.div_euclid(86_400);
    let secs_of_day = epoch_secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    let hour = secs_of_day / 3600;
    let min = (secs_of_day % 3600) / 60;
    let sec = secs_of_day % 60;
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year, month, day, hour, min, sec
    )
}

/// Howard Hinnant's `civil_from_days`: converts a day count since
/// 1970-01-01 into a proleptic-Gregorian `(year, month, day)` triple.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

#[derive(Default, Clone)]
struct Info {
    version: Option<u32>,
    timestamp: Option<i64>,
    changeset: Option<i64>,
    uid: Option<i64>,
    user_sid: Option<u32>,
}

fn parse_info(payload: &[u8]) -> Result<Info, Error> {
    let mut r = Reader::new(payload);
    let mut info = Info::default();
    while let Some((field_id, wire_type)) = r.read_tag()? {
        match (field_id, wire_type) {
            (1, WireType::Varint) => info.version = Some(r.read_uint32()?),
            (2, WireType::Varint) => info.timestamp = Some(r.read_int64()?),
            (3, WireType::Varint) => info.changeset = Some(r.read_int64()?),
            (4, WireType::Varint) => info.uid = Some(r.read_int32()? as i64),
            (5, WireType::Varint) => info.user_sid = Some(r.read_uint32()?),
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(info)
}

fn metadata_from_info(info: &Info, scaling: &Scaling, strings: &[String]) -> Result<Metadata, Error> {
    let user = info
        .user_sid
        .filter(|&sid| sid != 0)
        .map(|sid| get_string(strings, sid))
        .transpose()?;
    Ok(Metadata {
        version: info.version,
        changeset: info.changeset,
        uid: info.uid.filter(|&uid| uid != 0),
        user,
        timestamp: info.timestamp.map(|t| scaling.timestamp(t)),
    })
}

fn collect_tags(keys: &[u32], values: &[u32], strings: &[String]) -> Result<Vec<(String, String)>, Error> {
    if keys.len() != values.len() {
        return Err(Error::ParallelArrayMismatch("Way/Relation keys/values"));
    }
    keys.iter()
        .zip(values.iter())
        .map(|(&k, &v)| Ok((get_string(strings, k)?, get_string(strings, v)?)))
        .collect()
}

fn cumulative(deltas: &[i64]) -> Vec<i64> {
    let mut acc = 0i64;
    deltas
        .iter()
        .map(|&d| {
            acc += d;
            acc
        })
        .collect()
}

/// A decoded `PrimitiveBlock`, ready to yield its features in on-disk order.
pub struct PrimitiveBlock {
    groups: Vec<Group>,
}

struct Group {
    nodes: Vec<Node>,
    ways: Vec<Way>,
    relations: Vec<Relation>,
}

impl PrimitiveBlock {
    pub fn parse(payload: &[u8]) -> Result<Self, Error> {
        let mut r = Reader::new(payload);
        let mut raw_string_table: &[u8] = &[];
        let mut raw_groups: Vec<&[u8]> = Vec::new();
        let mut scaling = Scaling::default();

        while let Some((field_id, wire_type)) = r.read_tag()? {
            match (field_id, wire_type) {
                (1, WireType::LengthDelimited) => raw_string_table = r.read_bytes()?,
                (2, WireType::LengthDelimited) => raw_groups.push(r.read_bytes()?),
                (17, WireType::Varint) => scaling.granularity = r.read_int32()? as i64,
                (18, WireType::Varint) => scaling.date_granularity = r.read_int32()? as i64,
                (19, WireType::Varint) => scaling.lat_offset = r.read_int64()?,
                (20, WireType::Varint) => scaling.lon_offset = r.read_int64()?,
                (_, wt) => r.skip(wt)?,
            }
        }

        let strings: StringTable = Rc::new(parse_string_table(raw_string_table)?);

        let groups = raw_groups
            .into_iter()
            .map(|g| Group::parse(g, scaling, &strings))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self { groups })
    }

    /// Yields every feature in this block, preserving on-disk order:
    /// each group's nodes, then its ways, then its relations, in the
    /// order groups appeared in the `PrimitiveBlock`.
    pub fn into_features(self) -> impl Iterator<Item = Feature> {
        self.groups.into_iter().flat_map(|g| {
            g.nodes
                .into_iter()
                .map(Feature::Node)
                .chain(g.ways.into_iter().map(Feature::Way))
                .chain(g.relations.into_iter().map(Feature::Relation))
        })
    }
}

fn parse_string_table(payload: &[u8]) -> Result<Vec<String>, Error> {
    let mut r = Reader::new(payload);
    let mut strings = Vec::new();
    while let Some((field_id, wire_type)) = r.read_tag()? {
        match (field_id, wire_type) {
            (1, WireType::LengthDelimited) => {
                strings.push(String::from_utf8_lossy(r.read_bytes()?).into_owned())
            }
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(strings)
}

impl Group {
    fn parse(payload: &[u8], scaling: Scaling, strings: &StringTable) -> Result<Self, Error> {
        let mut r = Reader::new(payload);
        let mut nodes = Vec::new();
        let mut ways = Vec::new();
        let mut relations = Vec::new();

        while let Some((field_id, wire_type)) = r.read_tag()? {
            match (field_id, wire_type) {
                // Plain (non-dense) nodes: accepted silently, not surfaced.
                (1, WireType::LengthDelimited) => {
                    r.read_bytes()?;
                }
                (2, WireType::LengthDelimited) => {
                    nodes.extend(parse_dense_nodes(r.read_bytes()?, scaling, strings)?);
                }
                (3, WireType::LengthDelimited) => {
                    ways.push(parse_way(r.read_bytes()?, scaling, strings)?);
                }
                (4, WireType::LengthDelimited) => {
                    relations.push(parse_relation(r.read_bytes()?, scaling, strings)?);
                }
                // ChangeSets: accepted silently, not surfaced.
                (5, WireType::LengthDelimited) => {
                    r.read_bytes()?;
                }
                (_, wt) => r.skip(wt)?,
            }
        }

        Ok(Self {
            nodes,
            ways,
            relations,
        })
    }
}

#[derive(Default)]
struct RawDenseInfo {
    versions: Vec<u32>,
    timestamps: Vec<i32>,
    changesets: Vec<i64>,
    uids: Vec<i32>,
    user_sids: Vec<i32>,
}

fn parse_dense_info(payload: &[u8]) -> Result<RawDenseInfo, Error> {
    let mut r = Reader::new(payload);
    let mut info = RawDenseInfo::default();
    while let Some((field_id, wire_type)) = r.read_tag()? {
        match (field_id, wire_type) {
            (1, WireType::LengthDelimited) => info.versions = parse_uint32_packed(r.read_bytes()?)?,
            (2, WireType::LengthDelimited) => info.timestamps = parse_sint32_packed(r.read_bytes()?)?,
            (3, WireType::LengthDelimited) => info.changesets = parse_sint64_packed(r.read_bytes()?)?,
            (4, WireType::LengthDelimited) => info.uids = parse_sint32_packed(r.read_bytes()?)?,
            (5, WireType::LengthDelimited) => info.user_sids = parse_sint32_packed(r.read_bytes()?)?,
            // visible_flag: accepted, ignored.
            (6, WireType::LengthDelimited) => {
                r.read_bytes()?;
            }
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(info)
}

fn parse_dense_nodes(
    payload: &[u8],
    scaling: Scaling,
    strings: &[String],
) -> Result<Vec<Node>, Error> {
    let mut r = Reader::new(payload);
    let mut ids: Vec<i64> = Vec::new();
    let mut lats: Vec<i64> = Vec::new();
    let mut lons: Vec<i64> = Vec::new();
    let mut keys_vals: Vec<u32> = Vec::new();
    let mut info = RawDenseInfo::default();

    while let Some((field_id, wire_type)) = r.read_tag()? {
        match (field_id, wire_type) {
            (1, WireType::LengthDelimited) => ids = parse_sint64_packed(r.read_bytes()?)?,
            (5, WireType::LengthDelimited) => info = parse_dense_info(r.read_bytes()?)?,
            (8, WireType::LengthDelimited) => lats = parse_sint64_packed(r.read_bytes()?)?,
            (9, WireType::LengthDelimited) => lons = parse_sint64_packed(r.read_bytes()?)?,
            (10, WireType::LengthDelimited) => keys_vals = parse_uint32_packed(r.read_bytes()?)?,
            (_, wt) => r.skip(wt)?,
        }
    }

    let n = ids.len();
    if lats.len() != n
        || lons.len() != n
        || info.versions.len() != n
        || info.timestamps.len() != n
        || info.changesets.len() != n
        || info.uids.len() != n
        || info.user_sids.len() != n
    {
        return Err(Error::ParallelArrayMismatch("DenseNodes"));
    }

    let abs_ids = cumulative(&ids);
    let abs_lats = cumulative(&lats);
    let abs_lons = cumulative(&lons);
    let abs_timestamps = cumulative(&info.timestamps.iter().map(|&v| v as i64).collect::<Vec<_>>());
    let abs_changesets = cumulative(&info.changesets);
    let abs_uids = cumulative(&info.uids.iter().map(|&v| v as i64).collect::<Vec<_>>());
    let abs_user_sids = cumulative(&info.user_sids.iter().map(|&v| v as i64).collect::<Vec<_>>());

    let mut nodes = Vec::with_capacity(n);
    let mut kv_pos = 0usize;

    for i in 0..n {
        let mut tags = Vec::new();
        while kv_pos < keys_vals.len() {
            let k_idx = keys_vals[kv_pos];
            kv_pos += 1;
            if k_idx == 0 {
                break;
            }
            let v_idx = *keys_vals.get(kv_pos).ok_or(Error::ParallelArrayMismatch("DenseNodes.keys_vals"))?;
            kv_pos += 1;
            tags.push((get_string(strings, k_idx)?, get_string(strings, v_idx)?));
        }

        let uid = abs_uids[i];
        let user_sid = abs_user_sids[i] as u32;
        let user = (user_sid != 0).then(|| get_string(strings, user_sid)).transpose()?;

        nodes.push(Node {
            id: abs_ids[i],
            lat: scaling.lat(abs_lats[i]),
            lon: scaling.lon(abs_lons[i]),
            meta: Metadata {
                version: Some(info.versions[i]),
                changeset: Some(abs_changesets[i]),
                uid: (uid >= 0 && uid != 0).then_some(uid),
                user,
                timestamp: Some(scaling.timestamp(abs_timestamps[i])),
            },
            tags,
        });
    }

    Ok(nodes)
}

fn parse_way(payload: &[u8], scaling: Scaling, strings: &[String]) -> Result<Way, Error> {
    let mut r = Reader::new(payload);
    let mut id = 0i64;
    let mut keys: Vec<u32> = Vec::new();
    let mut values: Vec<u32> = Vec::new();
    let mut refs: Vec<i64> = Vec::new();
    let mut info = Info::default();

    while let Some((field_id, wire_type)) = r.read_tag()? {
        match (field_id, wire_type) {
            (1, WireType::Varint) => id = r.read_int64()?,
            (2, WireType::LengthDelimited) => keys = parse_uint32_packed(r.read_bytes()?)?,
            (3, WireType::LengthDelimited) => values = parse_uint32_packed(r.read_bytes()?)?,
            (4, WireType::LengthDelimited) => info = parse_info(r.read_bytes()?)?,
            (8, WireType::LengthDelimited) => refs = parse_sint64_packed(r.read_bytes()?)?,
            (_, wt) => r.skip(wt)?,
        }
    }

    Ok(Way {
        id,
        nodes: cumulative(&refs),
        meta: metadata_from_info(&info, &scaling, strings)?,
        tags: collect_tags(&keys, &values, strings)?,
    })
}

fn parse_relation(payload: &[u8], scaling: Scaling, strings: &[String]) -> Result<Relation, Error> {
    let mut r = Reader::new(payload);
    let mut id = 0i64;
    let mut keys: Vec<u32> = Vec::new();
    let mut values: Vec<u32> = Vec::new();
    let mut roles_sid: Vec<u32> = Vec::new();
    let mut memids: Vec<i64> = Vec::new();
    let mut types: Vec<u32> = Vec::new();
    let mut info = Info::default();

    while let Some((field_id, wire_type)) = r.read_tag()? {
        match (field_id, wire_type) {
            (1, WireType::Varint) => id = r.read_int64()?,
            (2, WireType::LengthDelimited) => keys = parse_uint32_packed(r.read_bytes()?)?,
            (3, WireType::LengthDelimited) => values = parse_uint32_packed(r.read_bytes()?)?,
            (4, WireType::LengthDelimited) => info = parse_info(r.read_bytes()?)?,
            (8, WireType::LengthDelimited) => roles_sid = parse_uint32_packed(r.read_bytes()?)?,
            (9, WireType::LengthDelimited) => memids = parse_sint64_packed(r.read_bytes()?)?,
            (10, WireType::LengthDelimited) => types = parse_uint32_packed(r.read_bytes()?)?,
            (_, wt) => r.skip(wt)?,
        }
    }

    if roles_sid.len() != memids.len() || roles_sid.len() != types.len() {
        return Err(Error::ParallelArrayMismatch("Relation members"));
    }

    let abs_memids = cumulative(&memids);
    let members = roles_sid
        .iter()
        .zip(abs_memids.iter())
        .zip(types.iter())
        .map(|((&role_sid, &member_id), &ty)| {
            Ok(RelationMember {
                member_type: match ty {
                    0 => FeatureType::Node,
                    1 => FeatureType::Way,
                    2 => FeatureType::Relation,
                    other => return Err(Error::UnknownMemberType(other)),
                },
                id: member_id,
                role: get_string(strings, role_sid)?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(Relation {
        id,
        members,
        meta: metadata_from_info(&info, &scaling, strings)?,
        tags: collect_tags(&keys, &values, strings)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_varints_already_covered_in_wire_tests() {}

    #[test]
    fn timestamp_formatting_epoch() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_timestamp(1_600_000_000), "2020-09-13T12:26:40Z");
    }

    fn encode_tag(field_id: u32, wire_type: u8, out: &mut Vec<u8>) {
        encode_varint(((field_id as u64) << 3) | wire_type as u64, out);
    }

    fn encode_varint(mut v: u64, out: &mut Vec<u8>) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                out.push(byte);
                break;
            } else {
                out.push(byte | 0x80);
            }
        }
    }

    fn encode_zigzag32(v: i32, out: &mut Vec<u8>) {
        let u = ((v << 1) ^ (v >> 31)) as u32;
        encode_varint(u as u64, out);
    }

    fn encode_zigzag64(v: i64, out: &mut Vec<u8>) {
        let u = ((v << 1) ^ (v >> 63)) as u64;
        encode_varint(u, out);
    }

    fn encode_packed<F: Fn(&mut Vec<u8>)>(field_id: u32, body: F, out: &mut Vec<u8>) {
        let mut payload = Vec::new();
        body(&mut payload);
        encode_tag(field_id, 2, out);
        encode_varint(payload.len() as u64, out);
        out.extend_from_slice(&payload);
    }

    /// S3: dense nodes scenario from the spec's concrete scenarios.
    #[test]
    fn s3_dense_nodes() {
        let strings = vec![
            "".to_string(),
            "u1".to_string(),
            "u2".to_string(),
            "k1".to_string(),
            "v1".to_string(),
            "k2".to_string(),
            "v2".to_string(),
        ];

        let mut payload = Vec::new();

        encode_packed(
            1,
            |out| {
                for d in [10i64, 5, -3] {
                    encode_zigzag64(d, out);
                }
            },
            &mut payload,
        );

        let mut info_payload = Vec::new();
        encode_packed(1, |out| for v in [1u32, 1, 2] { encode_varint(v as u64, out) }, &mut info_payload);
        encode_packed(2, |out| for d in [1_600_000_000i32, 2, 1] { encode_zigzag32(d, out) }, &mut info_payload);
        encode_packed(3, |out| for d in [0i64, 0, 0] { encode_zigzag64(d, out) }, &mut info_payload);
        encode_packed(4, |out| for d in [0i32, 0, 0] { encode_zigzag32(d, out) }, &mut info_payload);
        encode_packed(5, |out| for d in [1i32, 0, 0] { encode_zigzag32(d, out) }, &mut info_payload);
        encode_tag(5, 2, &mut payload);
        encode_varint(info_payload.len() as u64, &mut payload);
        payload.extend_from_slice(&info_payload);

        encode_packed(8, |out| for d in [0i64, 0, 0] { encode_zigzag64(d, out) }, &mut payload);
        encode_packed(9, |out| for d in [0i64, 0, 0] { encode_zigzag64(d, out) }, &mut payload);
        encode_packed(
            10,
            |out| {
                for v in [3u32, 4, 0, 0, 5, 6, 0] {
                    encode_varint(v as u64, out);
                }
            },
            &mut payload,
        );

        let nodes = parse_dense_nodes(&payload, Scaling::default(), &strings).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].id, 10);
        assert_eq!(nodes[1].id, 15);
        assert_eq!(nodes[2].id, 12);
        assert_eq!(nodes[0].tags, vec![("k1".to_string(), "v1".to_string())]);
        assert!(nodes[1].tags.is_empty());
        assert_eq!(nodes[2].tags, vec![("k2".to_string(), "v2".to_string())]);
        assert_eq!(nodes[0].meta.user.as_deref(), Some("u1"));
        assert_eq!(nodes[1].meta.user.as_deref(), Some("u1"));
        assert_eq!(nodes[2].meta.user.as_deref(), Some("u1"));
    }

    /// S4: way scenario from the spec's concrete scenarios.
    #[test]
    fn s4_way() {
        let strings = vec![
            "".to_string(),
            "highway".to_string(),
            "residential".to_string(),
            "name".to_string(),
            "Main".to_string(),
        ];

        let mut payload = Vec::new();
        encode_tag(1, 0, &mut payload);
        encode_varint(900, &mut payload); // arbitrary id
        encode_packed(2, |out| for v in [1u32, 3] { encode_varint(v as u64, out) }, &mut payload);
        encode_packed(3, |out| for v in [2u32, 4] { encode_varint(v as u64, out) }, &mut payload);
        encode_packed(8, |out| for d in [100i64, 1, 2] { encode_zigzag64(d, out) }, &mut payload);

        let way = parse_way(&payload, Scaling::default(), &strings).unwrap();
        assert_eq!(way.nodes, vec![100, 101, 103]);
        assert_eq!(
            way.tags,
            vec![
                ("highway".to_string(), "residential".to_string()),
                ("name".to_string(), "Main".to_string()),
            ]
        );
    }

    #[test]
    fn relation_with_members_and_tags() {
        let strings = vec![
            "".to_string(),
            "type".to_string(),
            "route".to_string(),
            "stop".to_string(),
        ];

        let mut payload = Vec::new();
        encode_tag(1, 0, &mut payload);
        encode_varint(500, &mut payload);
        encode_packed(2, |out| encode_varint(1, out), &mut payload);
        encode_packed(3, |out| encode_varint(2, out), &mut payload);
        encode_packed(
            8,
            |out| {
                for v in [0u32, 3] {
                    encode_varint(v as u64, out);
                }
            },
            &mut payload,
        );
        encode_packed(
            9,
            |out| {
                for d in [10i64, 5] {
                    encode_zigzag64(d, out);
                }
            },
            &mut payload,
        );
        encode_packed(
            10,
            |out| {
                for v in [1u32, 0] {
                    encode_varint(v as u64, out);
                }
            },
            &mut payload,
        );

        let relation = parse_relation(&payload, Scaling::default(), &strings).unwrap();
        assert_eq!(relation.id, 500);
        assert_eq!(relation.tags, vec![("type".to_string(), "route".to_string())]);
        assert_eq!(relation.members.len(), 2);
        assert_eq!(relation.members[0].member_type, FeatureType::Way);
        assert_eq!(relation.members[0].id, 10);
        assert_eq!(relation.members[0].role, "");
        assert_eq!(relation.members[1].member_type, FeatureType::Node);
        assert_eq!(relation.members[1].id, 15);
        assert_eq!(relation.members[1].role, "stop");
    }

    #[test]
    fn way_keys_values_length_mismatch_is_an_error() {
        let strings = vec!["".to_string(), "k".to_string()];
        let mut payload = Vec::new();
        encode_tag(1, 0, &mut payload);
        encode_varint(1, &mut payload);
        encode_packed(2, |out| encode_varint(1, out), &mut payload);
        // no values field at all: lengths 1 vs 0.
        let err = parse_way(&payload, Scaling::default(), &strings).unwrap_err();
        assert!(matches!(err, Error::ParallelArrayMismatch(_)));
    }

    #[test]
    fn dense_nodes_array_length_mismatch_is_an_error() {
        let mut payload = Vec::new();
        encode_packed(1, |out| encode_zigzag64(1, out), &mut payload);
        // lats/lons/info arrays are all missing: lengths 1 vs 0.
        let err = parse_dense_nodes(&payload, Scaling::default(), &[]).unwrap_err();
        assert!(matches!(err, Error::ParallelArrayMismatch(_)));
    }

    /// An out-of-range StringTable index is corrupt input, not a silent
    /// empty-string default.
    #[test]
    fn way_tag_key_out_of_range_string_table_index_is_an_error() {
        let strings = vec!["".to_string()];
        let mut payload = Vec::new();
        encode_tag(1, 0, &mut payload);
        encode_varint(1, &mut payload);
        encode_packed(2, |out| encode_varint(5, out), &mut payload); // key index 5: out of range
        encode_packed(3, |out| encode_varint(0, out), &mut payload);
        let err = parse_way(&payload, Scaling::default(), &strings).unwrap_err();
        assert!(matches!(err, Error::StringTableIndexOutOfRange(5)));
    }

    /// granularity/lat_offset/lon_offset are honoured rather than hard-coded.
    #[test]
    fn non_default_granularity_and_offset_scale_coordinates() {
        let scaling = Scaling {
            granularity: 1000,
            lat_offset: 500_000_000,
            lon_offset: -250_000_000,
            date_granularity: 1000,
        };
        assert!((scaling.lat(2) - 0.500002).abs() < 1e-7);
        assert!((scaling.lon(2) - (-0.249998)).abs() < 1e-7);
    }
}

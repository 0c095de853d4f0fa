// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Reader for the [OSM PBF](https://wiki.openstreetmap.org/wiki/PBF_Format) format.
//!
//! A PBF file is a sequence of length-prefixed blobs: a `BlobHeader`
//! announcing a type and size, followed by a `Blob` payload that is either
//! raw or compressed. The first blob must be an `OSMHeader`; every
//! subsequent one is `OSMData`, each holding a `PrimitiveBlock`.
//!
//! Every message above is decoded by hand against the fixed OSMPBF field
//! layout (see [block]) rather than through generated protobuf code -
//! there is no `.proto` file or codegen crate in this dependency tree.

mod block;
mod wire;

use std::io::{self, Read};
use std::sync::Arc;

use wire::{Reader, WireType};

use crate::model::Feature;

/// Max permitted size for a serialized `BlobHeader` - 64 KiB, per the OSMPBF spec.
const MAX_BLOB_HEADER_SIZE: u32 = 64 * 1024;

/// Max permitted size for a serialized & decompressed `Blob` - 32 MiB, per the OSMPBF spec.
const MAX_BLOB_SIZE: u32 = 32 * 1024 * 1024;

/// Error which can occur while reading a PBF file.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] Arc<io::Error>),

    #[error("unexpected end of input while decoding a protobuf field")]
    Truncated,

    #[error("varint exceeds 64 bits")]
    VarintTooLong,

    #[error("unknown protobuf wire type: {0}")]
    UnknownWireType(u64),

    #[error("BlobHeader too large: {0} > {MAX_BLOB_HEADER_SIZE}")]
    BlobHeaderTooLarge(u32),

    #[error("Blob too large: {0} > {MAX_BLOB_SIZE}")]
    BlobTooLarge(u32),

    #[error("BlobHeader.type: got {got:?}, expected {expected:?}")]
    UnexpectedBlobHeaderType { got: String, expected: &'static str },

    #[error("Blob.raw_size or BlobHeader.datasize is negative")]
    NegativeSize,

    #[error("decompressed Blob size mismatch: declared {declared}, got {actual}")]
    SizeMismatch { declared: i32, actual: usize },

    #[error("unsupported Blob compression: {0} (supported: raw, zlib, bzip2)")]
    UnsupportedCompression(&'static str),

    #[error("Blob has no payload")]
    MissingBlobPayload,

    #[error("file requires unsupported features: {0:?}")]
    UnsupportedFeatures(Vec<String>),

    #[error("parallel array length mismatch in {0}")]
    ParallelArrayMismatch(&'static str),

    #[error("unknown relation member type: {0}")]
    UnknownMemberType(u32),

    #[error("StringTable index {0} out of range")]
    StringTableIndexOutOfRange(u32),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

struct BlobHeader {
    type_: String,
    datasize: i32,
}

fn parse_blob_header(buf: &[u8]) -> Result<BlobHeader, Error> {
    let mut r = Reader::new(buf);
    let mut type_ = String::new();
    let mut datasize = 0i32;
    while let Some((field_id, wire_type)) = r.read_tag()? {
        match (field_id, wire_type) {
            (1, WireType::LengthDelimited) => type_ = r.read_string()?,
            (2, WireType::LengthDelimited) => {
                r.read_bytes()?; // indexdata: unused
            }
            (3, WireType::Varint) => datasize = r.read_int32()?,
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(BlobHeader { type_, datasize })
}

enum BlobPayload<'a> {
    Raw(&'a [u8]),
    Zlib(&'a [u8]),
    Bzip2(&'a [u8]),
    Lzma,
    Lz4,
    Zstd,
}

struct Blob<'a> {
    raw_size: i32,
    payload: BlobPayload<'a>,
}

fn parse_blob(buf: &[u8]) -> Result<Blob<'_>, Error> {
    let mut r = Reader::new(buf);
    let mut raw_size = 0i32;
    let mut payload = None;
    while let Some((field_id, wire_type)) = r.read_tag()? {
        match (field_id, wire_type) {
            (1, WireType::LengthDelimited) => payload = Some(BlobPayload::Raw(r.read_bytes()?)),
            (2, WireType::Varint) => raw_size = r.read_int32()?,
            (3, WireType::LengthDelimited) => payload = Some(BlobPayload::Zlib(r.read_bytes()?)),
            (4, WireType::LengthDelimited) => {
                r.read_bytes()?;
                payload = Some(BlobPayload::Lzma);
            }
            (5, WireType::LengthDelimited) => payload = Some(BlobPayload::Bzip2(r.read_bytes()?)),
            (6, WireType::LengthDelimited) => {
                r.read_bytes()?;
                payload = Some(BlobPayload::Lz4);
            }
            (7, WireType::LengthDelimited) => {
                r.read_bytes()?;
                payload = Some(BlobPayload::Zstd);
            }
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(Blob {
        raw_size,
        payload: payload.ok_or(Error::MissingBlobPayload)?,
    })
}

fn decompress_blob(blob: Blob<'_>) -> Result<Vec<u8>, Error> {
    let declared = blob.raw_size;
    if declared < 0 {
        return Err(Error::NegativeSize);
    }
    if declared as u32 > MAX_BLOB_SIZE {
        return Err(Error::BlobTooLarge(declared as u32));
    }

    let data = match blob.payload {
        BlobPayload::Raw(data) => data.to_vec(),
        BlobPayload::Zlib(data) => {
            let mut decoder = flate2::read::ZlibDecoder::new(data);
            let mut out = Vec::with_capacity(declared as usize);
            decoder.read_to_end(&mut out)?;
            out
        }
        BlobPayload::Bzip2(data) => {
            let mut decoder = bzip2::read::BzDecoder::new(data);
            let mut out = Vec::with_capacity(declared as usize);
            decoder.read_to_end(&mut out)?;
            out
        }
        BlobPayload::Lzma => {
            log::warn!("Blob uses unsupported lzma compression");
            return Err(Error::UnsupportedCompression("lzma"));
        }
        BlobPayload::Lz4 => {
            log::warn!("Blob uses unsupported lz4 compression");
            return Err(Error::UnsupportedCompression("lz4"));
        }
        BlobPayload::Zstd => {
            log::warn!("Blob uses unsupported zstd compression");
            return Err(Error::UnsupportedCompression("zstd"));
        }
    };

    if declared != 0 && data.len() != declared as usize {
        return Err(Error::SizeMismatch {
            declared,
            actual: data.len(),
        });
    }

    Ok(data)
}

fn parse_header_block(payload: &[u8]) -> Result<(), Error> {
    let mut r = Reader::new(payload);
    let mut unsupported = Vec::new();
    while let Some((field_id, wire_type)) = r.read_tag()? {
        match (field_id, wire_type) {
            (4, WireType::LengthDelimited) => {
                let feature = r.read_string()?;
                if !matches!(feature.as_str(), "OsmSchema-V0.6" | "DenseNodes") {
                    unsupported.push(feature);
                }
            }
            (_, wt) => r.skip(wt)?,
        }
    }
    if unsupported.is_empty() {
        Ok(())
    } else {
        log::warn!("OSMHeader declares required features this reader doesn't support: {unsupported:?}");
        Err(Error::UnsupportedFeatures(unsupported))
    }
}

/// Three-state outer loop over a PBF file's blobs:
/// `ExpectHeader -> ExpectData* -> Done`.
enum State {
    ExpectHeader,
    ExpectData,
    Done,
}

/// Streams [Feature]s out of a `.osm.pbf` file, one `PrimitiveBlock` at a
/// time. Each block's string table and decoded entities are released
/// before the next blob is read.
pub struct BlobStream<R: Read> {
    inner: R,
    state: State,
    current: Option<std::vec::IntoIter<Feature>>,
}

impl<R: Read> BlobStream<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: State::ExpectHeader,
            current: None,
        }
    }

    fn read_blob_header_size(&mut self) -> Result<Option<u32>, Error> {
        let mut buf = [0u8; 4];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => Ok(Some(u32::from_be_bytes(buf))),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_blob_header(&mut self, size: u32) -> Result<BlobHeader, Error> {
        if size > MAX_BLOB_HEADER_SIZE {
            return Err(Error::BlobHeaderTooLarge(size));
        }
        let mut buf = vec![0u8; size as usize];
        self.inner.read_exact(&mut buf)?;
        parse_blob_header(&buf)
    }

    fn read_blob_payload(&mut self, datasize: i32) -> Result<Vec<u8>, Error> {
        if datasize < 0 {
            return Err(Error::NegativeSize);
        }
        let mut buf = vec![0u8; datasize as usize];
        self.inner.read_exact(&mut buf)?;
        let blob = parse_blob(&buf)?;
        decompress_blob(blob)
    }

    /// Reads the next blob and advances the state machine. Returns the
    /// decoded features of the next `PrimitiveBlock`, or `None` at clean EOF.
    fn advance(&mut self) -> Result<Option<std::vec::IntoIter<Feature>>, Error> {
        loop {
            match self.state {
                State::Done => return Ok(None),
                State::ExpectHeader => {
                    let size = match self.read_blob_header_size()? {
                        Some(s) => s,
                        None => {
                            self.state = State::Done;
                            return Ok(None);
                        }
                    };
                    let header = self.read_blob_header(size)?;
                    if header.type_ != "OSMHeader" {
                        return Err(Error::UnexpectedBlobHeaderType {
                            got: header.type_,
                            expected: "OSMHeader",
                        });
                    }
                    let payload = self.read_blob_payload(header.datasize)?;
                    parse_header_block(&payload)?;
                    log::debug!("parsed OSMHeader blob ({} bytes)", header.datasize);
                    self.state = State::ExpectData;
                }
                State::ExpectData => {
                    let size = match self.read_blob_header_size()? {
                        Some(s) => s,
                        None => {
                            self.state = State::Done;
                            return Ok(None);
                        }
                    };
                    let header = self.read_blob_header(size)?;
                    if header.type_ != "OSMData" {
                        return Err(Error::UnexpectedBlobHeaderType {
                            got: header.type_,
                            expected: "OSMData",
                        });
                    }
                    let payload = self.read_blob_payload(header.datasize)?;
                    let block = block::PrimitiveBlock::parse(&payload)?;
                    let features: Vec<Feature> = block.into_features().collect();
                    log::trace!("decoded OSMData blob into {} features", features.len());
                    return Ok(Some(features.into_iter()));
                }
            }
        }
    }
}

impl<R: Read> Iterator for BlobStream<R> {
    type Item = Result<Feature, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(iter) = &mut self.current {
                if let Some(f) = iter.next() {
                    return Some(Ok(f));
                }
                self.current = None;
            }

            match self.advance() {
                Ok(Some(iter)) => self.current = Some(iter),
                Ok(None) => return None,
                Err(e) => {
                    self.state = State::Done;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Returns an iterator over all features from an OSM PBF reader.
pub fn features_from_io<R: Read>(reader: R) -> impl Iterator<Item = Result<Feature, Error>> {
    BlobStream::new(reader)
}

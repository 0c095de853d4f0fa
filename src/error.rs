// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::sync::Arc;

use crate::{pbf, xml};

/// Error which can occur while opening or parsing an OSM file.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("{0}: unrecognized file suffix (expected .osm, .osm.gz, .osm.bz2 or .osm.pbf)")]
    InvalidSuffix(PathBuf),

    #[error("io: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("pbf: {0}")]
    Pbf(#[from] pbf::Error),

    #[error("xml: {0}")]
    Xml(#[from] xml::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

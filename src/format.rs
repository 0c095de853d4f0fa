// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::path::Path;

use crate::Error;

/// On-disk encoding of an OSM file, as determined by its path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) (`.osm`).
    Xml,

    /// [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) with
    /// [gzip](https://en.wikipedia.org/wiki/Gzip) compression (`.osm.gz`).
    XmlGz,

    /// [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) with
    /// [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression (`.osm.bz2`).
    XmlBz2,

    /// [OSM PBF](https://wiki.openstreetmap.org/wiki/PBF_Format) (`.osm.pbf` or `.pbf`).
    Pbf,
}

impl FileFormat {
    /// Guesses the format from a file path's suffix.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if name.ends_with(".osm.pbf") || name.ends_with(".pbf") {
            Ok(Self::Pbf)
        } else if name.ends_with(".osm.gz") {
            Ok(Self::XmlGz)
        } else if name.ends_with(".osm.bz2") {
            Ok(Self::XmlBz2)
        } else if name.ends_with(".osm") {
            Ok(Self::Xml)
        } else {
            Err(Error::InvalidSuffix(path.to_path_buf()))
        }
    }
}

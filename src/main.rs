// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use osmstream::{Control, Node, OsmReader, OsmSink, Relation, Way};

/// Streams nodes, ways and relations out of an OSM XML or PBF file and
/// prints a running tally, the way a sample consumer of the library would.
#[derive(Parser)]
struct Cli {
    /// Path to the OSM file (.osm, .osm.gz, .osm.bz2 or .osm.pbf)
    osm_file: PathBuf,

    /// Stop after this many features (0 means unbounded)
    #[arg(long, default_value_t = 0)]
    limit: u64,

    /// Print every feature's id and kind instead of just the final tally
    #[arg(long)]
    verbose: bool,
}

#[derive(Default)]
struct Tally {
    nodes: u64,
    ways: u64,
    relations: u64,
    limit: u64,
    verbose: bool,
}

impl Tally {
    fn total(&self) -> u64 {
        self.nodes + self.ways + self.relations
    }

    fn control(&self) -> Control {
        if self.limit != 0 && self.total() >= self.limit {
            Control::Abort
        } else {
            Control::Continue
        }
    }
}

impl OsmSink for Tally {
    fn node(&mut self, node: &Node) -> Control {
        self.nodes += 1;
        if self.verbose {
            println!("node {}", node.id);
        }
        self.control()
    }

    fn way(&mut self, way: &Way) -> Control {
        self.ways += 1;
        if self.verbose {
            println!("way {}", way.id);
        }
        self.control()
    }

    fn relation(&mut self, relation: &Relation) -> Control {
        self.relations += 1;
        if self.verbose {
            println!("relation {}", relation.id);
        }
        self.control()
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let mut reader = OsmReader::open(&cli.osm_file)?;
    let mut tally = Tally {
        limit: cli.limit,
        verbose: cli.verbose,
        ..Default::default()
    };
    let control = reader.parse(&mut tally)?;

    if control == Control::Abort {
        log::info!("stopped early at the requested limit of {} features", cli.limit);
    }

    println!(
        "{}: {} nodes, {} ways, {} relations",
        cli.osm_file.display(),
        tally.nodes,
        tally.ways,
        tally.relations
    );

    Ok(())
}

use std::io::{self, Read, Seek};
use std::path::Path;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::records::{Linedef, Node, Record, Sector, Segment, Sidedef, Subsector, Vertex};
use crate::wad::WadReader;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("error reading archive: {0}")]
    Io(#[from] io::Error),
    #[error("could not find mission {0}")]
    MissionNotFound(String),
    #[error("mission {mission} has no {name} lump")]
    LumpMissing { mission: String, name: &'static str },
}

/// Every lump a mission needs, in the order they are looked up.
pub const REQUIRED_LUMPS: [&str; 7] = [
    "LINEDEFS", "SIDEDEFS", "VERTEXES", "SEGS", "SSECTORS", "NODES", "SECTORS",
];

/// The decoded record arrays of one mission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapData {
    pub mission: String,
    pub linedefs: Vec<Linedef>,
    pub sidedefs: Vec<Sidedef>,
    pub vertexes: Vec<Vertex>,
    pub segments: Vec<Segment>,
    pub subsectors: Vec<Subsector>,
    pub nodes: Vec<Node>,
    pub sectors: Vec<Sector>,
}

/// Record counts of a loaded map, used for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapSummary {
    pub linedefs: usize,
    pub sidedefs: usize,
    pub vertexes: usize,
    pub segments: usize,
    pub subsectors: usize,
    pub nodes: usize,
    pub sectors: usize,
}

impl MapData {
    /// Opens the archive at `path` and loads `mission`.
    ///
    /// `mission` is matched byte for byte; callers upper-case it first.
    pub fn load<P: AsRef<Path>>(path: P, mission: &str) -> Result<Self, MapError> {
        let path = path.as_ref();
        info!("reading file {}", path.display());
        let mut wad = WadReader::open(path)?;
        Self::load_from_wad(&mut wad, mission)
    }

    /// Loads `mission` from an archive held in any seekable stream.
    pub fn load_from<R: Read + Seek>(reader: R, mission: &str) -> Result<Self, MapError> {
        let mut wad = WadReader::new(reader)?;
        Self::load_from_wad(&mut wad, mission)
    }

    pub fn load_from_wad<R: Read + Seek>(
        wad: &mut WadReader<R>,
        mission: &str,
    ) -> Result<Self, MapError> {
        info!(
            "archive tag {:?}, {} directory entries",
            wad.header().tag_lossy(),
            wad.header().lump_count
        );

        let (marker, _) = wad
            .find(mission)?
            .ok_or_else(|| MapError::MissionNotFound(mission.to_string()))?;
        info!("found {mission} at directory entry {marker}");

        let mut lumps = MissionLumps {
            wad,
            mission,
            first: marker + 1,
        };
        Ok(MapData {
            mission: mission.to_string(),
            linedefs: lumps.read("LINEDEFS")?,
            sidedefs: lumps.read("SIDEDEFS")?,
            vertexes: lumps.read("VERTEXES")?,
            segments: lumps.read("SEGS")?,
            subsectors: lumps.read("SSECTORS")?,
            nodes: lumps.read("NODES")?,
            sectors: lumps.read("SECTORS")?,
        })
    }

    pub fn summary(&self) -> MapSummary {
        MapSummary {
            linedefs: self.linedefs.len(),
            sidedefs: self.sidedefs.len(),
            vertexes: self.vertexes.len(),
            segments: self.segments.len(),
            subsectors: self.subsectors.len(),
            nodes: self.nodes.len(),
            sectors: self.sectors.len(),
        }
    }
}

/// Looks up lumps belonging to one mission: only entries after its marker
/// are searched.
struct MissionLumps<'a, R> {
    wad: &'a mut WadReader<R>,
    mission: &'a str,
    first: usize,
}

impl<R: Read + Seek> MissionLumps<'_, R> {
    fn read<T: Record>(&mut self, name: &'static str) -> Result<Vec<T>, MapError> {
        let (_, entry) =
            self.wad
                .find_from(self.first, name)?
                .ok_or_else(|| MapError::LumpMissing {
                    mission: self.mission.to_string(),
                    name,
                })?;

        let remainder = entry.length.max(0) as usize % T::SIZE;
        if remainder != 0 {
            warn!(
                "{name} lump length {} is not a multiple of {}; ignoring {remainder} trailing bytes",
                entry.length,
                T::SIZE
            );
        }

        let records = self.wad.read_lump::<T>(&entry)?;
        info!("read in {} {}", records.len(), T::LABEL);
        Ok(records)
    }
}

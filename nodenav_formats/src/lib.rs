pub mod map;
pub mod records;
pub mod wad;

pub use map::{MapData, MapError, MapSummary, REQUIRED_LUMPS};
pub use records::{
    BoundingBox, ChildRef, Linedef, Name8, Node, Record, Sector, Segment, Sidedef, Subsector,
    Vertex,
};
pub use wad::{LumpDirectory, LumpEntry, WadHeader, WadReader};

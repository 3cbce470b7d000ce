//! Fixed-size little-endian map records stored inside WAD lumps.
//!
//! Every record type implements [`Record`], which knows its on-disk size and
//! how to decode one instance from a byte stream. Lumps are packed arrays of
//! a single record type; [`read_records`] decodes a whole lump at once.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Serialize, Serializer};

/// Bit that marks a node child reference as a subsector (leaf) index.
pub const SUBSECTOR_FLAG: u16 = 0x8000;

/// Mask for the index carried by a node child reference.
pub const CHILD_INDEX_MASK: u16 = 0x7fff;

/// An 8-byte, NUL right-padded ASCII name as used by lumps and textures.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Name8(pub [u8; 8]);

impl Name8 {
    /// Pads `name` with NULs to 8 bytes. Returns `None` when it does not fit.
    pub fn pad(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() > 8 {
            return None;
        }
        let mut out = [0u8; 8];
        out[..bytes.len()].copy_from_slice(bytes);
        Some(Name8(out))
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// The name up to the first NUL, lossily decoded.
    pub fn to_string_lossy(&self) -> String {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        String::from_utf8_lossy(&self.0[..len]).into_owned()
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut bytes = [0u8; 8];
        reader.read_exact(&mut bytes)?;
        Ok(Name8(bytes))
    }
}

impl fmt::Debug for Name8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for Name8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Serialize for Name8 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

pub trait Record: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;
    /// Lower-case plural used in log lines ("read 12 vertexes").
    const LABEL: &'static str;

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self>;
}

/// Decodes `length / T::SIZE` records starting at `start`.
///
/// Trailing bytes that do not form a whole record are ignored. Records that
/// would run past the end of the stream fail with `UnexpectedEof` before
/// anything is allocated. The stream position is restored before returning,
/// also on error.
pub fn read_records<T, R>(reader: &mut R, start: u64, length: u32) -> io::Result<Vec<T>>
where
    T: Record,
    R: Read + Seek,
{
    let saved = reader.stream_position()?;
    let result = read_records_at(reader, start, length);
    reader.seek(SeekFrom::Start(saved))?;
    result
}

fn read_records_at<T, R>(reader: &mut R, start: u64, length: u32) -> io::Result<Vec<T>>
where
    T: Record,
    R: Read + Seek,
{
    let count = length as usize / T::SIZE;
    let end = start.saturating_add((count * T::SIZE) as u64);
    let available = reader.seek(SeekFrom::End(0))?;
    if end > available {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "{count} {} at offset {start} run past the end of the stream ({available} bytes)",
                T::LABEL
            ),
        ));
    }
    reader.seek(SeekFrom::Start(start))?;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(T::read_from(reader)?);
    }
    Ok(records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
}

impl Record for Vertex {
    const SIZE: usize = 4;
    const LABEL: &'static str = "vertexes";

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Vertex {
            x: reader.read_i16::<LittleEndian>()?,
            y: reader.read_i16::<LittleEndian>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Linedef {
    pub from_vertex: u16,
    pub to_vertex: u16,
    pub attributes: i16,
    pub kind: i16,
    pub sector_trigger: i16,
    pub right_sidedef: i16,
    pub left_sidedef: i16,
}

impl Record for Linedef {
    const SIZE: usize = 14;
    const LABEL: &'static str = "linedefs";

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Linedef {
            from_vertex: reader.read_u16::<LittleEndian>()?,
            to_vertex: reader.read_u16::<LittleEndian>()?,
            attributes: reader.read_i16::<LittleEndian>()?,
            kind: reader.read_i16::<LittleEndian>()?,
            sector_trigger: reader.read_i16::<LittleEndian>()?,
            right_sidedef: reader.read_i16::<LittleEndian>()?,
            left_sidedef: reader.read_i16::<LittleEndian>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sidedef {
    pub u_offset: i16,
    pub v_offset: i16,
    pub upper_texture: Name8,
    pub lower_texture: Name8,
    pub middle_texture: Name8,
    pub sector: i16,
}

impl Record for Sidedef {
    const SIZE: usize = 30;
    const LABEL: &'static str = "sidedefs";

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Sidedef {
            u_offset: reader.read_i16::<LittleEndian>()?,
            v_offset: reader.read_i16::<LittleEndian>()?,
            upper_texture: Name8::read_from(reader)?,
            lower_texture: Name8::read_from(reader)?,
            middle_texture: Name8::read_from(reader)?,
            sector: reader.read_i16::<LittleEndian>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub from_vertex: i16,
    pub to_vertex: i16,
    pub angle: i16,
    pub linedef: i16,
    pub side: i16,
    pub distance: i16,
}

impl Record for Segment {
    const SIZE: usize = 12;
    const LABEL: &'static str = "segments";

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Segment {
            from_vertex: reader.read_i16::<LittleEndian>()?,
            to_vertex: reader.read_i16::<LittleEndian>()?,
            angle: reader.read_i16::<LittleEndian>()?,
            linedef: reader.read_i16::<LittleEndian>()?,
            side: reader.read_i16::<LittleEndian>()?,
            distance: reader.read_i16::<LittleEndian>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Subsector {
    pub segment_count: i16,
    pub first_segment: i16,
}

impl Record for Subsector {
    const SIZE: usize = 4;
    const LABEL: &'static str = "subsectors";

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Subsector {
            segment_count: reader.read_i16::<LittleEndian>()?,
            first_segment: reader.read_i16::<LittleEndian>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sector {
    pub floor_height: i16,
    pub ceiling_height: i16,
    pub floor_texture: Name8,
    pub ceiling_texture: Name8,
    pub light_level: i16,
    pub special: i16,
    pub tag: i16,
}

impl Record for Sector {
    const SIZE: usize = 26;
    const LABEL: &'static str = "sectors";

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Sector {
            floor_height: reader.read_i16::<LittleEndian>()?,
            ceiling_height: reader.read_i16::<LittleEndian>()?,
            floor_texture: Name8::read_from(reader)?,
            ceiling_texture: Name8::read_from(reader)?,
            light_level: reader.read_i16::<LittleEndian>()?,
            special: reader.read_i16::<LittleEndian>()?,
            tag: reader.read_i16::<LittleEndian>()?,
        })
    }
}

/// Axis-aligned bounds of one node child, in map units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub y_upper: i16,
    pub y_lower: i16,
    pub x_upper: i16,
    pub x_lower: i16,
}

impl BoundingBox {
    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(BoundingBox {
            y_upper: reader.read_i16::<LittleEndian>()?,
            y_lower: reader.read_i16::<LittleEndian>()?,
            x_upper: reader.read_i16::<LittleEndian>()?,
            x_lower: reader.read_i16::<LittleEndian>()?,
        })
    }

    pub fn xs(&self) -> [i16; 2] {
        [self.x_upper, self.x_lower]
    }

    pub fn ys(&self) -> [i16; 2] {
        [self.y_upper, self.y_lower]
    }
}

/// Decoded form of a node child reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ChildRef {
    Node(u16),
    Subsector(u16),
}

impl ChildRef {
    pub fn decode(raw: u16) -> Self {
        let index = raw & CHILD_INDEX_MASK;
        if raw & SUBSECTOR_FLAG != 0 {
            ChildRef::Subsector(index)
        } else {
            ChildRef::Node(index)
        }
    }

    pub fn index(self) -> u16 {
        match self {
            ChildRef::Node(index) | ChildRef::Subsector(index) => index,
        }
    }

    /// Node index when the reference points at another node.
    pub fn node(self) -> Option<usize> {
        match self {
            ChildRef::Node(index) => Some(index as usize),
            ChildRef::Subsector(_) => None,
        }
    }

    /// Single-letter tag shown in the heading: `N` for nodes, `S` for subsectors.
    pub fn type_letter(self) -> char {
        match self {
            ChildRef::Node(_) => 'N',
            ChildRef::Subsector(_) => 'S',
        }
    }
}

/// One BSP node: a partition line plus the bounds and references of both
/// children. The first bounding box on disk belongs to the first child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Node {
    pub x: i16,
    pub y: i16,
    pub dx: i16,
    pub dy: i16,
    pub left_bbox: BoundingBox,
    pub right_bbox: BoundingBox,
    pub left_child: u16,
    pub right_child: u16,
}

impl Node {
    pub fn left(&self) -> ChildRef {
        ChildRef::decode(self.left_child)
    }

    pub fn right(&self) -> ChildRef {
        ChildRef::decode(self.right_child)
    }

    pub fn children(&self) -> [ChildRef; 2] {
        [self.left(), self.right()]
    }
}

impl Record for Node {
    const SIZE: usize = 28;
    const LABEL: &'static str = "nodes";

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Node {
            x: reader.read_i16::<LittleEndian>()?,
            y: reader.read_i16::<LittleEndian>()?,
            dx: reader.read_i16::<LittleEndian>()?,
            dy: reader.read_i16::<LittleEndian>()?,
            left_bbox: BoundingBox::read_from(reader)?,
            right_bbox: BoundingBox::read_from(reader)?,
            left_child: reader.read_u16::<LittleEndian>()?,
            right_child: reader.read_u16::<LittleEndian>()?,
        })
    }
}

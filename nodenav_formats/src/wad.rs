use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use crate::records::{Name8, Record, read_records};

pub const HEADER_SIZE: u64 = 12;
pub const ENTRY_SIZE: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WadHeader {
    /// Archive tag, normally `IWAD` or `PWAD`. Never validated.
    pub tag: [u8; 4],
    pub lump_count: i32,
    pub directory_offset: i32,
}

impl WadHeader {
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        Ok(WadHeader {
            tag,
            lump_count: reader.read_i32::<LittleEndian>()?,
            directory_offset: reader.read_i32::<LittleEndian>()?,
        })
    }

    pub fn tag_lossy(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LumpEntry {
    pub start: i32,
    pub length: i32,
    pub name: Name8,
}

impl LumpEntry {
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(LumpEntry {
            start: reader.read_i32::<LittleEndian>()?,
            length: reader.read_i32::<LittleEndian>()?,
            name: Name8::read_from(reader)?,
        })
    }

    pub fn data_range(&self) -> io::Result<Range<u64>> {
        let start = non_negative(self.start, "lump offset")?;
        let length = non_negative(self.length, "lump length")?;
        Ok(start..start + length)
    }
}

fn non_negative(value: i32, what: &str) -> io::Result<u64> {
    u64::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("negative {what} {value}"),
        )
    })
}

/// Location of the lump directory inside an archive.
///
/// The directory is never cached; every lookup scans the on-disk entries in
/// order so the first entry with a matching name wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LumpDirectory {
    offset: u64,
    count: usize,
}

impl LumpDirectory {
    pub fn from_header(header: &WadHeader) -> io::Result<Self> {
        Ok(LumpDirectory {
            offset: non_negative(header.directory_offset, "directory offset")?,
            count: usize::try_from(header.lump_count).unwrap_or(0),
        })
    }

    /// Entry count declared by the header. The file may hold fewer.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Finds the first entry named `name`. See [`LumpDirectory::find_from`].
    pub fn find<R: Read + Seek>(
        &self,
        reader: &mut R,
        name: &str,
    ) -> io::Result<Option<(usize, LumpEntry)>> {
        self.find_from(reader, 0, name)
    }

    /// Scans entries `first..count` for an exact, case-sensitive name match
    /// and returns the matching entry with its directory index.
    ///
    /// The reader's position is the same on return as on entry. A directory
    /// that ends early (short file) stops the scan without error.
    pub fn find_from<R: Read + Seek>(
        &self,
        reader: &mut R,
        first: usize,
        name: &str,
    ) -> io::Result<Option<(usize, LumpEntry)>> {
        let Some(wanted) = Name8::pad(name) else {
            return Ok(None);
        };
        let saved = reader.stream_position()?;
        let result = self.scan(reader, first, |entry| entry.name == wanted);
        reader.seek(SeekFrom::Start(saved))?;
        result
    }

    /// Every entry in directory order. Stops early on a short file.
    pub fn entries<R: Read + Seek>(&self, reader: &mut R) -> io::Result<Vec<LumpEntry>> {
        let saved = reader.stream_position()?;
        let stream_len = reader.seek(SeekFrom::End(0))?;
        let present = stream_len.saturating_sub(self.offset) / ENTRY_SIZE;
        let mut entries = Vec::with_capacity(self.count.min(present as usize));
        let result = self.scan(reader, 0, |entry| {
            entries.push(*entry);
            false
        });
        reader.seek(SeekFrom::Start(saved))?;
        result.map(|_| entries)
    }

    fn scan<R, F>(
        &self,
        reader: &mut R,
        first: usize,
        mut matches: F,
    ) -> io::Result<Option<(usize, LumpEntry)>>
    where
        R: Read + Seek,
        F: FnMut(&LumpEntry) -> bool,
    {
        if first >= self.count {
            return Ok(None);
        }
        reader.seek(SeekFrom::Start(self.offset + first as u64 * ENTRY_SIZE))?;
        for index in first..self.count {
            let entry = match LumpEntry::read_from(reader) {
                Ok(entry) => entry,
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(err) => return Err(err),
            };
            if matches(&entry) {
                return Ok(Some((index, entry)));
            }
        }
        Ok(None)
    }
}

/// An open archive: the byte stream plus its decoded header and directory.
#[derive(Debug)]
pub struct WadReader<R> {
    reader: R,
    header: WadHeader,
    directory: LumpDirectory,
}

impl WadReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        WadReader::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> WadReader<R> {
    /// Reads the header from the start of `reader`.
    pub fn new(mut reader: R) -> io::Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = WadHeader::read_from(&mut reader)?;
        let directory = LumpDirectory::from_header(&header)?;
        reader.seek(SeekFrom::Start(directory.offset))?;
        Ok(WadReader {
            reader,
            header,
            directory,
        })
    }

    pub fn header(&self) -> &WadHeader {
        &self.header
    }

    pub fn directory(&self) -> &LumpDirectory {
        &self.directory
    }

    pub fn find(&mut self, name: &str) -> io::Result<Option<(usize, LumpEntry)>> {
        self.directory.find(&mut self.reader, name)
    }

    pub fn find_from(
        &mut self,
        first: usize,
        name: &str,
    ) -> io::Result<Option<(usize, LumpEntry)>> {
        self.directory.find_from(&mut self.reader, first, name)
    }

    pub fn entries(&mut self) -> io::Result<Vec<LumpEntry>> {
        self.directory.entries(&mut self.reader)
    }

    /// Decodes a lump as a packed array of `T`.
    pub fn read_lump<T: Record>(&mut self, entry: &LumpEntry) -> io::Result<Vec<T>> {
        let range = entry.data_range()?;
        let length = u32::try_from(range.end - range.start).unwrap_or(u32::MAX);
        read_records(&mut self.reader, range.start, length)
    }
}

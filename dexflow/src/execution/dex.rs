//! Minimal dex container reader.
//!
//! Only the tables needed to list the defined classes are read: the header,
//! `string_ids`, `type_ids` and `class_defs`. Everything else in the
//! container is ignored.

use crate::core::ArtifactEntryPoint;
use crate::errors::DexParseError;

const MAGIC_PREFIX: &[u8; 4] = b"dex\n";
const HEADER_SIZE: usize = 0x70;

const STRING_IDS_SIZE: usize = 0x38;
const TYPE_IDS_SIZE: usize = 0x40;
const CLASS_DEFS_SIZE: usize = 0x60;

const CLASS_DEF_ITEM_SIZE: usize = 32;

/// The classes defined by a dex file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexFile {
    version: String,
    class_descriptors: Vec<String>,
}

impl DexFile {
    /// Parses a dex container.
    ///
    /// # Errors
    ///
    /// Returns an error if the magic is wrong, a table runs past the end of
    /// the data, an index points outside its table or a descriptor is not
    /// valid modified UTF-8.
    pub fn parse(bytes: &[u8]) -> Result<Self, DexParseError> {
        let version = read_magic(bytes)?;
        let reader = Reader { data: bytes };
        reader.slice(0, HEADER_SIZE)?;

        let string_ids = reader.table(STRING_IDS_SIZE)?;
        let type_ids = reader.table(TYPE_IDS_SIZE)?;
        let class_defs = reader.table(CLASS_DEFS_SIZE)?;

        let class_descriptors = (0..class_defs.size)
            .map(|i| {
                let class_idx = reader.u32_at(class_defs.item(i, CLASS_DEF_ITEM_SIZE))?;
                let descriptor_idx = reader.u32_at(type_ids.entry("type_ids", class_idx, 4)?)?;
                let string_off = reader.u32_at(string_ids.entry("string_ids", descriptor_idx, 4)?)?;
                reader.string_at(string_off as usize)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version,
            class_descriptors,
        })
    }

    /// Returns the format version, e.g. `"035"`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the class descriptors in class-def order.
    #[must_use]
    pub fn class_descriptors(&self) -> &[String] {
        &self.class_descriptors
    }

    /// Returns the defined classes as dotted names.
    #[must_use]
    pub fn entry_points(&self) -> Vec<ArtifactEntryPoint> {
        self.class_descriptors
            .iter()
            .filter_map(|d| ArtifactEntryPoint::from_descriptor(d))
            .collect()
    }
}

fn read_magic(bytes: &[u8]) -> Result<String, DexParseError> {
    let magic = bytes.get(..8).ok_or(DexParseError::BadMagic)?;
    let version = &magic[4..7];
    if &magic[..4] != MAGIC_PREFIX || magic[7] != 0 || !version.iter().all(u8::is_ascii_digit) {
        return Err(DexParseError::BadMagic);
    }
    Ok(String::from_utf8_lossy(version).into_owned())
}

/// A `(size, offset)` pair from the header.
#[derive(Debug, Clone, Copy)]
struct Table {
    size: u32,
    offset: usize,
}

impl Table {
    fn item(self, index: u32, stride: usize) -> usize {
        self.offset + index as usize * stride
    }

    fn entry(self, name: &'static str, index: u32, stride: usize) -> Result<usize, DexParseError> {
        if index >= self.size {
            return Err(DexParseError::IndexOutOfRange {
                table: name,
                index,
                size: self.size,
            });
        }
        Ok(self.item(index, stride))
    }
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn truncated(&self, offset: usize, needed: usize) -> DexParseError {
        DexParseError::Truncated {
            offset,
            needed,
            len: self.data.len(),
        }
    }

    fn slice(&self, offset: usize, needed: usize) -> Result<&'a [u8], DexParseError> {
        offset
            .checked_add(needed)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| self.truncated(offset, needed))
    }

    fn u32_at(&self, offset: usize) -> Result<u32, DexParseError> {
        let bytes = self.slice(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a header `(size, offset)` pair and checks the table fits.
    fn table(&self, header_offset: usize) -> Result<Table, DexParseError> {
        let size = self.u32_at(header_offset)?;
        let offset = self.u32_at(header_offset + 4)? as usize;
        let stride = if header_offset == CLASS_DEFS_SIZE {
            CLASS_DEF_ITEM_SIZE
        } else {
            4
        };
        let len = (size as usize)
            .checked_mul(stride)
            .ok_or_else(|| self.truncated(offset, usize::MAX))?;
        self.slice(offset, len)?;
        Ok(Table { size, offset })
    }

    fn uleb128(&self, pos: &mut usize) -> Result<u32, DexParseError> {
        let mut result = 0u32;
        for shift in 0..5 {
            let byte = *self.data.get(*pos).ok_or_else(|| self.truncated(*pos, 1))?;
            *pos += 1;
            result |= u32::from(byte & 0x7f) << (shift * 7);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(DexParseError::InvalidString { offset: *pos })
    }

    /// Reads a `string_data_item`: a ULEB128 UTF-16 length followed by
    /// NUL-terminated modified UTF-8.
    fn string_at(&self, offset: usize) -> Result<String, DexParseError> {
        let mut pos = offset;
        self.uleb128(&mut pos)?;
        let rest = self.data.get(pos..).ok_or_else(|| self.truncated(pos, 1))?;
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| self.truncated(pos, rest.len() + 1))?;
        decode_mutf8(&rest[..len]).ok_or(DexParseError::InvalidString { offset })
    }
}

/// Decodes modified UTF-8 (surrogates encoded separately, NUL as `C0 80`).
fn decode_mutf8(bytes: &[u8]) -> Option<String> {
    let continuation = |b: Option<&u8>| b.filter(|b| *b & 0xc0 == 0x80).map(|b| u16::from(b & 0x3f));

    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter();
    while let Some(&b) = iter.next() {
        let unit = match b {
            0x01..=0x7f => u16::from(b),
            _ if b & 0xe0 == 0xc0 => (u16::from(b & 0x1f) << 6) | continuation(iter.next())?,
            _ if b & 0xf0 == 0xe0 => {
                let high = continuation(iter.next())?;
                let low = continuation(iter.next())?;
                (u16::from(b & 0x0f) << 12) | (high << 6) | low
            }
            _ => return None,
        };
        units.push(unit);
    }
    String::from_utf16(&units).ok()
}

//! Test fixtures: on-disk projects and synthetic dex files.

use crate::project::Project;
use std::io;
use std::path::Path;

/// Writes a one-file Java project under `root`.
///
/// `src/Main.java` holds `on_disk`; the editor buffer holds `buffer`.
///
/// # Errors
///
/// Returns the I/O error if the source file cannot be written.
pub fn write_project(root: &Path, on_disk: &str, buffer: &str) -> io::Result<Project> {
    let project = Project::new("fixture", root);
    std::fs::create_dir_all(project.src_dir())?;
    std::fs::write(project.active_file(), on_disk)?;
    let active = project.active_file().to_path_buf();
    Ok(project.with_active_file(active, buffer))
}

/// Builds a minimal dex container defining `descriptors`, in order.
///
/// Only the header fields and tables read by
/// [`DexFile::parse`](crate::execution::DexFile::parse) are filled in.
#[must_use]
pub fn dex_with_classes(descriptors: &[&str]) -> Vec<u8> {
    const HEADER: usize = 0x70;

    let count = descriptors.len();
    let string_ids_off = HEADER;
    let type_ids_off = string_ids_off + count * 4;
    let class_defs_off = type_ids_off + count * 4;
    let data_off = class_defs_off + count * 32;

    let mut data = Vec::new();
    let mut string_offsets = Vec::with_capacity(count);
    for descriptor in descriptors {
        string_offsets.push(data_off + data.len());
        // ASCII only: the UTF-16 length is the byte length.
        data.extend(uleb128(descriptor.len()));
        data.extend_from_slice(descriptor.as_bytes());
        data.push(0);
    }

    let mut bytes = vec![0u8; data_off];
    bytes[..8].copy_from_slice(b"dex\n035\0");
    let mut put = |offset: usize, value: usize| {
        let value = u32::try_from(value).unwrap_or(u32::MAX);
        bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    };

    put(0x20, data_off + data.len());
    put(0x24, HEADER);
    put(0x28, 0x1234_5678);
    put(0x38, count);
    put(0x3c, string_ids_off);
    put(0x40, count);
    put(0x44, type_ids_off);
    put(0x60, count);
    put(0x64, class_defs_off);
    put(0x68, data.len());
    put(0x6c, data_off);

    for (i, offset) in string_offsets.into_iter().enumerate() {
        put(string_ids_off + i * 4, offset);
        put(type_ids_off + i * 4, i);
        put(class_defs_off + i * 32, i);
    }

    bytes.extend(data);
    bytes
}

fn uleb128(mut value: usize) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

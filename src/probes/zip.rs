//! ZIP probe.
//!
//! A local-file ZIP header can hide two launchable things: a Java
//! archive (conventional `META-INF/MANIFEST.MF` entry) or a Love2D
//! bundle (`main.lua` at the archive root). Only the central-directory
//! entry names are inspected; nothing is decompressed.

use std::io::{Read, Seek, SeekFrom};

use crate::types::{Candidate, Flavor};

/// Probe a seekable byte source as a ZIP archive.
///
/// A corrupt or unreadable archive is a clean failure, not an error.
pub fn probe<R: Read + Seek>(r: &mut R) -> std::io::Result<Option<Candidate>> {
    r.seek(SeekFrom::Start(0))?;

    let archive = match zip::ZipArchive::new(&mut *r) {
        Ok(archive) => archive,
        Err(_) => return Ok(None),
    };

    let mut has_main_lua = false;
    for name in archive.file_names() {
        if name == "META-INF/MANIFEST.MF" {
            return Ok(Some(Candidate::new(Flavor::Jar)));
        }
        if name == "main.lua" {
            has_main_lua = true;
        }
    }

    if has_main_lua {
        return Ok(Some(Candidate::new(Flavor::Love)));
    }

    Ok(None)
}

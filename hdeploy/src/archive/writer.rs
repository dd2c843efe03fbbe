//! ZIP serialization of archive entries.

use super::entry::{ArchiveEntry, EntryContent};
use super::error::AssemblyError;
use super::manifest::{ArchiveManifest, MANIFEST_PATH};
use super::timestamp::zip_timestamp;
use camino::Utf8Path;
use log::{debug, trace};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::time::SystemTime;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entries at or above this size need ZIP64 extensions.
const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

/// Counts reported after an archive has been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    /// Directory entries written.
    pub directories: usize,
    /// File entries written, excluding the manifest.
    pub files: usize,
    /// Uncompressed bytes copied into file entries.
    pub bytes: u64,
}

impl ArchiveSummary {
    /// Total entries written, including the manifest.
    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.directories + self.files + 1
    }
}

/// Write `manifest` followed by `entries` to `sink` as a ZIP archive.
///
/// The manifest is always the first entry. Entries are written in the order
/// given and file content is streamed from its source, so memory use does
/// not grow with file size. The first error aborts the write; the sink then
/// holds an incomplete archive that the caller must discard.
///
/// # Errors
///
/// Returns [`AssemblyError::Conflict`] if two entries share a path or an
/// entry collides with the manifest, [`AssemblyError::Read`] if a source
/// file cannot be read, and [`AssemblyError::Zip`] or [`AssemblyError::Io`]
/// if the sink rejects the write.
pub fn write_archive<W, I>(
    sink: &mut W,
    manifest: &ArchiveManifest,
    entries: I,
) -> Result<ArchiveSummary, AssemblyError>
where
    W: Write + Seek,
    I: IntoIterator<Item = Result<ArchiveEntry, AssemblyError>>,
{
    let mut zip = ZipWriter::new(sink);
    let mut seen: HashSet<String> = HashSet::new();
    let mut summary = ArchiveSummary::default();

    zip.start_file(MANIFEST_PATH, file_options(SystemTime::now(), 0))?;
    zip.write_all(manifest.render().as_bytes())?;
    seen.insert(MANIFEST_PATH.to_owned());

    for entry in entries {
        let entry = entry?;
        let name = entry.path().as_str();
        if !seen.insert(name.to_owned()) {
            return Err(AssemblyError::Conflict {
                path: name.to_owned(),
            });
        }

        match entry.content() {
            EntryContent::Directory => {
                zip.add_directory(name, file_options(entry.modified(), 0))?;
                summary.directories += 1;
            }
            EntryContent::File { source, size } => {
                zip.start_file(name, file_options(entry.modified(), *size))?;
                summary.bytes += copy_source(source, &mut zip)?;
                summary.files += 1;
            }
            EntryContent::Inline(bytes) => {
                let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
                zip.start_file(name, file_options(entry.modified(), size))?;
                zip.write_all(bytes)?;
                summary.bytes += size;
                summary.files += 1;
            }
        }
        trace!("archived {name}");
    }

    zip.finish()?;
    debug!(
        "archive written: {} directories, {} files, {} bytes",
        summary.directories, summary.files, summary.bytes
    );
    Ok(summary)
}

fn file_options(modified: SystemTime, size: u64) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip_timestamp(modified))
        .large_file(size >= ZIP64_THRESHOLD)
}

fn copy_source(source: &Utf8Path, sink: &mut impl Write) -> Result<u64, AssemblyError> {
    let read_error = |err: io::Error| AssemblyError::Read {
        path: source.to_owned(),
        source: err,
    };
    let mut file = File::open(source).map_err(read_error)?;
    copy_chunked(&mut file, sink).map_err(read_error)
}

/// Copy `reader` into `writer` through a fixed 8 KiB buffer.
fn copy_chunked(reader: &mut impl Read, writer: &mut impl Write) -> io::Result<u64> {
    let mut buffer = [0_u8; 8192];
    let mut copied = 0;
    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(copied),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        let chunk = buffer.get(..bytes_read).unwrap_or_default();
        writer.write_all(chunk)?;
        copied += u64::try_from(bytes_read).unwrap_or(u64::MAX);
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;

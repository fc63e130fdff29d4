//! P4K archive reader.
//!
//! The container is a ZIP-family archive with 64-bit extensions, `\`-separated
//! entry paths, and Zstandard entries alongside stored and deflated ones.
//! Archives run to tens of gigabytes, so the reader works through one seekable
//! file handle and streams the central directory through a fixed-size sliding
//! buffer instead of mapping the whole file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHasher;
use stribog_common::{BinaryReader, CancelToken};

use crate::decompress::{DecodeError, Decompressors};
use crate::entry::{CompressionMethod, P4kEntry};
use crate::stats::ArchiveStats;
use crate::zip::{
    CentralDirectoryHeader, Eocd64Locator, Eocd64Record, EocdRecord, LocalFileHeader,
    ZIP64_EXTRA_ID,
};
use crate::{Error, Result};

type FxHashMap<K, V> = HashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Chunk size for streaming the central directory. Large enough to always
/// hold one full entry (fixed header + 3 x 65,535 variable bytes).
const CD_CHUNK_SIZE: usize = 256 * 1024;

/// Entries between progress notifications during indexing.
const PROGRESS_INTERVAL: u64 = 1_000;

/// A P4K archive opened for reading.
///
/// One file handle per session; the entry index is write-once after
/// [`load_all_entries`](Self::load_all_entries) and reads go through an
/// internal lock, so `read_entry` takes `&self`.
pub struct P4kArchive {
    path: PathBuf,
    file: Mutex<Option<File>>,
    file_size: u64,
    total_entries: u64,
    central_dir_offset: u64,
    central_dir_size: u64,
    loaded: bool,
    entries: Vec<P4kEntry>,
    by_name: FxHashMap<String, usize>,
    by_name_lower: FxHashMap<String, usize>,
    decompressors: Decompressors,
}

impl P4kArchive {
    /// Open an archive with the standard decompressor registry.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, Decompressors::standard())
    }

    /// Open an archive with an injected decompressor registry.
    pub fn open_with<P: AsRef<Path>>(path: P, decompressors: Decompressors) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let file_size = file.metadata()?.len();

        let (total_entries, central_dir_offset, central_dir_size) =
            Self::locate_central_directory(&mut file, file_size)?;

        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
            file_size,
            total_entries,
            central_dir_offset,
            central_dir_size,
            loaded: false,
            entries: Vec::new(),
            by_name: FxHashMap::default(),
            by_name_lower: FxHashMap::default(),
            decompressors,
        })
    }

    /// Archive path on disk.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive size in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Entry count declared by the end-of-central-directory record.
    #[inline]
    pub fn total_entries(&self) -> u64 {
        self.total_entries
    }

    /// Whether [`load_all_entries`](Self::load_all_entries) has completed.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Indexed entries in central-directory order. Empty before loading.
    #[inline]
    pub fn entries(&self) -> &[P4kEntry] {
        &self.entries
    }

    /// Index the central directory. Idempotent; no progress or cancellation.
    pub fn load_all_entries(&mut self) -> Result<()> {
        self.load_all_entries_with(|_, _| {}, &CancelToken::new())
    }

    /// Index the central directory with progress notifications and
    /// cooperative cancellation.
    ///
    /// `progress` receives `(entries_indexed, total_entries)` every
    /// [`PROGRESS_INTERVAL`] entries and once at completion. The token is
    /// checked between entries.
    pub fn load_all_entries_with<F>(&mut self, mut progress: F, cancel: &CancelToken) -> Result<()>
    where
        F: FnMut(u64, u64),
    {
        if self.loaded {
            return Ok(());
        }

        let total = self.total_entries;
        let cd_offset = self.central_dir_offset;
        let cd_size = self.central_dir_size;

        let file = self.file.get_mut().as_mut().ok_or(Error::Closed)?;
        file.seek(SeekFrom::Start(cd_offset))?;
        let mut stream = CdStream::new(file, cd_size);

        // Entry counts are vendor-controlled; cap the pre-allocation.
        let mut entries: Vec<P4kEntry> = Vec::with_capacity(total.min(1 << 20) as usize);
        let mut by_name = FxHashMap::default();
        let mut by_name_lower = FxHashMap::default();

        for index in 0..total {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let fixed = 4 + CentralDirectoryHeader::FIXED_SIZE;
            stream.ensure(fixed)?;

            let header: CentralDirectoryHeader = {
                let mut reader = BinaryReader::new(stream.slice(fixed));
                let sig = reader.read_u32()?;
                if sig != CentralDirectoryHeader::SIGNATURE {
                    return Err(Error::InvalidSignature {
                        expected: CentralDirectoryHeader::SIGNATURE,
                        actual: sig,
                    });
                }
                reader.read_struct()?
            };

            let name_len = header.file_name_length as usize;
            let extra_len = header.extra_field_length as usize;
            let comment_len = header.file_comment_length as usize;
            stream.ensure(fixed + name_len + extra_len + comment_len)?;

            let variable = stream.slice(fixed + name_len + extra_len);
            let name_bytes = &variable[fixed..fixed + name_len];
            let extra = &variable[fixed + name_len..];

            let mut compressed_size = header.compressed_size as u64;
            let mut uncompressed_size = header.uncompressed_size as u64;
            let mut local_header_offset = header.local_header_offset as u64;

            if header.compressed_size == u32::MAX
                || header.uncompressed_size == u32::MAX
                || header.local_header_offset == u32::MAX
            {
                match find_zip64_extra(extra)? {
                    Some(body) => {
                        let mut reader = BinaryReader::new(body);
                        if header.uncompressed_size == u32::MAX {
                            uncompressed_size = reader.read_u64()?;
                        }
                        if header.compressed_size == u32::MAX {
                            compressed_size = reader.read_u64()?;
                        }
                        if header.local_header_offset == u32::MAX {
                            local_header_offset = reader.read_u64()?;
                        }
                    }
                    None => {
                        let name = String::from_utf8_lossy(name_bytes);
                        log::warn!(
                            "entry '{}' carries ZIP64 sentinels but no ZIP64 extra field",
                            name
                        );
                    }
                }
            }

            let raw_name = String::from_utf8_lossy(name_bytes);
            let is_directory = raw_name.ends_with('/') || raw_name.ends_with('\\');
            let name = raw_name.replace('/', "\\");

            let idx = entries.len();
            by_name.entry(name.clone()).or_insert(idx);
            by_name_lower.entry(name.to_ascii_lowercase()).or_insert(idx);

            entries.push(P4kEntry {
                name,
                compressed_size,
                uncompressed_size,
                method_code: header.compression_method,
                is_encrypted: header.flags & 1 != 0,
                is_directory,
                local_header_offset,
                crc32: header.crc32,
            });

            stream.consume(fixed + name_len + extra_len + comment_len);

            if (index + 1) % PROGRESS_INTERVAL == 0 {
                progress(index + 1, total);
            }
        }

        progress(total, total);

        self.entries = entries;
        self.by_name = by_name;
        self.by_name_lower = by_name_lower;
        self.loaded = true;
        Ok(())
    }

    /// Look up an entry by name: exact case first, then lower-cased.
    /// Separators are normalized to the container's `\` before the lookup.
    pub fn entry(&self, name: &str) -> Option<&P4kEntry> {
        let normalized = name.replace('/', "\\");
        if let Some(&idx) = self.by_name.get(&normalized) {
            return Some(&self.entries[idx]);
        }
        self.by_name_lower
            .get(&normalized.to_ascii_lowercase())
            .map(|&idx| &self.entries[idx])
    }

    /// Scan entries in central-directory order, returning up to `limit`
    /// whose name matches `pattern`.
    pub fn find_files(&self, pattern: &Regex, limit: usize) -> Vec<&P4kEntry> {
        let mut matches = Vec::new();
        for entry in &self.entries {
            if matches.len() >= limit {
                break;
            }
            if pattern.is_match(&entry.name) {
                matches.push(entry);
            }
        }
        matches
    }

    /// Read and decompress one entry.
    pub fn read_entry(&self, entry: &P4kEntry) -> Result<Vec<u8>> {
        self.read_entry_with(entry, None)
    }

    /// Read and decompress one entry, honoring a cancellation token during
    /// decompression.
    pub fn read_entry_with(&self, entry: &P4kEntry, cancel: Option<&CancelToken>) -> Result<Vec<u8>> {
        if entry.is_encrypted {
            return Err(Error::EncryptedEntry(entry.name.clone()));
        }
        if entry.uncompressed_size == 0 {
            return Ok(Vec::new());
        }

        let compressed = {
            let mut guard = self.file.lock();
            let file = guard.as_mut().ok_or(Error::Closed)?;

            file.seek(SeekFrom::Start(entry.local_header_offset))?;
            let mut fixed = [0u8; 4 + LocalFileHeader::FIXED_SIZE];
            file.read_exact(&mut fixed)?;

            let mut reader = BinaryReader::new(&fixed);
            let sig = reader.read_u32()?;
            if sig != LocalFileHeader::SIGNATURE && sig != LocalFileHeader::SIGNATURE_EXTENDED {
                return Err(Error::InvalidSignature {
                    expected: LocalFileHeader::SIGNATURE,
                    actual: sig,
                });
            }
            let local: LocalFileHeader = reader.read_struct()?;

            // The local name/extra lengths decide where the data starts;
            // they can differ from the central-directory copy.
            file.seek(SeekFrom::Current(local.variable_data_size() as i64))?;

            let mut compressed = vec![0u8; entry.compressed_size as usize];
            file.read_exact(&mut compressed)?;
            compressed
        };

        match entry.compression_method() {
            CompressionMethod::Store => {
                if compressed.len() as u64 != entry.uncompressed_size {
                    return Err(self.decompression_error(
                        entry,
                        format!(
                            "stored entry size mismatch: expected {}, got {}",
                            entry.uncompressed_size,
                            compressed.len()
                        ),
                    ));
                }
                Ok(compressed)
            }
            method @ (CompressionMethod::Deflate | CompressionMethod::Zstd) => {
                let backend =
                    self.decompressors
                        .get(method)
                        .ok_or_else(|| Error::UnsupportedCompression {
                            name: entry.name.clone(),
                            method: entry.method_code,
                        })?;

                let output = backend
                    .decompress(&compressed, entry.uncompressed_size as usize, cancel)
                    .map_err(|e| match e {
                        DecodeError::Cancelled => Error::Cancelled,
                        DecodeError::Failed(reason) => self.decompression_error(entry, reason),
                    })?;

                if output.len() as u64 != entry.uncompressed_size {
                    return Err(self.decompression_error(
                        entry,
                        format!(
                            "decoded length mismatch: expected {}, got {}",
                            entry.uncompressed_size,
                            output.len()
                        ),
                    ));
                }
                Ok(output)
            }
            CompressionMethod::Other(code) => Err(Error::UnsupportedCompression {
                name: entry.name.clone(),
                method: code,
            }),
        }
    }

    /// Read a batch of entries in parallel. Seeks serialize through the
    /// internal lock; decompression runs concurrently.
    #[cfg(feature = "parallel")]
    pub fn read_many(&self, entries: &[&P4kEntry]) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        entries.par_iter().map(|e| self.read_entry(e)).collect()
    }

    /// Aggregate archive statistics over the indexed entries.
    pub fn stats(&self) -> ArchiveStats {
        ArchiveStats::compute(self.file_size, &self.entries)
    }

    /// Release the file handle and clear the index. Idempotent; subsequent
    /// reads fail with [`Error::Closed`].
    pub fn close(&mut self) {
        *self.file.get_mut() = None;
        self.entries.clear();
        self.by_name.clear();
        self.by_name_lower.clear();
        self.loaded = false;
    }

    fn decompression_error(&self, entry: &P4kEntry, reason: String) -> Error {
        Error::Decompression {
            name: entry.name.clone(),
            method: entry.method_code,
            compressed_size: entry.compressed_size,
            uncompressed_size: entry.uncompressed_size,
            reason,
        }
    }

    fn locate_central_directory(file: &mut File, file_size: u64) -> Result<(u64, u64, u64)> {
        let window = file_size.min(EocdRecord::MAX_TAIL_SCAN);
        let mut tail = vec![0u8; window as usize];
        file.seek(SeekFrom::Start(file_size - window))?;
        file.read_exact(&mut tail)?;

        let eocd_rel = find_eocd_signature(&tail).ok_or(Error::EocdNotFound)?;
        let eocd_offset = file_size - window + eocd_rel as u64;

        let mut reader = BinaryReader::new_at(&tail, eocd_rel + 4);
        let eocd: EocdRecord = reader.read_struct()?;

        if eocd.is_zip64() {
            Self::read_zip64_eocd(file, eocd_offset)
        } else {
            Ok((
                eocd.central_dir_count_total as u64,
                eocd.central_dir_offset as u64,
                eocd.central_dir_size as u64,
            ))
        }
    }

    fn read_zip64_eocd(file: &mut File, eocd_offset: u64) -> Result<(u64, u64, u64)> {
        if eocd_offset < Eocd64Locator::TOTAL_SIZE {
            return Err(Error::Zip64EocdNotFound);
        }

        // The locator sits immediately before the EOCD record.
        let locator_offset = eocd_offset - Eocd64Locator::TOTAL_SIZE;
        let mut raw = [0u8; Eocd64Locator::TOTAL_SIZE as usize];
        file.seek(SeekFrom::Start(locator_offset))?;
        file.read_exact(&mut raw)?;

        let mut reader = BinaryReader::new(&raw);
        if reader.read_u32()? != Eocd64Locator::SIGNATURE {
            return Err(Error::Zip64EocdNotFound);
        }
        let locator: Eocd64Locator = reader.read_struct()?;

        let mut raw = [0u8; 4 + std::mem::size_of::<Eocd64Record>()];
        file.seek(SeekFrom::Start(locator.zip64_eocd_offset))?;
        file.read_exact(&mut raw)?;

        let mut reader = BinaryReader::new(&raw);
        let sig = reader.read_u32()?;
        if sig != Eocd64Record::SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: Eocd64Record::SIGNATURE,
                actual: sig,
            });
        }
        let record: Eocd64Record = reader.read_struct()?;

        Ok((
            record.central_dir_count_total,
            record.central_dir_offset,
            record.central_dir_size,
        ))
    }
}

impl std::fmt::Debug for P4kArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P4kArchive")
            .field("path", &self.path)
            .field("file_size", &self.file_size)
            .field("total_entries", &self.total_entries)
            .field("loaded", &self.loaded)
            .finish()
    }
}

/// Scan backwards for the last EOCD signature in the tail window.
fn find_eocd_signature(tail: &[u8]) -> Option<usize> {
    const MIN_EOCD: usize = 22;
    if tail.len() < MIN_EOCD {
        return None;
    }
    (0..=tail.len() - MIN_EOCD)
        .rev()
        .find(|&i| tail[i..i + 4] == EocdRecord::MAGIC)
}

/// Walk the (id, len) runs of an extra field looking for the ZIP64 block.
fn find_zip64_extra(extra: &[u8]) -> Result<Option<&[u8]>> {
    let mut reader = BinaryReader::new(extra);
    while reader.remaining() >= 4 {
        let id = reader.read_u16()?;
        let len = reader.read_u16()? as usize;
        if reader.remaining() < len {
            break;
        }
        let body = reader.read_bytes(len)?;
        if id == ZIP64_EXTRA_ID {
            return Ok(Some(body));
        }
    }
    Ok(None)
}

/// Sliding buffer over the central directory.
///
/// `ensure` compacts the unconsumed tail to the buffer front and refills from
/// the file, so memory stays bounded by one chunk no matter how large the
/// directory is.
struct CdStream<'f> {
    file: &'f mut File,
    buf: Vec<u8>,
    filled: usize,
    pos: usize,
    remaining: u64,
}

impl<'f> CdStream<'f> {
    fn new(file: &'f mut File, cd_size: u64) -> Self {
        Self {
            file,
            buf: vec![0u8; CD_CHUNK_SIZE],
            filled: 0,
            pos: 0,
            remaining: cd_size,
        }
    }

    fn ensure(&mut self, needed: usize) -> Result<()> {
        if self.filled - self.pos >= needed {
            return Ok(());
        }

        self.buf.copy_within(self.pos..self.filled, 0);
        self.filled -= self.pos;
        self.pos = 0;

        if needed > self.buf.len() {
            self.buf.resize(needed, 0);
        }

        while self.filled < needed {
            let want = (self.buf.len() - self.filled).min(self.remaining as usize);
            if want == 0 {
                return Err(Error::Common(stribog_common::Error::UnexpectedEof {
                    needed,
                    available: self.filled,
                }));
            }
            let n = self.file.read(&mut self.buf[self.filled..self.filled + want])?;
            if n == 0 {
                return Err(Error::Common(stribog_common::Error::UnexpectedEof {
                    needed,
                    available: self.filled,
                }));
            }
            self.filled += n;
            self.remaining -= n as u64;
        }
        Ok(())
    }

    #[inline]
    fn slice(&self, len: usize) -> &[u8] {
        &self.buf[self.pos..self.pos + len]
    }

    #[inline]
    fn consume(&mut self, len: usize) {
        self.pos += len;
    }
}

//! Aggregate statistics over an indexed archive.

use hashbrown::HashMap;
use rustc_hash::FxHasher;

use crate::entry::P4kEntry;

type FxHashMap<K, V> = HashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// How many directories/extensions to keep in the ranked lists.
const TOP_N: usize = 20;

/// Summary of an archive's contents.
#[derive(Debug, Clone, Default)]
pub struct ArchiveStats {
    /// Archive size on disk.
    pub file_size: u64,
    /// Number of file entries.
    pub total_files: u64,
    /// Number of directory entries.
    pub total_directories: u64,
    /// Sum of compressed sizes.
    pub total_compressed: u64,
    /// Sum of uncompressed sizes.
    pub total_uncompressed: u64,
    /// `total_compressed / total_uncompressed`, 1.0 for an empty archive.
    pub compression_ratio: f64,
    /// Top-level directories ranked by file count, at most 20.
    pub top_directories: Vec<(String, u64)>,
    /// File extensions ranked by file count, at most 20.
    pub top_extensions: Vec<(String, u64)>,
}

impl ArchiveStats {
    /// Aggregate over the indexed entries.
    pub fn compute(file_size: u64, entries: &[P4kEntry]) -> Self {
        let mut stats = Self {
            file_size,
            compression_ratio: 1.0,
            ..Self::default()
        };

        let mut dirs: FxHashMap<&str, u64> = FxHashMap::default();
        let mut exts: FxHashMap<String, u64> = FxHashMap::default();

        for entry in entries {
            if entry.is_directory {
                stats.total_directories += 1;
                continue;
            }

            stats.total_files += 1;
            stats.total_compressed += entry.compressed_size;
            stats.total_uncompressed += entry.uncompressed_size;

            if let Some(dir) = entry.top_level_dir() {
                *dirs.entry(dir).or_insert(0) += 1;
            }
            if let Some(ext) = entry.extension() {
                *exts.entry(ext).or_insert(0) += 1;
            }
        }

        if stats.total_uncompressed > 0 {
            stats.compression_ratio =
                stats.total_compressed as f64 / stats.total_uncompressed as f64;
        }

        stats.top_directories = rank(dirs.into_iter().map(|(k, v)| (k.to_string(), v)));
        stats.top_extensions = rank(exts.into_iter());
        stats
    }
}

fn rank(counts: impl Iterator<Item = (String, u64)>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = counts.collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_N);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, compressed: u64, uncompressed: u64) -> P4kEntry {
        P4kEntry {
            name: name.to_string(),
            compressed_size: compressed,
            uncompressed_size: uncompressed,
            method_code: 8,
            is_encrypted: false,
            is_directory: false,
            local_header_offset: 0,
            crc32: 0,
        }
    }

    #[test]
    fn aggregates_sizes_and_rankings() {
        let entries = vec![
            file("Data\\Objects\\a.dds", 50, 100),
            file("Data\\Objects\\b.dds", 25, 100),
            file("Data\\Scripts\\c.lua", 10, 40),
            file("Engine\\d.cfg", 5, 10),
            P4kEntry {
                is_directory: true,
                ..file("Data\\Objects\\", 0, 0)
            },
        ];

        let stats = ArchiveStats::compute(1024, &entries);
        assert_eq!(stats.total_files, 4);
        assert_eq!(stats.total_directories, 1);
        assert_eq!(stats.total_compressed, 90);
        assert_eq!(stats.total_uncompressed, 250);
        assert!((stats.compression_ratio - 0.36).abs() < 1e-9);

        assert_eq!(stats.top_directories[0], ("Data".to_string(), 3));
        assert_eq!(stats.top_directories[1], ("Engine".to_string(), 1));
        assert_eq!(stats.top_extensions[0], ("dds".to_string(), 2));
    }

    #[test]
    fn empty_archive_has_unit_ratio() {
        let stats = ArchiveStats::compute(0, &[]);
        assert_eq!(stats.compression_ratio, 1.0);
        assert!(stats.top_directories.is_empty());
    }
}

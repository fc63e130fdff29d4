//! Decompression backends.
//!
//! Each supported method code gets one [`Decompressor`] implementation,
//! assembled into a [`Decompressors`] registry that is constructed once and
//! handed to the archive reader. Store (method 0) is a pass-through handled
//! by the reader itself and has no backend here.

use std::io::Read;

use flate2::read::DeflateDecoder;
use hashbrown::HashMap;
use rustc_hash::FxHasher;
use stribog_common::CancelToken;
use thiserror::Error;

use crate::entry::CompressionMethod;

type FxHashMap<K, V> = HashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Chunk size for cancellation-aware streaming reads.
const DECODE_CHUNK: usize = 64 * 1024;

/// Backend-level decode failure, wrapped by the reader with entry context.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The underlying decoder reported an error.
    #[error("{0}")]
    Failed(String),

    /// Cancellation was requested mid-decode.
    #[error("operation cancelled")]
    Cancelled,
}

/// A decompression strategy for one compression method family.
pub trait Decompressor: Send + Sync {
    /// Decode `input`, producing roughly `expected_size` bytes.
    ///
    /// Implementations poll `cancel` at chunk granularity so huge entries
    /// cannot run unbounded.
    fn decompress(
        &self,
        input: &[u8],
        expected_size: usize,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<u8>, DecodeError>;
}

/// Raw (headerless) DEFLATE, ZIP method 8.
#[derive(Debug, Default)]
pub struct DeflateDecompressor;

impl Decompressor for DeflateDecompressor {
    fn decompress(
        &self,
        input: &[u8],
        expected_size: usize,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<u8>, DecodeError> {
        read_to_end_chunked(DeflateDecoder::new(input), expected_size, cancel)
    }
}

/// Zstandard, ZIP methods 93 and 100.
#[derive(Debug, Default)]
pub struct ZstdDecompressor;

impl Decompressor for ZstdDecompressor {
    fn decompress(
        &self,
        input: &[u8],
        expected_size: usize,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<u8>, DecodeError> {
        let decoder = zstd::Decoder::new(input).map_err(|e| DecodeError::Failed(e.to_string()))?;
        read_to_end_chunked(decoder, expected_size, cancel)
    }
}

fn read_to_end_chunked<R: Read>(
    mut decoder: R,
    expected_size: usize,
    cancel: Option<&CancelToken>,
) -> Result<Vec<u8>, DecodeError> {
    let mut output = Vec::with_capacity(expected_size);
    let mut chunk = [0u8; DECODE_CHUNK];

    loop {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(DecodeError::Cancelled);
            }
        }

        match decoder.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => output.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DecodeError::Failed(e.to_string())),
        }
    }

    Ok(output)
}

/// Registry mapping compression methods to their backends.
pub struct Decompressors {
    backends: FxHashMap<CompressionMethod, Box<dyn Decompressor>>,
}

impl Decompressors {
    /// An empty registry with no backends.
    pub fn empty() -> Self {
        Self {
            backends: FxHashMap::default(),
        }
    }

    /// The standard registry: DEFLATE and Zstandard.
    pub fn standard() -> Self {
        let mut this = Self::empty();
        this.register(CompressionMethod::Deflate, Box::new(DeflateDecompressor));
        this.register(CompressionMethod::Zstd, Box::new(ZstdDecompressor));
        this
    }

    /// Register or replace the backend for a method.
    pub fn register(&mut self, method: CompressionMethod, backend: Box<dyn Decompressor>) {
        self.backends.insert(method, backend);
    }

    /// Look up the backend for a method.
    pub fn get(&self, method: CompressionMethod) -> Option<&dyn Decompressor> {
        self.backends.get(&method).map(|b| b.as_ref())
    }
}

impl Default for Decompressors {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Decompressors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decompressors")
            .field("methods", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

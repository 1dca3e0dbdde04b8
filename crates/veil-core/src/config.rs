//! Tunables shared by the collaborators.

/// Default zstd level. Levels 1-3 are fast with moderate ratios.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Largest plaintext we will compress or inflate back (16 MiB).
pub const MAX_DECOMPRESSED_SIZE: usize = 16 * 1024 * 1024;

/// Largest compressed payload accepted before inflating.
pub const MAX_COMPRESSED_SIZE: usize = MAX_DECOMPRESSED_SIZE + 1024;

/// Salts shorter than this are rejected.
pub const MIN_SALT_LEN: usize = 8;

/// Compressor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    /// zstd level, clamped to 1..=22.
    pub level: i32,
    /// Upper bound on the inflated size (decompression bomb guard).
    pub max_decompressed_size: usize,
}

impl CompressionConfig {
    /// Settings with a specific level and the default size bound.
    pub fn with_level(level: i32) -> Self {
        Self {
            level: level.clamp(1, 22),
            ..Self::default()
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
            max_decompressed_size: MAX_DECOMPRESSED_SIZE,
        }
    }
}

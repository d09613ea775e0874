//! Precompiled SPIR-V shader binary loading.
//!
//! Shader binaries arrive as raw byte streams and are decoded into
//! little-endian 32-bit code words. A byte length that is empty or not a
//! multiple of 4 can never be valid SPIR-V and is a hard configuration
//! error.

use crate::error::{GpuError, Result};
use std::path::Path;

/// Decode a raw byte stream into SPIR-V code words.
pub fn words_from_bytes(path: &Path, bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(GpuError::MalformedShaderBinary {
            path: path.to_path_buf(),
            len: bytes.len(),
        });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Read a precompiled SPIR-V binary from disk.
pub fn load_spirv(path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| GpuError::ShaderIo {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Loaded shader binary {} ({} bytes)", path.display(), bytes.len());
    words_from_bytes(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_malformed() {
        let err = words_from_bytes(Path::new("empty.spv"), &[]).unwrap_err();
        assert!(matches!(err, GpuError::MalformedShaderBinary { len: 0, .. }));
    }

    #[test]
    fn unaligned_input_is_malformed() {
        let err = words_from_bytes(Path::new("odd.spv"), &[1, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(err, GpuError::MalformedShaderBinary { len: 5, .. }));
    }

    #[test]
    fn aligned_input_decodes_to_quarter_words() {
        let bytes: Vec<u8> = (0..64).collect();
        let words = words_from_bytes(Path::new("ok.spv"), &bytes).unwrap();
        assert_eq!(words.len(), 16);
    }

    #[test]
    fn words_are_little_endian() {
        // The SPIR-V magic number, byte by byte.
        let words = words_from_bytes(Path::new("magic.spv"), &[0x03, 0x02, 0x23, 0x07]).unwrap();
        assert_eq!(words, vec![0x0723_0203]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_spirv("definitely/not/here.spv").unwrap_err();
        assert!(matches!(err, GpuError::ShaderIo { .. }));
    }
}

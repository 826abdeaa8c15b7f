//! `.dat` volume files
//!
//! Layout: three little-endian `u16` extents `(nx, ny, nz)` followed by
//! `nx * ny * nz` little-endian `u16` samples in linear-address order.
//! Samples are 12-bit and normalized to `[0, 1]` by dividing by 4095.

use crate::error::{IsoError, IsoResult};
use crate::field::ScalarField;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const SAMPLE_MAX: f32 = 4095.0;
const HEADER_BYTES: usize = 3 * std::mem::size_of::<u16>();

impl ScalarField {
    /// Decode a volume from a byte stream
    pub fn read_dat<R: Read>(reader: &mut R) -> IsoResult<Self> {
        let mut header = Vec::with_capacity(HEADER_BYTES);
        reader.by_ref().take(HEADER_BYTES as u64).read_to_end(&mut header)?;
        if header.len() < HEADER_BYTES {
            return Err(IsoError::Truncated {
                expected: HEADER_BYTES,
                actual: header.len(),
            });
        }

        let nx = u16::from_le_bytes([header[0], header[1]]) as usize;
        let ny = u16::from_le_bytes([header[2], header[3]]) as usize;
        let nz = u16::from_le_bytes([header[4], header[5]]) as usize;

        // The header is untrusted: the buffer grows only as bytes arrive
        let expected = nx
            .checked_mul(ny)
            .and_then(|n| n.checked_mul(nz))
            .and_then(|n| n.checked_mul(2))
            .unwrap_or(usize::MAX);
        let mut raw = Vec::new();
        reader.by_ref().take(expected as u64).read_to_end(&mut raw)?;
        if raw.len() < expected {
            return Err(IsoError::Truncated {
                expected,
                actual: raw.len(),
            });
        }

        let data = raw
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]) as f32 / SAMPLE_MAX)
            .collect();

        Ok(Self::from_vec(nx, ny, nz, data))
    }

    /// Read a volume file from disk
    pub fn import_dat(path: impl AsRef<Path>) -> IsoResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| IsoError::io(path, e))?;
        let mut reader = BufReader::new(file);
        let field = Self::read_dat(&mut reader).map_err(|e| match e {
            IsoError::Stream(source) => IsoError::io(path, source),
            other => other,
        })?;
        tracing::info!(
            "Imported {}x{}x{} volume from {}",
            field.dimension(0),
            field.dimension(1),
            field.dimension(2),
            path.display()
        );
        Ok(field)
    }

    /// Replace this field with the contents of `path`.
    ///
    /// On failure `self` keeps its previous contents.
    pub fn load_dat(&mut self, path: impl AsRef<Path>) -> IsoResult<()> {
        match Self::import_dat(path.as_ref()) {
            Ok(field) => {
                *self = field;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Volume import from {} failed: {}", path.as_ref().display(), e);
                Err(e)
            }
        }
    }

    /// Encode this field. Samples are clamped to `[0, 1]` and quantized.
    ///
    /// Panics if an extent does not fit the 16-bit header.
    pub fn write_dat<W: Write>(&self, writer: &mut W) -> IsoResult<()> {
        for d in self.dims() {
            let d = u16::try_from(d).expect("ScalarField::write_dat -- extent exceeds u16");
            writer.write_all(&d.to_le_bytes())?;
        }
        for &v in self.values() {
            let q = (v.clamp(0.0, 1.0) * SAMPLE_MAX).round() as u16;
            writer.write_all(&q.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn export_dat(&self, path: impl AsRef<Path>) -> IsoResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| IsoError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_dat(&mut writer)
            .and_then(|_| writer.flush().map_err(IsoError::from))
            .map_err(|e| match e {
                IsoError::Stream(source) => IsoError::io(path, source),
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn encode(dims: [u16; 3], samples: &[u16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for d in dims {
            bytes.extend_from_slice(&d.to_le_bytes());
        }
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_read_normalizes_samples() {
        let bytes = encode([2, 1, 1], &[0, 4095]);
        let field = ScalarField::read_dat(&mut bytes.as_slice()).unwrap();
        assert_eq!(field.dims(), [2, 1, 1]);
        assert_relative_eq!(field.get(0, 0, 0), 0.0);
        assert_relative_eq!(field.get(1, 0, 0), 1.0);
    }

    #[test]
    fn test_read_row_major_order() {
        let bytes = encode([2, 2, 1], &[0, 1, 2, 3]);
        let field = ScalarField::read_dat(&mut bytes.as_slice()).unwrap();
        assert_relative_eq!(field.get(1, 0, 0) * 4095.0, 1.0, epsilon = 1e-3);
        assert_relative_eq!(field.get(0, 1, 0) * 4095.0, 2.0, epsilon = 1e-3);
        assert_relative_eq!(field.get(1, 1, 0) * 4095.0, 3.0, epsilon = 1e-3);
    }

    #[test]
    fn test_short_header_is_truncated() {
        let bytes = [1u8, 0, 2];
        let err = ScalarField::read_dat(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, IsoError::Truncated { expected: 6, actual: 3 }));
    }

    #[test]
    fn test_short_body_is_truncated() {
        let mut bytes = encode([2, 2, 2], &[100; 7]);
        bytes.push(0);
        let err = ScalarField::read_dat(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, IsoError::Truncated { expected: 16, actual: 15 }));
    }

    #[test]
    fn test_huge_header_without_body_is_truncated() {
        let bytes = encode([u16::MAX; 3], &[]);
        let err = ScalarField::read_dat(&mut bytes.as_slice()).unwrap_err();
        match err {
            IsoError::Truncated { expected, actual } => {
                assert_eq!(expected, 65535usize.pow(3) * 2);
                assert_eq!(actual, 0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_keeps_previous_field() {
        let mut field = ScalarField::radial(4);
        let before = field.clone();
        let missing = std::env::temp_dir().join("iso_engine_missing_volume_does_not_exist.dat");
        let err = field.load_dat(&missing).unwrap_err();
        assert!(matches!(err, IsoError::Io { .. }));
        assert_eq!(field, before);
    }

    #[test]
    fn test_write_then_import_file() {
        let path = std::env::temp_dir().join(format!("iso_engine_dat_{}.dat", std::process::id()));
        let field = ScalarField::radial(6);
        field.export_dat(&path).unwrap();

        let mut loaded = ScalarField::default();
        loaded.load_dat(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.dims(), [6, 6, 6]);
        for (a, b) in field.values().iter().zip(loaded.values()) {
            assert!((a - b).abs() <= 0.5 / 4095.0 + 1e-6);
        }
    }
}

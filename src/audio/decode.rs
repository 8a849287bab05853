// ABOUTME: PCM decoder implementation
// ABOUTME: Normalizes Int8/Int16/Int32/Float32 little-endian buffers to f32 samples

use crate::audio::Codec;
use crate::error::Error;

/// Decodes raw byte chunks into normalized f32 samples under a fixed codec.
///
/// Integer samples are divided by the codec's full-scale magnitude so output
/// lands in [-1.0, 1.0); `Float32` input is reinterpreted without scaling.
#[derive(Debug, Clone, Copy)]
pub struct PcmDecoder {
    codec: Codec,
}

impl PcmDecoder {
    /// Create a decoder for the given codec.
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    /// The codec this decoder was configured with.
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Decode one chunk into normalized samples.
    ///
    /// Rejects buffers whose length is not a multiple of the codec's sample
    /// width with [`Error::UnsupportedInput`]; nothing is produced in that
    /// case, so a failed decode can never corrupt downstream buffers.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<f32>, Error> {
        let width = self.codec.sample_width();
        if data.len() % width != 0 {
            return Err(Error::UnsupportedInput(format!(
                "buffer of {} bytes is not a whole number of {}-byte samples",
                data.len(),
                width
            )));
        }

        let samples = match self.codec {
            Codec::Int8 => data
                .iter()
                .map(|&b| f32::from(b as i8) / self.codec.full_scale())
                .collect(),
            Codec::Int16 => data
                .chunks_exact(2)
                .map(|c| f32::from(i16::from_le_bytes([c[0], c[1]])) / self.codec.full_scale())
                .collect(),
            Codec::Int32 => data
                .chunks_exact(4)
                .map(|c| {
                    i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32 / self.codec.full_scale()
                })
                .collect(),
            Codec::Float32 => data
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        };
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int8_normalization() {
        let decoder = PcmDecoder::new(Codec::Int8);
        let data = [0i8, 64, -64, 127, -128].map(|v| v as u8);
        let samples = decoder.decode(&data).unwrap();
        assert_eq!(samples, vec![0.0, 0.5, -0.5, 127.0 / 128.0, -1.0]);
    }

    #[test]
    fn test_int16_normalization() {
        let decoder = PcmDecoder::new(Codec::Int16);
        let mut data = Vec::new();
        for v in [0i16, 16_384, -16_384, 32_767, -32_768] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let samples = decoder.decode(&data).unwrap();
        assert_eq!(
            samples,
            vec![0.0, 0.5, -0.5, 32_767.0 / 32_768.0, -1.0]
        );
    }

    #[test]
    fn test_int32_normalization() {
        let decoder = PcmDecoder::new(Codec::Int32);
        let mut data = Vec::new();
        for v in [0i32, i32::MIN, 1 << 30] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let samples = decoder.decode(&data).unwrap();
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], -1.0);
        assert_eq!(samples[2], 0.5);
    }

    #[test]
    fn test_float32_is_identity() {
        let decoder = PcmDecoder::new(Codec::Float32);
        let mut data = Vec::new();
        for v in [0.25f32, -0.75, 1.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let samples = decoder.decode(&data).unwrap();
        assert_eq!(samples, vec![0.25, -0.75, 1.0]);
    }

    #[test]
    fn test_int16_roundtrip_within_one_step() {
        let decoder = PcmDecoder::new(Codec::Int16);
        for v in [-32_768i16, -1234, 0, 1, 9999, 32_767] {
            let samples = decoder.decode(&v.to_le_bytes()).unwrap();
            let reencoded = (samples[0] * 32_768.0).round() as i32;
            assert!(
                (reencoded - i32::from(v)).abs() <= 1,
                "roundtrip of {v} drifted to {reencoded}"
            );
        }
    }

    #[test]
    fn test_misaligned_buffer_rejected() {
        let decoder = PcmDecoder::new(Codec::Int16);
        let err = decoder.decode(&[0u8, 1, 2]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInput(_)));

        let decoder = PcmDecoder::new(Codec::Float32);
        assert!(decoder.decode(&[0u8; 6]).is_err());
        assert!(decoder.decode(&[0u8; 8]).is_ok());
    }

    #[test]
    fn test_empty_buffer_decodes_to_nothing() {
        let decoder = PcmDecoder::new(Codec::Int32);
        assert!(decoder.decode(&[]).unwrap().is_empty());
    }
}

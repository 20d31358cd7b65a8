use keel_types::{Eid, Value, ZonedTime};

use crate::error::{CodecError, CodecResult};
use crate::tags;

/// Walks a byte slice, decoding tagged values in sequence.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder over the given input.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Decode the next tagged value.
    pub fn take_value(&mut self) -> CodecResult<Value> {
        let tag = self.take_u8()?;
        match tag {
            tags::BOOL => {
                let byte = self.take_u8()?;
                match byte {
                    0 => Ok(Value::Bool(false)),
                    1 => Ok(Value::Bool(true)),
                    other => Err(CodecError::InvalidPayload(format!(
                        "bool byte must be 0 or 1, got 0x{other:02x}"
                    ))),
                }
            }
            tags::BYTE => Ok(Value::Byte(self.take_u8()?)),
            tags::INT => Ok(Value::Int(self.take_i32()?)),
            tags::LONG => Ok(Value::Long(self.take_i64()?)),
            tags::STRING => {
                let bytes = self.take_len_prefixed()?;
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| CodecError::InvalidPayload(format!("non-UTF-8 string: {e}")))?;
                Ok(Value::Text(text.to_string()))
            }
            tags::BYTES => Ok(Value::Bytes(self.take_len_prefixed()?.to_vec())),
            tags::INSTANT => Ok(Value::Instant(self.take_i64()?)),
            tags::ZONED => {
                let epoch_seconds = self.take_i64()?;
                let nanos = self.take_i32()?;
                if !(0..1_000_000_000).contains(&nanos) {
                    return Err(CodecError::InvalidPayload(format!(
                        "nanos out of range: {nanos}"
                    )));
                }
                let zone_bytes = self.take_len_prefixed()?;
                let zone = std::str::from_utf8(zone_bytes)
                    .map_err(|e| CodecError::InvalidPayload(format!("non-UTF-8 zone id: {e}")))?;
                Ok(Value::Zoned(ZonedTime::new(
                    epoch_seconds,
                    nanos as u32,
                    zone,
                )))
            }
            tags::EID => {
                let packed = self.take_i64()?;
                Ok(Value::Ref(Eid::from_packed(packed as u64)))
            }
            other => Err(CodecError::UnknownTag(other)),
        }
    }

    // ---------------------------------------------------------------
    // Raw readers
    // ---------------------------------------------------------------

    fn take_u8(&mut self) -> CodecResult<u8> {
        let slice = self.take_slice(1)?;
        Ok(slice[0])
    }

    fn take_i32(&mut self) -> CodecResult<i32> {
        let slice = self.take_slice(4)?;
        Ok(i32::from_be_bytes(slice.try_into().expect("4-byte slice")))
    }

    fn take_i64(&mut self) -> CodecResult<i64> {
        let slice = self.take_slice(8)?;
        Ok(i64::from_be_bytes(slice.try_into().expect("8-byte slice")))
    }

    fn take_len_prefixed(&mut self) -> CodecResult<&'a [u8]> {
        let len = self.take_i32()?;
        if len < 0 {
            return Err(CodecError::InvalidPayload(format!("negative length: {len}")));
        }
        self.take_slice(len as usize)
    }

    fn take_slice(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(CodecError::UnexpectedEof {
                needed: len - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::Encoder;

    fn roundtrip(value: Value) {
        let mut enc = Encoder::new();
        enc.put_value(&value).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.take_value().unwrap(), value);
        assert!(dec.is_exhausted());
    }

    #[test]
    fn roundtrip_every_scalar_kind() {
        roundtrip(Value::Bool(true));
        roundtrip(Value::Bool(false));
        roundtrip(Value::Byte(0xAB));
        roundtrip(Value::Int(i32::MIN));
        roundtrip(Value::Int(i32::MAX));
        roundtrip(Value::Long(i64::MIN));
        roundtrip(Value::Long(i64::MAX));
        roundtrip(Value::text(""));
        roundtrip(Value::text("hello"));
        roundtrip(Value::Bytes(vec![]));
        roundtrip(Value::Bytes(vec![1, 2, 3]));
        roundtrip(Value::Instant(-62_135_596_800_000));
        roundtrip(Value::Zoned(ZonedTime::new(
            1_700_000_000,
            999_999_999,
            "Europe/Berlin",
        )));
        roundtrip(Value::Ref(Eid::new(7, 42)));
    }

    #[test]
    fn roundtrip_multibyte_utf8() {
        // Byte length differs from code-point count.
        roundtrip(Value::text("héllo wörld 日本語"));
    }

    #[test]
    fn unknown_tag() {
        let mut dec = Decoder::new(&[b'x']);
        assert_eq!(dec.take_value().unwrap_err(), CodecError::UnknownTag(b'x'));
    }

    #[test]
    fn eof_on_empty_input() {
        let mut dec = Decoder::new(&[]);
        assert!(matches!(
            dec.take_value().unwrap_err(),
            CodecError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn eof_on_truncated_payload() {
        // Long tag but only 3 payload bytes.
        let mut dec = Decoder::new(&[b'l', 0, 0, 0]);
        assert_eq!(
            dec.take_value().unwrap_err(),
            CodecError::UnexpectedEof { needed: 5 }
        );
    }

    #[test]
    fn eof_on_truncated_string() {
        // Claims 10 bytes, provides 2.
        let mut dec = Decoder::new(&[b's', 0, 0, 0, 10, b'h', b'i']);
        assert!(matches!(
            dec.take_value().unwrap_err(),
            CodecError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn negative_length_rejected() {
        let mut dec = Decoder::new(&[b's', 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            dec.take_value().unwrap_err(),
            CodecError::InvalidPayload(_)
        ));
    }

    #[test]
    fn bad_bool_byte_rejected() {
        let mut dec = Decoder::new(&[b'B', 2]);
        assert!(matches!(
            dec.take_value().unwrap_err(),
            CodecError::InvalidPayload(_)
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut dec = Decoder::new(&[b's', 0, 0, 0, 1, 0xFF]);
        assert!(matches!(
            dec.take_value().unwrap_err(),
            CodecError::InvalidPayload(_)
        ));
    }

    #[test]
    fn sequential_values() {
        let mut enc = Encoder::new();
        enc.put_int(1);
        enc.put_str("two").unwrap();
        enc.put_bool(true);
        let bytes = enc.into_bytes();

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.take_value().unwrap(), Value::Int(1));
        assert_eq!(dec.take_value().unwrap(), Value::text("two"));
        assert_eq!(dec.take_value().unwrap(), Value::Bool(true));
        assert!(dec.is_exhausted());
    }
}

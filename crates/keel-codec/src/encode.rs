use keel_types::{Eid, Value, ZonedTime};

use crate::error::{CodecError, CodecResult};
use crate::tags;

/// Appends tagged values to an owned buffer.
///
/// The encoder is infallible for fixed-width kinds; variable-width payloads
/// fail with [`CodecError::UnsupportedValue`] when a length does not fit
/// the i32 prefix, and EIDs fail when `local` leaves the packable range.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes encoded so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the encoder and return its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Number of bytes encoded so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been encoded yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    // ---------------------------------------------------------------
    // Tagged scalar writers
    // ---------------------------------------------------------------

    /// Encode a bool (`B`, one payload byte).
    pub fn put_bool(&mut self, v: bool) {
        self.buf.push(tags::BOOL);
        self.buf.push(u8::from(v));
    }

    /// Encode a byte (`b`).
    pub fn put_byte(&mut self, v: u8) {
        self.buf.push(tags::BYTE);
        self.buf.push(v);
    }

    /// Encode an int32 (`i`, big-endian).
    pub fn put_int(&mut self, v: i32) {
        self.buf.push(tags::INT);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Encode an int64 (`l`, big-endian).
    pub fn put_long(&mut self, v: i64) {
        self.buf.push(tags::LONG);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Encode a string (`s`, i32 byte length then UTF-8 bytes).
    pub fn put_str(&mut self, v: &str) -> CodecResult<()> {
        self.buf.push(tags::STRING);
        self.put_len_prefixed(v.as_bytes())
    }

    /// Encode a byte array (`a`, i32 length then bytes).
    pub fn put_bytes(&mut self, v: &[u8]) -> CodecResult<()> {
        self.buf.push(tags::BYTES);
        self.put_len_prefixed(v)
    }

    /// Encode an instant (`t`, epoch millis).
    pub fn put_instant(&mut self, epoch_millis: i64) {
        self.buf.push(tags::INSTANT);
        self.buf.extend_from_slice(&epoch_millis.to_be_bytes());
    }

    /// Encode a zoned timestamp (`z`).
    pub fn put_zoned(&mut self, v: &ZonedTime) -> CodecResult<()> {
        if v.nanos >= 1_000_000_000 {
            return Err(CodecError::UnsupportedValue(format!(
                "nanos out of range: {}",
                v.nanos
            )));
        }
        self.buf.push(tags::ZONED);
        self.buf.extend_from_slice(&v.epoch_seconds.to_be_bytes());
        self.buf.extend_from_slice(&(v.nanos as i32).to_be_bytes());
        self.put_len_prefixed(v.zone.as_bytes())
    }

    /// Encode an entity id (`e`, packed i64).
    pub fn put_eid(&mut self, eid: Eid) -> CodecResult<()> {
        let packed = eid.packed().ok_or_else(|| {
            CodecError::UnsupportedValue(format!("eid local out of packable range: {eid}"))
        })?;
        self.buf.push(tags::EID);
        self.buf.extend_from_slice(&(packed as i64).to_be_bytes());
        Ok(())
    }

    /// Encode any [`Value`].
    pub fn put_value(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Bool(v) => self.put_bool(*v),
            Value::Byte(v) => self.put_byte(*v),
            Value::Int(v) => self.put_int(*v),
            Value::Long(v) => self.put_long(*v),
            Value::Text(v) => self.put_str(v)?,
            Value::Bytes(v) => self.put_bytes(v)?,
            Value::Instant(v) => self.put_instant(*v),
            Value::Zoned(v) => self.put_zoned(v)?,
            Value::Ref(v) => self.put_eid(*v)?,
        }
        Ok(())
    }

    fn put_len_prefixed(&mut self, payload: &[u8]) -> CodecResult<()> {
        let len = i32::try_from(payload.len()).map_err(|_| {
            CodecError::UnsupportedValue(format!("payload too large: {} bytes", payload.len()))
        })?;
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(payload);
        Ok(())
    }
}

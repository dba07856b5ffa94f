//! Length-prefixed binary encoding used to build digest input.
//!
//! Every field is written as a one byte tag followed by a fixed-width value
//! or a big-endian `u64` length and the raw bytes, so no two distinct field
//! sequences can produce the same byte stream.

pub mod tags {
    pub const NULL: u8 = 0x00;
    pub const FALSE: u8 = 0x01;
    pub const TRUE: u8 = 0x02;
    pub const INT: u8 = 0x03;
    pub const FLOAT: u8 = 0x04;
    pub const STR: u8 = 0x05;
    pub const BYTES: u8 = 0x06;
    pub const LIST: u8 = 0x07;
    pub const MAP: u8 = 0x08;
    pub const ABSENT: u8 = 0x09;
    pub const UINT: u8 = 0x0a;
}

/// Values that know how to write themselves into a [`CanonicalWriter`].
pub trait Canonical {
    fn write_canonical(&self, out: &mut CanonicalWriter);
}

#[derive(Clone, Debug, Default)]
pub struct CanonicalWriter {
    buf: Vec<u8>,
}

impl CanonicalWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn null(&mut self) -> &mut Self {
        self.buf.push(tags::NULL);
        self
    }

    pub fn absent(&mut self) -> &mut Self {
        self.buf.push(tags::ABSENT);
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(if value { tags::TRUE } else { tags::FALSE });
        self
    }

    pub fn int(&mut self, value: i64) -> &mut Self {
        self.buf.push(tags::INT);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Values that fit an `i64` are written as [`int`](Self::int), so one
    /// number never has two encodings.
    pub fn uint(&mut self, value: u64) -> &mut Self {
        match i64::try_from(value) {
            Ok(signed) => self.int(signed),
            Err(_) => {
                self.buf.push(tags::UINT);
                self.buf.extend_from_slice(&value.to_be_bytes());
                self
            }
        }
    }

    /// `-0.0` is written as `0.0` and every NaN as the canonical quiet NaN.
    pub fn float(&mut self, value: f64) -> &mut Self {
        let normalized = if value.is_nan() {
            f64::NAN
        } else if value == 0.0 {
            0.0
        } else {
            value
        };
        self.buf.push(tags::FLOAT);
        self.buf.extend_from_slice(&normalized.to_bits().to_be_bytes());
        self
    }

    pub fn str(&mut self, value: &str) -> &mut Self {
        self.buf.push(tags::STR);
        self.len_prefixed(value.as_bytes());
        self
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buf.push(tags::BYTES);
        self.len_prefixed(value);
        self
    }

    /// Opens a list of `len` items; the caller writes the items next.
    pub fn list_header(&mut self, len: usize) -> &mut Self {
        self.buf.push(tags::LIST);
        self.buf.extend_from_slice(&(len as u64).to_be_bytes());
        self
    }

    /// Opens a map of `len` entries; the caller writes key/value pairs next.
    pub fn map_header(&mut self, len: usize) -> &mut Self {
        self.buf.push(tags::MAP);
        self.buf.extend_from_slice(&(len as u64).to_be_bytes());
        self
    }

    pub fn value<T: Canonical + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.write_canonical(self);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn len_prefixed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(&(data.len() as u64).to_be_bytes());
        self.buf.extend_from_slice(data);
    }
}

impl Canonical for str {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        out.str(self);
    }
}

impl Canonical for String {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        out.str(self);
    }
}

impl Canonical for bool {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        out.bool(*self);
    }
}

impl Canonical for i64 {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        out.int(*self);
    }
}

impl Canonical for u64 {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        out.uint(*self);
    }
}

impl Canonical for f64 {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        out.float(*self);
    }
}

impl<T: Canonical + ?Sized> Canonical for &T {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        (**self).write_canonical(out);
    }
}

impl<T: Canonical> Canonical for Option<T> {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        match self {
            Some(inner) => inner.write_canonical(out),
            None => {
                out.absent();
            }
        }
    }
}

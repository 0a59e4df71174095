//! Binary PBM (`P4`) encoding and decoding.
//!
//! Layout: ASCII header `P4\n{width} {height}\n`, then `height` rows of
//! `ceil(width / 8)` bytes. Pixels are packed MSB first with `1 = ink`; the
//! low bits of each row's last byte are zero padding.

use tracing::debug;

use crate::raster::{BilevelRaster, Polarity};
use crate::{Result, ThermalImageError};

/// Bytes per packed row for the given pixel width.
pub const fn row_bytes(width: u32) -> usize {
    (width as usize).div_ceil(8)
}

/// A serialized P4 bitmap, ready to hand to a printer transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBitmap {
    width: u32,
    height: u32,
    header_len: usize,
    bytes: Vec<u8>,
}

impl PackedBitmap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Length of the ASCII header, including its trailing newline.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// The ASCII header.
    pub fn header(&self) -> &[u8] {
        &self.bytes[..self.header_len]
    }

    /// Packed rows without the header.
    pub fn raster(&self) -> &[u8] {
        &self.bytes[self.header_len..]
    }

    /// The full P4 byte stream.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Read a P4 stream back into a bilevel raster.
    ///
    /// Accepts any whitespace and `#` comment lines between header fields, as
    /// written by common PBM tools. Pad bits are ignored.
    pub fn parse(data: &[u8]) -> Result<BilevelRaster> {
        let mut cursor = HeaderCursor { data, pos: 0 };

        if !data.starts_with(b"P4") {
            return Err(ThermalImageError::Decode("missing P4 magic".into()));
        }
        match data.get(2) {
            Some(b) if b.is_ascii_whitespace() || *b == b'#' => cursor.pos = 2,
            _ => {
                return Err(ThermalImageError::Decode(
                    "expected whitespace after P4 magic".into(),
                ));
            }
        }
        let width = cursor.next_number()?;
        let height = cursor.next_number()?;
        // Exactly one whitespace byte separates the header from the raster.
        match data.get(cursor.pos) {
            Some(b) if b.is_ascii_whitespace() => cursor.pos += 1,
            _ => {
                return Err(ThermalImageError::Decode(
                    "expected whitespace after PBM dimensions".into(),
                ));
            }
        }
        if width == 0 || height == 0 {
            return Err(ThermalImageError::Decode(format!(
                "PBM dimensions must be non-zero, got {width}x{height}"
            )));
        }

        let stride = row_bytes(width);
        let expected = stride * height as usize;
        let raster = &data[cursor.pos..];
        if raster.len() < expected {
            return Err(ThermalImageError::Decode(format!(
                "PBM raster holds {} bytes, expected {expected}",
                raster.len()
            )));
        }

        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for row in raster[..expected].chunks_exact(stride) {
            for x in 0..width as usize {
                bits.push((row[x / 8] >> (7 - (x % 8))) & 1);
            }
        }
        Ok(BilevelRaster::from_ink_bits(width, height, bits))
    }
}

struct HeaderCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl HeaderCursor<'_> {
    /// Skip whitespace and comments, then read a decimal number.
    fn next_number(&mut self) -> Result<u32> {
        loop {
            match self.data.get(self.pos) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'#') => {
                    while let Some(&b) = self.data.get(self.pos) {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }

        let start = self.pos;
        while self.data.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.data[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                ThermalImageError::Decode(format!("invalid PBM header number at byte {start}"))
            })
    }
}

/// Pack a row of pixels into bytes (MSB first, `1 = ink`).
fn pack_row(row: &[u8], polarity: Polarity, out: &mut Vec<u8>) {
    out.extend(row.chunks(8).map(|chunk| {
        let mut byte_val: u8 = 0;
        for (i, &px) in chunk.iter().enumerate() {
            if polarity.is_ink(px) {
                byte_val |= 1 << (7 - i);
            }
        }
        byte_val
    }));
}

/// Serialize a bilevel raster as binary PBM.
///
/// `LightIsOne` rasters are inverted here so the output is always `1 = ink`.
pub fn pack(raster: &BilevelRaster) -> PackedBitmap {
    let (width, height) = raster.dimensions();
    let header = format!("P4\n{width} {height}\n");
    let header_len = header.len();

    let mut bytes = Vec::with_capacity(header_len + row_bytes(width) * height as usize);
    bytes.extend_from_slice(header.as_bytes());
    for row in raster.rows() {
        pack_row(row, raster.polarity(), &mut bytes);
    }

    debug!(
        width,
        height,
        polarity = ?raster.polarity(),
        total = bytes.len(),
        "Packed PBM bitmap"
    );

    PackedBitmap {
        width,
        height,
        header_len,
        bytes,
    }
}

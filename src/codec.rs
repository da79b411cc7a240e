//! Compact number encoding for persisted statistics
//!
//! The two high bits of the first byte select the width:
//!
//! ```text
//! 00xxxxxx                      values < 2^6
//! 01xxxxxx x8                   values < 2^14
//! 10xxxxxx x8 x8 x8             values < 2^30
//! 11000000 + 8 bytes big-endian everything else
//! ```

use crate::error::{Result, StatsError};

/// Append `v` in compact form.
pub fn write_num(out: &mut Vec<u8>, v: u64) {
    if v < 0x40 {
        out.push(v as u8);
    } else if v < 0x4000 {
        out.push(0x40 | (v >> 8) as u8);
        out.push(v as u8);
    } else if v < 0x4000_0000 {
        out.push(0x80 | (v >> 24) as u8);
        out.push((v >> 16) as u8);
        out.push((v >> 8) as u8);
        out.push(v as u8);
    } else {
        out.push(0xC0);
        out.extend_from_slice(&v.to_be_bytes());
    }
}

/// Bounds-checked cursor over a persisted image.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Current offset
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// True once every byte has been consumed
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(StatsError::Decode(format!(
                "need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.data.len().saturating_sub(self.pos)
            ))),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_num(&mut self) -> Result<u64> {
        let first = self.read_u8()?;
        let low = u64::from(first & 0x3F);
        match first >> 6 {
            0 => Ok(low),
            1 => Ok(low << 8 | u64::from(self.read_u8()?)),
            2 => {
                let rest = self.take(3)?;
                Ok(low << 24 | u64::from(rest[0]) << 16 | u64::from(rest[1]) << 8 | u64::from(rest[2]))
            }
            _ => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(self.take(8)?);
                Ok(u64::from_be_bytes(bytes))
            }
        }
    }

    /// Read a number that must fit in 32 bits.
    pub fn read_num_u32(&mut self) -> Result<u32> {
        let at = self.pos;
        let v = self.read_num()?;
        u32::try_from(v).map_err(|_| StatsError::Decode(format!("value {} at offset {} exceeds u32", v, at)))
    }

    /// Read a length-prefixed byte string.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_num()? as usize;
        self.take(len)
    }
}

/// Append a length-prefixed byte string.
pub fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_num(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        let cases: [(u64, usize); 6] = [
            (0, 1),
            (0x3F, 1),
            (0x40, 2),
            (0x3FFF, 2),
            (0x3FFF_FFFF, 4),
            (u64::MAX, 9),
        ];
        for (v, width) in cases {
            let mut out = Vec::new();
            write_num(&mut out, v);
            assert_eq!(out.len(), width, "width of {}", v);
            let mut reader = ByteReader::new(&out);
            assert_eq!(reader.read_num().unwrap(), v);
            assert!(reader.is_at_end());
        }
    }

    #[test]
    fn test_truncated() {
        let mut out = Vec::new();
        write_num(&mut out, 0x1234_5678);
        out.truncate(2);
        let mut reader = ByteReader::new(&out);
        assert!(matches!(reader.read_num(), Err(StatsError::Decode(_))));
    }

    #[test]
    fn test_u32_overflow() {
        let mut out = Vec::new();
        write_num(&mut out, u64::from(u32::MAX) + 1);
        let mut reader = ByteReader::new(&out);
        assert!(reader.read_num_u32().is_err());
    }

    #[test]
    fn test_bytes() {
        let mut out = Vec::new();
        write_bytes(&mut out, b"name");
        write_bytes(&mut out, b"");
        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.read_bytes().unwrap(), b"name");
        assert_eq!(reader.read_bytes().unwrap(), b"");
        assert!(reader.is_at_end());
    }
}

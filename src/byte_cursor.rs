//! Random-access, read-only view over a class-file buffer.

use std::io::Cursor;

use binrw::meta::ReadEndian;
use binrw::BinRead;

use crate::error::{ReadError, ReadResult};

/// A borrowed window into a byte buffer.
///
/// Every read is addressed by an offset relative to the start of the window, so
/// callers compute table positions themselves. `base` is the absolute offset of
/// the window in the original buffer and is only used for diagnostics.
#[derive(Clone, Copy, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    base: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, base: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Absolute position of this window in the buffer it was cut from.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn u8_at(&self, offset: usize) -> ReadResult<u8> {
        Ok(self.bytes_at(offset, 1)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> ReadResult<u16> {
        let b = self.bytes_at(offset, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u32_at(&self, offset: usize) -> ReadResult<u32> {
        let b = self.bytes_at(offset, 4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32_at(&self, offset: usize) -> ReadResult<i32> {
        self.u32_at(offset).map(|v| v as i32)
    }

    pub fn bytes_at(&self, offset: usize, len: usize) -> ReadResult<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| {
                ReadError::malformed(
                    self.base + offset,
                    format!("truncated: needed {} byte(s), {} available", len, self.remaining(offset)),
                )
            })
    }

    /// A sub-view starting at `offset` and running to the end of this window.
    pub fn offset_cursor(&self, offset: usize) -> ReadResult<ByteCursor<'a>> {
        let data = self.data.get(offset..).ok_or_else(|| {
            ReadError::malformed(self.base + offset, "offset past end of buffer")
        })?;
        Ok(ByteCursor {
            data,
            base: self.base + offset,
        })
    }

    /// Decode a fixed-shape record at `offset`, returning it with its byte length.
    pub fn read_at<T>(&self, offset: usize) -> ReadResult<(T, usize)>
    where
        T: ReadEndian + for<'b> BinRead<Args<'b> = ()>,
    {
        let window = self.offset_cursor(offset)?;
        let mut reader = Cursor::new(window.data);
        let value = T::read(&mut reader).map_err(|e| {
            ReadError::malformed(window.base + reader.position() as usize, e.to_string())
        })?;
        Ok((value, reader.position() as usize))
    }

    fn remaining(&self, offset: usize) -> usize {
        self.data.len().saturating_sub(offset)
    }
}

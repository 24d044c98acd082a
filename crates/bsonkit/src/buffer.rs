//! 字节缓冲区模块
//!
//! 为编解码器提供底层读写原语:
//!
//! - `ReadBuffer`：借用字节切片的读游标，支持顺序/随机读取与零拷贝切片
//! - `WriteBuffer`：基于 `BytesMut` 的可增长写缓冲区，支持追加与回填 int32
//!
//! 所有多字节数值均为小端序。

use crate::{BsonError, BsonResult};
use bytes::{BufMut, Bytes, BytesMut};

/// 读缓冲区
///
/// 读取的字节区间借用自底层切片，生命周期与切片一致。
#[derive(Debug, Clone, Copy)]
pub struct ReadBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ReadBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 游标位于 `pos` 的读缓冲区，调用方保证 `pos <= data.len()`
    pub(crate) fn from_parts(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// 移动读游标
    ///
    /// # Arguments
    /// * `pos` - 新位置，允许等于长度(即末尾)
    pub fn set_position(&mut self, pos: usize) -> BsonResult<()> {
        if pos > self.data.len() {
            return Err(BsonError::BufferUnderrun {
                need: pos,
                have: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    fn ensure(&self, n: usize) -> BsonResult<()> {
        if n > self.remaining() {
            return Err(BsonError::BufferUnderrun {
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> BsonResult<u8> {
        self.ensure(1)?;
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_i8(&mut self) -> BsonResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_array<const N: usize>(&mut self) -> BsonResult<[u8; N]> {
        self.ensure(N)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(buf)
    }

    pub fn read_i32_le(&mut self) -> BsonResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// 读取 int32 但不移动游标
    pub fn peek_i32_le(&self) -> BsonResult<i32> {
        self.ensure(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_i64_le(&mut self) -> BsonResult<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> BsonResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64_le(&mut self) -> BsonResult<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// 读取 `len` 个原始字节，返回借用的切片
    pub fn read_bytes(&mut self, len: usize) -> BsonResult<&'a [u8]> {
        self.ensure(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// 按绝对偏移截取子区间，不移动游标
    pub fn slice(&self, offset: usize, len: usize) -> BsonResult<&'a [u8]> {
        let end = offset.checked_add(len).ok_or(BsonError::BufferUnderrun {
            need: usize::MAX,
            have: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(BsonError::BufferUnderrun {
                need: end,
                have: self.data.len(),
            });
        }
        Ok(&self.data[offset..end])
    }

    /// 读取 C 字符串: UTF-8 字节 + 单个 NUL
    pub fn read_cstr(&mut self) -> BsonResult<&'a str> {
        let rest = &self.data[self.pos..];
        let nul = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            BsonError::InvalidCString(format!("missing terminator at offset {}", self.pos))
        })?;
        let s = std::str::from_utf8(&rest[..nul])?;
        self.pos += nul + 1;
        Ok(s)
    }

    /// 读取 BSON 字符串: int32 (字节数 + 1) | UTF-8 字节 | NUL
    pub fn read_string(&mut self) -> BsonResult<&'a str> {
        let start = self.pos;
        let len = self.read_i32_le()?;
        if len < 1 {
            self.pos = start;
            return Err(BsonError::InvalidDocument(format!(
                "string length {} at offset {}",
                len, start
            )));
        }
        let bytes = self.read_bytes(len as usize)?;
        let (body, terminator) = bytes.split_at(bytes.len() - 1);
        if terminator != [0] {
            return Err(BsonError::InvalidDocument(format!(
                "string at offset {} is not NUL-terminated",
                start
            )));
        }
        Ok(std::str::from_utf8(body)?)
    }
}

/// 将字节数转换为 int32 长度字段
pub(crate) fn length_prefix(len: usize) -> BsonResult<i32> {
    i32::try_from(len).map_err(|_| BsonError::DocumentTooLarge(i32::MAX as usize))
}

/// 写缓冲区
///
/// 写入过程中缓冲区按需增长，初始容量只是性能提示。
#[derive(Debug, Default)]
pub struct WriteBuffer {
    buf: BytesMut,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_i32_le(&mut self, v: i32) {
        self.buf.put_i32_le(v);
    }

    pub fn put_i64_le(&mut self, v: i64) {
        self.buf.put_i64_le(v);
    }

    pub fn put_u64_le(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    pub fn put_f64_le(&mut self, v: f64) {
        self.buf.put_f64_le(v);
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// 写入 C 字符串
    ///
    /// 内含 NUL 的字符串会破坏流结构，直接拒绝，不写入任何字节。
    pub fn put_cstr(&mut self, s: &str) -> BsonResult<()> {
        if s.as_bytes().contains(&0) {
            return Err(BsonError::InvalidCString(format!(
                "{:?} contains an interior NUL",
                s
            )));
        }
        self.buf.put_slice(s.as_bytes());
        self.buf.put_u8(0);
        Ok(())
    }

    /// 写入 BSON 字符串，长度字段计入结尾 NUL
    ///
    /// 超出 int32 的字符串返回 `DocumentTooLarge`，不写入任何字节。
    pub fn put_string(&mut self, s: &str) -> BsonResult<()> {
        let len = length_prefix(s.len() + 1)?;
        self.buf.put_i32_le(len);
        self.buf.put_slice(s.as_bytes());
        self.buf.put_u8(0);
        Ok(())
    }

    /// 回填先前写入的 int32 字段
    ///
    /// # Arguments
    /// * `offset` - 字段起始偏移，必须已写入 4 字节
    pub fn patch_i32_le(&mut self, offset: usize, value: i32) -> BsonResult<()> {
        let end = offset + 4;
        if end > self.buf.len() {
            return Err(BsonError::BufferUnderrun {
                need: end,
                have: self.buf.len(),
            });
        }
        self.buf[offset..end].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// 丢弃 `len` 之后的字节，用于回滚未完成的写入
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-2i32).to_le_bytes());
        data.extend_from_slice(&7i64.to_le_bytes());
        data.extend_from_slice(&1.5f64.to_le_bytes());
        data.push(0xFE);

        let mut buf = ReadBuffer::new(&data);
        assert_eq!(buf.peek_i32_le().unwrap(), -2);
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.read_i32_le().unwrap(), -2);
        assert_eq!(buf.read_i64_le().unwrap(), 7);
        assert_eq!(buf.read_f64_le().unwrap(), 1.5);
        assert_eq!(buf.read_i8().unwrap(), -2);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_underrun_is_reported() {
        let data = [1u8, 2, 3];
        let mut buf = ReadBuffer::new(&data);
        assert_eq!(
            buf.read_i32_le(),
            Err(BsonError::BufferUnderrun { need: 4, have: 3 })
        );
        assert_eq!(buf.position(), 0);
        assert!(buf.slice(2, 2).is_err());
        assert_eq!(buf.slice(1, 2).unwrap(), &[2, 3]);
    }

    #[test]
    fn test_cstr_and_string() {
        let mut out = WriteBuffer::new();
        out.put_cstr("naïve").unwrap();
        out.put_string("héllo").unwrap();
        let bytes = out.freeze();

        let mut buf = ReadBuffer::new(&bytes);
        assert_eq!(buf.read_cstr().unwrap(), "naïve");
        assert_eq!(buf.read_string().unwrap(), "héllo");
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_cstr_without_terminator() {
        let mut buf = ReadBuffer::new(b"abc");
        assert!(matches!(buf.read_cstr(), Err(BsonError::InvalidCString(_))));
    }

    #[test]
    fn test_put_cstr_rejects_interior_nul() {
        let mut out = WriteBuffer::new();
        assert!(out.put_cstr("a\0b").is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_length_prefix_bounds() {
        assert_eq!(length_prefix(0).unwrap(), 0);
        assert_eq!(length_prefix(i32::MAX as usize).unwrap(), i32::MAX);
        assert_eq!(
            length_prefix(i32::MAX as usize + 1),
            Err(BsonError::DocumentTooLarge(i32::MAX as usize))
        );
    }

    #[test]
    fn test_patch_i32() {
        let mut out = WriteBuffer::with_capacity(1);
        out.put_i32_le(0);
        out.put_u8(9);
        out.patch_i32_le(0, 5).unwrap();
        assert_eq!(out.as_slice(), &[5, 0, 0, 0, 9]);
        assert!(out.patch_i32_le(2, 1).is_err());
    }
}

//! 字节源抽象.
//!
//! 读取器只需要两种能力: 在不消耗的前提下预读至多 N 字节,
//! 以及丢弃已预读的 K 字节. 缓冲区容量固定, 从不增长.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use mpa_core::MpaResult;

/// 字节源 trait
///
/// 实现此 trait 以支持不同的数据来源 (文件、内存、网络流等).
pub trait ByteSource {
    /// 缓冲区容量, 即单次 `peek` 的上限
    fn capacity(&self) -> usize;

    /// 预读至多 `n` 字节, 不消耗
    ///
    /// 只有到达流末尾时才返回少于 `n` 字节. `n` 超过容量时返回
    /// `InvalidInput` 错误.
    fn peek(&mut self, n: usize) -> io::Result<&[u8]>;

    /// 丢弃 `n` 个已预读的字节, 返回实际丢弃的字节数
    fn discard(&mut self, n: usize) -> io::Result<usize>;

    /// 最近一次 `discard` 丢弃的字节
    ///
    /// 在下一次 `peek` 之前有效.
    fn discarded(&self) -> &[u8];
}

fn capacity_exceeded(n: usize, capacity: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("预读 {n} 字节超过缓冲区容量 {capacity}"),
    )
}

fn discard_exceeded(n: usize, buffered: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("丢弃 {n} 字节超过已预读的 {buffered} 字节"),
    )
}

/// 带固定容量缓冲区的字节源
///
/// 包装任意 [`Read`], 按需填充缓冲区. 缓冲区尾部空间不足时,
/// 先把未读数据搬到开头再继续读取.
pub struct BufferedSource<R> {
    /// 内部读取器
    inner: R,
    /// 读缓冲区
    buffer: Box<[u8]>,
    /// 下一个未读字节的位置
    pos: usize,
    /// 缓冲区中有效数据的末尾
    end: usize,
    /// 最近一次丢弃区间的起点, 区间为 `discard_start..pos`
    discard_start: usize,
    /// 内部读取器已返回 0
    eof: bool,
}

impl<R: Read> BufferedSource<R> {
    /// 创建指定容量的字节源
    pub fn new(inner: R, capacity: usize) -> Self {
        Self {
            inner,
            buffer: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
            end: 0,
            discard_start: 0,
            eof: false,
        }
    }

    /// 获取内部读取器的引用
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// 消耗自身, 返回内部读取器 (缓冲区中未读的数据被丢弃)
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// 缓冲区中未读的字节数
    pub fn buffered(&self) -> usize {
        self.end - self.pos
    }

    /// 将未读数据搬到缓冲区开头
    fn compact(&mut self) {
        self.buffer.copy_within(self.pos..self.end, 0);
        self.end -= self.pos;
        self.pos = 0;
        self.discard_start = 0;
    }

    /// 读取一次, 返回是否读到了数据
    fn fill(&mut self) -> io::Result<bool> {
        loop {
            match self.inner.read(&mut self.buffer[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl BufferedSource<File> {
    /// 从文件路径打开 (只读)
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> MpaResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file, capacity))
    }
}

impl<R: Read> ByteSource for BufferedSource<R> {
    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        if n > self.buffer.len() {
            return Err(capacity_exceeded(n, self.buffer.len()));
        }
        while self.buffered() < n && !self.eof {
            if self.pos + n > self.buffer.len() {
                self.compact();
            }
            self.fill()?;
        }
        let end = self.end.min(self.pos + n);
        Ok(&self.buffer[self.pos..end])
    }

    fn discard(&mut self, n: usize) -> io::Result<usize> {
        if n > self.buffered() {
            return Err(discard_exceeded(n, self.buffered()));
        }
        self.discard_start = self.pos;
        self.pos += n;
        Ok(n)
    }

    fn discarded(&self) -> &[u8] {
        &self.buffer[self.discard_start..self.pos]
    }
}

/// 内存切片字节源
///
/// 零拷贝地读取内存中的数据, `peek` 的窗口仍受容量限制,
/// 行为与同容量的 [`BufferedSource`] 一致. 用于测试和内存中处理.
pub struct SliceSource<'a> {
    /// 数据
    data: &'a [u8],
    /// 当前位置
    pos: usize,
    /// 最近一次丢弃区间的起点
    discard_start: usize,
    /// 预读窗口大小
    capacity: usize,
}

impl<'a> SliceSource<'a> {
    /// 从切片创建
    pub fn new(data: &'a [u8], capacity: usize) -> Self {
        Self {
            data,
            pos: 0,
            discard_start: 0,
            capacity,
        }
    }

    /// 剩余未读的字节
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl ByteSource for SliceSource<'_> {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        if n > self.capacity {
            return Err(capacity_exceeded(n, self.capacity));
        }
        let end = self.data.len().min(self.pos + n);
        Ok(&self.data[self.pos..end])
    }

    fn discard(&mut self, n: usize) -> io::Result<usize> {
        let available = self.data.len() - self.pos;
        if n > available.min(self.capacity) {
            return Err(discard_exceeded(n, available.min(self.capacity)));
        }
        self.discard_start = self.pos;
        self.pos += n;
        Ok(n)
    }

    fn discarded(&self) -> &[u8] {
        &self.data[self.discard_start..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 每次 read 最多返回 `chunk` 字节的读取器, 模拟网络流
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.chunk).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// 总是失败的读取器
    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("磁盘损坏"))
        }
    }

    fn numbers(n: usize) -> Vec<u8> {
        (0..n).map(|i| i as u8).collect()
    }

    #[test]
    fn test_缓冲源_预读不消耗() {
        let data = numbers(32);
        let mut src = BufferedSource::new(&data[..], 8);
        assert_eq!(src.peek(4).unwrap(), &[0, 1, 2, 3]);
        assert_eq!(src.peek(8).unwrap(), &data[..8]);
        assert_eq!(src.discard(3).unwrap(), 3);
        assert_eq!(src.discarded(), &[0, 1, 2]);
        assert_eq!(src.peek(2).unwrap(), &[3, 4]);
    }

    #[test]
    fn test_缓冲源_分块读取时补齐() {
        let data = numbers(20);
        let mut src = BufferedSource::new(
            Trickle {
                data: &data,
                chunk: 3,
            },
            8,
        );
        assert_eq!(src.peek(8).unwrap(), &data[..8]);
        src.discard(6).unwrap();
        // 需要搬移才能再预读 8 字节
        assert_eq!(src.peek(8).unwrap(), &data[6..14]);
        src.discard(8).unwrap();
        assert_eq!(src.discarded(), &data[6..14]);
        assert_eq!(src.peek(8).unwrap(), &data[14..20]);
        assert_eq!(src.peek(8).unwrap().len(), 6);
    }

    #[test]
    fn test_缓冲源_超出容量() {
        let data = numbers(32);
        let mut src = BufferedSource::new(&data[..], 8);
        let err = src.peek(9).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        // 一次 read 即填满缓冲区, 已缓冲 8 字节
        src.peek(4).unwrap();
        assert_eq!(
            src.discard(9).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_缓冲源_空流() {
        let mut src = BufferedSource::new(io::empty(), 8);
        assert!(src.peek(8).unwrap().is_empty());
        assert!(src.discarded().is_empty());
    }

    #[test]
    fn test_缓冲源_读取错误透传() {
        let mut src = BufferedSource::new(Broken, 8);
        let err = src.peek(4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn test_切片源() {
        let data = numbers(10);
        let mut src = SliceSource::new(&data, 4);
        assert_eq!(src.capacity(), 4);
        assert_eq!(src.peek(4).unwrap(), &[0, 1, 2, 3]);
        assert!(src.peek(5).is_err());
        src.discard(4).unwrap();
        assert_eq!(src.discarded(), &[0, 1, 2, 3]);
        src.peek(4).unwrap();
        src.discard(4).unwrap();
        assert_eq!(src.peek(4).unwrap(), &[8, 9]);
        assert!(src.discard(3).is_err());
        src.discard(2).unwrap();
        assert!(src.remaining().is_empty());
        assert!(src.peek(4).unwrap().is_empty());
    }
}

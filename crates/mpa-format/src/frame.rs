//! 帧快照.
//!
//! [`FrameReader`](crate::FrameReader) 暴露的原始帧是借用视图, 下一次
//! `advance` 后失效. 需要保留数据时调用 `FrameReader::frame` 得到独立的
//! [`Frame`], 字段布局参照压缩数据包.

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use mpa_codec::{FRAME_HEADER_SIZE, FrameHeader};
use mpa_core::{Rational, Timestamp};

/// 读取帧头后 2 字节的错误校验字
///
/// 仅当帧头的保护位置位时存在.
pub(crate) fn error_check_word(header: &FrameHeader, raw: &[u8]) -> Option<u16> {
    if !header.protection {
        return None;
    }
    raw.get(FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + 2)
        .map(BigEndian::read_u16)
}

/// 独立持有数据的一帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 帧头
    pub header: FrameHeader,
    /// 整帧数据 (帧头 + CRC + 数据 + 填充)
    pub data: Bytes,
    /// 帧起始的流偏移
    pub offset: u64,
    /// 显示时间戳 (以 time_base 为单位, 即采样数)
    pub pts: i64,
    /// 帧时长 (采样数)
    pub duration: i64,
    /// 时间基, 1/采样率
    pub time_base: Rational,
}

impl Frame {
    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 帧结束的流偏移, 即下一帧的起始位置
    pub fn end_offset(&self) -> u64 {
        self.offset + self.data.len() as u64
    }

    /// 错误校验字
    pub fn error_check(&self) -> Option<u16> {
        error_check_word(&self.header, &self.data)
    }

    /// 帧头与 CRC 之后的数据部分 (含填充)
    pub fn payload(&self) -> Bytes {
        let start = if self.header.protection {
            FRAME_HEADER_SIZE + 2
        } else {
            FRAME_HEADER_SIZE
        };
        self.data.slice(start.min(self.data.len())..)
    }

    /// 帧起始时间
    pub fn timestamp(&self) -> Timestamp {
        Timestamp::new(self.pts, self.time_base)
    }
}

//! # mpa-codec
//!
//! MPEG 音频 (ISO/IEC 11172-3, 含 ISO/IEC 13818-3 低采样率扩展) 帧头编解码.
//!
//! 纯函数, 无 I/O 与缓冲:
//! - [`FrameHeader::decode`] / [`FrameHeader::encode`]: 4 字节线上格式与结构体互转
//! - [`sync`] / [`is_syncword`]: 同步码搜索
//! - [`tables`]: 比特率、采样率、每帧采样数、slot 大小查找表

pub mod header;
pub mod sync;
pub mod tables;

// 重导出常用类型
pub use header::{
    BitrateIndex, Emphasis, FRAME_HEADER_SIZE, FrameHeader, Mode, ModeExtension, MpegLayer,
    MpegVersion, SamplingFrequencyIndex, Slots,
};
pub use sync::{is_syncword, sync};
pub use tables::{sample_count, slot_size};

//! # mpa-format
//!
//! MPEG 音频码流的增量帧读取器.
//!
//! 在固定容量的缓冲区上逐帧扫描, 定位并校验帧边界,
//! 暴露帧头、原始帧字节、流偏移与累计播放时长.

pub mod frame;
pub mod io;
pub mod reader;

// 重导出常用类型
pub use frame::Frame;
pub use io::{BufferedSource, ByteSource, SliceSource};
pub use reader::{
    DEFAULT_BUFFER_SIZE, ELAPSED_TICK_RATE, ELAPSED_TIME_BASE, FrameError, FrameReader, MAX_FRAME_LENGTH,
    ReaderConfig, ReaderState,
};

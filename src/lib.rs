//! # mpa
//!
//! 纯 Rust 实现的 MPEG 音频 (MPEG-1/2/2.5, Layer I/II/III) 帧解析库.
//!
//! 在任意字节流中定位帧边界, 解码 4 字节帧头, 计算比特率、采样率、
//! 帧长与累计播放时长, 并可把帧头重新编码为线上格式.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use mpa::format::{FrameReader, ReaderConfig};
//!
//! let mut reader = FrameReader::open("input.mp3", &ReaderConfig::default())?;
//! while reader.advance()? {
//!     if let Some(header) = reader.header() {
//!         println!("{} @ {}", header, reader.frame_offset());
//!     }
//! }
//! println!("时长: {}", reader.elapsed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `mpa-core` | 错误类型、有理数与时间戳 |
//! | `mpa-codec` | 帧头编解码、同步码搜索与标准查找表 |
//! | `mpa-format` | 增量帧读取器与字节源 |

/// 核心类型: 错误、有理数、时间戳
pub use mpa_core as core;

/// 帧头编解码
pub use mpa_codec as codec;

/// 增量帧读取器
pub use mpa_format as format;

/// 获取 mpa 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! # mpa-core
//!
//! MPEG 音频帧解析库的核心类型, 供 `mpa-codec` 与 `mpa-format` 共用.
//!
//! - [`MpaError`]: 统一错误类型
//! - [`Rational`]: 时间基
//! - [`Timestamp`]: 精确的播放时长累计

pub mod error;
pub mod rational;
pub mod timestamp;

// 重导出常用类型
pub use error::{HeaderField, MpaError, MpaResult};
pub use rational::Rational;
pub use timestamp::Timestamp;

//! 统一错误类型定义.
//!
//! 所有 mpa crate 共用的错误类型. 干净的流结束不是错误,
//! 由读取器以 `Ok(false)` 表示.

use std::fmt;

use thiserror::Error;

/// 帧头中可能无效的字段
///
/// 供调用方做机器可读的判断, 见 [`HeaderField::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    /// MPEG 版本为保留值
    Version,
    /// 层为保留值
    Layer,
    /// 比特率索引在当前版本/层下无定义
    BitrateIndex,
    /// 采样率索引为保留值
    SamplingFrequencyIndex,
    /// 去加重为保留值
    Emphasis,
}

impl HeaderField {
    /// 简短的机器可读原因
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Version => "mpeg version",
            Self::Layer => "mpeg layer",
            Self::BitrateIndex => "bitrate index",
            Self::SamplingFrequencyIndex => "sampling frequency index",
            Self::Emphasis => "emphasis",
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}", self.as_str())
    }
}

/// mpa 统一错误类型
#[derive(Debug, Error)]
pub enum MpaError {
    /// 搜索窗口内未找到帧同步码, 或当前位置不是同步码
    #[error("未找到帧同步码")]
    Unsynchronized,

    /// 帧头字段无效
    #[error("无效帧头: {0}")]
    InvalidHeader(HeaderField),

    /// 功能未实现 (自由格式比特率、CRC 校验)
    #[error("功能未实现: {0}")]
    NotImplemented(String),

    /// 帧被截断: 数据在帧结束前耗尽
    #[error("数据意外结束: 需要 {expected} 字节, 实际只有 {actual} 字节")]
    UnexpectedEof {
        /// 期望的字节数
        expected: usize,
        /// 实际可用的字节数
        actual: usize,
    },

    /// 帧长度超过读取缓冲区容量
    #[error("缓冲区过小: 需要 {needed} 字节, 容量 {capacity} 字节")]
    BufferTooSmall {
        /// 所需字节数
        needed: usize,
        /// 缓冲区容量
        capacity: usize,
    },

    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

impl MpaError {
    /// 是否为截断流
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }

    /// 是否为未实现的功能
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }
}

impl From<HeaderField> for MpaError {
    fn from(field: HeaderField) -> Self {
        Self::InvalidHeader(field)
    }
}

/// mpa 统一 Result 类型
pub type MpaResult<T> = Result<T, MpaError>;

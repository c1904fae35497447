//! 增量帧读取器.
//!
//! 在固定容量的缓冲区上逐帧扫描码流, 不把整个流读入内存.
//! 调用方反复调用 [`FrameReader::advance`] 推进, 每次至多读取一帧.
//!
//! 状态机:
//! - 未同步: 流偏移为 0, 下一次推进先在一个缓冲区窗口内搜索同步码
//! - 已同步: 连续解析首尾相接的帧
//! - 结束 / 失败: 不再读取, 直到 [`FrameReader::reset`]

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace, warn};
use mpa_codec::{FRAME_HEADER_SIZE, FrameHeader, sync};
use mpa_core::{HeaderField, MpaError, MpaResult, Rational, Timestamp};
use thiserror::Error;

use crate::frame::{Frame, error_check_word};
use crate::io::{BufferedSource, ByteSource, SliceSource};

/// 默认缓冲区大小 (字节)
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// 合法帧的最大长度 (MPEG-2.5 Layer II 160 kbit/s @ 8 kHz, 含填充)
pub const MAX_FRAME_LENGTH: usize = 2881;

/// 累计时长的计时频率, 为 9 个标准采样率的最小公倍数
///
/// 每个采样对应整数个 tick, 累加没有舍入误差.
pub const ELAPSED_TICK_RATE: u32 = 14_112_000;

/// 累计时长的时间基
pub const ELAPSED_TIME_BASE: Rational = Rational::new(1, ELAPSED_TICK_RATE as i32);

/// 读取器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// 缓冲区容量, 必须容纳一整帧以及流开头到第一个同步码的距离
    pub buffer_size: usize,
    /// 对带 CRC 的帧做校验 (尚未实现, 开启后遇到带 CRC 的帧即失败)
    pub verify_checksum: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            verify_checksum: false,
        }
    }
}

impl ReaderConfig {
    /// 设置缓冲区容量
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// 设置是否校验 CRC
    pub fn with_verify_checksum(mut self, verify_checksum: bool) -> Self {
        self.verify_checksum = verify_checksum;
        self
    }
}

/// 带位置信息的读取错误
#[derive(Debug, Clone, Error)]
#[error("第 {index} 帧 (偏移 {offset}): {kind}")]
pub struct FrameError {
    /// 出错的帧序号 (从 1 开始)
    pub index: u64,
    /// 出错时的流偏移
    pub offset: u64,
    /// 错误原因
    #[source]
    pub kind: Arc<MpaError>,
}

impl FrameError {
    /// 错误原因
    pub fn kind(&self) -> &MpaError {
        &self.kind
    }
}

/// 读取器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// 尚未找到第一个同步码
    Unsynchronized,
    /// 正在读取连续的帧
    Synchronized,
    /// 流已干净结束
    Finished,
    /// 出现错误, 需要 reset 才能继续
    Failed,
}

/// MPEG 音频帧读取器
///
/// `header()`、`raw()` 等访问器返回的都是对内部缓冲区的借用,
/// 只在下一次 `advance` 或 `reset` 之前有效. 需要保留时用 [`Self::frame`].
pub struct FrameReader<S> {
    source: S,
    state: ReaderState,
    /// 下一个未读字节的绝对偏移, 即当前帧的结束位置
    offset: u64,
    /// 当前帧的起始偏移
    frame_offset: u64,
    header: Option<FrameHeader>,
    error: Option<FrameError>,
    frames_read: u64,
    /// 第一个同步码的偏移
    sync_offset: Option<u64>,
    /// 累计时长 (tick)
    ticks: u64,
    /// 当前帧起始时的累计时长 (tick)
    frame_ticks: u64,
    verify_checksum: bool,
}

impl<S: ByteSource> FrameReader<S> {
    /// 在字节源上创建读取器
    ///
    /// 容量必须大于帧头大小, 否则永远放不下一整帧.
    pub fn new(source: S) -> MpaResult<Self> {
        check_capacity(source.capacity())?;
        Ok(Self {
            source,
            state: ReaderState::Unsynchronized,
            offset: 0,
            frame_offset: 0,
            header: None,
            error: None,
            frames_read: 0,
            sync_offset: None,
            ticks: 0,
            frame_ticks: 0,
            verify_checksum: false,
        })
    }

    /// 设置是否校验 CRC
    pub fn set_verify_checksum(&mut self, verify_checksum: bool) {
        self.verify_checksum = verify_checksum;
    }

    /// 读取下一帧
    ///
    /// 返回 `Ok(true)` 表示读到一帧, `Ok(false)` 表示流已结束.
    /// 出错后读取器进入失败状态, 之后的调用都返回 `Ok(false)` 且不再读取,
    /// 错误可通过 [`Self::err`] 取回.
    pub fn advance(&mut self) -> Result<bool, FrameError> {
        if matches!(self.state, ReaderState::Finished | ReaderState::Failed) {
            return Ok(false);
        }
        self.header = None;
        match self.read_frame() {
            Ok(true) => Ok(true),
            Ok(false) => {
                debug!(
                    "流结束: 共 {} 帧, 偏移 {}",
                    self.frames_read, self.offset
                );
                self.state = ReaderState::Finished;
                Ok(false)
            }
            Err(kind) => {
                let error = FrameError {
                    index: self.frames_read + 1,
                    offset: self.offset,
                    kind: Arc::new(kind),
                };
                warn!("读取失败: {error}");
                self.state = ReaderState::Failed;
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn read_frame(&mut self) -> MpaResult<bool> {
        if self.state == ReaderState::Unsynchronized {
            let capacity = self.source.capacity();
            let window = self.source.peek(capacity)?;
            if window.is_empty() {
                return Ok(false);
            }
            let skip = sync(window).ok_or(MpaError::Unsynchronized)?;
            if skip > 0 {
                self.source.discard(skip)?;
                self.offset += skip as u64;
                debug!("跳过同步码前的 {skip} 字节");
            }
            self.sync_offset = Some(self.offset);
            self.state = ReaderState::Synchronized;
        }

        let bytes = self.source.peek(FRAME_HEADER_SIZE)?;
        if bytes.is_empty() {
            return Ok(false);
        }
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(MpaError::UnexpectedEof {
                expected: FRAME_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let mut raw = [0u8; FRAME_HEADER_SIZE];
        raw.copy_from_slice(&bytes[..FRAME_HEADER_SIZE]);
        let header = FrameHeader::decode(&raw);

        // 去加重不影响帧边界, 不在此检查
        match header.validate() {
            Ok(()) | Err(HeaderField::Emphasis) => {}
            Err(field) => return Err(field.into()),
        }
        if header.bitrate_index.is_free() {
            return Err(MpaError::NotImplemented("自由格式比特率".into()));
        }
        if self.verify_checksum && header.protection {
            return Err(MpaError::NotImplemented("CRC 校验".into()));
        }

        let length = header
            .frame_length()
            .ok_or_else(|| MpaError::Internal(format!("无法计算帧长: {header}")))?;
        if length < FRAME_HEADER_SIZE {
            return Err(MpaError::Internal(format!("帧长 {length} 小于帧头")));
        }
        let capacity = self.source.capacity();
        if length > capacity {
            return Err(MpaError::BufferTooSmall {
                needed: length,
                capacity,
            });
        }
        let available = self.source.peek(length)?.len();
        if available < length {
            return Err(MpaError::UnexpectedEof {
                expected: length,
                actual: available,
            });
        }
        self.source.discard(length)?;

        self.frame_offset = self.offset;
        self.offset += length as u64;
        self.frame_ticks = self.ticks;
        self.ticks += frame_ticks(&header)?;
        self.header = Some(header);
        self.frames_read += 1;
        trace!(
            "第 {} 帧: 偏移 {}, {header}",
            self.frames_read, self.frame_offset
        );
        Ok(true)
    }

    /// 从已知的帧边界开始读取
    ///
    /// `source` 的第一个字节位于流偏移 `offset` 处. 偏移为正时不搜索同步码.
    pub fn resume(source: S, offset: u64) -> MpaResult<Self> {
        let mut reader = Self::new(source)?;
        reader.restart(offset);
        Ok(reader)
    }

    /// 替换字节源并从指定偏移重新开始
    ///
    /// 清除错误、当前帧和累计时长. 偏移为 0 时下一次推进重新搜索同步码,
    /// 否则认为新字节源正好从一个帧边界开始.
    pub fn reset(&mut self, source: S, offset: u64) -> MpaResult<()> {
        check_capacity(source.capacity())?;
        debug!("重置读取器: 偏移 {offset}");
        self.source = source;
        self.restart(offset);
        Ok(())
    }

    fn restart(&mut self, offset: u64) {
        self.state = if offset == 0 {
            ReaderState::Unsynchronized
        } else {
            ReaderState::Synchronized
        };
        self.offset = offset;
        self.frame_offset = offset;
        self.header = None;
        self.error = None;
        self.frames_read = 0;
        self.sync_offset = (offset != 0).then_some(offset);
        self.ticks = 0;
        self.frame_ticks = 0;
    }

    /// 当前帧头
    pub fn header(&self) -> Option<&FrameHeader> {
        self.header.as_ref()
    }

    /// 当前帧的原始字节 (帧头 + CRC + 数据 + 填充)
    pub fn raw(&self) -> Option<&[u8]> {
        self.header.map(|_| self.source.discarded())
    }

    /// 当前帧的结束偏移, 即下一帧的起始位置
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 当前帧的起始偏移
    pub fn frame_offset(&self) -> u64 {
        self.frame_offset
    }

    /// 第一个同步码的偏移, 尚未同步时为 `None`
    pub fn sync_offset(&self) -> Option<u64> {
        self.sync_offset
    }

    /// 帧头后的 16 bit 错误校验字, 仅当保护位置位时存在
    pub fn error_check(&self) -> Option<u16> {
        error_check_word(self.header.as_ref()?, self.raw()?)
    }

    /// 校验当前帧的 CRC
    ///
    /// 尚未实现, 总是返回 `NotImplemented`.
    pub fn verify_checksum(&self) -> MpaResult<()> {
        Err(MpaError::NotImplemented("CRC 校验".into()))
    }

    /// 截至当前帧的累计播放时长
    pub fn elapsed(&self) -> Timestamp {
        Timestamp::new(self.ticks as i64, ELAPSED_TIME_BASE)
    }

    /// 累计播放时长, 向零截断到纳秒
    pub fn elapsed_duration(&self) -> Duration {
        let rate = u64::from(ELAPSED_TICK_RATE);
        let secs = self.ticks / rate;
        let nanos = (self.ticks % rate) * 1_000_000_000 / rate;
        Duration::new(secs, nanos as u32)
    }

    /// 已记录的错误, 干净结束时为 `None`
    pub fn err(&self) -> Option<&FrameError> {
        self.error.as_ref()
    }

    /// 已成功读取的帧数
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// 当前状态
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// 字节源的引用
    pub fn source(&self) -> &S {
        &self.source
    }

    /// 消耗读取器, 返回字节源
    pub fn into_source(self) -> S {
        self.source
    }

    /// 复制当前帧
    ///
    /// 时间基为当前帧的 1/采样率, pts 为此前累计时长换算成的采样数.
    pub fn frame(&self) -> Option<Frame> {
        let header = self.header?;
        let frequency = header.sampling_frequency()?;
        let ticks_per_sample = u64::from(ELAPSED_TICK_RATE / frequency);
        Some(Frame {
            header,
            data: Bytes::copy_from_slice(self.raw()?),
            offset: self.frame_offset,
            pts: (self.frame_ticks / ticks_per_sample) as i64,
            duration: i64::from(header.sample_count()?),
            time_base: Rational::per_second(frequency)?,
        })
    }
}

impl<R: Read> FrameReader<BufferedSource<R>> {
    /// 包装任意读取器, 使用指定容量的缓冲区
    pub fn from_reader(inner: R, capacity: usize) -> MpaResult<Self> {
        Self::new(BufferedSource::new(inner, capacity))
    }

    /// 按配置包装读取器
    pub fn with_config(inner: R, config: &ReaderConfig) -> MpaResult<Self> {
        let mut reader = Self::from_reader(inner, config.buffer_size)?;
        reader.set_verify_checksum(config.verify_checksum);
        Ok(reader)
    }
}

impl FrameReader<BufferedSource<File>> {
    /// 打开文件
    pub fn open<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> MpaResult<Self> {
        let file = File::open(path)?;
        Self::with_config(file, config)
    }
}

impl<'a> FrameReader<SliceSource<'a>> {
    /// 读取内存中的数据, `capacity` 为预读窗口大小
    pub fn from_slice(data: &'a [u8], capacity: usize) -> MpaResult<Self> {
        Self::new(SliceSource::new(data, capacity))
    }
}

fn check_capacity(capacity: usize) -> MpaResult<()> {
    if capacity <= FRAME_HEADER_SIZE {
        return Err(MpaError::InvalidArgument(format!(
            "缓冲区容量 {capacity} 必须大于帧头大小 {FRAME_HEADER_SIZE}"
        )));
    }
    Ok(())
}

/// 一帧的时长 (tick)
fn frame_ticks(header: &FrameHeader) -> MpaResult<u64> {
    match (header.sample_count(), header.sampling_frequency()) {
        (Some(samples), Some(frequency)) => {
            Ok(u64::from(samples) * u64::from(ELAPSED_TICK_RATE / frequency))
        }
        _ => Err(MpaError::Internal(format!("无法计算帧时长: {header}"))),
    }
}

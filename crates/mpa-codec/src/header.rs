//! MPEG 音频帧头编解码.
//!
//! 帧头结构 (32 位, 大端):
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//! A = 同步位 (11 bit, 全 1)   B = MPEG 版本     C = 层
//! D = 无 CRC 标志            E = 比特率索引    F = 采样率索引
//! G = 填充位                 H = 私有位        I = 声道模式
//! J = 模式扩展               K = 版权          L = 原始/复制
//! M = 去加重
//! ```
//!
//! 解码从不失败: 保留值映射为枚举中的 `Reserved` 变体, 合法性由
//! [`FrameHeader::validate`] 单独检查.

use std::fmt;
use std::io::{Read, Write};

use mpa_core::{HeaderField, MpaError, MpaResult, Rational};

use crate::sync::is_syncword;
use crate::tables;

/// 编码后帧头的字节数
pub const FRAME_HEADER_SIZE: usize = 4;

/// MPEG 版本 (2 bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpegVersion {
    Mpeg25 = 0,
    Reserved = 1,
    Mpeg2 = 2,
    Mpeg1 = 3,
}

impl MpegVersion {
    /// 从 2 bit 字段构造, 高位被忽略
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Mpeg25,
            1 => Self::Reserved,
            2 => Self::Mpeg2,
            _ => Self::Mpeg1,
        }
    }

    /// 线上的 2 bit 值
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// MPEG 层 (2 bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpegLayer {
    Reserved = 0,
    Layer3 = 1,
    Layer2 = 2,
    Layer1 = 3,
}

impl MpegLayer {
    /// 从 2 bit 字段构造, 高位被忽略
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Reserved,
            1 => Self::Layer3,
            2 => Self::Layer2,
            _ => Self::Layer1,
        }
    }

    /// 线上的 2 bit 值
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// 声道模式 (2 bit)
///
/// Layer I/II 的联合立体声即强度立体声; Layer III 为强度立体声和/或 M/S 立体声.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Stereo = 0,
    JointStereo = 1,
    DualChannel = 2,
    SingleChannel = 3,
}

impl Mode {
    /// 从 2 bit 字段构造, 高位被忽略
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Stereo,
            1 => Self::JointStereo,
            2 => Self::DualChannel,
            _ => Self::SingleChannel,
        }
    }

    /// 线上的 2 bit 值
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// 去加重类型 (2 bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    None = 0,
    /// 50/15 微秒
    Ms50_15 = 1,
    Reserved = 2,
    /// CCITT J.17
    CcittJ17 = 3,
}

impl Emphasis {
    /// 从 2 bit 字段构造, 高位被忽略
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::None,
            1 => Self::Ms50_15,
            2 => Self::Reserved,
            _ => Self::CcittJ17,
        }
    }

    /// 线上的 2 bit 值
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// 比特率索引 (4 bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitrateIndex(pub u8);

impl BitrateIndex {
    /// 自由格式: 使用不在表中的固定比特率
    pub const FREE: Self = Self(0);

    /// 是否为自由格式
    pub const fn is_free(self) -> bool {
        self.0 == Self::FREE.0
    }

    /// 比特率 (kbit/s), 见 [`tables::bitrate_kbps`]
    pub fn bitrate(self, version: MpegVersion, layer: MpegLayer) -> Option<u32> {
        tables::bitrate_kbps(self.0, version, layer)
    }
}

/// 采样率索引 (2 bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplingFrequencyIndex(pub u8);

impl SamplingFrequencyIndex {
    /// 采样率 (Hz), 索引 3 无定义
    pub fn sampling_frequency(self, version: MpegVersion) -> Option<u32> {
        tables::sampling_frequency_hz(self.0, version)
    }
}

/// 模式扩展 (2 bit), 仅在联合立体声下有意义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeExtension(pub u8);

impl ModeExtension {
    /// Layer I/II: 从此子带起使用强度立体声 (4, 8, 12, 16)
    pub const fn bound(self) -> u32 {
        4 * ((self.0 & 0b11) as u32 + 1)
    }

    /// Layer III: `(intensity_stereo, ms_stereo)`
    ///
    /// 两者都为 false 时, 效果等同于普通立体声.
    pub const fn coding(self) -> (bool, bool) {
        (self.0 & 0b01 != 0, self.0 & 0b10 != 0)
    }
}

/// 帧的 slot 数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slots {
    /// 不含填充的 slot 数
    pub count: u32,
    /// 除法有余数: 相邻帧的 slot 数在 count 与 count+1 之间交替以贴合名义比特率
    pub truncated: bool,
}

/// MPEG 音频帧头
///
/// 与 4 字节线上格式一一对应. 每帧在栈上解码, 由调用方复制或读取.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: MpegLayer,
    /// 帧头后跟随 16 bit CRC (线上为反相的 protection_absent 位)
    pub protection: bool,
    pub bitrate_index: BitrateIndex,
    pub sampling_frequency_index: SamplingFrequencyIndex,
    /// 帧末尾多一个 slot, 用于贴合平均比特率
    pub padding: bool,
    /// 私有位, 解码器不使用
    pub private: bool,
    pub mode: Mode,
    pub mode_extension: ModeExtension,
    pub copyright: bool,
    /// 原始码流 (而非副本)
    pub original: bool,
    pub emphasis: Emphasis,
}

impl FrameHeader {
    /// 创建帧头, 其余字段为立体声、无 CRC、无填充
    pub const fn new(
        version: MpegVersion,
        layer: MpegLayer,
        bitrate_index: u8,
        sampling_frequency_index: u8,
    ) -> Self {
        Self {
            version,
            layer,
            protection: false,
            bitrate_index: BitrateIndex(bitrate_index),
            sampling_frequency_index: SamplingFrequencyIndex(sampling_frequency_index),
            padding: false,
            private: false,
            mode: Mode::Stereo,
            mode_extension: ModeExtension(0),
            copyright: false,
            original: false,
            emphasis: Emphasis::None,
        }
    }

    /// 从 4 字节解码帧头, 不检查同步码
    pub const fn decode(b: &[u8; FRAME_HEADER_SIZE]) -> Self {
        Self {
            version: MpegVersion::from_bits((b[1] & 0b0001_1000) >> 3),
            layer: MpegLayer::from_bits((b[1] & 0b0000_0110) >> 1),
            protection: b[1] & 0b0000_0001 == 0,
            bitrate_index: BitrateIndex((b[2] & 0b1111_0000) >> 4),
            sampling_frequency_index: SamplingFrequencyIndex((b[2] & 0b0000_1100) >> 2),
            padding: b[2] & 0b0000_0010 != 0,
            private: b[2] & 0b0000_0001 != 0,
            mode: Mode::from_bits((b[3] & 0b1100_0000) >> 6),
            mode_extension: ModeExtension((b[3] & 0b0011_0000) >> 4),
            copyright: b[3] & 0b0000_1000 != 0,
            original: b[3] & 0b0000_0100 != 0,
            emphasis: Emphasis::from_bits(b[3] & 0b0000_0011),
        }
    }

    /// 编码为 4 字节
    ///
    /// 总是写入 11 位同步码. 超出位宽的索引值按位截断.
    pub const fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        [
            0b1111_1111,
            0b1110_0000
                | self.version.bits() << 3
                | self.layer.bits() << 1
                | bool_bit(!self.protection),
            (self.bitrate_index.0 & 0b1111) << 4
                | (self.sampling_frequency_index.0 & 0b11) << 2
                | bool_bit(self.padding) << 1
                | bool_bit(self.private),
            self.mode.bits() << 6
                | (self.mode_extension.0 & 0b11) << 4
                | bool_bit(self.copyright) << 3
                | bool_bit(self.original) << 2
                | self.emphasis.bits(),
        ]
    }

    /// 从字节切片解析帧头
    ///
    /// 切片必须恰好 4 字节且以同步码开头.
    pub fn parse(b: &[u8]) -> MpaResult<Self> {
        let bytes: &[u8; FRAME_HEADER_SIZE] = b.try_into().map_err(|_| {
            MpaError::InvalidArgument(format!("帧头长度错误: {} 字节", b.len()))
        })?;
        if !is_syncword(bytes) {
            return Err(MpaError::Unsynchronized);
        }
        Ok(Self::decode(bytes))
    }

    /// 从读取器读取 4 字节并解析帧头
    pub fn read_from<R: Read>(r: &mut R) -> MpaResult<Self> {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        r.read_exact(&mut buf)?;
        if !is_syncword(&buf) {
            return Err(MpaError::Unsynchronized);
        }
        Ok(Self::decode(&buf))
    }

    /// 写出编码后的 4 字节
    pub fn write_to<W: Write>(&self, w: &mut W) -> MpaResult<()> {
        w.write_all(&self.encode())?;
        Ok(())
    }

    /// 追加编码后的 4 字节到缓冲区
    pub fn append_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.encode());
    }

    /// 比特率 (kbit/s), 自由格式为 0
    pub fn bitrate(&self) -> Option<u32> {
        self.bitrate_index.bitrate(self.version, self.layer)
    }

    /// 采样率 (Hz)
    pub fn sampling_frequency(&self) -> Option<u32> {
        self.sampling_frequency_index.sampling_frequency(self.version)
    }

    /// 每帧采样数
    pub fn sample_count(&self) -> Option<u32> {
        tables::sample_count(self.version, self.layer)
    }

    /// 每 slot 字节数
    pub fn slot_size(&self) -> Option<u32> {
        tables::slot_size(self.version, self.layer)
    }

    /// 声道数
    pub const fn channels(&self) -> u32 {
        match self.mode {
            Mode::SingleChannel => 1,
            _ => 2,
        }
    }

    /// 帧占用的 slot 数 (含帧头、CRC、数据, 不含填充)
    ///
    /// count = floor(N / 采样率), Layer I 的 N = 12 × 比特率 (bit/s),
    /// Layer II/III 的 N = 144 × 比特率, 与版本无关.
    ///
    /// 自由格式返回 `None`: 帧长只能通过到下一个同步码的距离推断.
    pub fn slots(&self) -> Option<Slots> {
        let bitrate = self.bitrate()?;
        if bitrate == 0 {
            return None;
        }
        let frequency = u64::from(self.sampling_frequency()?);
        let coefficient: u64 = match self.layer {
            MpegLayer::Layer1 => 12,
            MpegLayer::Layer2 | MpegLayer::Layer3 => 144,
            MpegLayer::Reserved => return None,
        };
        let n = coefficient * u64::from(bitrate) * 1000;
        Some(Slots {
            count: u32::try_from(n / frequency).ok()?,
            truncated: n % frequency != 0,
        })
    }

    /// 整帧字节数: slot 数 × slot 大小, 有填充时再加一个 slot
    pub fn frame_length(&self) -> Option<usize> {
        let slots = self.slots()?;
        let slot_size = self.slot_size()?;
        let padding = if self.padding { slot_size } else { 0 };
        usize::try_from(slots.count * slot_size + padding).ok()
    }

    /// 单帧播放时长 (秒), 已约分
    pub fn duration(&self) -> Option<Rational> {
        let samples = i32::try_from(self.sample_count()?).ok()?;
        let frequency = i32::try_from(self.sampling_frequency()?).ok()?;
        Some(Rational::new(samples, frequency).reduce())
    }

    /// 检查帧头是否可用
    ///
    /// 依次检查版本、层、比特率索引、采样率索引、去加重, 返回第一个无效字段.
    /// 声道模式的四个取值都合法; 模式扩展的含义取决于层与模式, 不做检查.
    pub fn validate(&self) -> Result<(), HeaderField> {
        if self.version == MpegVersion::Reserved {
            return Err(HeaderField::Version);
        }
        if self.layer == MpegLayer::Reserved {
            return Err(HeaderField::Layer);
        }
        if self.bitrate().is_none() {
            return Err(HeaderField::BitrateIndex);
        }
        if self.sampling_frequency().is_none() {
            return Err(HeaderField::SamplingFrequencyIndex);
        }
        match self.emphasis {
            Emphasis::None | Emphasis::Ms50_15 | Emphasis::CcittJ17 => Ok(()),
            Emphasis::Reserved => Err(HeaderField::Emphasis),
        }
    }
}

impl From<u32> for FrameHeader {
    fn from(word: u32) -> Self {
        Self::decode(&word.to_be_bytes())
    }
}

impl From<FrameHeader> for u32 {
    fn from(header: FrameHeader) -> Self {
        u32::from_be_bytes(header.encode())
    }
}

const fn bool_bit(b: bool) -> u8 {
    if b { 1 } else { 0 }
}

impl fmt::Display for MpegVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mpeg1 => write!(f, "mpeg-1"),
            Self::Mpeg2 => write!(f, "mpeg-2"),
            Self::Mpeg25 => write!(f, "mpeg-2.5"),
            Self::Reserved => write!(f, "{}", self.bits()),
        }
    }
}

impl fmt::Display for MpegLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layer1 => write!(f, "layer-1"),
            Self::Layer2 => write!(f, "layer-2"),
            Self::Layer3 => write!(f, "layer-3"),
            Self::Reserved => write!(f, "{}", self.bits()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stereo => "stereo",
            Self::JointStereo => "joint-stereo",
            Self::DualChannel => "dual-channel",
            Self::SingleChannel => "single-channel",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Emphasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Ms50_15 => write!(f, "50/15-microsecond"),
            Self::CcittJ17 => write!(f, "ccitt-j.17"),
            Self::Reserved => write!(f, "{}", self.bits()),
        }
    }
}

/// 单行摘要, 如 `frame(417*1=417+){mpeg-1,layer-3,stereo,44100-Hz,128-kbit/s}`
///
/// `+` 表示 slot 数被截断, 实际帧长会在相邻帧之间交替.
impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame(")?;
        if let (Some(slots), Some(slot_size)) = (self.slots(), self.slot_size()) {
            write!(
                f,
                "{}*{}={}",
                slots.count,
                slot_size,
                slots.count * slot_size
            )?;
            if slots.truncated {
                write!(f, "+")?;
            }
        }
        write!(f, "){{{},{},{}", self.version, self.layer, self.mode)?;
        if self.mode == Mode::JointStereo {
            match self.layer {
                MpegLayer::Layer1 | MpegLayer::Layer2 => {
                    write!(f, ",(bound={})", self.mode_extension.bound())?;
                }
                MpegLayer::Layer3 => {
                    let coding = match self.mode_extension.coding() {
                        (false, false) => "",
                        (true, false) => "intensity-stereo",
                        (false, true) => "ms-stereo",
                        (true, true) => "intensity-stereo+ms-stereo",
                    };
                    write!(f, ",({coding})")?;
                }
                MpegLayer::Reserved => write!(f, ",(?)")?,
            }
        }
        if let Some(frequency) = self.sampling_frequency() {
            write!(f, ",{frequency}-Hz")?;
        }
        if let Some(bitrate) = self.bitrate() {
            write!(f, ",{bitrate}-kbit/s")?;
        }
        if self.protection {
            write!(f, ",crc")?;
        }
        if self.private {
            write!(f, ",private")?;
        }
        if self.copyright {
            write!(f, ",copyright")?;
        }
        if self.original {
            write!(f, ",original")?;
        }
        write!(f, "}}")
    }
}

//! MPEG 音频标准查找表.
//!
//! ISO/IEC 11172-3 第 2.4.2.3 节与 ISO/IEC 13818-3 第 2.4.2.3 节.
//! 所有表都是编译期常量, 以枚举值转换得到的小整数索引.

use crate::header::{MpegLayer, MpegVersion};

/// 比特率表 (kbit/s), 按 [版本族][层][比特率索引] 索引
///
/// 版本族 0 = MPEG-1, 1 = MPEG-2/2.5 (低采样率扩展).
/// 层 0/1/2 = Layer I/II/III. 索引 0 为自由格式, 索引 15 无定义.
const BITRATE_KBPS: [[[u32; 15]; 3]; 2] = [
    [
        [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
        [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
    ],
    [
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
    ],
];

/// 采样率表 (Hz), 按 [版本][采样率索引] 索引
///
/// 版本 0/1/2 = MPEG-1/MPEG-2/MPEG-2.5. 索引 3 保留.
const SAMPLING_FREQUENCY_HZ: [[u32; 3]; 3] = [
    [44100, 48000, 32000],
    [22050, 24000, 16000],
    [11025, 12000, 8000],
];

/// 每帧采样数, 按 [版本族][层] 索引
const SAMPLE_COUNT: [[u32; 3]; 2] = [[384, 1152, 1152], [384, 1152, 576]];

/// 每 slot 字节数, 按层索引
const SLOT_SIZE: [u32; 3] = [4, 1, 1];

/// 版本族下标: MPEG-1 为 0, MPEG-2/2.5 为 1
const fn family(version: MpegVersion) -> Option<usize> {
    match version {
        MpegVersion::Mpeg1 => Some(0),
        MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => Some(1),
        MpegVersion::Reserved => None,
    }
}

/// 采样率表的版本下标
const fn version_row(version: MpegVersion) -> Option<usize> {
    match version {
        MpegVersion::Mpeg1 => Some(0),
        MpegVersion::Mpeg2 => Some(1),
        MpegVersion::Mpeg25 => Some(2),
        MpegVersion::Reserved => None,
    }
}

/// 层下标: Layer I/II/III 为 0/1/2
const fn layer_column(layer: MpegLayer) -> Option<usize> {
    match layer {
        MpegLayer::Layer1 => Some(0),
        MpegLayer::Layer2 => Some(1),
        MpegLayer::Layer3 => Some(2),
        MpegLayer::Reserved => None,
    }
}

/// 查询比特率 (kbit/s)
///
/// 索引 0 (自由格式) 返回 `Some(0)`, 调用方需将其视为"无固定比特率".
/// 索引 15 或保留的版本/层返回 `None`.
pub fn bitrate_kbps(index: u8, version: MpegVersion, layer: MpegLayer) -> Option<u32> {
    let row = family(version)?;
    let column = layer_column(layer)?;
    BITRATE_KBPS[row][column].get(usize::from(index)).copied()
}

/// 查询采样率 (Hz), 索引 3 总是返回 `None`
pub fn sampling_frequency_hz(index: u8, version: MpegVersion) -> Option<u32> {
    let row = version_row(version)?;
    SAMPLING_FREQUENCY_HZ[row].get(usize::from(index)).copied()
}

/// 每帧包含的采样数
///
/// Layer I/II 的每帧独立; Layer III 的帧可能依赖之前帧的数据 (比特储备).
pub fn sample_count(version: MpegVersion, layer: MpegLayer) -> Option<u32> {
    Some(SAMPLE_COUNT[family(version)?][layer_column(layer)?])
}

/// 每 slot 的字节数: Layer I 为 4, Layer II/III 为 1
pub fn slot_size(version: MpegVersion, layer: MpegLayer) -> Option<u32> {
    family(version)?;
    Some(SLOT_SIZE[layer_column(layer)?])
}

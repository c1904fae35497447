//! mpa-probe - MPEG 音频帧探测工具
//!
//! 逐帧遍历 MPEG 音频文件, 输出帧数、时长、比特率等统计信息.
//! 读取出错时仍输出已读部分的统计, 并以退出码 1 结束.

mod logging;

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};

use mpa_codec::FrameHeader;
use mpa_format::{
    BufferedSource, ByteSource, DEFAULT_BUFFER_SIZE, FrameReader, MAX_FRAME_LENGTH,
};

/// MPEG 音频帧探测工具
#[derive(Parser, Debug)]
#[command(name = "mpa-probe", version, about = "MPEG 音频帧探测工具")]
struct Cli {
    /// 输入文件路径
    input: PathBuf,

    /// 读取缓冲区大小 (字节), 必须容纳一整帧与文件开头到第一个同步码的距离
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// 从已知的帧边界开始读取 (跳过同步码搜索)
    #[arg(long, default_value_t = 0)]
    start_offset: u64,

    /// 逐帧输出信息
    #[arg(long)]
    show_frames: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 校验帧 CRC (尚未实现, 遇到带 CRC 的帧即报错)
    #[arg(long)]
    verify_checksum: bool,

    /// 日志详细程度 (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// 静默模式 (只输出探测结果)
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================
// 输出结构体
// ============================================================

/// 单帧信息
#[derive(Debug, Serialize)]
struct FrameInfo {
    index: u64,
    offset: u64,
    length: usize,
    /// 帧结束时的累计时长 (秒)
    elapsed: f64,
    header: String,
}

/// 探测结果
#[derive(Debug, Default, Serialize)]
struct ProbeSummary {
    filename: String,
    nb_frames: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_offset: Option<u64>,
    /// 所有帧的总字节数
    total_bytes: u64,
    end_offset: u64,
    duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_bitrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_bitrate: Option<u32>,
    /// 平均比特率 (kbit/s), 由总字节数与时长计算
    #[serde(skip_serializing_if = "Option::is_none")]
    avg_bitrate: Option<f64>,
    vbr: bool,
    crc_frames: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    frames: Vec<FrameInfo>,
}

impl ProbeSummary {
    /// 记录一帧
    fn record(&mut self, header: &FrameHeader, length: usize) {
        if self.nb_frames == 0 {
            self.version = Some(header.version.to_string());
            self.layer = Some(header.layer.to_string());
            self.sample_rate = header.sampling_frequency();
            self.channels = Some(header.channels());
        }
        self.nb_frames += 1;
        self.total_bytes += length as u64;
        if header.protection {
            self.crc_frames += 1;
        }
        if let Some(bitrate) = header.bitrate() {
            self.min_bitrate = Some(self.min_bitrate.map_or(bitrate, |b| b.min(bitrate)));
            self.max_bitrate = Some(self.max_bitrate.map_or(bitrate, |b| b.max(bitrate)));
        }
    }

    /// 收尾: 计算平均比特率与 VBR 标记
    fn finish(&mut self, end_offset: u64, duration: f64) {
        self.end_offset = end_offset;
        self.duration = duration;
        self.vbr = self.min_bitrate != self.max_bitrate;
        if duration > 0.0 {
            self.avg_bitrate = Some(self.total_bytes as f64 * 8.0 / duration / 1000.0);
        }
    }
}

// ============================================================
// 主逻辑
// ============================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init("mpa-probe", cli.verbose, cli.quiet) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    if !cli.quiet {
        eprintln!(
            "mpa-probe 版本 {} -- MPEG 音频帧探测工具",
            env!("CARGO_PKG_VERSION")
        );
        eprintln!("输入文件: {}", cli.input.display());
    }

    let summary = match probe(&cli) {
        Ok(summary) => summary,
        Err(e) => {
            error!("探测失败: {e:#}");
            eprintln!("错误: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("错误: 序列化结果失败: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        if cli.show_frames {
            print_frames_text(&summary.frames);
        }
        print_summary_text(&summary);
    }

    if summary.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// 打开文件并定位到起始偏移
fn open_source(path: &Path, offset: u64, buffer_size: usize) -> Result<BufferedSource<File>> {
    let mut file = File::open(path).with_context(|| format!("无法打开文件 '{}'", path.display()))?;
    if offset > 0 {
        file.seek(SeekFrom::Start(offset))
            .with_context(|| format!("无法定位到偏移 {offset}"))?;
    }
    Ok(BufferedSource::new(file, buffer_size))
}

/// 遍历整个文件
///
/// 读取器出错不视为探测失败, 错误记录在结果中.
fn probe(cli: &Cli) -> Result<ProbeSummary> {
    if cli.buffer_size < MAX_FRAME_LENGTH {
        warn!(
            "缓冲区大小 {} 小于最大帧长 {MAX_FRAME_LENGTH}, 较长的帧会读取失败",
            cli.buffer_size
        );
    }

    let source = open_source(&cli.input, cli.start_offset, cli.buffer_size)?;
    let mut summary = walk(source, cli.start_offset, cli.verify_checksum, cli.show_frames)?;
    summary.filename = cli.input.display().to_string();
    Ok(summary)
}

/// 逐帧读取字节源并统计
fn walk<S: ByteSource>(
    source: S,
    start_offset: u64,
    verify_checksum: bool,
    collect_frames: bool,
) -> Result<ProbeSummary> {
    let mut reader = FrameReader::resume(source, start_offset).context("创建读取器失败")?;
    reader.set_verify_checksum(verify_checksum);

    let mut summary = ProbeSummary::default();
    loop {
        match reader.advance() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("{e}");
                summary.error = Some(e.to_string());
                break;
            }
        }
        let (Some(header), Some(raw)) = (reader.header(), reader.raw()) else {
            break;
        };
        summary.record(header, raw.len());
        if collect_frames {
            summary.frames.push(FrameInfo {
                index: reader.frames_read(),
                offset: reader.frame_offset(),
                length: raw.len(),
                elapsed: reader.elapsed().to_seconds(),
                header: header.to_string(),
            });
        }
    }

    summary.sync_offset = reader.sync_offset();
    summary.finish(reader.offset(), reader.elapsed().to_seconds());
    info!(
        "共 {} 帧, {} 字节, 时长 {:.3} 秒",
        summary.nb_frames, summary.total_bytes, summary.duration
    );
    Ok(summary)
}

/// 文本输出: 逐帧信息
fn print_frames_text(frames: &[FrameInfo]) {
    println!("[FRAMES]");
    for frame in frames {
        println!(
            "  #{:<6} {:>10} {:>5} {:>12.6}s {}",
            frame.index, frame.offset, frame.length, frame.elapsed, frame.header
        );
    }
    println!("[/FRAMES]");
    println!();
}

/// 文本输出: 统计信息
fn print_summary_text(summary: &ProbeSummary) {
    println!("[STREAM]");
    println!("  文件名       : {}", summary.filename);
    println!("  帧数         : {}", summary.nb_frames);
    if let Some(offset) = summary.sync_offset {
        println!("  首帧偏移     : {offset}");
    }
    println!("  帧总字节数   : {}", summary.total_bytes);
    println!("  结束偏移     : {}", summary.end_offset);
    println!("  时长         : {:.3} 秒", summary.duration);
    if let (Some(version), Some(layer)) = (&summary.version, &summary.layer) {
        println!("  格式         : {version} {layer}");
    }
    if let Some(rate) = summary.sample_rate {
        println!("  采样率       : {rate} Hz");
    }
    if let Some(channels) = summary.channels {
        println!("  声道数       : {channels}");
    }
    if let (Some(min), Some(max)) = (summary.min_bitrate, summary.max_bitrate) {
        if summary.vbr {
            println!("  码率         : {min}-{max} kbit/s (VBR)");
        } else {
            println!("  码率         : {min} kbit/s");
        }
    }
    if let Some(avg) = summary.avg_bitrate {
        println!("  平均码率     : {avg:.1} kbit/s");
    }
    if summary.crc_frames > 0 {
        println!("  带 CRC 的帧  : {}", summary.crc_frames);
    }
    if let Some(ref e) = summary.error {
        println!("  错误         : {e}");
    }
    println!("[/STREAM]");
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpa_format::SliceSource;
    use std::io::Write;

    /// MPEG-1 Layer III, 44100 Hz, 立体声, 无 CRC
    fn frame(bitrate_index: u8, len: usize) -> Vec<u8> {
        let mut data = vec![0xFF, 0xFB, bitrate_index << 4, 0x00];
        data.resize(len, 0);
        data
    }

    #[test]
    fn test_统计_恒定码率() {
        let data: Vec<u8> = (0..5).flat_map(|_| frame(9, 417)).collect();
        let summary = walk(SliceSource::new(&data, 4096), 0, false, true).unwrap();
        assert_eq!(summary.nb_frames, 5);
        assert_eq!(summary.total_bytes, 5 * 417);
        assert_eq!(summary.sync_offset, Some(0));
        assert_eq!(summary.min_bitrate, Some(128));
        assert!(!summary.vbr);
        assert_eq!(summary.sample_rate, Some(44100));
        assert_eq!(summary.layer.as_deref(), Some("layer-3"));
        assert!(summary.error.is_none());
        assert_eq!(summary.frames.len(), 5);
        assert_eq!(summary.frames[4].offset, 4 * 417);
        assert!((summary.duration - 5.0 * 1152.0 / 44100.0).abs() < 1e-9);
    }

    #[test]
    fn test_统计_可变码率与错误() {
        // 128 kbit/s 与 64 kbit/s (208 字节) 交替, 末尾截断
        let mut data = frame(9, 417);
        data.extend(frame(5, 208));
        data.extend(&frame(9, 417)[..100]);
        let summary = walk(SliceSource::new(&data, 4096), 0, false, false).unwrap();
        assert_eq!(summary.nb_frames, 2);
        assert_eq!(summary.min_bitrate, Some(64));
        assert_eq!(summary.max_bitrate, Some(128));
        assert!(summary.vbr);
        assert!(summary.error.is_some());
        assert!(summary.frames.is_empty());
    }

    #[test]
    fn test_探测文件_起始偏移() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x00; 7]).unwrap();
        for _ in 0..3 {
            file.write_all(&frame(9, 417)).unwrap();
        }
        file.flush().unwrap();

        let path = file.path().to_string_lossy().into_owned();

        let cli = Cli::parse_from(["mpa-probe", path.as_str()]);
        let summary = probe(&cli).unwrap();
        assert_eq!(summary.nb_frames, 3);
        assert_eq!(summary.sync_offset, Some(7));
        assert_eq!(summary.end_offset, 7 + 3 * 417);

        let cli = Cli::parse_from(["mpa-probe", "--start-offset", "424", path.as_str()]);
        let summary = probe(&cli).unwrap();
        assert_eq!(summary.nb_frames, 2);
        assert_eq!(summary.sync_offset, Some(424));
    }

    #[test]
    fn test_文件不存在() {
        let cli = Cli::parse_from(["mpa-probe", "/nonexistent/file.mp3"]);
        assert!(probe(&cli).is_err());
    }
}

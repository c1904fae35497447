//! 样本文件回归测试.
//!
//! 遍历 `$MPA_DATA_DIR/samples/mpa` 下的 .mpg/.mp1/.mp2/.mp3 文件,
//! 逐帧读取并检查偏移首尾相接、帧头重新编码后与原始字节一致.
//! 样本目录不存在时跳过.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mpa::codec::{FRAME_HEADER_SIZE, FrameHeader, sync};
use mpa::core::MpaError;
use mpa::format::{FrameError, FrameReader};

/// 获取 MPEG 音频样本目录
fn samples_dir() -> PathBuf {
    let base_dir = std::env::var("MPA_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    PathBuf::from(base_dir).join("samples").join("mpa")
}

/// 递归收集样本文件
fn collect_samples(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_samples(&path, out);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("mpg" | "mp1" | "mp2" | "mp3")
        ) {
            out.push(path);
        }
    }
}

/// 样本名: 相对样本目录、去掉扩展名, 如 `layer3/compl`
fn sample_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

struct Outcome {
    frames: u64,
    elapsed: Duration,
    error: Option<FrameError>,
}

/// 读取整个样本并检查每一帧
fn read_sample(name: &str, data: &[u8]) -> Outcome {
    let mut reader = FrameReader::from_slice(data, 16384).unwrap();
    let mut expected = sync(&data[..data.len().min(16384)]).unwrap_or(0) as u64;
    while reader.advance().unwrap_or(false) {
        let raw = reader.raw().unwrap();
        expected += raw.len() as u64;
        assert_eq!(
            reader.offset(),
            expected,
            "{name}: 第 {} 帧不是首尾相接",
            reader.frames_read()
        );

        let header = reader.header().unwrap();
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes.copy_from_slice(&raw[..FRAME_HEADER_SIZE]);
        assert_eq!(
            header.encode(),
            bytes,
            "{name}: 第 {} 帧重新编码后不一致",
            reader.frames_read()
        );
        assert_eq!(FrameHeader::decode(&bytes), *header);
    }
    Outcome {
        frames: reader.frames_read(),
        elapsed: reader.elapsed_duration(),
        error: reader.err().cloned(),
    }
}

fn truncate_to_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}

#[test]
fn test_样本文件回归() {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = samples_dir();
    let mut samples = Vec::new();
    collect_samples(&root, &mut samples);
    if samples.is_empty() {
        println!("SKIP: 样本目录不存在或为空: {}", root.display());
        return;
    }
    samples.sort();

    for path in &samples {
        let name = sample_name(&root, path);
        let data = std::fs::read(path).unwrap();
        let outcome = read_sample(&name, &data);
        log::info!(
            "{name}: {} 帧, {:?}, 错误: {:?}",
            outcome.frames,
            outcome.elapsed,
            outcome.error.as_ref().map(ToString::to_string)
        );

        match name.as_str() {
            "layer3/compl" => expect_eof(&name, &outcome, 217, 41472),
            "layer3/sin1k0db" => expect_eof(&name, &outcome, 318, 132708),
            "layer3/he_free" => {
                let err = outcome.error.as_ref().expect("自由格式应当报错");
                assert!(err.kind().is_not_implemented(), "{name}: {err}");
            }
            "mpeg2/test23" => expect_eof(&name, &outcome, 342, 327360),
            _ => {
                assert!(outcome.error.is_none(), "{name}: {:?}", outcome.error);
                assert!(outcome.frames > 0, "{name}: 没有读到帧");
            }
        }

        if name == "layer3/he_48khz" {
            assert_eq!(
                truncate_to_millis(outcome.elapsed),
                Duration::from_millis(3600),
                "{name}"
            );
        }
    }
}

fn expect_eof(name: &str, outcome: &Outcome, index: u64, offset: u64) {
    let err = outcome
        .error
        .as_ref()
        .unwrap_or_else(|| panic!("{name}: 应当在第 {index} 帧截断"));
    assert_eq!((err.index, err.offset), (index, offset), "{name}: {err}");
    assert!(
        matches!(err.kind(), MpaError::UnexpectedEof { .. }),
        "{name}: {err}"
    );
}

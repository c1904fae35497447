//! 帧同步码搜索.
//!
//! 同步码为 11 个连续的 1 bit: 第一个字节为 0xFF, 第二个字节的高 3 位为 `111`.
//! 找到的位置只是候选帧, 帧头仍需由读取器校验.

/// 判断切片是否以同步码开头, 不足 2 字节时返回 false
pub fn is_syncword(b: &[u8]) -> bool {
    b.len() >= 2 && b[0] == 0xFF && b[1] & 0xE0 == 0xE0
}

/// 查找第一个同步码的位置
pub fn sync(b: &[u8]) -> Option<usize> {
    (0..b.len()).find(|&i| is_syncword(&b[i..]))
}

//! 带时间基的时间点.

use crate::rational::Rational;
use std::fmt;
use std::time::Duration;

const NANOS_PER_SECOND: Rational = Rational::new(1, 1_000_000_000);

/// 以 `time_base` 为单位的时间点, 秒数 = `pts * time_base`
///
/// 读取器以它表示累计播放时长, 帧快照以它表示显示时间.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub pts: i64,
    pub time_base: Rational,
}

impl Timestamp {
    pub const fn new(pts: i64, time_base: Rational) -> Self {
        Self { pts, time_base }
    }

    /// 时间基未定义时无效
    pub const fn is_valid(&self) -> bool {
        self.time_base.is_valid()
    }

    /// 秒数, 无效时为 NaN
    pub fn to_seconds(&self) -> f64 {
        self.pts as f64 * self.time_base.to_f64()
    }

    /// 换算为 [`Duration`], 不足 1 ns 的部分舍去. 负值或无效时返回 `None`.
    pub fn to_duration(&self) -> Option<Duration> {
        let nanos = self.rescale(NANOS_PER_SECOND)?.pts;
        u64::try_from(nanos).ok().map(Duration::from_nanos)
    }

    /// 换到另一个时间基, 结果向零截断
    ///
    /// 全程整数运算, `pts * tb.num * new.den / (tb.den * new.num)`.
    pub fn rescale(&self, time_base: Rational) -> Option<Self> {
        let scale = |a: i32, b: i32| i128::from(a) * i128::from(b);
        let den = scale(self.time_base.den, time_base.num);
        if den == 0 {
            return None;
        }
        let pts = i128::from(self.pts) * scale(self.time_base.num, time_base.den) / den;
        Some(Self::new(i64::try_from(pts).ok()?, time_base))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{:.6}s", self.to_seconds())
        } else {
            f.write_str("NOPTS")
        }
    }
}

//! 有理数, 用于时间基与单帧时长.

use std::fmt;

/// 分数 `num / den`
///
/// 时间基 1/44100 表示以采样为单位计时; 一帧 MPEG-1 Layer III @ 44.1 kHz
/// 的时长为 1152/44100 秒, 约分后为 32/1225.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    /// 为 0 时整个值未定义
    pub den: i32,
}

impl Rational {
    /// 未定义的值
    pub const UNDEFINED: Self = Self::new(0, 0);

    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 采样率对应的时间基 `1/hz`, 采样率为 0 或超出 i32 时返回 `None`
    pub fn per_second(hz: u32) -> Option<Self> {
        match i32::try_from(hz) {
            Ok(den) if den > 0 => Some(Self::new(1, den)),
            _ => None,
        }
    }

    pub const fn is_valid(&self) -> bool {
        self.den != 0
    }

    /// 浮点值, 未定义时为 NaN
    pub fn to_f64(self) -> f64 {
        if self.is_valid() {
            f64::from(self.num) / f64::from(self.den)
        } else {
            f64::NAN
        }
    }

    /// 化为最简分数, 分母恒为正. 未定义的值原样返回.
    pub fn reduce(self) -> Self {
        if !self.is_valid() {
            return self;
        }
        let divisor = i64::from(gcd(self.num.unsigned_abs(), self.den.unsigned_abs()));
        let sign = i64::from(self.den.signum());
        // 在 i64 中计算, i32::MIN 取反不会溢出
        let num = sign * i64::from(self.num) / divisor;
        let den = sign * i64::from(self.den) / divisor;
        match (i32::try_from(num), i32::try_from(den)) {
            (Ok(num), Ok(den)) => Self::new(num, den),
            _ => self,
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

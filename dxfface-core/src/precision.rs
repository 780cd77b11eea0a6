//! 几何比较使用的精度常量。

/// 两点重合判定的默认距离容差。
pub const CONFUSION: f64 = 1.0e-7;

/// 数值计算中视为零的分母阈值。
pub const COMPUTATIONAL: f64 = 1.0e-12;

/// 对圆弧等曲线边做折线采样时，每一整圈使用的段数。
pub const ARC_SAMPLES_PER_TURN: usize = 64;

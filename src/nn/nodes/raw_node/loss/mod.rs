mod soft_cross_entropy;

pub(crate) use soft_cross_entropy::{
    SoftCrossEntropy, soft_cross_entropy_per_example, validate_soft_cross_entropy_shapes,
};

/// Reduction 模式：如何把逐样本的损失向量合并
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Reduction {
    /// 不合并，返回逐样本损失
    None,
    /// 对所有样本求平均（默认）
    #[default]
    Mean,
    /// 对所有样本求和
    Sum,
}

impl Reduction {
    /// 由 PyTorch 旧式的 (`size_average`, `reduce`) 标志位构造。
    /// `size_average` 只有在 `reduce` 为真时才有意义。
    pub const fn from_flags(size_average: bool, reduce: bool) -> Self {
        match (reduce, size_average) {
            (false, _) => Self::None,
            (true, true) => Self::Mean,
            (true, false) => Self::Sum,
        }
    }

    /// 是否把逐样本损失合并成标量
    pub const fn reduce(self) -> bool {
        !matches!(self, Self::None)
    }

    /// 实际生效的求平均标志（即 `size_average && reduce`）
    pub const fn size_average(self) -> bool {
        matches!(self, Self::Mean)
    }
}

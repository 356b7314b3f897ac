/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @Description  : Var 损失函数扩展 trait
 *
 * 提供损失函数的链式调用支持，用户需 import 此 trait 后才能使用。
 */

use crate::nn::{GraphError, Reduction, Var};
use crate::tensor::Tensor;
use std::rc::Rc;

/// 损失函数扩展 trait
///
/// - `soft_cross_entropy(target, weight, reduction)`: 带类别权重的软标签交叉熵
/// - `cross_entropy(target)`: 无权重、求平均的软标签交叉熵
///
/// # 使用示例
/// ```ignore
/// use soft_ce::nn::{Reduction, Var, VarLossOps};
///
/// let loss = logits.cross_entropy(&soft_labels)?;
/// let per_example = logits.soft_cross_entropy(&soft_labels, None, Reduction::None)?;
/// ```
pub trait VarLossOps {
    /// 软标签交叉熵（含 LogSoftmax）
    ///
    /// # 参数
    /// - `target`: 与 logits 同形状的类别概率 [batch, `num_classes`]
    /// - `weight`: 类别权重 [`num_classes`]，按原样使用，不做归一化
    /// - `reduction`: 逐样本损失的合并方式
    ///
    /// # 返回
    /// `Reduction::None` 时为 [batch, 1] 的逐样本损失，否则为 [1, 1] 的标量损失
    fn soft_cross_entropy(
        &self,
        target: &Var,
        weight: Option<&Tensor>,
        reduction: Reduction,
    ) -> Result<Var, GraphError>;

    /// 无权重、求平均的软标签交叉熵
    fn cross_entropy(&self, target: &Var) -> Result<Var, GraphError> {
        self.soft_cross_entropy(target, None, Reduction::Mean)
    }
}

impl VarLossOps for Var {
    fn soft_cross_entropy(
        &self,
        target: &Var,
        weight: Option<&Tensor>,
        reduction: Reduction,
    ) -> Result<Var, GraphError> {
        self.check_same_graph(target, "软标签交叉熵")?;
        let id = self.graph().borrow_mut().new_soft_cross_entropy_node(
            self.node_id(),
            target.node_id(),
            weight,
            reduction,
            None,
        )?;
        Ok(Var::new(id, Rc::clone(self.graph())))
    }
}

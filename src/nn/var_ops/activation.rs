/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @Description  : Var 激活函数扩展 trait
 */

use crate::nn::{GraphError, Var};
use std::rc::Rc;

/// 激活函数扩展 trait
///
/// # 使用示例
/// ```ignore
/// use soft_ce::nn::{Var, VarActivationOps};
///
/// let log_probs = logits.log_softmax()?;
/// ```
pub trait VarActivationOps {
    /// `LogSoftmax` 激活：x_i - log(Σ exp(x_j))
    ///
    /// 沿最后一维计算，输入形状 [batch, `num_classes`]，输出形状相同。
    fn log_softmax(&self) -> Result<Var, GraphError>;
}

impl VarActivationOps for Var {
    fn log_softmax(&self) -> Result<Var, GraphError> {
        let id = self
            .graph()
            .borrow_mut()
            .new_log_softmax_node(self.node_id(), None)?;
        Ok(Var::new(id, Rc::clone(self.graph())))
    }
}

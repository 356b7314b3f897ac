mod input;
mod loss;
mod ops;
mod parameter;

pub(crate) use input::InputVariant;
pub use loss::Reduction;
pub(crate) use loss::{
    SoftCrossEntropy, soft_cross_entropy_per_example, validate_soft_cross_entropy_shapes,
};
pub(crate) use ops::LogSoftmax;
pub(crate) use parameter::Parameter;

use super::NodeHandle;
use crate::nn::GraphError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
#[derive(Clone)]
pub(crate) enum NodeType {
    Input(InputVariant),
    Parameter(Parameter),
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓算子↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    LogSoftmax(LogSoftmax),
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑算子↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
    SoftCrossEntropy(SoftCrossEntropy),
}

#[enum_dispatch(NodeType)]
pub(crate) trait TraitNode {
    /// 节点类型名（用于显示和自动命名）
    fn type_name(&self) -> &'static str;

    /// 节点创建时就确定下来的输出形状
    fn value_expected_shape(&self) -> &[usize];

    // 根据父节点的值计算本节点的值（注意：由于该接口只在Graph中使用，所以实现时不用关心父节点的值是否已被计算，所有父节点的值已预先被计算过了）
    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError>;

    fn value(&self) -> Option<&Tensor>;

    fn set_value(&mut self, _value: Option<&Tensor>) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "{}类型节点的值不应该被手动设置",
            self.type_name()
        )))
    }

    fn clear_value(&mut self) -> Result<(), GraphError>;

    /// VJP：给定本节点的上游梯度，计算对某个父节点的梯度
    ///
    /// `assistant_parent`为另一个父节点（若有），部分二元节点需要它的值
    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError>;

    fn grad(&self) -> Option<&Tensor>;

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError>;

    fn clear_grad(&mut self) -> Result<(), GraphError> {
        self.set_grad(None)
    }
}

/// 设置值时统一的形状检查
pub(in crate::nn::nodes) fn check_value_shape(
    type_name: &str,
    expected: &[usize],
    value: Option<&Tensor>,
) -> Result<(), GraphError> {
    match value {
        Some(v) if v.shape() != expected => Err(GraphError::ShapeMismatch {
            expected: expected.to_vec(),
            got: v.shape().to_vec(),
            message: format!("{type_name}节点的值形状与创建时不一致"),
        }),
        _ => Ok(()),
    }
}

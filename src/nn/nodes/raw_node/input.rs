/*
 * Input：所有"接收外部数据"的节点，通过 InputVariant 区分：
 * - Data: 用户手动创建的通用输入（如logits）
 * - Target: Loss 的目标值（软标签）
 *
 * 输入节点没有父节点，也从不接收梯度。
 */

use super::{TraitNode, check_value_shape};
use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::tensor::Tensor;

/// 基础输入节点（Data 和 Target 共用）
#[derive(Clone)]
pub(crate) struct BasicInput {
    value: Option<Tensor>,
    shape: Vec<usize>,
}

impl BasicInput {
    pub(crate) fn new(shape: &[usize]) -> Result<Self, GraphError> {
        // 支持 2D-4D 张量，损失计算只用到 2D 的 [batch, num_classes]
        if shape.len() < 2 || shape.len() > 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 2, // 表示 2-4 维
                got: shape.len(),
                message: format!(
                    "输入张量必须是 2-4 维，但收到的维度是 {} 维。",
                    shape.len(),
                ),
            });
        }
        Ok(Self {
            value: None,
            shape: shape.to_vec(),
        })
    }
}

/// 输入节点的变体
#[derive(Clone)]
pub(crate) enum InputVariant {
    /// 普通数据输入（用户手动创建）
    Data(BasicInput),
    /// Loss 目标值（Criterion 内部创建）
    Target(BasicInput),
}

impl InputVariant {
    pub(crate) fn new_data(shape: &[usize]) -> Result<Self, GraphError> {
        Ok(Self::Data(BasicInput::new(shape)?))
    }

    pub(crate) fn new_target(shape: &[usize]) -> Result<Self, GraphError> {
        Ok(Self::Target(BasicInput::new(shape)?))
    }

    fn inner(&self) -> &BasicInput {
        match self {
            Self::Data(inner) | Self::Target(inner) => inner,
        }
    }

    fn inner_mut(&mut self) -> &mut BasicInput {
        match self {
            Self::Data(inner) | Self::Target(inner) => inner,
        }
    }
}

impl TraitNode for InputVariant {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Data(_) => "input",
            Self::Target(_) => "target",
        }
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.inner().shape
    }

    fn calc_value_by_parents(&mut self, _parents: &[&NodeHandle]) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "{}节点被执行了前向传播。不该触及本错误，否则说明crate代码有问题",
            self.type_name()
        )))
    }

    fn value(&self) -> Option<&Tensor> {
        self.inner().value.as_ref()
    }

    fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        check_value_shape(self.type_name(), &self.inner().shape, value)?;
        self.inner_mut().value = value.cloned();
        Ok(())
    }

    fn clear_value(&mut self) -> Result<(), GraphError> {
        self.inner_mut().value = None;
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        _upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "{}节点没有父节点。不该触及本错误，否则说明crate代码有问题",
            self.type_name()
        )))
    }

    fn grad(&self) -> Option<&Tensor> {
        None
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        match grad {
            None => Ok(()),
            Some(_) => Err(GraphError::InvalidOperation(format!(
                "{}节点不应该有梯度",
                self.type_name()
            ))),
        }
    }
}

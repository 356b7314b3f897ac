use super::{TraitNode, check_value_shape};
use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 可训练参数节点：没有父节点，反向传播时累积梯度直到被清零
#[derive(Clone)]
pub(crate) struct Parameter {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
}

impl Parameter {
    pub(crate) fn new(shape: &[usize]) -> Result<Self, GraphError> {
        Self::check_shape(shape)?;
        Ok(Self {
            value: Some(Tensor::normal(0.0, 0.001, shape)),
            grad: None,
            shape: shape.to_vec(),
        })
    }

    /// 使用固定种子创建参数节点（确保可重复性）
    pub(crate) fn new_seeded(shape: &[usize], seed: u64) -> Result<Self, GraphError> {
        Self::check_shape(shape)?;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(Self {
            value: Some(Tensor::normal_with_rng(0.0, 0.001, shape, &mut rng)),
            grad: None,
            shape: shape.to_vec(),
        })
    }

    // 支持 2D-4D 张量
    fn check_shape(shape: &[usize]) -> Result<(), GraphError> {
        if shape.len() < 2 || shape.len() > 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 2, // 表示 2-4 维
                got: shape.len(),
                message: format!(
                    "参数张量必须是 2-4 维，但收到的维度是 {} 维。",
                    shape.len(),
                ),
            });
        }
        Ok(())
    }
}

impl TraitNode for Parameter {
    fn type_name(&self) -> &'static str {
        "parameter"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, _parents: &[&NodeHandle]) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(
            "参数节点被执行了前向传播。不该触及本错误，否则说明crate代码有问题".to_string(),
        ))
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        check_value_shape(self.type_name(), &self.shape, value)?;
        self.value = value.cloned();
        Ok(())
    }

    fn clear_value(&mut self) -> Result<(), GraphError> {
        self.value = None;
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        _upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(
            "参数节点没有父节点。不该触及本错误，否则说明crate代码有问题".to_string(),
        ))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}

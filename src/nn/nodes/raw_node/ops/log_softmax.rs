/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @Description  : LogSoftmax 激活节点
 *                 沿最后一维计算 log_softmax(x)_i = x_i - max(x) - log(Σ exp(x_j - max(x)))
 */

use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;

/// LogSoftmax 激活节点
///
/// ## 输入
/// - 父节点: [batch, `num_classes`]
///
/// ## 输出
/// - 与输入形状相同，每行为对数概率
///
/// ## 梯度
/// 记 y = log_softmax(x)、p = softmax(x)，则
/// `dL/dx_i = dL/dy_i - p_i * Σ_j dL/dy_j`
#[derive(Clone)]
pub(crate) struct LogSoftmax {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    /// 缓存 softmax 结果，用于反向传播
    softmax_cache: Option<Tensor>,
}

impl LogSoftmax {
    pub(crate) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "LogSoftmax 节点需要正好 1 个父节点".to_string(),
            ));
        }

        // 2. 获取输入形状
        let shape = parents[0].value_expected_shape().to_vec();
        if shape.len() != 2 {
            return Err(GraphError::InvalidOperation(format!(
                "LogSoftmax 节点需要 2D 输入 [batch, num_classes]，但得到 {shape:?}"
            )));
        }

        Ok(Self {
            value: None,
            grad: None,
            shape,
            softmax_cache: None,
        })
    }
}

impl TraitNode for LogSoftmax {
    fn type_name(&self) -> &'static str {
        "log_softmax"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parents[0].value().ok_or_else(|| {
            GraphError::ComputationError(format!("LogSoftmax 的父{}没有值", parents[0]))
        })?;

        let output = input.log_softmax_rows();
        self.softmax_cache = Some(output.exp());
        self.value = Some(output);
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) -> Result<(), GraphError> {
        self.value = None;
        self.softmax_cache = None;
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        let softmax = self.softmax_cache.as_ref().ok_or_else(|| {
            GraphError::ComputationError("softmax 缓存为空，需先执行前向传播".to_string())
        })?;

        // dL/dx = g - p * rowsum(g)
        let row_sum = upstream_grad.sum_axis_keepdims(1);
        Ok(upstream_grad - &(softmax * &row_sum))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}

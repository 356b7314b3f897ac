/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 带类别权重的软标签交叉熵损失节点
 */

use crate::errors::TensorError;
use crate::nn::GraphError;
use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

use super::Reduction;

/// 软标签交叉熵损失节点（LogSoftmax + 加权交叉熵融合）
///
/// 与 one-hot 交叉熵不同，target 的每一行可以是任意的类别概率分布。
///
/// ## 输入
/// - 父节点 0: logits（未经 softmax 的原始分数）[batch, num_classes]
/// - 父节点 1: target（类别概率）[batch, num_classes]
///
/// ## 输出
/// - `Reduction::None`: 逐样本损失 [batch, 1]
/// - `Reduction::Mean` / `Reduction::Sum`: 标量损失 [1, 1]
///
/// ## 公式
/// ```text
/// L_i = -Σ_y w_y * t_iy * log_softmax(x_i)_y
/// ```
///
/// ## 梯度（s_i 为按 reduction 缩放后的上游梯度）
/// ```text
/// ∂L/∂x_ik = s_i * (p_ik * Σ_y w_y t_iy - w_k t_ik)
/// ∂L/∂t_ik = -s_i * w_k * log_softmax(x_i)_k
/// ```
#[derive(Clone)]
pub(crate) struct SoftCrossEntropy {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    /// 已经过均值归一化的类别权重 [num_classes]
    weight: Option<Tensor>,
    reduction: Reduction,
    /// 缓存 log_softmax(logits)，用于反向传播
    log_softmax_cache: Option<Tensor>,
    /// 缓存 w * target，用于反向传播
    weighted_target_cache: Option<Tensor>,
    /// 父节点 ID，用于区分 logits 和 target
    parents_ids: Vec<NodeId>,
}

impl SoftCrossEntropy {
    pub(crate) fn new(
        parents: &[&NodeHandle],
        weight: Option<&Tensor>,
        reduction: Reduction,
    ) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "SoftCrossEntropy 节点需要 2 个父节点（logits 和 target）".to_string(),
            ));
        }

        // 2. 验证形状兼容性
        let logits_shape = parents[0].value_expected_shape();
        let target_shape = parents[1].value_expected_shape();
        validate_soft_cross_entropy_shapes(logits_shape, target_shape, weight)?;

        let shape = match reduction {
            Reduction::None => vec![logits_shape[0], 1],
            Reduction::Mean | Reduction::Sum => vec![1, 1],
        };

        Ok(Self {
            value: None,
            grad: None,
            shape,
            weight: weight.cloned(),
            reduction,
            log_softmax_cache: None,
            weighted_target_cache: None,
            parents_ids: vec![parents[0].id(), parents[1].id()],
        })
    }
}

impl TraitNode for SoftCrossEntropy {
    fn type_name(&self) -> &'static str {
        "soft_cross_entropy"
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let logits = parents[0].value().ok_or_else(|| {
            GraphError::ComputationError(format!("SoftCrossEntropy 的 logits 父{}没有值", parents[0]))
        })?;
        let target = parents[1].value().ok_or_else(|| {
            GraphError::ComputationError(format!("SoftCrossEntropy 的 target 父{}没有值", parents[1]))
        })?;

        let log_softmax = logits.log_softmax_rows();
        let weighted_target = weighted_target(target, self.weight.as_ref());
        let per_example = per_example_from_parts(&log_softmax, &weighted_target);

        self.value = Some(match self.reduction {
            Reduction::None => per_example.unsqueeze_last(),
            Reduction::Mean => per_example.mean().reshape(&[1, 1]),
            Reduction::Sum => per_example.sum().reshape(&[1, 1]),
        });
        self.log_softmax_cache = Some(log_softmax);
        self.weighted_target_cache = Some(weighted_target);
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) -> Result<(), GraphError> {
        self.value = None;
        self.log_softmax_cache = None;
        self.weighted_target_cache = None;
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        let log_softmax = self.log_softmax_cache.as_ref().ok_or_else(|| {
            GraphError::ComputationError("log_softmax 缓存为空，需先执行前向传播".to_string())
        })?;
        let weighted_target = self.weighted_target_cache.as_ref().ok_or_else(|| {
            GraphError::ComputationError("target 缓存为空，需先执行前向传播".to_string())
        })?;

        // 上游梯度为 [1, 1]（Mean/Sum）或 [batch, 1]（None），均可沿类别维广播
        let batch_size = log_softmax.shape()[0] as f32;
        let scale = match self.reduction {
            Reduction::Mean => upstream_grad / batch_size,
            Reduction::None | Reduction::Sum => upstream_grad.clone(),
        };

        if target_parent.id() == self.parents_ids[0] {
            // 对 logits 的梯度：s * (softmax * Σ_y w_y t_y - w * t)
            let softmax = log_softmax.exp();
            let row_mass = weighted_target.sum_axis_keepdims(1);
            Ok(&(&(&softmax * &row_mass) - weighted_target) * &scale)
        } else {
            // 对 target 的梯度：-s * w * log_softmax
            let neg_weighted = match &self.weight {
                Some(w) => -(log_softmax * w),
                None => -log_softmax,
            };
            Ok(&neg_weighted * &scale)
        }
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}

/// 检查 logits、target 与类别权重的形状能否组成一次软标签交叉熵计算
pub(crate) fn validate_soft_cross_entropy_shapes(
    logits_shape: &[usize],
    target_shape: &[usize],
    weight: Option<&Tensor>,
) -> Result<(), TensorError> {
    if logits_shape != target_shape {
        return Err(TensorError::ShapeMismatch {
            expected: logits_shape.to_vec(),
            got: target_shape.to_vec(),
            message: "logits 和 target 形状必须相同".to_string(),
        });
    }
    if logits_shape.len() != 2 {
        return Err(TensorError::ShapeMismatch {
            expected: vec![],
            got: logits_shape.to_vec(),
            message: "logits 和 target 必须是二维张量 [batch, num_classes]".to_string(),
        });
    }
    if let Some(w) = weight {
        let num_classes = logits_shape[1];
        if w.shape() != [num_classes] {
            return Err(TensorError::ShapeMismatch {
                expected: vec![num_classes],
                got: w.shape().to_vec(),
                message: "类别权重的长度必须等于类别数".to_string(),
            });
        }
    }
    Ok(())
}

/// 逐样本的软标签交叉熵，返回形状为 [batch] 的张量。
/// 调用者须先通过 [`validate_soft_cross_entropy_shapes`]。
pub(crate) fn soft_cross_entropy_per_example(
    logits: &Tensor,
    target: &Tensor,
    weight: Option<&Tensor>,
) -> Tensor {
    let log_softmax = logits.log_softmax_rows();
    per_example_from_parts(&log_softmax, &weighted_target(target, weight))
}

// w_y * t_iy，类别权重沿行广播
fn weighted_target(target: &Tensor, weight: Option<&Tensor>) -> Tensor {
    match weight {
        Some(w) => target * w,
        None => target.clone(),
    }
}

fn per_example_from_parts(log_softmax: &Tensor, weighted_target: &Tensor) -> Tensor {
    (-(log_softmax * weighted_target)).sum_axis(1)
}

/*
 * @Author       : 老董
 * @Date         : 2025-01-21
 * @Description  : 带类别权重的软标签交叉熵损失函数（PyTorch 风格 API）
 *
 * 提供两种调用方式：
 * - `compute`: 直接在 Tensor 上求值，不构建计算图
 * - `forward`: 在计算图上构建损失节点，可反向传播，并按 logits 节点智能缓存
 *
 * ```ignore
 * let criterion = WeightedSoftCrossEntropy::new(Some(&weight), true, true)?;
 * for (x_batch, soft_labels) in train_loader.iter() {
 *     let logits = model.forward(&x_batch)?;
 *     let loss = criterion.forward(&logits, &soft_labels)?;  // 自动缓存！
 *     loss.backward()?;
 * }
 * ```
 */

use super::nodes::raw_node::{
    Reduction, soft_cross_entropy_per_example, validate_soft_cross_entropy_shapes,
};
use super::{GraphError, NodeId, Var, VarLossOps};
use crate::errors::TensorError;
use crate::tensor::Tensor;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

// ==================== 配置 ====================

/// 软标签交叉熵的配置
///
/// ```ignore
/// let config = SoftCrossEntropyConfig::new()
///     .with_weight(Tensor::new(&[1.0, 2.0, 1.0], &[3]))
///     .with_reduction(Reduction::Sum);
/// let criterion = WeightedSoftCrossEntropy::from_config(config)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SoftCrossEntropyConfig {
    /// 类别权重 [`num_classes`]（未归一化）
    pub weight: Option<Tensor>,
    pub reduction: Reduction,
}

impl SoftCrossEntropyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weight(mut self, weight: Tensor) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    /// 以 PyTorch 旧式的 (`size_average`, `reduce`) 标志位设置 reduction
    pub fn with_flags(mut self, size_average: bool, reduce: bool) -> Self {
        self.reduction = Reduction::from_flags(size_average, reduce);
        self
    }
}

// ==================== 内部状态结构 ====================

/// 单个 logits 节点对应的损失状态
struct LossState {
    /// 缓存时的 logits 节点（用于确认来自同一个图）
    logits_node: Var,
    /// 内部创建的 target 输入节点
    target_node: Var,
    /// 内部创建的 loss 节点
    loss_node: Var,
}

// ==================== WeightedSoftCrossEntropy ====================

/// 带类别权重的软标签交叉熵损失函数
///
/// 对每个样本 i：`L_i = -Σ_y w_y * t[i, y] * log_softmax(x_i)_y`，
/// 其中 target 的每一行是类别概率分布（不做校验）。
///
/// 类别权重在构造时被缩放为均值 1（即和为类别数 K），之后不再改变。
///
/// # 智能缓存
/// `forward` 为每个 logits 节点只创建一次 target 节点与 loss 节点，
/// 之后的调用只更新 target 的值。
pub struct WeightedSoftCrossEntropy {
    /// 缩放后的类别权重 [`num_classes`]
    weight: Option<Tensor>,
    reduction: Reduction,
    /// 按 logits 节点 ID 缓存的 loss 状态
    cache: RefCell<HashMap<NodeId, LossState>>,
}

impl WeightedSoftCrossEntropy {
    /// 创建损失函数
    ///
    /// # 参数
    /// - `weight`: 可选的类别权重，须为非空、非负、有限且和不为 0 的一维张量
    /// - `size_average`: 为真时对样本求平均，否则求和（仅当 `reduce` 为真时有效）
    /// - `reduce`: 为假时返回逐样本损失
    pub fn new(weight: Option<&Tensor>, size_average: bool, reduce: bool) -> Result<Self, TensorError> {
        let weight = weight.map(rescale_class_weight).transpose()?;
        Ok(Self {
            weight,
            reduction: Reduction::from_flags(size_average, reduce),
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// 由配置创建损失函数
    pub fn from_config(config: SoftCrossEntropyConfig) -> Result<Self, TensorError> {
        let weight = config.weight.as_ref().map(rescale_class_weight).transpose()?;
        Ok(Self {
            weight,
            reduction: config.reduction,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// 缩放后的类别权重（均值为 1）
    pub const fn weight(&self) -> Option<&Tensor> {
        self.weight.as_ref()
    }

    pub const fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// 实际生效的求平均标志（`size_average && reduce`）
    pub const fn size_average(&self) -> bool {
        self.reduction.size_average()
    }

    pub const fn reduce(&self) -> bool {
        self.reduction.reduce()
    }

    /// 直接在张量上计算损失（不构建计算图）
    ///
    /// # 参数
    /// - `logits`: [batch, `num_classes`] 的原始分数
    /// - `target`: 与 logits 同形状的类别概率
    ///
    /// # 返回
    /// `Reduction::None` 时为 [batch] 的逐样本损失，否则为 [1] 的标量
    pub fn compute(&self, logits: &Tensor, target: &Tensor) -> Result<Tensor, TensorError> {
        validate_soft_cross_entropy_shapes(logits.shape(), target.shape(), self.weight.as_ref())?;

        let per_example = soft_cross_entropy_per_example(logits, target, self.weight.as_ref());
        log::trace!(
            "软标签交叉熵：batch={}，reduction={:?}",
            per_example.size(),
            self.reduction
        );
        Ok(match self.reduction {
            Reduction::None => per_example,
            Reduction::Mean => per_example.mean(),
            Reduction::Sum => per_example.sum(),
        })
    }

    /// 在计算图上构建损失（PyTorch 风格）
    ///
    /// # 参数
    /// - `logits`: 模型输出节点 [batch, `num_classes`]
    /// - `target`: 类别概率
    ///
    /// # 返回
    /// 损失值节点：`Reduction::None` 时为 [batch, 1]，否则为 [1, 1]（可直接调用 `.backward()`）
    ///
    /// # 智能缓存
    /// - 相同 logits 节点复用已创建的 loss 子图
    /// - 不同 logits 节点自动创建新的 loss 子图
    pub fn forward(&self, logits: &Var, target: &Tensor) -> Result<Var, GraphError> {
        let logits_shape = logits.value_expected_shape()?;
        validate_soft_cross_entropy_shapes(&logits_shape, target.shape(), self.weight.as_ref())?;

        let logits_id = logits.node_id();
        let mut cache = self.cache.borrow_mut();

        if let Some(s) = cache.get(&logits_id) {
            if s.logits_node.same_graph(logits) {
                // 缓存命中：复用已有的 loss 子图
                s.target_node.set_value(target)?;
                return Ok(s.loss_node.clone());
            }
        }

        // 缓存未命中：创建新的 loss 子图
        let graph = logits.get_graph();
        let target_node = graph.target(target.shape())?;
        target_node.set_value(target)?;
        let loss_node = logits.soft_cross_entropy(&target_node, self.weight.as_ref(), self.reduction)?;

        cache.insert(
            logits_id,
            LossState {
                logits_node: logits.clone(),
                target_node,
                loss_node: loss_node.clone(),
            },
        );

        Ok(loss_node)
    }

    /// 获取缓存数量
    pub fn cache_size(&self) -> usize {
        self.cache.borrow().len()
    }

    /// 清空缓存
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl Default for WeightedSoftCrossEntropy {
    fn default() -> Self {
        Self {
            weight: None,
            reduction: Reduction::Mean,
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl fmt::Debug for WeightedSoftCrossEntropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedSoftCrossEntropy")
            .field("weight", &self.weight)
            .field("reduction", &self.reduction)
            .field("cache_size", &self.cache_size())
            .finish()
    }
}

/// 检查类别权重并缩放为均值 1：`w / sum(w) * K`
fn rescale_class_weight(weight: &Tensor) -> Result<Tensor, TensorError> {
    if weight.dimension() != 1 {
        return Err(TensorError::InvalidArgument(format!(
            "类别权重必须是一维张量，但其形状为{:?}",
            weight.shape()
        )));
    }
    let num_classes = weight.size();
    if num_classes == 0 {
        return Err(TensorError::InvalidArgument("类别权重不能为空".to_string()));
    }
    if !weight.is_finite() || weight.data_as_vec().iter().any(|&w| w < 0.0) {
        return Err(TensorError::InvalidArgument(
            "类别权重必须是非负的有限值".to_string(),
        ));
    }
    let total = weight.sum().get_data_number().unwrap_or(0.0);
    if total <= 0.0 {
        return Err(TensorError::InvalidArgument(
            "类别权重之和必须大于0".to_string(),
        ));
    }

    let rescaled = weight / total * num_classes as f32;
    log::debug!("类别权重由{:?}缩放为{:?}", weight.data_as_vec(), rescaled.data_as_vec());
    Ok(rescaled)
}

use super::raw_node::{
    InputVariant, LogSoftmax, NodeType, Parameter, Reduction, SoftCrossEntropy, TraitNode,
};
use crate::nn::GraphError;
use crate::nn::format_node_display;
use crate::tensor::Tensor;
use std::fmt;

/// 图中节点的唯一标识（由所在图分配，从1开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 节点句柄：在具体节点（`NodeType`）之外附加图层面的元信息
#[derive(Clone)]
pub(crate) struct NodeHandle {
    id: NodeId,
    name: String,
    raw_node: NodeType,
    last_forward_pass_id: u64,
    last_backward_pass_id: u64,
}

impl NodeHandle {
    fn new<T: Into<NodeType>>(raw_node: T) -> Self {
        Self {
            id: NodeId(0),
            name: String::new(),
            raw_node: raw_node.into(),
            last_forward_pass_id: 0,
            last_backward_pass_id: 0,
        }
    }

    // ========== 各类节点的构造 ==========

    pub(crate) fn new_basic_input(shape: &[usize]) -> Result<Self, GraphError> {
        Ok(Self::new(InputVariant::new_data(shape)?))
    }

    pub(crate) fn new_target_input(shape: &[usize]) -> Result<Self, GraphError> {
        Ok(Self::new(InputVariant::new_target(shape)?))
    }

    pub(crate) fn new_parameter(shape: &[usize]) -> Result<Self, GraphError> {
        Ok(Self::new(Parameter::new(shape)?))
    }

    pub(crate) fn new_parameter_seeded(shape: &[usize], seed: u64) -> Result<Self, GraphError> {
        Ok(Self::new(Parameter::new_seeded(shape, seed)?))
    }

    pub(crate) fn new_log_softmax(parents: &[&Self]) -> Result<Self, GraphError> {
        Ok(Self::new(LogSoftmax::new(parents)?))
    }

    pub(crate) fn new_soft_cross_entropy(
        parents: &[&Self],
        weight: Option<&Tensor>,
        reduction: Reduction,
    ) -> Result<Self, GraphError> {
        Ok(Self::new(SoftCrossEntropy::new(parents, weight, reduction)?))
    }

    /// 由所在的图在加入节点时调用
    pub(crate) fn bind_id_and_name(&mut self, id: NodeId, name: &str) {
        self.id = id;
        self.name = name.to_string();
    }

    // ========== 访问器 ==========

    pub(crate) const fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) const fn node_type(&self) -> &NodeType {
        &self.raw_node
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.raw_node.type_name()
    }

    pub(crate) fn value_expected_shape(&self) -> &[usize] {
        self.raw_node.value_expected_shape()
    }

    pub(crate) fn value(&self) -> Option<&Tensor> {
        self.raw_node.value()
    }

    pub(crate) fn has_value(&self) -> bool {
        self.value().is_some()
    }

    pub(crate) fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.raw_node.set_value(value)
    }

    pub(crate) fn clear_value(&mut self) -> Result<(), GraphError> {
        self.raw_node.clear_value()
    }

    pub(crate) fn grad(&self) -> Option<&Tensor> {
        self.raw_node.grad()
    }

    pub(crate) fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.raw_node.set_grad(grad)
    }

    pub(crate) fn clear_grad(&mut self) -> Result<(), GraphError> {
        self.raw_node.clear_grad()
    }

    pub(crate) const fn last_forward_pass_id(&self) -> u64 {
        self.last_forward_pass_id
    }

    pub(crate) const fn set_last_forward_pass_id(&mut self, id: u64) {
        self.last_forward_pass_id = id;
    }

    pub(crate) const fn set_last_backward_pass_id(&mut self, id: u64) {
        self.last_backward_pass_id = id;
    }

    // ========== 计算 ==========

    pub(crate) fn calc_value_by_parents(&mut self, parents: &[&Self]) -> Result<(), GraphError> {
        self.raw_node.calc_value_by_parents(parents)
    }

    pub(crate) fn calc_grad_to_parent(
        &self,
        target_parent: &Self,
        upstream_grad: &Tensor,
        assistant_parent: Option<&Self>,
    ) -> Result<Tensor, GraphError> {
        self.raw_node
            .calc_grad_to_parent(target_parent, upstream_grad, assistant_parent)
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            format_node_display(self.id, &self.name, self.type_name())
        )
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @Description  : GraphInner VJP 反向传播
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::NodeType;
use crate::tensor::Tensor;
use std::collections::HashSet;

impl GraphInner {
    // ========== VJP 反向传播核心 ==========

    /// 反向传播，返回损失的标量值。传播结束后释放中间节点的值与梯度
    pub fn backward(&mut self, loss: NodeId) -> Result<f32, GraphError> {
        self.backward_ex(loss, false)
    }

    /// 反向传播（扩展版本）
    ///
    /// `retain_graph` 为 true 时保留中间节点的值与梯度，可在同一前向结果上再次反向传播
    pub fn backward_ex(&mut self, loss: NodeId, retain_graph: bool) -> Result<f32, GraphError> {
        let loss_node = self.get_node(loss)?;
        let loss_value = loss_node.value().ok_or_else(|| {
            GraphError::ComputationError(format!("损失{loss_node}没有值，请先执行 forward"))
        })?;

        let loss_scalar = loss_value.get_data_number().ok_or_else(|| {
            GraphError::InvalidOperation(format!(
                "反向传播要求损失为标量 [1, 1]，但得到 {:?}",
                loss_value.shape()
            ))
        })?;

        let seed_grad = Tensor::ones(loss_value.shape());
        self.backward_vjp_core(loss, &seed_grad)?;

        if !retain_graph {
            self.release_intermediate_results()?;
        }

        Ok(loss_scalar)
    }

    /// 以指定的上游梯度从 `output` 开始反向传播（输出不必是标量，如逐样本损失）
    ///
    /// 中间结果总是被保留
    pub fn backward_with_grad(&mut self, output: NodeId, grad: &Tensor) -> Result<(), GraphError> {
        let output_node = self.get_node(output)?;
        if output_node.value().is_none() {
            return Err(GraphError::ComputationError(format!(
                "{output_node}没有值，请先执行 forward"
            )));
        }
        let expected = output_node.value_expected_shape();
        if grad.shape() != expected {
            return Err(GraphError::ShapeMismatch {
                expected: expected.to_vec(),
                got: grad.shape().to_vec(),
                message: format!("{output_node}的上游梯度形状必须与其输出一致"),
            });
        }
        self.backward_vjp_core(output, grad)
    }

    /// VJP 反向传播核心实现
    fn backward_vjp_core(&mut self, output_id: NodeId, seed_grad: &Tensor) -> Result<(), GraphError> {
        if !self.is_train_mode() {
            log::warn!("在 eval 模式下调用 backward，这通常是误用");
        }

        self.reset_intermediate_grad()?;
        self.get_node_mut(output_id)?.set_grad(Some(seed_grad))?;

        let topo_order = self.topological_sort_backward(output_id)?;
        for node_id in &topo_order {
            self.propagate_grad_to_parents(*node_id)?;
        }

        self.last_backward_pass_id += 1;
        let new_pass_id = self.last_backward_pass_id;
        for node_id in topo_order {
            let node = self.get_node_mut(node_id)?;
            if node.grad().is_some() {
                node.set_last_backward_pass_id(new_pass_id);
            }
        }
        log::trace!("图{}完成第{}次反向传播", self.name, new_pass_id);

        Ok(())
    }

    /// 将梯度从当前节点传播到其父节点（输入节点不接收梯度）
    fn propagate_grad_to_parents(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let parent_ids = self.get_node_parents(node_id)?;
        if parent_ids.is_empty() {
            return Ok(());
        }

        let parent_grads: Vec<(NodeId, Tensor)> = {
            let node = self.get_node(node_id)?;
            let Some(upstream_grad) = node.grad() else {
                return Ok(());
            };

            let mut grads = Vec::with_capacity(parent_ids.len());
            for parent_id in &parent_ids {
                let parent = self.get_node(*parent_id)?;
                if let NodeType::Input(_) = parent.node_type() {
                    continue;
                }

                let assistant = parent_ids
                    .iter()
                    .find(|&&id| id != *parent_id)
                    .map(|&id| self.get_node(id))
                    .transpose()?;

                let parent_grad = node.calc_grad_to_parent(parent, upstream_grad, assistant)?;
                grads.push((*parent_id, parent_grad));
            }
            grads
        };

        for (parent_id, parent_grad) in parent_grads {
            let parent_node = self.get_node_mut(parent_id)?;
            let new_grad = match parent_node.grad() {
                Some(existing_grad) => existing_grad + &parent_grad,
                None => parent_grad,
            };
            parent_node.set_grad(Some(&new_grad))?;
        }

        Ok(())
    }

    /// 反向拓扑序：每个节点都排在它的所有父节点之前
    fn topological_sort_backward(&self, output_id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        fn dfs(
            graph: &GraphInner,
            node_id: NodeId,
            visited: &mut HashSet<NodeId>,
            post_order: &mut Vec<NodeId>,
        ) -> Result<(), GraphError> {
            if !visited.insert(node_id) {
                return Ok(());
            }
            for parent_id in graph.get_node_parents(node_id)? {
                dfs(graph, parent_id, visited, post_order)?;
            }
            post_order.push(node_id);
            Ok(())
        }

        let mut visited = HashSet::new();
        let mut post_order = Vec::new();
        dfs(self, output_id, &mut visited, &mut post_order)?;
        post_order.reverse();
        Ok(post_order)
    }

    /// 清除所有节点的梯度
    pub fn clear_grad(&mut self) -> Result<(), GraphError> {
        for node in self.nodes.values_mut() {
            node.clear_grad()?;
        }
        Ok(())
    }

    /// 清零梯度（PyTorch 风格）
    pub fn zero_grad(&mut self) -> Result<(), GraphError> {
        self.clear_grad()
    }
}

/*
 * @Author       : 老董
 * @Date         : 2024-01-31 20:23:53
 * @Description  : 负责损失计算图（neural network）的构建：输入/参数节点、log-softmax、软标签交叉熵，以及VJP反向传播
 */

mod criterion;
mod display;
mod graph;
mod nodes;
mod var;
mod var_ops;

pub use criterion::{SoftCrossEntropyConfig, WeightedSoftCrossEntropy};
pub(in crate::nn) use display::format_node_display;
pub use graph::{Graph, GraphError, GraphInner};
pub use nodes::NodeId;
pub use nodes::raw_node::Reduction;
pub use var::{Init, Var};
pub use var_ops::{VarActivationOps, VarLossOps};

#[cfg(test)]
mod tests;

//! # Soft CE
//!
//! `soft_ce`用纯rust实现带类别权重的软标签交叉熵损失（soft-target cross-entropy），
//! 既可以直接在[`tensor::Tensor`]上求值，也可以作为计算图中的可微节点参与反向传播。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
pub mod utils;

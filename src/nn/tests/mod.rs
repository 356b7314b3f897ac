mod criterion;
mod node_soft_cross_entropy;
mod var_ops;

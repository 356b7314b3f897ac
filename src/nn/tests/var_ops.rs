use crate::nn::{Graph, Reduction, VarActivationOps, VarLossOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_var_log_softmax_chain() {
    let graph = Graph::new();
    let x = graph.input(&Tensor::new(&[1., 2., 3.], &[1, 3])).unwrap();
    let y = x.log_softmax().unwrap();
    y.forward().unwrap();

    assert_abs_diff_eq!(
        y.value().unwrap().unwrap(),
        Tensor::new(&[-2.407_606, -1.407_606, -0.407_606], &[1, 3]),
        epsilon = 1e-5
    );
}

#[test]
fn test_var_cross_entropy_defaults_to_unweighted_mean() {
    let graph = Graph::new();
    let logits = graph
        .input(&Tensor::new(&[0., 0., 10., -10.], &[2, 2]))
        .unwrap();
    let target = graph
        .input(&Tensor::new(&[0.5, 0.5, 1., 0.], &[2, 2]))
        .unwrap();

    let loss = logits.cross_entropy(&target).unwrap();
    let explicit = logits
        .soft_cross_entropy(&target, None, Reduction::Mean)
        .unwrap();
    loss.forward().unwrap();
    explicit.forward().unwrap();

    assert_abs_diff_eq!(loss.item().unwrap(), 0.346_573_6, epsilon = 1e-6);
    assert_abs_diff_eq!(loss.item().unwrap(), explicit.item().unwrap());
}

#[test]
fn test_var_item_requires_value() {
    let graph = Graph::new();
    let logits = graph.input(&Tensor::zeros(&[1, 2])).unwrap();
    let target = graph.input(&Tensor::zeros(&[1, 2])).unwrap();
    let loss = logits.cross_entropy(&target).unwrap();

    // 未执行 forward
    assert!(loss.item().is_err());
    // 非标量
    assert!(logits.item().is_err());
}

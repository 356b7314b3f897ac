use crate::assert_err;
use crate::nn::{Graph, GraphError, Init, Reduction, Var, VarLossOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

// 权重 [2, 1, 1] 缩放为均值 1 后的结果
fn rescaled_weight() -> Tensor {
    Tensor::new(&[1.5, 0.75, 0.75], &[3])
}

fn logits_and_target(graph: &Graph) -> (Var, Var) {
    let logits = graph.parameter(&[2, 3], Init::Zeros, "logits").unwrap();
    logits
        .set_value(&Tensor::new(&[0.5, -1., 2., 1., 0., -0.5], &[2, 3]))
        .unwrap();
    let target = graph
        .input(&Tensor::new(&[0.1, 0.6, 0.3, 0.7, 0.2, 0.1], &[2, 3]))
        .unwrap();
    (logits, target)
}

#[test]
fn test_soft_cross_entropy_creation() {
    let graph = Graph::new();
    let (logits, target) = logits_and_target(&graph);

    let mean = logits
        .soft_cross_entropy(&target, None, Reduction::Mean)
        .unwrap();
    let none = logits
        .soft_cross_entropy(&target, None, Reduction::None)
        .unwrap();

    assert_eq!(mean.value_expected_shape().unwrap(), vec![1, 1]);
    assert_eq!(none.value_expected_shape().unwrap(), vec![2, 1]);
    assert_eq!(
        graph.inner().get_node_name(mean.node_id()).unwrap(),
        "soft_cross_entropy_1"
    );
}

#[test]
fn test_soft_cross_entropy_shape_mismatch() {
    let graph = Graph::new();
    let logits = graph.input(&Tensor::zeros(&[2, 3])).unwrap();
    let target = graph.input(&Tensor::zeros(&[2, 2])).unwrap();

    let result = logits.soft_cross_entropy(&target, None, Reduction::Mean);
    assert_err!(
        result,
        GraphError::ShapeMismatch([2, 3], [2, 2], "logits 和 target 形状必须相同")
    );
}

#[test]
fn test_soft_cross_entropy_weight_length_mismatch() {
    let graph = Graph::new();
    let logits = graph.input(&Tensor::zeros(&[2, 3])).unwrap();
    let target = graph.input(&Tensor::zeros(&[2, 3])).unwrap();
    let weight = Tensor::new(&[1., 1.], &[2]);

    let result = logits.soft_cross_entropy(&target, Some(&weight), Reduction::Sum);
    assert_err!(
        result,
        GraphError::ShapeMismatch([3], [2], "类别权重的长度必须等于类别数")
    );
}

#[test]
fn test_soft_cross_entropy_rejects_vars_from_other_graph() {
    let graph = Graph::new();
    let other = Graph::new();
    let logits = graph.input(&Tensor::zeros(&[1, 2])).unwrap();
    let target = other.input(&Tensor::zeros(&[1, 2])).unwrap();

    assert_err!(
        logits.soft_cross_entropy(&target, None, Reduction::Mean),
        GraphError::InvalidOperation(msg) if msg.contains("不同 Graph")
    );
}

#[test]
fn test_soft_cross_entropy_forward_per_example() {
    let graph = Graph::new();
    let (logits, target) = logits_and_target(&graph);
    let weight = rescaled_weight();

    let loss = logits
        .soft_cross_entropy(&target, Some(&weight), Reduction::None)
        .unwrap();
    loss.forward().unwrap();

    let expected = Tensor::new(&[1.774_081_8, 0.854_570_2], &[2, 1]);
    assert_abs_diff_eq!(loss.value().unwrap().unwrap(), expected, epsilon = 1e-5);
}

#[test]
fn test_soft_cross_entropy_forward_mean_and_sum() {
    let graph = Graph::new();
    let (logits, target) = logits_and_target(&graph);
    let weight = rescaled_weight();

    let mean = logits
        .soft_cross_entropy(&target, Some(&weight), Reduction::Mean)
        .unwrap();
    let sum = logits
        .soft_cross_entropy(&target, Some(&weight), Reduction::Sum)
        .unwrap();
    mean.forward().unwrap();
    sum.forward().unwrap();

    assert_abs_diff_eq!(mean.item().unwrap(), 1.314_326, epsilon = 1e-5);
    assert_abs_diff_eq!(sum.item().unwrap(), 2.628_652, epsilon = 1e-5);
}

#[test]
fn test_soft_cross_entropy_backward_to_logits() {
    let graph = Graph::new();
    let (logits, target) = logits_and_target(&graph);
    let weight = rescaled_weight();

    let loss = logits
        .soft_cross_entropy(&target, Some(&weight), Reduction::Sum)
        .unwrap();
    loss.backward().unwrap();

    // s * (softmax * Σ_y w_y t_y - w * t)
    let expected = Tensor::new(
        &[
            -0.005_385_4,
            -0.417_732_1,
            0.423_117_6,
            -0.248_622_1,
            0.144_810_5,
            0.103_811_6,
        ],
        &[2, 3],
    );
    assert_abs_diff_eq!(logits.grad().unwrap().unwrap(), expected, epsilon = 1e-5);
}

#[test]
fn test_soft_cross_entropy_backward_mean_scales_by_batch() {
    let graph = Graph::new();
    let (logits, target) = logits_and_target(&graph);
    let weight = rescaled_weight();

    let sum = logits
        .soft_cross_entropy(&target, Some(&weight), Reduction::Sum)
        .unwrap();
    sum.backward().unwrap();
    let sum_grad = logits.grad().unwrap().unwrap();

    graph.zero_grad().unwrap();
    let mean = logits
        .soft_cross_entropy(&target, Some(&weight), Reduction::Mean)
        .unwrap();
    mean.backward().unwrap();

    assert_abs_diff_eq!(
        logits.grad().unwrap().unwrap(),
        &sum_grad / 2.,
        epsilon = 1e-6
    );
}

#[test]
fn test_soft_cross_entropy_backward_to_parameter_target() {
    let graph = Graph::new();
    let (logits, _) = logits_and_target(&graph);
    let target = graph.parameter(&[2, 3], Init::Zeros, "target").unwrap();
    target
        .set_value(&Tensor::new(&[0.1, 0.6, 0.3, 0.7, 0.2, 0.1], &[2, 3]))
        .unwrap();
    let weight = rescaled_weight();

    let loss = logits
        .soft_cross_entropy(&target, Some(&weight), Reduction::Sum)
        .unwrap();
    loss.backward().unwrap();

    // -s * w * log_softmax(logits)
    let expected = Tensor::new(
        &[
            2.611_967,
            2.430_983_5,
            0.180_983_5,
            0.696_553_2,
            1.098_276_6,
            1.473_276_6,
        ],
        &[2, 3],
    );
    assert_abs_diff_eq!(target.grad().unwrap().unwrap(), expected, epsilon = 1e-5);
}

#[test]
fn test_soft_cross_entropy_input_target_gets_no_grad() {
    let graph = Graph::new();
    let (logits, target) = logits_and_target(&graph);
    let loss = logits.cross_entropy(&target).unwrap();
    loss.backward().unwrap();

    assert!(logits.grad().unwrap().is_some());
    assert_err!(target.grad(), GraphError::InvalidOperation(_));
}

#[test]
fn test_soft_cross_entropy_per_example_backward_with_grad() {
    let graph = Graph::new();
    let (logits, target) = logits_and_target(&graph);

    let none = logits
        .soft_cross_entropy(&target, None, Reduction::None)
        .unwrap();
    // 逐样本损失不是标量，不能直接 backward
    assert_err!(none.backward(), GraphError::InvalidOperation(msg) if msg.contains("标量"));

    none.backward_with_grad(&Tensor::ones(&[2, 1])).unwrap();
    let none_grad = logits.grad().unwrap().unwrap();

    graph.zero_grad().unwrap();
    let sum = logits
        .soft_cross_entropy(&target, None, Reduction::Sum)
        .unwrap();
    sum.backward().unwrap();

    assert_abs_diff_eq!(logits.grad().unwrap().unwrap(), none_grad, epsilon = 1e-6);
}

#[test]
fn test_soft_cross_entropy_backward_with_grad_checks_shape() {
    let graph = Graph::new();
    let (logits, target) = logits_and_target(&graph);
    let none = logits
        .soft_cross_entropy(&target, None, Reduction::None)
        .unwrap();

    assert_err!(
        none.backward_with_grad(&Tensor::ones(&[1, 2])),
        GraphError::ShapeMismatch { .. }
    );
}

use crate::assert_err;
use crate::errors::TensorError;
use crate::nn::{
    Graph, GraphError, Init, Reduction, SoftCrossEntropyConfig, WeightedSoftCrossEntropy,
};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn random_batch(seed: u64, rows: usize, cols: usize) -> (Tensor, Tensor) {
    let mut rng = StdRng::seed_from_u64(seed);
    let logits = Tensor::normal_with_rng(0., 3., &[rows, cols], &mut rng);
    let raw = Tensor::uniform_with_rng(0., 1., &[rows, cols], &mut rng);
    let target = &raw / &raw.sum_axis_keepdims(1);
    (logits, target)
}

// ==================== 构造 ====================

#[test]
fn test_criterion_default() {
    let criterion = WeightedSoftCrossEntropy::default();
    assert!(criterion.weight().is_none());
    assert_eq!(criterion.reduction(), Reduction::Mean);
    assert!(criterion.size_average());
    assert!(criterion.reduce());
    assert_eq!(criterion.cache_size(), 0);
}

#[test]
fn test_criterion_flags_to_reduction() {
    let cases = [
        (true, true, Reduction::Mean, true),
        (false, true, Reduction::Sum, false),
        (true, false, Reduction::None, false),
        (false, false, Reduction::None, false),
    ];
    for (size_average, reduce, reduction, effective_size_average) in cases {
        let criterion = WeightedSoftCrossEntropy::new(None, size_average, reduce).unwrap();
        assert_eq!(criterion.reduction(), reduction);
        assert_eq!(criterion.reduce(), reduce);
        assert_eq!(criterion.size_average(), effective_size_average);
    }
}

#[test]
fn test_criterion_weight_rescaled_to_mean_one() {
    let weight = Tensor::new(&[1., 2., 3., 6.], &[4]);
    let criterion = WeightedSoftCrossEntropy::new(Some(&weight), true, true).unwrap();
    let effective = criterion.weight().unwrap();

    assert_abs_diff_eq!(effective.mean().get_data_number().unwrap(), 1., epsilon = 1e-6);
    assert_abs_diff_eq!(
        effective,
        &Tensor::new(&[1. / 3., 2. / 3., 1., 2.], &[4]),
        epsilon = 1e-6
    );
    // 比例不变
    assert_abs_diff_eq!(effective[[3]] / effective[[0]], 6., epsilon = 1e-5);
}

#[test]
fn test_criterion_weight_with_zero_entry() {
    let weight = Tensor::new(&[2., 0., 2.], &[3]);
    let criterion = WeightedSoftCrossEntropy::new(Some(&weight), true, true).unwrap();
    let effective = criterion.weight().unwrap();

    assert_abs_diff_eq!(effective.sum().get_data_number().unwrap(), 3., epsilon = 1e-6);
    assert_eq!(effective, &Tensor::new(&[1.5, 0., 1.5], &[3]));
}

#[test]
fn test_criterion_invalid_weight() {
    assert_err!(
        WeightedSoftCrossEntropy::new(Some(&Tensor::ones(&[2, 3])), true, true),
        TensorError::InvalidArgument(msg) if msg.contains("一维")
    );
    assert_err!(
        WeightedSoftCrossEntropy::new(Some(&Tensor::zeros(&[0])), true, true),
        TensorError::InvalidArgument("类别权重不能为空")
    );
    assert_err!(
        WeightedSoftCrossEntropy::new(Some(&Tensor::new(&[1., -1.], &[2])), true, true),
        TensorError::InvalidArgument("类别权重必须是非负的有限值")
    );
    assert_err!(
        WeightedSoftCrossEntropy::new(Some(&Tensor::new(&[1., f32::NAN], &[2])), true, true),
        TensorError::InvalidArgument("类别权重必须是非负的有限值")
    );
    assert_err!(
        WeightedSoftCrossEntropy::new(Some(&Tensor::zeros(&[3])), true, true),
        TensorError::InvalidArgument("类别权重之和必须大于0")
    );
}

#[test]
fn test_criterion_from_config() {
    let config = SoftCrossEntropyConfig::new()
        .with_weight(Tensor::new(&[1., 3.], &[2]))
        .with_reduction(Reduction::Sum);
    let criterion = WeightedSoftCrossEntropy::from_config(config).unwrap();
    assert_eq!(criterion.reduction(), Reduction::Sum);
    assert_abs_diff_eq!(
        criterion.weight().unwrap(),
        &Tensor::new(&[0.5, 1.5], &[2]),
        epsilon = 1e-6
    );

    let config = SoftCrossEntropyConfig::default().with_flags(true, false);
    assert_eq!(config.reduction, Reduction::None);
    assert!(config.weight.is_none());

    let config = SoftCrossEntropyConfig::new().with_weight(Tensor::zeros(&[2]));
    assert_err!(
        WeightedSoftCrossEntropy::from_config(config),
        TensorError::InvalidArgument(_)
    );
}

// ==================== 求值 ====================

#[test]
fn test_compute_two_examples_scenario() {
    let logits = Tensor::new(&[0., 0., 10., -10.], &[2, 2]);
    let target = Tensor::new(&[0.5, 0.5, 1., 0.], &[2, 2]);

    let per_example = WeightedSoftCrossEntropy::new(None, true, false)
        .unwrap()
        .compute(&logits, &target)
        .unwrap();
    assert_eq!(per_example.shape(), &[2]);
    assert_abs_diff_eq!(per_example[[0]], std::f32::consts::LN_2, epsilon = 1e-6);
    assert_abs_diff_eq!(per_example[[1]], 0., epsilon = 1e-6);

    let mean = WeightedSoftCrossEntropy::default()
        .compute(&logits, &target)
        .unwrap();
    assert_eq!(mean.shape(), &[1]);
    assert_abs_diff_eq!(mean.get_data_number().unwrap(), 0.346_573_6, epsilon = 1e-6);
}

/// PyTorch 验证:
/// ```python
/// F.cross_entropy(torch.tensor([[1., 2., 3.]]), torch.tensor([2]))  # 0.4076
/// F.cross_entropy(torch.tensor([[0.5, -1., 2.]]), torch.tensor([1]))  # 3.2413
/// ```
#[test]
fn test_compute_hard_labels_match_classic_cross_entropy() {
    let logits = Tensor::new(&[1., 2., 3., 0.5, -1., 2.], &[2, 3]);
    let one_hot = Tensor::new(&[0., 0., 1., 0., 1., 0.], &[2, 3]);
    let per_example = WeightedSoftCrossEntropy::new(None, true, false)
        .unwrap()
        .compute(&logits, &one_hot)
        .unwrap();

    // 经典交叉熵：logsumexp(x) - x[label]
    assert_abs_diff_eq!(per_example[[0]], 0.407_606, epsilon = 1e-5);
    assert_abs_diff_eq!(per_example[[1]], 3.241_311, epsilon = 1e-5);
}

#[test]
fn test_compute_weighted_value() {
    // 权重 [1, 2, 1] 缩放为 [0.75, 1.5, 0.75]
    let weight = Tensor::new(&[1., 2., 1.], &[3]);
    let criterion = WeightedSoftCrossEntropy::new(Some(&weight), false, true).unwrap();
    let loss = criterion
        .compute(
            &Tensor::new(&[1., 2., 3.], &[1, 3]),
            &Tensor::new(&[0.2, 0.3, 0.5], &[1, 3]),
        )
        .unwrap();
    assert_abs_diff_eq!(loss.get_data_number().unwrap(), 1.147_415_8, epsilon = 1e-5);
}

#[test]
fn test_compute_reduction_consistency() {
    let (logits, target) = random_batch(3, 5, 4);
    let weight = Tensor::new(&[0.5, 1., 2., 0.25], &[4]);
    let none = WeightedSoftCrossEntropy::new(Some(&weight), true, false).unwrap();
    let mean = WeightedSoftCrossEntropy::new(Some(&weight), true, true).unwrap();
    let sum = WeightedSoftCrossEntropy::new(Some(&weight), false, true).unwrap();

    let per_example = none.compute(&logits, &target).unwrap();
    assert_eq!(per_example.shape(), &[5]);
    assert_abs_diff_eq!(
        mean.compute(&logits, &target).unwrap(),
        per_example.mean(),
        epsilon = 1e-5
    );
    assert_abs_diff_eq!(
        sum.compute(&logits, &target).unwrap(),
        per_example.sum(),
        epsilon = 1e-5
    );
}

#[test]
fn test_compute_column_permutation_invariance() {
    let (logits, target) = random_batch(11, 3, 5);
    let weight = Tensor::new(&[1., 2., 3., 4., 5.], &[5]);
    let order = [3, 0, 4, 1, 2];

    let original = WeightedSoftCrossEntropy::new(Some(&weight), true, false)
        .unwrap()
        .compute(&logits, &target)
        .unwrap();
    let permuted = WeightedSoftCrossEntropy::new(Some(&weight.permute(&order).unwrap()), true, false)
        .unwrap()
        .compute(
            &logits.permute_columns(&order).unwrap(),
            &target.permute_columns(&order).unwrap(),
        )
        .unwrap();

    assert_abs_diff_eq!(original, permuted, epsilon = 1e-5);
}

#[test]
fn test_compute_huge_logits_stays_finite() {
    let logits = Tensor::new(&[1e4, -1e4, 0., -1e4, 1e4, 0.], &[2, 3]);
    let target = Tensor::new(&[0.7, 0.1, 0.2, 0., 0.5, 0.5], &[2, 3]);
    let per_example = WeightedSoftCrossEntropy::new(None, true, false)
        .unwrap()
        .compute(&logits, &target)
        .unwrap();

    assert!(per_example.is_finite());
    // 0.1 * 2e4 + 0.2 * 1e4
    assert_abs_diff_eq!(per_example[[0]], 4e3, epsilon = 1.);
}

#[test]
fn test_compute_shape_errors() {
    let criterion = WeightedSoftCrossEntropy::default();
    assert_err!(
        criterion.compute(&Tensor::zeros(&[2, 3]), &Tensor::zeros(&[2, 2])),
        TensorError::ShapeMismatch([2, 3], [2, 2], "logits 和 target 形状必须相同")
    );
    assert_err!(
        criterion.compute(&Tensor::zeros(&[3]), &Tensor::zeros(&[3])),
        TensorError::ShapeMismatch { .. }
    );

    let weighted = WeightedSoftCrossEntropy::new(Some(&Tensor::ones(&[4])), true, true).unwrap();
    assert_err!(
        weighted.compute(&Tensor::zeros(&[2, 3]), &Tensor::zeros(&[2, 3])),
        TensorError::ShapeMismatch([3], [4], "类别权重的长度必须等于类别数")
    );
}

#[test]
fn test_compute_does_not_validate_target_rows() {
    // target 行和不为 1 时照常计算
    let logits = Tensor::new(&[0., 0.], &[1, 2]);
    let target = Tensor::new(&[2., 2.], &[1, 2]);
    let loss = WeightedSoftCrossEntropy::default()
        .compute(&logits, &target)
        .unwrap();
    assert_abs_diff_eq!(
        loss.get_data_number().unwrap(),
        4. * std::f32::consts::LN_2,
        epsilon = 1e-5
    );
}

// ==================== 计算图 ====================

#[test]
fn test_forward_matches_compute() {
    let (logits_value, target) = random_batch(5, 4, 3);
    let weight = Tensor::new(&[3., 1., 1.], &[3]);
    for (size_average, reduce) in [(true, true), (false, true), (true, false)] {
        let criterion = WeightedSoftCrossEntropy::new(Some(&weight), size_average, reduce).unwrap();
        let graph = Graph::new();
        let logits = graph.input(&logits_value).unwrap();
        let loss = criterion.forward(&logits, &target).unwrap();
        loss.forward().unwrap();

        let graph_value = loss.value().unwrap().unwrap();
        let eager_value = criterion.compute(&logits_value, &target).unwrap();
        let expected_shape = if reduce { vec![1, 1] } else { vec![4, 1] };
        assert_eq!(graph_value.shape(), expected_shape.as_slice());
        assert_abs_diff_eq!(
            graph_value.reshape(eager_value.shape()),
            eager_value,
            epsilon = 1e-5
        );
    }
}

#[test]
fn test_forward_cache() {
    let criterion = WeightedSoftCrossEntropy::default();
    let graph = Graph::new();
    let a = graph.parameter(&[2, 2], Init::Zeros, "a").unwrap();
    let b = graph.parameter(&[2, 2], Init::Zeros, "b").unwrap();
    let t1 = Tensor::new(&[1., 0., 0., 1.], &[2, 2]);
    let t2 = Tensor::new(&[0.5, 0.5, 0.5, 0.5], &[2, 2]);

    let loss1 = criterion.forward(&a, &t1).unwrap();
    let nodes_after_first = graph.inner().nodes_count();
    let loss1_again = criterion.forward(&a, &t2).unwrap();
    assert_eq!(loss1.node_id(), loss1_again.node_id());
    assert_eq!(graph.inner().nodes_count(), nodes_after_first);
    assert_eq!(criterion.cache_size(), 1);

    // 缓存命中时 target 的值被更新：零 logits 下两行均为 ln2
    loss1_again.forward().unwrap();
    assert_abs_diff_eq!(
        loss1_again.item().unwrap(),
        std::f32::consts::LN_2,
        epsilon = 1e-6
    );

    let loss2 = criterion.forward(&b, &t1).unwrap();
    assert_ne!(loss1.node_id(), loss2.node_id());
    assert_eq!(criterion.cache_size(), 2);

    criterion.clear_cache();
    assert_eq!(criterion.cache_size(), 0);
}

#[test]
fn test_forward_cache_is_per_graph() {
    // 不同图中的 logits 节点可能有相同的 NodeId
    let criterion = WeightedSoftCrossEntropy::default();
    let g1 = Graph::new();
    let g2 = Graph::new();
    let a = g1.input(&Tensor::zeros(&[1, 2])).unwrap();
    let b = g2.input(&Tensor::zeros(&[1, 2])).unwrap();
    assert_eq!(a.node_id(), b.node_id());

    let target = Tensor::new(&[1., 0.], &[1, 2]);
    criterion.forward(&a, &target).unwrap();
    let loss_b = criterion.forward(&b, &target).unwrap();
    assert!(loss_b.same_graph(&b));
}

#[test]
fn test_forward_shape_errors() {
    let criterion = WeightedSoftCrossEntropy::default();
    let graph = Graph::new();
    let logits = graph.input(&Tensor::zeros(&[2, 3])).unwrap();

    assert_err!(
        criterion.forward(&logits, &Tensor::zeros(&[2, 2])),
        GraphError::ShapeMismatch([2, 3], [2, 2], "logits 和 target 形状必须相同")
    );
    assert_eq!(criterion.cache_size(), 0);
}

#[test]
fn test_criterion_debug() {
    let criterion = WeightedSoftCrossEntropy::new(None, false, true).unwrap();
    let text = format!("{criterion:?}");
    assert!(text.contains("Sum"));
    assert!(text.contains("cache_size: 0"));
}

/*
 * @Author       : 老董
 * @Date         : 2025-01-09
 * @Description  : 按行（最后一维）计算的数值稳定softmax与log-softmax
 *                 log_softmax(x)_i = (x_i - max(x)) - log(Σ exp(x_j - max(x)))
 */

use crate::errors::TensorError;
use crate::tensor::Tensor;

impl Tensor {
    /// 对二维张量`[batch, num_classes]`逐行计算log-softmax。
    /// 先减去每行最大值再取指数，避免上溢；绝不先求softmax再取对数。
    ///
    /// # Panics
    /// 若张量不是二维
    pub fn log_softmax_rows(&self) -> Tensor {
        assert!(self.dimension() == 2, "{}", TensorError::IncompatibleShape);
        let shifted = self - &self.max_axis_keepdims(1);
        let log_sum_exp = shifted.exp().sum_axis_keepdims(1).ln();
        shifted - log_sum_exp
    }

    /// 对二维张量`[batch, num_classes]`逐行计算softmax，每行之和为1
    pub fn softmax_rows(&self) -> Tensor {
        self.log_softmax_rows().exp()
    }
}

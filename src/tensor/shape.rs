use super::Tensor;
use crate::errors::TensorError;
use ndarray::Axis;
use std::collections::HashSet;

impl Tensor {
    /// 改变张量形状，元素总数必须保持不变，否则panic
    pub fn reshape(&self, shape: &[usize]) -> Self {
        let total_elements: usize = self.data.len();
        let new_total_elements: usize = shape.iter().product();
        assert!(
            total_elements == new_total_elements,
            "{}",
            TensorError::IncompatibleShape
        );
        let data = self.data.iter().copied().collect::<Vec<_>>();
        Tensor::new(&data, shape)
    }

    /// 按`order`重排二维张量的列：结果的第`j`列为原张量的第`order[j]`列。
    /// `order`须是`0..列数`的一个排列。
    pub fn permute_columns(&self, order: &[usize]) -> Result<Self, TensorError> {
        if self.dimension() != 2 {
            return Err(TensorError::ShapeMismatch {
                expected: vec![0, order.len()],
                got: self.shape().to_vec(),
                message: "只有二维张量才能重排列".to_string(),
            });
        }
        Self::check_permutation(order, self.shape()[1])?;
        Ok(Tensor {
            data: self.data.select(Axis(1), order),
        })
    }

    /// 按`order`重排一维张量的元素：结果的第`j`个元素为原张量的第`order[j]`个元素
    pub fn permute(&self, order: &[usize]) -> Result<Self, TensorError> {
        if self.dimension() != 1 {
            return Err(TensorError::ShapeMismatch {
                expected: vec![order.len()],
                got: self.shape().to_vec(),
                message: "只有一维张量才能按元素重排".to_string(),
            });
        }
        Self::check_permutation(order, self.shape()[0])?;
        Ok(Tensor {
            data: self.data.select(Axis(0), order),
        })
    }

    /// 取出二维张量的第`j`列，返回形状为`[rows]`的一维张量
    pub fn column(&self, j: usize) -> Self {
        assert!(
            self.dimension() == 2 && j < self.shape()[1],
            "{}",
            TensorError::IncompatibleShape
        );
        Tensor {
            data: self.data.index_axis(Axis(1), j).to_owned(),
        }
    }

    /// 在末尾追加一个长度为1的维度，如`[n]`->`[n, 1]`
    pub fn unsqueeze_last(&self) -> Self {
        let mut shape = self.shape().to_vec();
        shape.push(1);
        self.reshape(&shape)
    }

    fn check_permutation(order: &[usize], len: usize) -> Result<(), TensorError> {
        let unique = order.iter().collect::<HashSet<_>>();
        if order.len() != len || unique.len() != len || order.iter().any(|&i| i >= len) {
            return Err(TensorError::PermuteNeedUniqueAndInRange);
        }
        Ok(())
    }
}

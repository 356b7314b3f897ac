use crate::tensor::Tensor;
use ndarray::Axis;

impl From<f32> for Tensor {
    /// 实现 From<f32> trait 用于将`f32`类型转换为形状为`[1]`的张量
    fn from(scalar: f32) -> Self {
        Tensor::new(&[scalar], &[1])
    }
}

impl Tensor {
    /// 对张量中的所有元素求和并返回一个形状为[1]的标量。
    pub fn sum(&self) -> Tensor {
        Tensor::from(self.data.sum())
    }

    /// 对张量中的所有元素求平均并返回一个形状为[1]的标量。
    /// 空张量的平均值为NaN（与PyTorch一致）。
    pub fn mean(&self) -> Tensor {
        Tensor::from(self.data.sum() / self.size() as f32)
    }

    /// 沿`axis`求和，结果去掉该维度，如`[n, k]`沿1轴求和得到`[n]`
    pub fn sum_axis(&self, axis: usize) -> Tensor {
        Tensor {
            data: self.data.sum_axis(Axis(axis)),
        }
    }

    /// 沿`axis`求和并保留该维度（长度为1），便于之后与原张量广播
    pub fn sum_axis_keepdims(&self, axis: usize) -> Tensor {
        Tensor {
            data: self.data.sum_axis(Axis(axis)).insert_axis(Axis(axis)),
        }
    }

    /// 沿`axis`取最大值并保留该维度（长度为1）
    pub fn max_axis_keepdims(&self, axis: usize) -> Tensor {
        Tensor {
            data: self
                .data
                .fold_axis(Axis(axis), f32::NEG_INFINITY, |&max, &x| max.max(x))
                .insert_axis(Axis(axis)),
        }
    }

    pub fn exp(&self) -> Tensor {
        Tensor {
            data: self.data.mapv(f32::exp),
        }
    }

    /// 逐元素自然对数
    pub fn ln(&self) -> Tensor {
        Tensor {
            data: self.data.mapv(f32::ln),
        }
    }
}

use super::Tensor;
use ndarray::IxDyn;
use std::ops::{Index, IndexMut};

// 引用式索引，主要用于二维的[batch, num_classes]张量
impl Index<[usize; 2]> for Tensor {
    type Output = f32;

    fn index(&self, index: [usize; 2]) -> &Self::Output {
        &self.data[IxDyn(&index)]
    }
}

impl IndexMut<[usize; 2]> for Tensor {
    fn index_mut(&mut self, index: [usize; 2]) -> &mut Self::Output {
        &mut self.data[IxDyn(&index)]
    }
}

impl Index<[usize; 1]> for Tensor {
    type Output = f32;

    fn index(&self, index: [usize; 1]) -> &Self::Output {
        &self.data[IxDyn(&index)]
    }
}

impl IndexMut<[usize; 1]> for Tensor {
    fn index_mut(&mut self, index: [usize; 1]) -> &mut Self::Output {
        &mut self.data[IxDyn(&index)]
    }
}

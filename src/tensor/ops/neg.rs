use crate::tensor::Tensor;
use std::ops::Neg;

impl Neg for Tensor {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            data: self.data.mapv(|x| -x),
        }
    }
}

impl Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        Tensor {
            data: self.data.mapv(|x| -x),
        }
    }
}

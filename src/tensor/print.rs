use super::Tensor;
use std::fmt;

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "形状: {:?}", self.shape())?;
        match self.dimension() {
            0 | 1 => {
                for x in self.data.iter() {
                    write!(f, "{:8.4} ", x)?;
                }
                writeln!(f)
            }
            _ => {
                let cols = self.shape()[self.dimension() - 1].max(1);
                for (i, x) in self.data.iter().enumerate() {
                    write!(f, "{:8.4} ", x)?;
                    if (i + 1) % cols == 0 {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
        }
    }
}

use crate::errors::TensorError;
use crate::{assert_err, assert_panic};

#[test]
fn test_assert_panic_macro() {
    assert_panic!(panic!("test panic"));
    assert_panic!(panic!("custom test panic msg"), "custom test panic msg");
}

#[test]
fn test_assert_err_macro() {
    let result: Result<(), TensorError> = Err(TensorError::InvalidArgument("权重为空".to_string()));
    assert_err!(result);
    assert_err!(result, TensorError::InvalidArgument("权重为空"));
    assert_err!(result, TensorError::InvalidArgument(msg) if msg.contains("权重"));

    let result: Result<(), TensorError> = Err(TensorError::ShapeMismatch {
        expected: vec![2, 3],
        got: vec![2, 2],
        message: "logits与target形状必须相同".to_string(),
    });
    assert_err!(
        result,
        TensorError::ShapeMismatch([2, 3], [2, 2], "logits与target形状必须相同")
    );
    assert_err!(result, TensorError::ShapeMismatch { .. });
}

#[test]
fn test_assert_err_macro_on_ok_panics() {
    let result: Result<u8, TensorError> = Ok(1);
    assert_panic!(assert_err!(result, TensorError::IncompatibleShape));
}

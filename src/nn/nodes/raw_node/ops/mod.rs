mod log_softmax;

pub(crate) use log_softmax::LogSoftmax;

use super::NodeId;

/// 节点在日志与错误信息中的统一写法，如`节点[id=3, name=loss, type=soft_cross_entropy]`。
/// `NodeHandle`的`Display`及图构建时的`debug!`日志都经由此处
pub(in crate::nn) fn format_node_display(id: NodeId, name: &str, type_name: &str) -> String {
    format!("节点[id={id}, name={name}, type={type_name}]")
}

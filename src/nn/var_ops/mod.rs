/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @Description  : Var 扩展 trait 模块
 *
 * 按功能领域组织 Var 的扩展方法，用户按需 import。
 *
 * # 模块结构
 * - `activation`: 激活函数（log_softmax）
 * - `loss`: 损失函数（soft_cross_entropy, cross_entropy）
 *
 * # 使用示例
 * ```ignore
 * use soft_ce::nn::{Reduction, Var, VarActivationOps, VarLossOps};
 *
 * let log_probs = logits.log_softmax()?;
 * let loss = logits.soft_cross_entropy(&target, Some(&weight), Reduction::Sum)?;
 * ```
 */

mod activation;
mod loss;

pub use activation::VarActivationOps;
pub use loss::VarLossOps;

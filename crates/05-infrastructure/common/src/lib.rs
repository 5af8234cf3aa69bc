//! # Infrastructure Common
//!
//! 依赖注入容器各层共享的基础类型。
//!
//! ## 核心内容
//!
//! - [`DependencyError`] - 注册与解析错误
//! - [`ConfigError`] - 配置与清单加载错误
//! - [`Lifecycle`] - 定义的缓存策略
//! - [`ContainerScope`] - 容器身份信息（用于日志与诊断）

pub mod errors;
pub mod lifecycle;

pub use errors::*;
pub use lifecycle::*;

//! 依赖注入容器抽象接口
//!
//! 提供依赖注入容器的核心抽象

use crate::definition::RegistrationHandle;
use crate::resolver::ComponentResolver;
use infrastructure_common::{ContainerScope, DependencyError, Lifecycle};
use serde::{Deserialize, Serialize};

/// 依赖注入容器 trait
///
/// 在解析能力之上提供派生子容器、重置与缓存管理
pub trait DiContainer: ComponentResolver {
    /// 派生子容器
    ///
    /// `inherit` 为真时子容器可以解析本容器（及祖先）的定义；
    /// 否则子容器完全隔离。派生不会复制或修改本容器的状态。
    fn spawn(&self, inherit: bool) -> Self
    where
        Self: Sized;

    /// 移除本容器自己的所有定义
    fn reset(&self);

    /// 清理本容器自己的缓存；`forever` 为真时同时把这些定义改为不缓存
    fn clear_cache(&self, forever: bool);

    /// 检查名称是否注册在本容器自身
    fn has_local(&self, name: &str) -> bool;

    /// 本容器注册的名称
    fn registered_names(&self) -> Vec<String>;

    /// 获取可见定义的注册信息
    fn definition_info(&self, name: &str) -> Option<RegistrationHandle>;

    /// 容器作用域
    fn scope(&self) -> &ContainerScope;

    /// 获取统计信息
    fn stats(&self) -> ContainerStats;

    /// 验证容器状态（不调用任何生产者）
    fn validate(&self) -> Result<(), Vec<DependencyError>>;
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 根容器名称
    pub name: String,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 未显式指定时使用的生命周期
    pub default_lifecycle: Lifecycle,
    /// 覆盖已有定义时是否输出警告
    pub warn_on_overwrite: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "root".to_string(),
            max_resolution_depth: 100,
            default_lifecycle: Lifecycle::Application,
            warn_on_overwrite: false,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    /// 已注册定义数量
    pub registered_components: usize,
    /// 当前缓存的实例数量
    pub cached_instances: usize,
    /// 顶层解析请求数量
    pub resolutions: u64,
    /// 缓存命中次数
    pub cache_hits: u64,
    /// 解析错误数量
    pub resolution_errors: u64,
}

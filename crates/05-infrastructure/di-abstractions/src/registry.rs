//! 定义注册表抽象接口

use crate::definition::{Definition, RegistrationHandle};
use crate::factory::Instance;
use infrastructure_common::{DependencyError, DependencyResult, Lifecycle};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// 定义注册表 trait
///
/// 只负责本容器自己的定义；沿父容器链查找由解析器完成。
pub trait DefinitionRegistry: Send + Sync {
    /// 注册定义，同名定义会被覆盖
    fn register(
        &self,
        definition: Definition,
        lifecycle: Lifecycle,
    ) -> DependencyResult<RegistrationHandle>;

    /// 查找本地定义
    fn lookup(&self, name: &str) -> Option<RegistryEntry>;

    /// 检查本地是否注册了该名称
    fn contains(&self, name: &str) -> bool;

    /// 本地注册的名称（已排序）
    fn names(&self) -> Vec<String>;

    /// 本地定义数量
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 移除所有本地定义
    fn reset(&self);
}

/// 注册表条目快照
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub definition: Arc<Definition>,
    pub lifecycle: Lifecycle,
    /// 已解析的缓存值
    pub cached: Option<Instance>,
}

/// 依赖图节点
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    /// 定义名称
    pub name: String,
    /// 依赖名称列表（声明顺序）
    pub dependencies: Vec<String>,
}

impl DependencyGraphNode {
    pub fn of(definition: &Definition) -> Self {
        Self {
            name: definition.name().to_string(),
            dependencies: definition.dependencies().to_vec(),
        }
    }
}

/// 循环依赖检测器
pub trait CircularDependencyDetector: Send + Sync {
    /// 检测循环依赖，返回第一个发现的环
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> DependencyResult<()>;
}

/// 默认循环依赖检测器
#[derive(Debug, Default)]
pub struct DefaultCircularDependencyDetector;

impl CircularDependencyDetector for DefaultCircularDependencyDetector {
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> DependencyResult<()> {
        let nodes: HashMap<&str, &DependencyGraphNode> =
            graph.iter().map(|node| (node.name.as_str(), node)).collect();
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        // 按名称排序保证报告的环是确定的
        let mut names: Vec<&str> = nodes.keys().copied().collect();
        names.sort_unstable();

        for name in names {
            if !visited.contains(name) {
                Self::dfs_check(name, &nodes, &mut visited, &mut path)?;
            }
        }

        Ok(())
    }
}

impl DefaultCircularDependencyDetector {
    fn dfs_check<'g>(
        current: &'g str,
        nodes: &HashMap<&'g str, &'g DependencyGraphNode>,
        visited: &mut HashSet<&'g str>,
        path: &mut Vec<&'g str>,
    ) -> DependencyResult<()> {
        if let Some(start) = path.iter().position(|name| *name == current) {
            let mut cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
            cycle.push(current.to_string());
            return Err(DependencyError::CircularDependency { path: cycle });
        }

        if visited.contains(current) {
            return Ok(());
        }

        path.push(current);

        // 未注册的依赖不在图中，由调用方单独报告
        if let Some(&node) = nodes.get(current) {
            for dep in &node.dependencies {
                Self::dfs_check(dep.as_str(), nodes, visited, path)?;
            }
        }

        path.pop();
        visited.insert(current);

        Ok(())
    }
}

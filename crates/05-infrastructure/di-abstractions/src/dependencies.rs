//! 已解析的依赖参数

use crate::factory::{downcast_instance, Instance};
use infrastructure_common::{DependencyError, DependencyResult};
use std::sync::Arc;

/// 按声明顺序排列的已解析依赖
///
/// 传给构造器与工厂函数，相当于有序的调用参数。
#[derive(Clone, Default)]
pub struct Dependencies {
    values: Vec<(String, Instance)>,
}

impl Dependencies {
    /// 创建空参数列表
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个已解析的依赖
    pub fn push(&mut self, name: impl Into<String>, value: Instance) {
        self.values.push((name.into(), value));
    }

    /// 按位置获取并转型
    pub fn get<T>(&self, index: usize) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let (name, value) = self
            .values
            .get(index)
            .ok_or_else(|| DependencyError::MissingArgument {
                name: format!("#{index}"),
            })?;
        downcast_instance(name, Arc::clone(value))
    }

    /// 按名称获取并转型
    pub fn by_name<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let value = self
            .raw_by_name(name)
            .ok_or_else(|| DependencyError::MissingArgument {
                name: name.to_string(),
            })?;
        downcast_instance(name, Arc::clone(value))
    }

    /// 按位置获取原始值
    pub fn raw(&self, index: usize) -> Option<&Instance> {
        self.values.get(index).map(|(_, value)| value)
    }

    /// 按名称获取原始值
    pub fn raw_by_name(&self, name: &str) -> Option<&Instance> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 依赖名称（声明顺序）
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

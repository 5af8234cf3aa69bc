//! 宿主框架的依赖描述与解析结果
//!
//! 宿主框架声明它需要哪些名称，容器返回别名到值的映射；
//! 如何把这些值挂到宿主自己的对象上由宿主负责。

use crate::factory::{downcast_instance, Instance};
use infrastructure_common::{DependencyError, DependencyResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 依赖描述
///
/// 反序列化时接受三种形态：字符串、字符串数组、别名到名称的对象。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyDescriptor {
    /// 单个名称，别名即名称
    Single(String),
    /// 名称列表，别名即名称
    List(Vec<String>),
    /// 别名 -> 名称
    Aliased(BTreeMap<String, String>),
}

impl DependencyDescriptor {
    /// 展开为 (别名, 名称) 列表
    pub fn entries(&self) -> Vec<(&str, &str)> {
        match self {
            Self::Single(name) => vec![(name.as_str(), name.as_str())],
            Self::List(names) => names.iter().map(|n| (n.as_str(), n.as_str())).collect(),
            Self::Aliased(map) => map
                .iter()
                .map(|(alias, name)| (alias.as_str(), name.as_str()))
                .collect(),
        }
    }
}

impl From<&str> for DependencyDescriptor {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<Vec<String>> for DependencyDescriptor {
    fn from(names: Vec<String>) -> Self {
        Self::List(names)
    }
}

impl From<BTreeMap<String, String>> for DependencyDescriptor {
    fn from(aliases: BTreeMap<String, String>) -> Self {
        Self::Aliased(aliases)
    }
}

/// 描述解析后的绑定：别名 -> 值，保持描述中的顺序
#[derive(Clone, Default)]
pub struct Bindings {
    entries: Vec<(String, Instance)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, value: Instance) {
        let alias = alias.into();
        if let Some(entry) = self.entries.iter_mut().find(|(a, _)| *a == alias) {
            entry.1 = value;
        } else {
            self.entries.push((alias, value));
        }
    }

    pub fn get(&self, alias: &str) -> Option<&Instance> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, value)| value)
    }

    /// 按别名获取并转型
    pub fn get_as<T>(&self, alias: &str) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let value = self.get(alias).ok_or_else(|| DependencyError::MissingArgument {
            name: alias.to_string(),
        })?;
        downcast_instance(alias, Arc::clone(value))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(alias, _)| alias.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.entries.iter().map(|(alias, value)| (alias.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.aliases()).finish()
    }
}

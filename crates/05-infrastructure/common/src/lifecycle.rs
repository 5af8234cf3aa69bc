//! 定义的生命周期（缓存策略）与容器作用域

use crate::errors::DependencyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 定义的缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// 应用模式 - 首次解析后缓存在拥有该定义的容器中，子容器共享同一实例
    #[default]
    Application,
    /// 类模式 - 按解析容器缓存，派生的子容器从空缓存开始
    Class,
    /// 不缓存 - 每次解析都重新构建
    None,
}

impl Lifecycle {
    /// 解析结果是否写入缓存
    pub const fn caches(self) -> bool {
        matches!(self, Self::Application | Self::Class)
    }

    /// 生命周期名称
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Class => "class",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifecycle {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "application" => Ok(Self::Application),
            "class" => Ok(Self::Class),
            "none" => Ok(Self::None),
            // 保留名称，行为尚未定义
            "instance" => Err(DependencyError::invalid_registration(
                s,
                "生命周期 instance 为保留值，尚未实现",
            )),
            other => Err(DependencyError::invalid_registration(
                other,
                "未知的生命周期",
            )),
        }
    }
}

/// 容器作用域
///
/// 标识一个容器实例，子容器的名称为父名称加序号，如 `root.2`。
#[derive(Debug, Clone, Serialize)]
pub struct ContainerScope {
    pub id: uuid::Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ContainerScope {
    /// 创建新作用域
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            created_at: chrono::Utc::now(),
        }
    }

    /// 创建根作用域
    pub fn root() -> Self {
        Self::new("root")
    }

    /// 创建子作用域
    pub fn child(&self, name: impl fmt::Display) -> Self {
        Self::new(format!("{}.{}", self.name, name))
    }
}

impl fmt::Display for ContainerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

//! 生产者抽象
//!
//! 描述一个定义如何产生它的值：构造器、工厂函数、常量或枚举。

use crate::dependencies::Dependencies;
use crate::enumeration::EnumValues;
use infrastructure_common::{DependencyError, DependencyResult};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 解析得到的值
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 生产者函数类型
pub type ProducerFn = Arc<dyn Fn(&Dependencies) -> DependencyResult<Instance> + Send + Sync>;

/// 定义种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    /// 以构造器方式调用，每次构建得到一个新实例
    Service,
    /// 以普通函数方式调用，返回值即结果
    Factory,
    /// 固定值
    Constant,
    /// 标签到序号的映射
    Enum,
}

impl DefinitionKind {
    /// 种类名称
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Factory => "factory",
            Self::Constant => "constant",
            Self::Enum => "enum",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefinitionKind {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "service" => Ok(Self::Service),
            "factory" => Ok(Self::Factory),
            "constant" => Ok(Self::Constant),
            "enum" => Ok(Self::Enum),
            other => Err(DependencyError::invalid_registration(
                other,
                "未知的定义种类，可选值: service, factory, constant, enum",
            )),
        }
    }
}

/// 生产者
#[derive(Clone)]
pub enum Producer {
    /// 构造器
    Service(ProducerFn),
    /// 工厂函数
    Factory(ProducerFn),
    /// 常量值
    Constant(Instance),
    /// 注册时展开的枚举映射
    Enum(Arc<EnumValues>),
}

impl Producer {
    /// 构造器生产者：依赖按声明顺序传入，返回值被包装为新实例
    pub fn service<T, F>(constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> DependencyResult<T> + Send + Sync + 'static,
    {
        Self::Service(Arc::new(move |deps: &Dependencies| {
            constructor(deps).map(|value| Arc::new(value) as Instance)
        }))
    }

    /// 工厂生产者：返回值原样作为结果，可以是共享的已有实例
    pub fn factory<T, F>(function: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> DependencyResult<Arc<T>> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(move |deps: &Dependencies| {
            function(deps).map(|value| value as Instance)
        }))
    }

    /// 对应的定义种类
    pub const fn kind(&self) -> DefinitionKind {
        match self {
            Self::Service(_) => DefinitionKind::Service,
            Self::Factory(_) => DefinitionKind::Factory,
            Self::Constant(_) => DefinitionKind::Constant,
            Self::Enum(_) => DefinitionKind::Enum,
        }
    }

    /// 使用已解析的依赖产生值
    pub fn produce(&self, dependencies: &Dependencies) -> DependencyResult<Instance> {
        match self {
            Self::Service(constructor) => constructor(dependencies),
            Self::Factory(function) => function(dependencies),
            Self::Constant(value) => Ok(Arc::clone(value)),
            Self::Enum(values) => Ok(Arc::clone(values) as Instance),
        }
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(_) => f.write_str("Service(<constructor>)"),
            Self::Factory(_) => f.write_str("Factory(<function>)"),
            Self::Constant(_) => f.write_str("Constant(<value>)"),
            Self::Enum(values) => f.debug_tuple("Enum").field(values).finish(),
        }
    }
}

/// 将解析值向下转型为具体类型
pub fn downcast_instance<T>(name: &str, instance: Instance) -> DependencyResult<Arc<T>>
where
    T: Send + Sync + 'static,
{
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

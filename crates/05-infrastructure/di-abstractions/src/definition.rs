//! 定义：一个名称对应的生产者及其依赖

use crate::dependencies::Dependencies;
use crate::enumeration::EnumValues;
use crate::factory::{DefinitionKind, Instance, Producer};
use infrastructure_common::{DependencyError, DependencyResult, Lifecycle};
use serde::Serialize;
use std::sync::Arc;

/// 注册到容器中的定义
///
/// 定义本身不可变；缓存状态与生命周期由持有它的容器维护。
#[derive(Debug, Clone)]
pub struct Definition {
    name: String,
    dependencies: Vec<String>,
    producer: Producer,
}

impl Definition {
    /// 创建定义并校验名称与依赖列表
    pub fn new<I, S>(
        name: impl Into<String>,
        dependencies: I,
        producer: Producer,
    ) -> DependencyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        validate_name(&name)?;
        let dependencies: Vec<String> = dependencies.into_iter().map(Into::into).collect();
        validate_dependencies(&name, &dependencies)?;
        Ok(Self {
            name,
            dependencies,
            producer,
        })
    }

    /// 服务定义
    pub fn service<T, F>(
        name: impl Into<String>,
        dependencies: &[&str],
        constructor: F,
    ) -> DependencyResult<Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> DependencyResult<T> + Send + Sync + 'static,
    {
        Self::new(name, dependencies.iter().copied(), Producer::service(constructor))
    }

    /// 工厂定义
    pub fn factory<T, F>(
        name: impl Into<String>,
        dependencies: &[&str],
        function: F,
    ) -> DependencyResult<Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> DependencyResult<Arc<T>> + Send + Sync + 'static,
    {
        Self::new(name, dependencies.iter().copied(), Producer::factory(function))
    }

    /// 常量定义，值可以是任意类型（包括 `Option::None`）
    pub fn constant<T>(name: impl Into<String>, value: T) -> DependencyResult<Self>
    where
        T: Send + Sync + 'static,
    {
        Self::constant_instance(name, Arc::new(value))
    }

    /// 使用已包装的值创建常量定义
    pub fn constant_instance(name: impl Into<String>, value: Instance) -> DependencyResult<Self> {
        Self::new(name, Vec::<String>::new(), Producer::Constant(value))
    }

    /// 枚举定义，注册时即展开为标签到序号的映射
    pub fn enumeration<I, S>(name: impl Into<String>, labels: I) -> DependencyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let values = EnumValues::new(labels);
        Self::new(name, Vec::<String>::new(), Producer::Enum(Arc::new(values)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> DefinitionKind {
        self.producer.kind()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub const fn producer(&self) -> &Producer {
        &self.producer
    }

    /// 使用已解析的依赖构建值
    pub fn instantiate(&self, dependencies: &Dependencies) -> DependencyResult<Instance> {
        self.producer.produce(dependencies)
    }
}

/// 注册结果
///
/// 描述一次注册之后定义的状态，供调用者和诊断使用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationHandle {
    pub name: String,
    pub kind: DefinitionKind,
    pub dependencies: Vec<String>,
    pub lifecycle: Lifecycle,
    /// 拥有该定义的容器作用域名称
    pub scope: String,
}

impl RegistrationHandle {
    pub fn new(definition: &Definition, lifecycle: Lifecycle, scope: impl Into<String>) -> Self {
        Self {
            name: definition.name().to_string(),
            kind: definition.kind(),
            dependencies: definition.dependencies().to_vec(),
            lifecycle,
            scope: scope.into(),
        }
    }
}

/// 校验定义名称
pub fn validate_name(name: &str) -> DependencyResult<()> {
    if name.is_empty() {
        return Err(DependencyError::invalid_registration(name, "名称不能为空"));
    }
    Ok(())
}

/// 校验依赖名称列表
pub fn validate_dependencies(name: &str, dependencies: &[String]) -> DependencyResult<()> {
    if let Some(index) = dependencies.iter().position(String::is_empty) {
        return Err(DependencyError::invalid_registration(
            name,
            format!("第 {index} 个依赖名称为空"),
        ));
    }
    Ok(())
}

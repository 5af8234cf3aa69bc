//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义按名称注册的生产者与依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`DefinitionRegistry`] - 定义注册表接口
//! - [`ComponentResolver`] - 按名称解析接口
//! - [`DiContainer`] - 容器门面接口（派生、重置、清理缓存）
//! - [`Definition`] - 一个名称对应的生产者定义
//! - [`DependencyDescriptor`] - 宿主框架使用的依赖描述

pub mod container;
pub mod definition;
pub mod dependencies;
pub mod descriptor;
pub mod enumeration;
pub mod factory;
pub mod overrides;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use definition::*;
pub use dependencies::*;
pub use descriptor::*;
pub use enumeration::*;
pub use factory::*;
pub use overrides::*;
pub use registry::*;
pub use resolver::*;

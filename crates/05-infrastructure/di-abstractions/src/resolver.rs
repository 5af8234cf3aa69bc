//! 组件解析器抽象接口
//!
//! 提供按名称解析依赖并构建值的能力

use crate::descriptor::{Bindings, DependencyDescriptor};
use crate::factory::{downcast_instance, Instance};
use crate::overrides::Overrides;
use infrastructure_common::{DependencyError, DependencyResult};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// 组件解析器 trait
///
/// 负责解析定义的依赖并构建值
pub trait ComponentResolver: Send + Sync {
    /// 使用覆盖值解析指定名称
    fn resolve_with(&self, name: &str, overrides: &Overrides) -> DependencyResult<Instance>;

    /// 检查名称在本容器或祖先容器中是否可见
    fn can_resolve(&self, name: &str) -> bool;

    /// 解析指定名称
    fn resolve(&self, name: &str) -> DependencyResult<Instance> {
        self.resolve_with(name, &Overrides::new())
    }

    /// 解析并转型
    fn get_as<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        Self: Sized,
    {
        downcast_instance(name, self.resolve(name)?)
    }

    /// 使用覆盖值解析并转型
    fn get_as_with<T>(&self, name: &str, overrides: &Overrides) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        Self: Sized,
    {
        downcast_instance(name, self.resolve_with(name, overrides)?)
    }

    /// 解析宿主框架的依赖描述，任一名称失败则整体失败
    fn resolve_descriptor(
        &self,
        descriptor: &DependencyDescriptor,
        overrides: &Overrides,
    ) -> DependencyResult<Bindings> {
        let mut bindings = Bindings::new();
        for (alias, name) in descriptor.entries() {
            bindings.insert(alias, self.resolve_with(name, overrides)?);
        }
        Ok(bindings)
    }
}

/// 解析上下文
///
/// 作用于一次顶层解析请求：记录当前解析链用于循环检测，并携带覆盖值。
#[derive(Debug)]
pub struct ResolveContext<'o> {
    /// 当前解析链（从顶层请求到当前名称）
    resolution_chain: Vec<String>,
    overrides: &'o Overrides,
    max_depth: usize,
}

impl<'o> ResolveContext<'o> {
    /// 创建新的解析上下文
    pub fn new(overrides: &'o Overrides, max_depth: usize) -> Self {
        Self {
            resolution_chain: Vec::new(),
            overrides,
            max_depth,
        }
    }

    pub const fn overrides(&self) -> &'o Overrides {
        self.overrides
    }

    /// 当前解析链
    pub fn chain(&self) -> &[String] {
        &self.resolution_chain
    }

    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 进入一个名称的解析
    ///
    /// 返回的守卫在离开作用域时（无论成功或失败）把名称移出解析链。
    pub fn enter(&mut self, name: &str) -> DependencyResult<ResolveFrame<'_, 'o>> {
        if self.resolution_chain.iter().any(|n| n == name) {
            let mut path = self.resolution_chain.clone();
            path.push(name.to_string());
            return Err(DependencyError::CircularDependency { path });
        }
        if self.resolution_chain.len() >= self.max_depth {
            let mut chain = self.resolution_chain.clone();
            chain.push(name.to_string());
            return Err(DependencyError::ResolutionDepthExceeded {
                max_depth: self.max_depth,
                chain,
            });
        }
        self.resolution_chain.push(name.to_string());
        Ok(ResolveFrame { context: self })
    }
}

/// 解析帧守卫
pub struct ResolveFrame<'a, 'o> {
    context: &'a mut ResolveContext<'o>,
}

impl<'o> Deref for ResolveFrame<'_, 'o> {
    type Target = ResolveContext<'o>;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for ResolveFrame<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ResolveFrame<'_, '_> {
    fn drop(&mut self) {
        self.context.resolution_chain.pop();
    }
}

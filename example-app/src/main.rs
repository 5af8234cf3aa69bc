//! # 容器演示程序
//!
//! 加载容器配置与注册清单，注册几个演示定义，然后按命令行给出的依赖描述解析并输出 JSON。
//!
//! ```text
//! container-demo --manifest demo.toml --alias url=endpoint --override apiRoot=http://b
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use di_abstractions::{
    Bindings, ComponentResolver, Dependencies, DependencyDescriptor, DiContainer, EnumValues,
    Instance, Overrides,
};
use di_impl::{load_container_config, Container, RegistrationManifest};
use infrastructure_common::{DependencyError, DependencyResult, Lifecycle};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "container-demo")]
#[command(about = "按名称解析依赖注入容器中的定义")]
struct Args {
    /// 容器配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 注册清单路径
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// 解析单个名称
    #[arg(long, conflicts_with_all = ["names", "alias"])]
    name: Option<String>,

    /// 解析名称列表，逗号分隔
    #[arg(long, value_delimiter = ',', conflicts_with = "alias")]
    names: Vec<String>,

    /// 别名绑定，格式 alias=name，可重复
    #[arg(long, value_parser = parse_pair)]
    alias: Vec<(String, String)>,

    /// 字符串覆盖值，格式 name=value，可重复
    #[arg(long = "override", value_parser = parse_pair)]
    overrides: Vec<(String, String)>,

    /// 在派生的子容器中解析
    #[arg(long)]
    spawn: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn descriptor(&self) -> Result<DependencyDescriptor> {
        if let Some(name) = &self.name {
            return Ok(DependencyDescriptor::Single(name.clone()));
        }
        if !self.names.is_empty() {
            return Ok(DependencyDescriptor::List(self.names.clone()));
        }
        if !self.alias.is_empty() {
            let aliases: BTreeMap<String, String> = self.alias.iter().cloned().collect();
            return Ok(DependencyDescriptor::Aliased(aliases));
        }
        bail!("需要 --name、--names 或 --alias 之一")
    }

    fn overrides(&self) -> Overrides {
        let mut overrides = Overrides::new();
        for (name, value) in &self.overrides {
            overrides.insert(name.clone(), Arc::new(value.clone()));
        }
        overrides
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("期望 key=value 格式: {raw}")),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("启动容器演示程序");

    let config = load_container_config(args.config.as_deref()).context("加载容器配置失败")?;
    let root = Container::with_config(config);
    register_demo_definitions(&root)?;

    if let Some(path) = &args.manifest {
        let manifest = RegistrationManifest::from_path(path)
            .with_context(|| format!("加载注册清单失败: {}", path.display()))?;
        manifest.apply(&root).context("应用注册清单失败")?;
    }

    if let Err(errors) = root.validate() {
        for error in &errors {
            tracing::warn!("容器验证问题: {}", error);
        }
    }

    let container = if args.spawn { root.spawn(true) } else { root.clone() };
    let descriptor = args.descriptor()?;
    let bindings = container.resolve_descriptor(&descriptor, &args.overrides())?;

    let output = json!({
        "scope": container.scope().name,
        "bindings": render_bindings(&bindings),
        "stats": container.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// 注册演示定义
///
/// 清单中的同名定义会覆盖这里的注册。
fn register_demo_definitions(container: &Container) -> DependencyResult<()> {
    container.constant("apiRoot", String::from("http://localhost:8080"))?;
    container.enumeration("LogLevel", &["trace", "debug", "info", "warn", "error"])?;

    container.service("endpoint", &["apiRoot"], Lifecycle::Application, |deps| {
        let root = text_of(deps, 0)?;
        Ok(format!("{}/v1", root.trim_end_matches('/')))
    })?;

    let issued = Arc::new(AtomicU64::new(0));
    container.service("requestId", &[], Lifecycle::None, move |_| {
        Ok(issued.fetch_add(1, Ordering::Relaxed) + 1)
    })?;

    container.factory("client", &["endpoint", "LogLevel"], Lifecycle::Class, |deps| {
        let endpoint = deps.get::<String>(0)?;
        let levels = deps.get::<EnumValues>(1)?;
        debug!("构建演示客户端: {}", endpoint);
        Ok(Arc::new(json!({
            "endpoint": endpoint.as_str(),
            "logLevel": levels.index_of("info"),
        })))
    })?;

    Ok(())
}

/// 读取字符串依赖，兼容清单中的 JSON 字符串
fn text_of(deps: &Dependencies, index: usize) -> DependencyResult<String> {
    let name = deps.names().nth(index).unwrap_or_default().to_string();
    let value = deps
        .raw(index)
        .ok_or_else(|| DependencyError::MissingArgument { name: name.clone() })?;
    if let Some(text) = value.downcast_ref::<String>() {
        return Ok(text.clone());
    }
    match value.downcast_ref::<Value>() {
        Some(Value::String(text)) => Ok(text.clone()),
        _ => Err(DependencyError::TypeMismatch {
            name,
            expected: "String",
        }),
    }
}

fn render_bindings(bindings: &Bindings) -> Value {
    let mut rendered = Map::new();
    for (alias, value) in bindings.iter() {
        rendered.insert(alias.to_string(), render(value));
    }
    Value::Object(rendered)
}

/// 把已解析的值渲染为 JSON，无法识别的类型显示为占位符
fn render(value: &Instance) -> Value {
    if let Some(json) = value.downcast_ref::<Value>() {
        return json.clone();
    }
    if let Some(text) = value.downcast_ref::<String>() {
        return Value::String(text.clone());
    }
    if let Some(number) = value.downcast_ref::<u64>() {
        return json!(number);
    }
    if let Some(flag) = value.downcast_ref::<bool>() {
        return json!(flag);
    }
    if let Some(values) = value.downcast_ref::<EnumValues>() {
        return serde_json::to_value(values).unwrap_or(Value::Null);
    }
    if value.downcast_ref::<()>().is_some() {
        return Value::Null;
    }
    Value::String("<opaque>".to_string())
}

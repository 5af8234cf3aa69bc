//! 注册清单
//!
//! 从 JSON/TOML/YAML 文件声明常量与枚举定义：
//!
//! ```toml
//! [[definitions]]
//! name = "apiRoot"
//! kind = "constant"
//! value = "http://a"
//!
//! [[definitions]]
//! name = "Color"
//! kind = "enum"
//! labels = ["red", "green"]
//! ```
//!
//! 服务与工厂需要可调用的生产者，无法用数据声明，出现在清单中视为无效注册。

use crate::Container;
use di_abstractions::{Definition, DefinitionKind, EnumValues, Producer, RegistrationHandle};
use infrastructure_common::{
    ConfigError, DependencyError, DependencyResult, InfrastructureResult, Lifecycle,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 清单条目中声明的值
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestValue {
    /// 常量值，缺省为 null
    Constant(Value),
    /// 枚举标签
    Enum(Vec<String>),
}

/// 清单条目
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub name: String,
    pub dependencies: Vec<String>,
    /// 未声明时使用容器配置的默认生命周期
    pub lifecycle: Option<Lifecycle>,
    pub value: ManifestValue,
}

impl ManifestEntry {
    fn to_definition(&self) -> DependencyResult<Definition> {
        let producer = match &self.value {
            ManifestValue::Constant(value) => Producer::Constant(Arc::new(value.clone())),
            ManifestValue::Enum(labels) => {
                Producer::Enum(Arc::new(EnumValues::new(labels.iter().cloned())))
            }
        };
        Definition::new(self.name.clone(), self.dependencies.iter().cloned(), producer)
    }
}

/// 注册清单
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationManifest {
    entries: Vec<ManifestEntry>,
}

impl RegistrationManifest {
    /// 从文件加载，格式按扩展名识别
    pub fn from_path(path: &Path) -> InfrastructureResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        debug!("加载注册清单: {}", path.display());

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(ConfigError::parse)?;
        let value: Value = settings.try_deserialize().map_err(ConfigError::parse)?;

        Ok(Self::from_value(&value)?)
    }

    /// 从未类型化的值解析并校验
    ///
    /// 接受 `{ "definitions": [...] }` 或直接的条目数组。
    pub fn from_value(value: &Value) -> DependencyResult<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("definitions") {
                Some(Value::Array(items)) => items,
                None => return Ok(Self::default()),
                Some(_) => {
                    return Err(DependencyError::invalid_registration(
                        "definitions",
                        "definitions 必须是数组",
                    ))
                }
            },
            _ => {
                return Err(DependencyError::invalid_registration(
                    "<manifest>",
                    "清单必须是对象或数组",
                ))
            }
        };

        let entries = items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_entry(index, item))
            .collect::<DependencyResult<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 把清单注册到容器
    ///
    /// 先构建全部定义，任一失败则不注册任何条目。
    pub fn apply(&self, container: &Container) -> DependencyResult<Vec<RegistrationHandle>> {
        let definitions = self
            .entries
            .iter()
            .map(|entry| -> DependencyResult<_> { Ok((entry.to_definition()?, entry.lifecycle)) })
            .collect::<DependencyResult<Vec<_>>>()?;

        let default_lifecycle = container.config().default_lifecycle;
        let handles = definitions
            .into_iter()
            .map(|(definition, lifecycle)| {
                container.register(definition, lifecycle.unwrap_or(default_lifecycle))
            })
            .collect::<DependencyResult<Vec<_>>>()?;

        info!("注册清单已应用: {} 个定义", handles.len());
        Ok(handles)
    }
}

fn parse_entry(index: usize, item: &Value) -> DependencyResult<ManifestEntry> {
    let label = format!("definitions[{index}]");
    let Value::Object(fields) = item else {
        return Err(DependencyError::invalid_registration(label, "条目必须是对象"));
    };

    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        Some(Value::String(_)) => {
            return Err(DependencyError::invalid_registration(label, "名称不能为空"))
        }
        Some(_) => {
            return Err(DependencyError::invalid_registration(label, "名称必须是字符串"))
        }
        None => return Err(DependencyError::invalid_registration(label, "缺少名称")),
    };

    let kind = match fields.get("kind") {
        Some(Value::String(kind)) => kind
            .parse::<DefinitionKind>()
            .map_err(|_| DependencyError::invalid_registration(&name, format!("未知的定义种类: {kind}")))?,
        Some(_) => {
            return Err(DependencyError::invalid_registration(&name, "kind 必须是字符串"))
        }
        None => return Err(DependencyError::invalid_registration(&name, "缺少 kind")),
    };

    let dependencies = match fields.get("dependencies") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(dep) => Ok(dep.clone()),
                _ => Err(DependencyError::invalid_registration(
                    &name,
                    "dependencies 必须是字符串数组",
                )),
            })
            .collect::<DependencyResult<Vec<_>>>()?,
        Some(_) => {
            return Err(DependencyError::invalid_registration(
                &name,
                "dependencies 必须是字符串数组",
            ))
        }
    };

    let lifecycle = match fields.get("lifecycle") {
        None | Some(Value::Null) => None,
        Some(Value::String(lifecycle)) => Some(lifecycle.parse::<Lifecycle>().map_err(|err| {
            DependencyError::invalid_registration(&name, format!("无效的生命周期: {err}"))
        })?),
        Some(_) => {
            return Err(DependencyError::invalid_registration(&name, "lifecycle 必须是字符串"))
        }
    };

    let value = match kind {
        DefinitionKind::Constant => {
            ManifestValue::Constant(fields.get("value").cloned().unwrap_or(Value::Null))
        }
        DefinitionKind::Enum => match fields.get("labels") {
            Some(Value::Array(items)) => ManifestValue::Enum(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(label) => Ok(label.clone()),
                        _ => Err(DependencyError::invalid_registration(
                            &name,
                            "labels 必须是字符串数组",
                        )),
                    })
                    .collect::<DependencyResult<Vec<_>>>()?,
            ),
            _ => {
                return Err(DependencyError::invalid_registration(
                    &name,
                    "枚举缺少 labels 数组",
                ))
            }
        },
        DefinitionKind::Service | DefinitionKind::Factory => {
            return Err(DependencyError::invalid_registration(
                &name,
                format!("{kind} 缺少生产者，清单只能声明 constant 与 enum"),
            ))
        }
    };

    Ok(ManifestEntry {
        name,
        dependencies,
        lifecycle,
        value,
    })
}

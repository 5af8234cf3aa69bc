//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

impl ConfigError {
    /// 包装底层解析错误
    pub fn parse(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ParseError {
            source: Box::new(source),
        }
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("无效的注册: {name:?}, 原因: {message}")]
    InvalidRegistration { name: String, message: String },

    #[error("依赖未注册: {name} (解析链: [{}])", .chain.join(" -> "))]
    UnknownDependency { name: String, chain: Vec<String> },

    #[error("循环依赖检测到: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("类型不匹配: {name}, 期望类型: {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("依赖参数缺失: {name}")]
    MissingArgument { name: String },

    #[error("组件创建失败: {name}, 原因: {source}")]
    ProducerFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("解析深度超过上限 {max_depth}: {}", .chain.join(" -> "))]
    ResolutionDepthExceeded { max_depth: usize, chain: Vec<String> },
}

impl DependencyError {
    /// 创建注册错误
    pub fn invalid_registration(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRegistration {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 创建生产者失败错误
    pub fn producer_failed(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ProducerFailed {
            name: name.into(),
            source: source.into(),
        }
    }

    /// 循环依赖的完整路径
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::CircularDependency { path } => Some(path),
            _ => None,
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message_lists_path() {
        let error = DependencyError::CircularDependency {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(error.to_string(), "循环依赖检测到: A -> B -> A");
        assert_eq!(error.cycle_path().map(<[String]>::len), Some(3));
    }

    #[test]
    fn test_producer_failed_keeps_source() {
        let error = DependencyError::producer_failed("db", "连接被拒绝");
        assert!(error.to_string().contains("连接被拒绝"));
        assert!(std::error::Error::source(&error).is_some());
    }
}

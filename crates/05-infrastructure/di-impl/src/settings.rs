//! 容器配置加载

use di_abstractions::ContainerConfig;
use infrastructure_common::{ConfigError, ConfigResult};
use std::path::Path;
use tracing::{debug, error};

/// 环境变量前缀，例如 `DI_MAX_RESOLUTION_DEPTH=64`
pub const ENV_PREFIX: &str = "DI";

/// 加载容器配置
///
/// 来源优先级从低到高：默认值、配置文件（toml/json/yaml，按扩展名识别）、环境变量。
pub fn load_container_config(path: Option<&Path>) -> ConfigResult<ContainerConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!("加载容器配置文件: {}", path.display());
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()
        .map_err(|e| {
            error!("容器配置构建失败: {}", e);
            ConfigError::parse(e)
        })?;

    let config: ContainerConfig = settings.try_deserialize().map_err(|e| {
        error!("容器配置绑定失败: {}", e);
        ConfigError::parse(e)
    })?;

    if config.max_resolution_depth == 0 {
        return Err(ConfigError::ValidationError {
            message: "max_resolution_depth 必须大于 0".to_string(),
        });
    }

    debug!("容器配置加载完成: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::Lifecycle;
    use parking_lot::Mutex;
    use std::io::Write;

    /// 环境变量是进程级状态，读取配置的测试串行执行
    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    /// 设置环境变量，离开作用域时移除
    struct EnvVars(Vec<&'static str>);

    impl EnvVars {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self(vars.iter().map(|(key, _)| *key).collect())
        }
    }

    impl Drop for EnvVars {
        fn drop(&mut self) {
            for key in &self.0 {
                std::env::remove_var(key);
            }
        }
    }

    fn write_temp(extension: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let _lock = ENV_LOCK.lock();
        let config = load_container_config(None).unwrap();
        assert_eq!(config, ContainerConfig::default());
    }

    #[test]
    fn test_load_toml_file() {
        let _lock = ENV_LOCK.lock();
        let file = write_temp(
            ".toml",
            "name = \"app\"\nmax_resolution_depth = 16\ndefault_lifecycle = \"class\"\n",
        );
        let config = load_container_config(Some(file.path())).unwrap();
        assert_eq!(config.name, "app");
        assert_eq!(config.max_resolution_depth, 16);
        assert_eq!(config.default_lifecycle, Lifecycle::Class);
        assert!(!config.warn_on_overwrite);
    }

    #[test]
    fn test_rejects_zero_depth() {
        let _lock = ENV_LOCK.lock();
        let file = write_temp(".json", r#"{ "max_resolution_depth": 0 }"#);
        assert!(matches!(
            load_container_config(Some(file.path())),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let _lock = ENV_LOCK.lock();
        let result = load_container_config(Some(Path::new("/nonexistent/di.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let _lock = ENV_LOCK.lock();
        let file = write_temp(
            ".toml",
            "name = \"app\"\nmax_resolution_depth = 16\ndefault_lifecycle = \"application\"\n",
        );
        let _env = EnvVars::set(&[
            ("DI_MAX_RESOLUTION_DEPTH", "7"),
            ("DI_DEFAULT_LIFECYCLE", "class"),
        ]);

        let config = load_container_config(Some(file.path())).unwrap();
        assert_eq!(config.name, "app");
        assert_eq!(config.max_resolution_depth, 7);
        assert_eq!(config.default_lifecycle, Lifecycle::Class);

        let without_file = load_container_config(None).unwrap();
        assert_eq!(without_file.max_resolution_depth, 7);
        assert_eq!(without_file.name, "root");
    }

    #[test]
    fn test_env_zero_depth_is_rejected() {
        let _lock = ENV_LOCK.lock();
        let _env = EnvVars::set(&[("DI_MAX_RESOLUTION_DEPTH", "0")]);
        assert!(matches!(
            load_container_config(None),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}

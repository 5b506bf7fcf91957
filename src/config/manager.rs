//! # 配置管理器
//!
//! 加载 TOML 配置文件（可选）并应用环境变量覆盖。
//! 部署时通常只依赖环境变量：`STRIPE_SECRET_KEY`、`STRIPE_WEBHOOK_SECRET`、
//! `DATABASE_URL`、`VITE_FRONTEND_FORGE_API_URL` 等。

use std::collections::HashMap;
use std::env;
use std::path::Path;
use tracing::{debug, info, warn};

use super::AppConfig;
use crate::error::{AppError, Result};

/// 被识别的环境变量与配置路径的映射
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("STRIPE_SECRET_KEY", "billing.stripe_secret_key"),
    ("STRIPE_WEBHOOK_SECRET", "billing.stripe_webhook_secret"),
    ("DATABASE_URL", "database.url"),
    ("VITE_FRONTEND_FORGE_API_URL", "email.api_url"),
    ("FORGE_API_KEY", "email.api_key"),
    ("APP_BASE_URL", "server.app_base_url"),
    ("SERVER_PORT", "server.port"),
    ("AUTH_CHALLENGE_SECRET", "auth.challenge_secret"),
];

/// 配置管理器
pub struct ConfigManager {
    config: AppConfig,
    /// 实际生效的环境变量覆盖（配置路径 -> 值）
    env_overrides: HashMap<String, String>,
}

impl ConfigManager {
    /// 创建配置管理器
    ///
    /// 优先使用 `HOUSE_CONFIG_PATH`，否则尝试 `config/config.{RUST_ENV}.toml`；
    /// 文件不存在时使用默认配置。
    pub fn load() -> Result<Self> {
        let config_file = env::var("HOUSE_CONFIG_PATH").unwrap_or_else(|_| {
            let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
            format!("config/config.{env}.toml")
        });

        let base = if Path::new(&config_file).exists() {
            Self::load_config_file(Path::new(&config_file))?
        } else {
            debug!("配置文件不存在，使用默认配置: {}", config_file);
            AppConfig::default()
        };

        Self::from_parts(base, Self::build_env_overrides(env::vars()))
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::load_config_file(config_path.as_ref())?;
        Self::from_parts(config, Self::build_env_overrides(env::vars()))
    }

    /// 用给定的基础配置与覆盖项构建
    pub fn from_parts(mut config: AppConfig, env_overrides: HashMap<String, String>) -> Result<Self> {
        Self::apply_env_overrides(&mut config, &env_overrides)?;
        config.validate().map_err(AppError::config)?;

        info!("配置管理器初始化完成");
        info!("- 环境变量覆盖: {} 个", env_overrides.len());
        info!(
            "- Stripe webhook 密钥: {}",
            if config.billing.stripe_webhook_secret.is_some() {
                "已配置"
            } else {
                "未配置"
            }
        );

        Ok(Self {
            config,
            env_overrides,
        })
    }

    /// 获取当前配置
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 取出配置
    #[must_use]
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    /// 生效的覆盖项数量
    #[must_use]
    pub fn override_count(&self) -> usize {
        self.env_overrides.len()
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(AppError::config(format!("配置文件不存在: {}", path.display())));
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            AppError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            AppError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
                e,
            )
        })
    }

    /// 构建环境变量覆盖映射，忽略空值
    pub fn build_env_overrides<I>(vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let overrides: HashMap<String, String> = ENV_OVERRIDES
            .iter()
            .filter_map(|(env_key, path)| {
                vars.get(*env_key)
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| ((*path).to_string(), value.clone()))
            })
            .collect();

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(config: &mut AppConfig, overrides: &HashMap<String, String>) -> Result<()> {
        for (path, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                path,
                if path.contains("key") || path.contains("secret") || path.contains("url") {
                    "***"
                } else {
                    value
                }
            );

            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        match path {
            "billing.stripe_secret_key" => config.billing.stripe_secret_key = Some(value.to_string()),
            "billing.stripe_webhook_secret" => {
                config.billing.stripe_webhook_secret = Some(value.to_string());
            }
            "database.url" => config.database.url = value.to_string(),
            "email.api_url" => config.email.api_url = Some(value.trim_end_matches('/').to_string()),
            "email.api_key" => config.email.api_key = Some(value.to_string()),
            "server.app_base_url" => {
                config.server.app_base_url = value.trim_end_matches('/').to_string();
            }
            "server.port" => {
                config.server.port = value.parse().map_err(|e| {
                    AppError::config_with_source(format!("无效的端口号: {value}"), e)
                })?;
            }
            "auth.challenge_secret" => config.auth.challenge_secret = Some(value.to_string()),
            _ => {
                warn!("未知的配置路径，忽略环境变量覆盖: {}", path);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_recognised_env_vars_are_applied() {
        let overrides = ConfigManager::build_env_overrides(vars(&[
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_abc"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("VITE_FRONTEND_FORGE_API_URL", "https://forge.example.com/"),
            ("UNRELATED", "ignored"),
        ]));
        assert_eq!(overrides.len(), 4);

        let manager = ConfigManager::from_parts(AppConfig::default(), overrides).unwrap();
        let config = manager.config();
        assert_eq!(config.billing.stripe_secret_key.as_deref(), Some("sk_test_123"));
        assert_eq!(config.billing.stripe_webhook_secret.as_deref(), Some("whsec_abc"));
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.email.api_url.as_deref(), Some("https://forge.example.com"));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let overrides = ConfigManager::build_env_overrides(vars(&[("STRIPE_WEBHOOK_SECRET", "  ")]));
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let overrides = ConfigManager::build_env_overrides(vars(&[("SERVER_PORT", "eighty")]));
        assert!(ConfigManager::from_parts(AppConfig::default(), overrides).is_err());
    }

    #[test]
    fn test_from_file_reads_toml() {
        let path = std::env::temp_dir().join(format!("house33-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[server]\nport = 4100\n").unwrap();

        let manager = ConfigManager::from_file(&path).unwrap();
        assert_eq!(manager.config().server.port, 4100);
        std::fs::remove_file(path).ok();
    }
}

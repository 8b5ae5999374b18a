//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 签名密钥（使用 Secret 包装，防止日志泄露）
    pub jwt_secret: Secret<String>,
    /// 令牌有效期（秒）
    pub token_ttl_secs: u64,
    /// 内置用户表，格式 `name:phc;name:phc`（可选）
    pub users: Option<Secret<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("server.body_limit_bytes", 64 * 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.token_ttl_secs", 3600)?;

        // 从环境变量加载配置（前缀为 GATE_）
        settings = settings.add_source(
            Environment::with_prefix("GATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证 JWT 密钥长度（至少 32 字符）
        if self.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        // 验证令牌过期时间
        if self.security.token_ttl_secs < 60 || self.security.token_ttl_secs > 86400 {
            return Err(ConfigError::Message(
                "token_ttl_secs must be between 60 and 86400 (1 minute to 24 hours)".to_string(),
            ));
        }

        // 验证用户表格式
        if let Some(users) = &self.security.users {
            crate::auth::validator::parse_user_table(users.expose_secret())
                .map_err(|e| ConfigError::Message(format!("Invalid security.users: {}", e)))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

    fn clear_env() {
        for key in [
            "GATE_SERVER__ADDR",
            "GATE_LOGGING__LEVEL",
            "GATE_LOGGING__FORMAT",
            "GATE_SECURITY__JWT_SECRET",
            "GATE_SECURITY__TOKEN_TTL_SECS",
            "GATE_SECURITY__USERS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();
        std::env::set_var("GATE_SECURITY__JWT_SECRET", TEST_SECRET);

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:3000");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.security.token_ttl_secs, 3600);
        assert!(config.security.users.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_requires_secret() {
        clear_env();

        assert!(AppConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_config_validation_short_secret() {
        clear_env();
        std::env::set_var("GATE_SECURITY__JWT_SECRET", "my_secret_key");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_invalid_port() {
        clear_env();
        std::env::set_var("GATE_SERVER__ADDR", "0.0.0.0:80");
        std::env::set_var("GATE_SECURITY__JWT_SECRET", TEST_SECRET);

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_invalid_log_level() {
        clear_env();
        std::env::set_var("GATE_LOGGING__LEVEL", "invalid");
        std::env::set_var("GATE_SECURITY__JWT_SECRET", TEST_SECRET);

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_ttl_out_of_range() {
        clear_env();
        std::env::set_var("GATE_SECURITY__JWT_SECRET", TEST_SECRET);
        std::env::set_var("GATE_SECURITY__TOKEN_TTL_SECS", "10");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_bad_user_table() {
        clear_env();
        std::env::set_var("GATE_SECURITY__JWT_SECRET", TEST_SECRET);
        std::env::set_var("GATE_SECURITY__USERS", "alice-without-hash");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }
}

// ==========================================
// 列车编组计算系统 - 配置层
// ==========================================
// 职责: 显式构造的应用配置对象, 传给需要它的组件
// 红线: 不提供进程级单例; 核心逻辑只依赖显式输入
// ==========================================

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// 默认 CORS 来源 (本地前端开发服务器)
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// 默认 API 前缀
pub const DEFAULT_API_PREFIX: &str = "/api";

// ==========================================
// AppConfig - 应用配置
// ==========================================
/// 应用配置
///
/// 由组合根显式构造并下发; 请求层消费 api_prefix 与 cors_origins,
/// 存储层消费 db_path。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub api_prefix: String,
    pub db_path: String,
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: crate::APP_NAME.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            db_path: default_db_path(),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }
}

impl AppConfig {
    /// 从环境变量构造配置
    ///
    /// # 环境变量
    /// - TRAIN_COMPOSER_DB_PATH: SQLite 数据库文件路径
    /// - API_PREFIX: 请求层挂载前缀
    /// - CORS_ORIGINS: JSON 数组或逗号分隔的来源列表
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(db_path) = env::var("TRAIN_COMPOSER_DB_PATH") {
            if !db_path.trim().is_empty() {
                config.db_path = db_path;
            }
        }
        if let Ok(prefix) = env::var("API_PREFIX") {
            if !prefix.trim().is_empty() {
                config.api_prefix = prefix;
            }
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            let parsed = parse_cors_origins(&origins);
            if !parsed.is_empty() {
                config.cors_origins = parsed;
            }
        }

        config
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 解析 CORS 来源列表
///
/// 兼容两种写法:
/// - JSON 数组: `["http://a", "http://b"]`
/// - 逗号分隔: `http://a, http://b`
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    let stripped = raw.trim();

    if stripped.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<Vec<String>>(stripped) {
            return parsed
                .into_iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }
    }

    stripped
        .split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

/// 默认数据库路径: 平台数据目录下的 train-composer/train_composer.db,
/// 取不到数据目录时退回当前目录
pub fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("train-composer")
        .join("train_composer.db")
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cors_origins_comma_separated() {
        let origins = parse_cors_origins("http://localhost:5173, http://example.com ,");
        assert_eq!(
            origins,
            vec![
                "http://localhost:5173".to_string(),
                "http://example.com".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_cors_origins_json_array() {
        let origins = parse_cors_origins(r#"["http://a.example", " http://b.example "]"#);
        assert_eq!(
            origins,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
    }

    #[test]
    fn test_parse_cors_origins_malformed_json_falls_back_to_split() {
        // JSON 解析失败时按逗号拆分兜底
        let origins = parse_cors_origins("[not-json");
        assert_eq!(origins, vec!["[not-json".to_string()]);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api_prefix, DEFAULT_API_PREFIX);
        assert_eq!(config.cors_origins, vec![DEFAULT_CORS_ORIGIN.to_string()]);
        assert!(!config.db_path.is_empty());
    }
}

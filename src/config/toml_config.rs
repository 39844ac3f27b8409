use crate::adapters::vk::{VkClientOptions, DEFAULT_API_URL, DEFAULT_API_VERSION};
use crate::core::fetcher::{FailurePolicy, DEFAULT_CONCURRENCY_LIMIT};
use crate::core::report::ReportSettings;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub roster: RosterConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub access_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// 要分析的社群短名稱，例如 `kait_20_official`
    pub community: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    pub employees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub concurrency_limit: Option<usize>,
    pub reactor_page_size: Option<usize>,
    #[serde(default)]
    pub on_reactor_failure: FailurePolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: None,
            reactor_page_size: None,
            on_reactor_failure: FailurePolicy::Degrade,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub activity_ttl_seconds: Option<u64>,
    pub posts_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid pattern"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，`${VAR}` 會以環境變數取代
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 找不到的變數保持原樣，交給驗證階段報錯
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let name = &caps[1];
                std::env::var(name).unwrap_or_else(|_| format!("${{{}}}", name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.api_url", &self.source.api_url)?;
        validation::validate_non_empty_string("source.access_token", &self.source.access_token)?;
        if env_var_pattern().is_match(&self.source.access_token) {
            return Err(EtlError::MissingConfigError {
                field: format!("source.access_token ({})", self.source.access_token),
            });
        }
        validation::validate_non_empty_string("source.api_version", &self.source.api_version)?;
        validation::validate_screen_name("source.community", &self.source.community)?;
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_range("source.timeout_seconds", timeout, 1, 300)?;
        }

        if self.roster.employees.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "roster.employees".to_string(),
            });
        }
        validation::validate_unique_names("roster.employees", &self.roster.employees)?;

        if let Some(limit) = self.fetch.concurrency_limit {
            validation::validate_positive_number("fetch.concurrency_limit", limit, 1)?;
        }
        if let Some(size) = self.fetch.reactor_page_size {
            validation::validate_range("fetch.reactor_page_size", size, 1, 1000)?;
        }

        validation::validate_path("load.output_path", &self.load.output_path)?;
        Ok(())
    }

    pub fn concurrency_limit(&self) -> usize {
        self.fetch.concurrency_limit.unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
    }

    pub fn client_options(&self) -> VkClientOptions {
        let defaults = VkClientOptions::default();
        VkClientOptions {
            api_url: self.source.api_url.clone(),
            access_token: self.source.access_token.clone(),
            api_version: self.source.api_version.clone(),
            timeout: self
                .source
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            reactor_page_size: self
                .fetch
                .reactor_page_size
                .unwrap_or(defaults.reactor_page_size),
        }
    }

    pub fn report_settings(&self) -> ReportSettings {
        let defaults = ReportSettings::default();
        ReportSettings {
            concurrency_limit: self.concurrency_limit(),
            failure_policy: self.fetch.on_reactor_failure,
            activity_ttl: self
                .cache
                .activity_ttl_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.activity_ttl),
            posts_ttl: self
                .cache
                .posts_ttl_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.posts_ttl),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[source]
access_token = "token-123"
community = "kait_20_official"

[roster]
employees = ["kozhan_vi", "id50311017"]
"#;

    #[test]
    fn test_parse_basic_config_with_defaults() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.source.api_url, "https://api.vk.com/method");
        assert_eq!(config.source.api_version, "5.131");
        assert_eq!(config.concurrency_limit(), 8);
        assert_eq!(config.fetch.on_reactor_failure, FailurePolicy::Degrade);
        assert_eq!(config.load.output_path, "./output");
        assert!(config.validate().is_ok());

        let settings = config.report_settings();
        assert_eq!(settings.activity_ttl, Duration::from_secs(300));
        assert_eq!(settings.posts_ttl, Duration::from_secs(1800));

        let options = config.client_options();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.reactor_page_size, 1000);
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[source]
api_url = "http://127.0.0.1:9000/method"
access_token = "abc"
api_version = "5.199"
community = "club.one"
timeout_seconds = 3

[roster]
employees = ["a", "b", "c"]

[fetch]
concurrency_limit = 4
reactor_page_size = 500
on_reactor_failure = "abort"

[cache]
activity_ttl_seconds = 60
posts_ttl_seconds = 120

[load]
output_path = "/tmp/reports"
"#;
        let config = TomlConfig::from_toml_str(content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.fetch.on_reactor_failure, FailurePolicy::Abort);

        let settings = config.report_settings();
        assert_eq!(settings.concurrency_limit, 4);
        assert_eq!(settings.activity_ttl, Duration::from_secs(60));

        let options = config.client_options();
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert_eq!(options.reactor_page_size, 500);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ENGAGEMENT_ETL_TEST_TOKEN", "from-env");
        let content = BASIC.replace("token-123", "${ENGAGEMENT_ETL_TEST_TOKEN}");

        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.source.access_token, "from-env");

        std::env::remove_var("ENGAGEMENT_ETL_TEST_TOKEN");
    }

    #[test]
    fn test_unresolved_token_fails_validation() {
        let content = BASIC.replace("token-123", "${ENGAGEMENT_ETL_UNSET_TOKEN}");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(EtlError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_validation_errors() {
        let mut config = TomlConfig::from_toml_str(BASIC).unwrap();
        config.fetch.concurrency_limit = Some(0);
        assert!(config.validate().is_err());

        let mut config = TomlConfig::from_toml_str(BASIC).unwrap();
        config.roster.employees.clear();
        assert!(config.validate().is_err());

        let mut config = TomlConfig::from_toml_str(BASIC).unwrap();
        config.source.api_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[source\n").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.source.community, "kait_20_official");
        assert_eq!(config.roster.employees.len(), 2);
    }
}

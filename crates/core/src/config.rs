use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::rates::RateTable;

pub const CONFIG_FILE_NAME: &str = "archquote.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub pricing: RateTable,
    pub server: ServerConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub pdf_enabled: bool,
    pub wkhtmltopdf_path: Option<String>,
    pub template_dir: Option<String>,
    pub company_name: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub pdf_enabled: Option<bool>,
    pub retrofit_factor: Option<Decimal>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pricing: RateTable::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            export: ExportConfig {
                pdf_enabled: true,
                wkhtmltopdf_path: None,
                template_dir: None,
                company_name: "Sophia Pollis Arquitetura".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricing) = patch.pricing {
            if let Some(minimum_fee) = pricing.minimum_fee {
                self.pricing.minimum_fee = minimum_fee;
            }
            if let Some(minimum_fee_area_sqm) = pricing.minimum_fee_area_sqm {
                self.pricing.minimum_fee_area_sqm = minimum_fee_area_sqm;
            }
            if let Some(rate_per_sqm) = pricing.rate_per_sqm {
                self.pricing.rate_per_sqm = rate_per_sqm;
            }
            if let Some(retrofit_factor) = pricing.retrofit_factor {
                self.pricing.retrofit_factor = Some(retrofit_factor);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(export) = patch.export {
            if let Some(pdf_enabled) = export.pdf_enabled {
                self.export.pdf_enabled = pdf_enabled;
            }
            if let Some(wkhtmltopdf_path) = export.wkhtmltopdf_path {
                self.export.wkhtmltopdf_path = Some(wkhtmltopdf_path);
            }
            if let Some(template_dir) = export.template_dir {
                self.export.template_dir = Some(template_dir);
            }
            if let Some(company_name) = export.company_name {
                self.export.company_name = company_name;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ARCHQUOTE_PRICING_MINIMUM_FEE") {
            self.pricing.minimum_fee = parse_decimal("ARCHQUOTE_PRICING_MINIMUM_FEE", &value)?;
        }
        if let Some(value) = read_env("ARCHQUOTE_PRICING_MINIMUM_FEE_AREA_SQM") {
            self.pricing.minimum_fee_area_sqm =
                parse_decimal("ARCHQUOTE_PRICING_MINIMUM_FEE_AREA_SQM", &value)?;
        }
        if let Some(value) = read_env("ARCHQUOTE_PRICING_RATE_PER_SQM") {
            self.pricing.rate_per_sqm = parse_decimal("ARCHQUOTE_PRICING_RATE_PER_SQM", &value)?;
        }
        if let Some(value) = read_env("ARCHQUOTE_PRICING_RETROFIT_FACTOR") {
            self.pricing.retrofit_factor =
                Some(parse_decimal("ARCHQUOTE_PRICING_RETROFIT_FACTOR", &value)?);
        }

        if let Some(value) = read_env("ARCHQUOTE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ARCHQUOTE_SERVER_PORT") {
            self.server.port = parse_u16("ARCHQUOTE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("ARCHQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("ARCHQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("ARCHQUOTE_EXPORT_PDF_ENABLED") {
            self.export.pdf_enabled = parse_bool("ARCHQUOTE_EXPORT_PDF_ENABLED", &value)?;
        }
        if let Some(value) = read_env("ARCHQUOTE_EXPORT_WKHTMLTOPDF_PATH") {
            self.export.wkhtmltopdf_path = Some(value);
        }
        if let Some(value) = read_env("ARCHQUOTE_EXPORT_TEMPLATE_DIR") {
            self.export.template_dir = Some(value);
        }
        if let Some(value) = read_env("ARCHQUOTE_EXPORT_COMPANY_NAME") {
            self.export.company_name = value;
        }

        let log_level =
            read_env("ARCHQUOTE_LOGGING_LEVEL").or_else(|| read_env("ARCHQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ARCHQUOTE_LOGGING_FORMAT").or_else(|| read_env("ARCHQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(pdf_enabled) = overrides.pdf_enabled {
            self.export.pdf_enabled = pdf_enabled;
        }
        if let Some(retrofit_factor) = overrides.retrofit_factor {
            self.pricing.retrofit_factor = Some(retrofit_factor);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        validate_server(&self.server)?;
        validate_export(&self.export)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), PathBuf::from("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pricing(pricing: &RateTable) -> Result<(), ConfigError> {
    if pricing.minimum_fee <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.minimum_fee must be greater than zero".to_string(),
        ));
    }

    if pricing.minimum_fee_area_sqm < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.minimum_fee_area_sqm must not be negative".to_string(),
        ));
    }

    if pricing.rate_per_sqm <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.rate_per_sqm must be greater than zero".to_string(),
        ));
    }

    if let Some(factor) = pricing.retrofit_factor {
        if factor <= Decimal::ZERO {
            return Err(ConfigError::Validation(
                "pricing.retrofit_factor must be greater than zero when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_export(export: &ExportConfig) -> Result<(), ConfigError> {
    if export.company_name.trim().is_empty() {
        return Err(ConfigError::Validation("export.company_name must not be empty".to_string()));
    }

    if let Some(path) = &export.wkhtmltopdf_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "export.wkhtmltopdf_path must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    server: Option<ServerPatch>,
    export: Option<ExportPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    minimum_fee: Option<Decimal>,
    minimum_fee_area_sqm: Option<Decimal>,
    rate_per_sqm: Option<Decimal>,
    retrofit_factor: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportPatch {
    pdf_enabled: Option<bool>,
    wkhtmltopdf_path: Option<String>,
    template_dir: Option<String>,
    company_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_static_pricing_constants() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.pricing.minimum_fee == Decimal::new(5000, 0), "minimum fee is 5000")?;
        ensure(config.pricing.minimum_fee_area_sqm == Decimal::new(40, 0), "threshold is 40")?;
        ensure(config.pricing.rate_per_sqm == Decimal::new(150, 0), "rate is 150")?;
        ensure(config.pricing.retrofit_factor.is_none(), "retrofit factor is unset")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_ARCHQUOTE_COMPANY", "Atelier Teste");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("archquote.toml");
            fs::write(
                &path,
                r#"
[export]
company_name = "${TEST_ARCHQUOTE_COMPANY}"

[pricing]
rate_per_sqm = 180
retrofit_factor = 1.2
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.export.company_name == "Atelier Teste",
                "company name should be interpolated from environment",
            )?;
            ensure(config.pricing.rate_per_sqm == Decimal::new(180, 0), "rate from file")?;
            ensure(
                config.pricing.retrofit_factor == Some(Decimal::new(12, 1)),
                "retrofit factor from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_ARCHQUOTE_COMPANY"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ARCHQUOTE_LOG_LEVEL", "warn");
        env::set_var("ARCHQUOTE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["ARCHQUOTE_LOG_LEVEL", "ARCHQUOTE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ARCHQUOTE_SERVER_PORT", "9090");
        env::set_var("ARCHQUOTE_PRICING_MINIMUM_FEE", "6000");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("archquote.toml");
            fs::write(
                &path,
                r#"
[server]
port = 7070
bind_address = "0.0.0.0"

[pricing]
minimum_fee = 5500

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    port: Some(6060),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.server.port == 6060, "override port should win")?;
            ensure(config.server.bind_address == "0.0.0.0", "file bind address should apply")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.pricing.minimum_fee == Decimal::new(6000, 0),
                "env minimum fee should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["ARCHQUOTE_SERVER_PORT", "ARCHQUOTE_PRICING_MINIMUM_FEE"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ARCHQUOTE_PRICING_RATE_PER_SQM", "0");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("pricing.rate_per_sqm")
            );
            ensure(has_message, "validation failure should mention pricing.rate_per_sqm")
        })();

        clear_vars(&["ARCHQUOTE_PRICING_RATE_PER_SQM"]);
        result
    }

    #[test]
    fn malformed_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ARCHQUOTE_EXPORT_PDF_ENABLED", "maybe");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "ARCHQUOTE_EXPORT_PDF_ENABLED", "error should name the env key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected invalid env override".to_string()),
        };

        clear_vars(&["ARCHQUOTE_EXPORT_PDF_ENABLED"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should fail",
        )
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use archquote_core::config::{AppConfig, LoadOptions, CONFIG_FILE_NAME};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let retrofit_factor = config
        .pricing
        .retrofit_factor
        .map(|factor| factor.to_string())
        .unwrap_or_else(|| "<unset>".to_string());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    let mut push = |key: &str, value: String, env_keys: &[&str]| {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    };

    push(
        "pricing.minimum_fee",
        config.pricing.minimum_fee.to_string(),
        &["ARCHQUOTE_PRICING_MINIMUM_FEE"],
    );
    push(
        "pricing.minimum_fee_area_sqm",
        config.pricing.minimum_fee_area_sqm.to_string(),
        &["ARCHQUOTE_PRICING_MINIMUM_FEE_AREA_SQM"],
    );
    push(
        "pricing.rate_per_sqm",
        config.pricing.rate_per_sqm.to_string(),
        &["ARCHQUOTE_PRICING_RATE_PER_SQM"],
    );
    push("pricing.retrofit_factor", retrofit_factor, &["ARCHQUOTE_PRICING_RETROFIT_FACTOR"]);

    push(
        "server.bind_address",
        config.server.bind_address.clone(),
        &["ARCHQUOTE_SERVER_BIND_ADDRESS"],
    );
    push("server.port", config.server.port.to_string(), &["ARCHQUOTE_SERVER_PORT"]);
    push(
        "server.graceful_shutdown_secs",
        config.server.graceful_shutdown_secs.to_string(),
        &["ARCHQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
    );

    push(
        "export.pdf_enabled",
        config.export.pdf_enabled.to_string(),
        &["ARCHQUOTE_EXPORT_PDF_ENABLED"],
    );
    push(
        "export.wkhtmltopdf_path",
        config.export.wkhtmltopdf_path.clone().unwrap_or_else(|| "<PATH lookup>".to_string()),
        &["ARCHQUOTE_EXPORT_WKHTMLTOPDF_PATH"],
    );
    push(
        "export.template_dir",
        config.export.template_dir.clone().unwrap_or_else(|| "<built-in>".to_string()),
        &["ARCHQUOTE_EXPORT_TEMPLATE_DIR"],
    );
    push(
        "export.company_name",
        config.export.company_name.clone(),
        &["ARCHQUOTE_EXPORT_COMPANY_NAME"],
    );

    push(
        "logging.level",
        config.logging.level.clone(),
        &["ARCHQUOTE_LOGGING_LEVEL", "ARCHQUOTE_LOG_LEVEL"],
    );
    push(
        "logging.format",
        format!("{:?}", config.logging.format),
        &["ARCHQUOTE_LOGGING_FORMAT", "ARCHQUOTE_LOG_FORMAT"],
    );

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(CONFIG_FILE_NAME), PathBuf::from("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, field_source, render_line};

    #[test]
    fn nested_keys_are_found_in_file_document() {
        let doc: Value = "[pricing]\nrate_per_sqm = 180\n".parse().expect("toml");

        assert!(contains_path(&doc, "pricing.rate_per_sqm"));
        assert!(!contains_path(&doc, "pricing.minimum_fee"));
        assert!(!contains_path(&doc, "server.port"));
    }

    #[test]
    fn file_source_names_the_file() {
        let doc: Value = "[export]\ncompany_name = \"Atelier\"\n".parse().expect("toml");
        let source = field_source(
            "export.company_name",
            &["ARCHQUOTE_TEST_UNSET_COMPANY_NAME"],
            Some(&doc),
            Some(std::path::Path::new("archquote.toml")),
        );

        assert_eq!(source, "file (archquote.toml)");
        assert_eq!(
            render_line("export.company_name", "Atelier", source),
            "- export.company_name = Atelier (source: file (archquote.toml))"
        );
    }
}

//! Doctor command - verify API keys, index and configuration.

use crate::cli::Output;
use crate::config::{Settings, OPENAI_API_KEY_ENV, SARVAM_API_KEY_ENV, SERPAPI_API_KEY_ENV};
use crate::vector_store::{SqliteVectorStore, VectorStore};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Vidya Doctor");
    println!();
    println!("Checking API keys, index and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Keys").bold());
    let key_checks = check_api_keys(settings);
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("Passage Index").bold());
    let index_check = check_index(settings).await;
    index_check.print();
    checks.push(index_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!("{} error(s) found. Please fix them before using Vidya.", errors));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Vidya is ready to use.");
    }

    Ok(())
}

fn check_api_keys(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![check_openai_key(settings.llm.api_key.as_deref())];

    results.push(check_optional_key(
        SARVAM_API_KEY_ENV,
        settings.speech.enabled,
        settings.speech.api_key.as_deref(),
        "audio_base64 will be null",
    ));
    results.push(check_optional_key(
        SERPAPI_API_KEY_ENV,
        settings.video.enabled,
        settings.video.api_key.as_deref(),
        "suggested_video will be null",
    ));

    results
}

fn check_openai_key(key: Option<&str>) -> CheckResult {
    let hint = format!("Set with: export {}='sk-...'", OPENAI_API_KEY_ENV);
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok(OPENAI_API_KEY_ENV, &format!("configured ({})", mask(key)))
        }
        Some(key) if key.trim().is_empty() => CheckResult::error(OPENAI_API_KEY_ENV, "empty", &hint),
        Some(_) => CheckResult::warning(
            OPENAI_API_KEY_ENV,
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(OPENAI_API_KEY_ENV, "not set", &hint),
    }
}

fn check_optional_key(name: &str, enabled: bool, key: Option<&str>, consequence: &str) -> CheckResult {
    match key {
        _ if !enabled => CheckResult::ok(name, "disabled in config"),
        Some(key) if !key.trim().is_empty() => {
            CheckResult::ok(name, &format!("configured ({})", mask(key)))
        }
        _ => CheckResult::warning(
            name,
            &format!("not set ({})", consequence),
            &format!("Set with: export {}='...'", name),
        ),
    }
}

async fn check_index(settings: &Settings) -> CheckResult {
    let db_path = settings.sqlite_path();
    if !db_path.exists() {
        return CheckResult::warning(
            "Database",
            &format!("{} (not created yet)", db_path.display()),
            "Load passages with: vidya import <file.jsonl>",
        );
    }

    let count = match SqliteVectorStore::new(&db_path) {
        Ok(store) => store.passage_count().await,
        Err(e) => Err(e),
    };

    match count {
        Ok(0) => CheckResult::warning(
            "Database",
            &format!("{} (empty)", db_path.display()),
            "Load passages with: vidya import <file.jsonl>",
        ),
        Ok(count) => {
            let size = std::fs::metadata(&db_path)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "unknown size".to_string());
            CheckResult::ok(
                "Database",
                &format!("{} ({} passages, {})", db_path.display(), count, size),
            )
        }
        Err(e) => CheckResult::error(
            "Database",
            &format!("cannot open {}: {}", db_path.display(), e),
            "Remove the file and re-import",
        ),
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: vidya config edit",
        )
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "****".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_openai_key_checks() {
        assert_eq!(check_openai_key(None).status, CheckStatus::Error);
        assert_eq!(check_openai_key(Some("  ")).status, CheckStatus::Error);
        assert_eq!(check_openai_key(Some("abc")).status, CheckStatus::Warning);

        let ok = check_openai_key(Some("sk-proj-abcdefghijklmnop1234"));
        assert_eq!(ok.status, CheckStatus::Ok);
        assert!(ok.message.contains("sk-proj...1234"));
    }

    #[test]
    fn test_optional_key_checks() {
        assert_eq!(check_optional_key("K", false, None, "x").status, CheckStatus::Ok);
        assert_eq!(check_optional_key("K", true, None, "x").status, CheckStatus::Warning);
        assert_eq!(check_optional_key("K", true, Some("secret"), "x").status, CheckStatus::Ok);
    }

    #[tokio::test]
    async fn test_missing_index_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.vector_store.sqlite_path = dir.path().join("none.db").to_string_lossy().into_owned();

        assert_eq!(check_index(&settings).await.status, CheckStatus::Warning);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }
}

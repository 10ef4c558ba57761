use crate::args::Args;
use crate::metawahl::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_ROOT: &str = "http://localhost:9000/api/v1";
pub const DEFAULT_CACHE_DIRECTORY: &str = ".metawahl-cache";
pub const DEFAULT_REPORT_TIMEOUT_SECS: u64 = 5;

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizRulesConfig {
    #[serde(rename = "questionLimit")]
    pub question_limit: Option<usize>,
    #[serde(rename = "contestedMinimumPct")]
    pub contested_minimum_pct: Option<f64>,
    #[serde(rename = "minimumCommunitySample")]
    pub minimum_community_sample: Option<u64>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "apiRoot")]
    pub api_root: Option<String>,
    #[serde(rename = "cacheDirectory")]
    pub cache_directory: Option<String>,
    #[serde(rename = "reportTimeoutSecs")]
    pub report_timeout_secs: Option<u64>,
    #[serde(rename = "quizRules")]
    pub quiz_rules: Option<QuizRulesConfig>,
}

impl AppConfig {
    pub fn quiz_rules(&self) -> AppResult<QuizRules> {
        let defaults = QuizRules::DEFAULT_RULES;
        let cfg = self.quiz_rules.clone().unwrap_or_default();
        let contested_minimum_pct = cfg
            .contested_minimum_pct
            .unwrap_or(defaults.contested_minimum_pct);
        if !(0.0..=100.0).contains(&contested_minimum_pct) {
            whatever!(
                "contestedMinimumPct must be between 0 and 100, got {}",
                contested_minimum_pct
            )
        }
        Ok(QuizRules {
            question_limit: cfg.question_limit.unwrap_or(defaults.question_limit),
            contested_minimum_pct,
            minimum_community_sample: cfg
                .minimum_community_sample
                .unwrap_or(defaults.minimum_community_sample),
        })
    }
}

/// The configuration after applying the command line.
#[derive(PartialEq, Debug, Clone)]
pub struct Settings {
    pub api_root: String,
    pub cache_directory: PathBuf,
    pub report_timeout: Duration,
    pub rules: QuizRules,
}

pub fn resolve_settings(args: &Args, config: &AppConfig) -> AppResult<Settings> {
    let api_root = args
        .api_root
        .clone()
        .or_else(|| config.api_root.clone())
        .unwrap_or_else(|| DEFAULT_API_ROOT.to_string());
    let cache_directory = args
        .cache_dir
        .clone()
        .or_else(|| config.cache_directory.clone())
        .unwrap_or_else(|| DEFAULT_CACHE_DIRECTORY.to_string());
    let timeout_secs = config
        .report_timeout_secs
        .unwrap_or(DEFAULT_REPORT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        whatever!("reportTimeoutSecs must be at least 1")
    }
    Ok(Settings {
        api_root: api_root.trim_end_matches('/').to_string(),
        cache_directory: PathBuf::from(cache_directory),
        report_timeout: Duration::from_secs(timeout_secs),
        rules: config.quiz_rules()?,
    })
}

pub fn read_config(path: &str) -> AppResult<AppConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: AppConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_without_config() {
        let args = Args::parse_from(["metawahl", "--election", "44"]);
        let settings = resolve_settings(&args, &AppConfig::default()).unwrap();
        assert_eq!(settings.api_root, DEFAULT_API_ROOT);
        assert_eq!(settings.cache_directory, PathBuf::from(DEFAULT_CACHE_DIRECTORY));
        assert_eq!(settings.report_timeout, Duration::from_secs(5));
        assert_eq!(settings.rules, QuizRules::DEFAULT_RULES);
    }

    #[test]
    fn partial_config_file() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "apiRoot": "https://api.example.org/api/v1/",
                "quizRules": { "questionLimit": 10 }
            }"#,
        )
        .unwrap();
        let args = Args::parse_from(["metawahl", "--election", "44"]);
        let settings = resolve_settings(&args, &config).unwrap();
        assert_eq!(settings.api_root, "https://api.example.org/api/v1");
        assert_eq!(settings.rules.question_limit, 10);
        assert_eq!(settings.rules.contested_minimum_pct, 15.0);
        assert_eq!(settings.rules.minimum_community_sample, 5);
    }

    #[test]
    fn command_line_wins() {
        let config = AppConfig {
            api_root: Some("http://config".to_string()),
            cache_directory: Some("/tmp/config".to_string()),
            ..AppConfig::default()
        };
        let args = Args::parse_from([
            "metawahl",
            "--election",
            "44",
            "--api-root",
            "http://flag",
            "--cache-dir",
            "/tmp/flag",
        ]);
        let settings = resolve_settings(&args, &config).unwrap();
        assert_eq!(settings.api_root, "http://flag");
        assert_eq!(settings.cache_directory, PathBuf::from("/tmp/flag"));
    }

    #[test]
    fn rejects_bad_values() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "quizRules": { "contestedMinimumPct": 150 } }"#).unwrap();
        assert!(config.quiz_rules().is_err());

        let config = AppConfig {
            report_timeout_secs: Some(0),
            ..AppConfig::default()
        };
        let args = Args::parse_from(["metawahl", "--election", "44"]);
        assert!(resolve_settings(&args, &config).is_err());
    }
}

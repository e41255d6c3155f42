//! CLI argument definitions using clap.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Courier - send one templated e-mail to every stored recipient
#[derive(Parser, Debug)]
#[command(name = "courier", author, version, about)]
pub struct Cli {
    /// Ask for settings on the terminal instead of reading them from `.env`
    #[arg(long)]
    pub prompt: bool,

    /// Override NUM_WORKERS
    #[arg(short, long, allow_negative_numbers = true)]
    pub workers: Option<i64>,

    /// Override TEMPLATE_PATH
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", env = "COURIER_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Flag values keyed by the configuration variable they replace, so they
    /// go through the same validation as the environment.
    pub fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(workers) = self.workers {
            overrides.insert("NUM_WORKERS".to_string(), workers.to_string());
        }
        if let Some(template) = &self.template {
            overrides.insert("TEMPLATE_PATH".to_string(), template.display().to_string());
        }
        overrides
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_common::config::{AppConfig, layered};
    use courier_common::error::AppError;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["courier"]);
        assert!(!cli.prompt);
        assert!(cli.workers.is_none());
        assert!(cli.template.is_none());
        assert!(cli.overrides().is_empty());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "courier",
            "--prompt",
            "--workers",
            "8",
            "--template",
            "mail/promo.html",
            "--log-format",
            "json",
        ]);
        assert!(cli.prompt);
        assert_eq!(cli.workers, Some(8));
        assert_eq!(cli.template, Some(PathBuf::from("mail/promo.html")));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_negative_workers_parse() {
        let cli = Cli::parse_from(["courier", "--workers", "-1"]);
        assert_eq!(cli.workers, Some(-1));
    }

    #[test]
    fn test_flags_become_config_overrides() {
        let cli = Cli::parse_from(["courier", "--workers", "4", "--template", "mail/promo.html"]);
        let overrides = cli.overrides();
        assert_eq!(overrides["NUM_WORKERS"], "4");
        assert_eq!(overrides["TEMPLATE_PATH"], "mail/promo.html");
    }

    #[test]
    fn test_workers_flag_satisfies_missing_env() {
        let cli = Cli::parse_from(["courier", "--workers", "4"]);
        let overrides = cli.overrides();
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://courier@localhost/courier"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_EMAIL", "sender@example.com"),
        ]);

        let config = AppConfig::from_lookup(layered(&overrides, |key| {
            env.get(key).map(|v| v.to_string())
        }))
        .unwrap();
        assert_eq!(config.num_workers, 4);
    }

    #[test]
    fn test_negative_workers_flag_is_rejected_by_config() {
        let cli = Cli::parse_from(["courier", "--workers", "-2"]);
        let overrides = cli.overrides();
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://courier@localhost/courier"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_EMAIL", "sender@example.com"),
            ("NUM_WORKERS", "8"),
        ]);

        let result = AppConfig::from_lookup(layered(&overrides, |key| {
            env.get(key).map(|v| v.to_string())
        }));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

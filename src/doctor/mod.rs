//! Doctor command for system diagnostics
//!
//! Checks that the configuration, the corpus and the Ollama backend are all
//! usable before a question is asked.

use crate::cli::config::Config;
use crate::corpus::Corpus;
use crate::retrieval::RetrievalEngine;
use crate::streaming::OllamaClient;
use crate::tools::Glossary;
use colored::*;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass(String),
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        HealthCheck {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    config: Config,
    client: OllamaClient,
}

impl Doctor {
    pub fn new(config: Config, client: OllamaClient) -> Self {
        Self { config, client }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = vec![
            self.check_config(),
            self.check_corpus(),
            check_glossary(),
            self.check_ollama_api().await,
        ];

        if matches!(checks[3].status, HealthStatus::Pass(_)) {
            checks.push(self.check_model_available().await);
        } else {
            checks.push(HealthCheck::new(
                "Model",
                HealthStatus::Warn("skipped, Ollama unreachable".to_string()),
            ));
        }

        checks
    }

    fn check_config(&self) -> HealthCheck {
        match self.config.validate() {
            Ok(()) => HealthCheck::new("Configuration", HealthStatus::Pass("valid".to_string())),
            Err(e) => HealthCheck::new("Configuration", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Load the corpus and build its index
    fn check_corpus(&self) -> HealthCheck {
        let path = self.config.corpus_path();
        let built = Corpus::load(path.as_deref())
            .and_then(|corpus| RetrievalEngine::build_with_params(corpus, self.config.search_params()));

        match built {
            Ok(engine) if engine.corpus().is_empty() => HealthCheck::new(
                "Corpus",
                HealthStatus::Warn("corpus is empty; every search returns nothing".to_string()),
            ),
            Ok(engine) => HealthCheck::new(
                "Corpus",
                HealthStatus::Pass(format!(
                    "{} documents, {} terms",
                    engine.corpus().len(),
                    engine.index().vocabulary_size()
                )),
            ),
            Err(e) => HealthCheck::new("Corpus", HealthStatus::Fail(e.to_string())),
        }
    }

    async fn check_ollama_api(&self) -> HealthCheck {
        match self.client.health_check().await {
            Ok(true) => HealthCheck::new(
                "Ollama API",
                HealthStatus::Pass(self.client.base_url().to_string()),
            ),
            Ok(false) => HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(format!(
                    "not reachable at {}; start it with: ollama serve",
                    self.client.base_url()
                )),
            ),
            Err(e) => HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(format!("Error checking Ollama: {}", e)),
            ),
        }
    }

    async fn check_model_available(&self) -> HealthCheck {
        match self.client.list_models().await {
            Ok(models) => HealthCheck::new("Model", model_status(&models, self.client.model())),
            Err(e) => HealthCheck::new(
                "Model",
                HealthStatus::Fail(format!("Cannot list models: {}", e)),
            ),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "docbuddy System Diagnostics".bold().cyan());
        println!("{:<16} Status", "Check");
        println!("{}", "=".repeat(60));

        for check in checks {
            let line = match &check.status {
                HealthStatus::Pass(msg) => format!("{} {}", "✓ PASS".green(), msg.dimmed()),
                HealthStatus::Warn(msg) => format!("{} {}", "! WARN".yellow(), msg),
                HealthStatus::Fail(msg) => format!("{} {}", "✗ FAIL".red(), msg),
            };
            println!("{:<16} {}", check.name, line);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

fn check_glossary() -> HealthCheck {
    match Glossary::builtin() {
        Ok(glossary) => HealthCheck::new(
            "Glossary",
            HealthStatus::Pass(format!("{} terms", glossary.len())),
        ),
        Err(e) => HealthCheck::new("Glossary", HealthStatus::Fail(e.to_string())),
    }
}

/// Whether `wanted` is installed; a bare name matches its `:latest` tag
pub fn model_status(installed: &[String], wanted: &str) -> HealthStatus {
    let is_wanted = |name: &String| {
        name == wanted || (!wanted.contains(':') && *name == format!("{}:latest", wanted))
    };

    if installed.iter().any(is_wanted) {
        HealthStatus::Pass(wanted.to_string())
    } else if installed.is_empty() {
        HealthStatus::Fail(format!("no models installed; pull one with: ollama pull {}", wanted))
    } else {
        HealthStatus::Fail(format!(
            "{} not installed (available: {}); pull it with: ollama pull {}",
            wanted,
            installed.join(", "),
            wanted
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_client() -> OllamaClient {
        OllamaClient::with_timeout("http://127.0.0.1:1", "qwen2.5:7b-instruct", Duration::from_secs(2))
            .unwrap()
    }

    #[test]
    fn test_model_status() {
        let installed = vec!["llama3:latest".to_string(), "qwen2.5:7b-instruct".to_string()];
        assert!(matches!(model_status(&installed, "llama3"), HealthStatus::Pass(_)));
        assert!(matches!(
            model_status(&installed, "qwen2.5:7b-instruct"),
            HealthStatus::Pass(_)
        ));
        assert!(matches!(model_status(&installed, "mistral"), HealthStatus::Fail(_)));
        assert!(matches!(model_status(&[], "llama3"), HealthStatus::Fail(_)));
    }

    #[test]
    fn test_overall_status() {
        let checks = vec![
            HealthCheck::new("a", HealthStatus::Pass(String::new())),
            HealthCheck::new("b", HealthStatus::Warn("warning".to_string())),
        ];
        assert!(Doctor::overall_status(&checks));

        let checks = vec![HealthCheck::new("c", HealthStatus::Fail("error".to_string()))];
        assert!(!Doctor::overall_status(&checks));
    }

    #[test]
    fn test_local_checks() {
        let doctor = Doctor::new(Config::default(), unreachable_client());
        assert!(matches!(doctor.check_config().status, HealthStatus::Pass(_)));
        assert!(matches!(doctor.check_corpus().status, HealthStatus::Pass(_)));
        assert!(matches!(check_glossary().status, HealthStatus::Pass(_)));

        let mut config = Config::default();
        config.corpus.path = Some("/nonexistent/corpus.json".to_string());
        let doctor = Doctor::new(config, unreachable_client());
        assert!(matches!(doctor.check_corpus().status, HealthStatus::Fail(_)));
    }

    #[tokio::test]
    async fn test_unreachable_ollama() {
        let doctor = Doctor::new(Config::default(), unreachable_client());
        let checks = doctor.run_diagnostics().await;

        assert_eq!(checks.len(), 5);
        assert!(matches!(checks[3].status, HealthStatus::Fail(_)));
        assert!(matches!(checks[4].status, HealthStatus::Warn(_)));
        assert!(!Doctor::overall_status(&checks));
    }
}

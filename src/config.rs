use crate::error::{HarnessError, Result};
use crate::oracle::ToleranceMode;
use crate::runner::ProgramSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name written by `approx-stress init`
pub const DEFAULT_CONFIG_FILENAME: &str = "stress.toml";

/// Parameter names the harness always passes to the generator itself
pub const RESERVED_PARAMS: [&str; 4] = ["n", "max_weight", "cost", "precision"];

/// Stress run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Number of iterations to run before declaring success
    pub max_iterations: u64,

    /// Index of the first iteration (also the first generator seed)
    pub start_iteration: u64,

    /// Seed for tolerance sampling (random when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Per-process wall-clock limit in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Representation of the sampled tolerance
    pub tolerance_mode: ToleranceMode,

    /// Parent directory for the scratch directory (system temp dir when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,

    /// Test case generator
    pub generator: ProgramSpec,

    /// Trusted implementation
    pub reference: ProgramSpec,

    /// Implementation under test
    pub candidate: ProgramSpec,

    /// Generation parameters handed to the generator
    pub params: GenerationParams,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000_000,
            start_iteration: 0,
            seed: None,
            timeout_ms: None,
            tolerance_mode: ToleranceMode::Float,
            scratch_dir: None,
            generator: ProgramSpec::new("./gen"),
            reference: ProgramSpec::new("./standard"),
            candidate: ProgramSpec::new("./main"),
            params: GenerationParams::default(),
        }
    }
}

/// Named generator parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Item count
    pub n: u64,

    /// Maximum total weight
    pub max_weight: u64,

    /// Upper bound on a single item cost
    pub cost: u64,

    /// Additional `key=value` pairs, passed after the named ones
    pub extra: BTreeMap<String, String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            n: 100,
            max_weight: 500,
            cost: 10_000,
            extra: BTreeMap::new(),
        }
    }
}

impl GenerationParams {
    /// `key=value` arguments in generator order
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("n={}", self.n),
            format!("max_weight={}", self.max_weight),
            format!("cost={}", self.cost),
        ];
        args.extend(self.extra.iter().map(|(k, v)| format!("{k}={v}")));
        args
    }

    /// Parse a `key=value` override and apply it
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            HarnessError::InvalidConfig(format!("parameter '{assignment}' is not key=value"))
        })?;
        let number = || {
            value.parse::<u64>().map_err(|_| {
                HarnessError::InvalidConfig(format!("parameter {key} needs an integer, got '{value}'"))
            })
        };
        match key {
            "n" => self.n = number()?,
            "max_weight" => self.max_weight = number()?,
            "cost" => self.cost = number()?,
            "precision" => {
                return Err(HarnessError::InvalidConfig(
                    "precision is sampled per iteration and cannot be set".to_string(),
                ))
            }
            _ => {
                self.extra.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }
}

impl StressConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        toml::from_str(&content).map_err(|source| HarnessError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HarnessError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| HarnessError::io(path, e))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Last iteration index (exclusive) covered by the budget
    pub fn end_iteration(&self) -> u64 {
        self.start_iteration.saturating_add(self.max_iterations)
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(HarnessError::InvalidConfig(msg));

        if self.max_iterations == 0 {
            return fail("max_iterations must be positive".to_string());
        }
        if self.timeout_ms == Some(0) {
            return fail("timeout_ms must be positive".to_string());
        }
        for (role, program) in [
            ("generator", &self.generator),
            ("reference", &self.reference),
            ("candidate", &self.candidate),
        ] {
            if program.path.as_os_str().is_empty() {
                return fail(format!("{role} path is empty"));
            }
        }
        for (name, value) in [
            ("n", self.params.n),
            ("max_weight", self.params.max_weight),
            ("cost", self.params.cost),
        ] {
            if value == 0 {
                return fail(format!("{name} must be positive"));
            }
        }
        for key in self.params.extra.keys() {
            if key.is_empty() || key.contains('=') || key.chars().any(char::is_whitespace) {
                return fail(format!("invalid parameter name '{key}'"));
            }
            if RESERVED_PARAMS.contains(&key.as_str()) {
                return fail(format!("parameter '{key}' is reserved"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ============================================================================
    // DEFAULT VALUE TESTS
    // ============================================================================

    #[test]
    fn test_stress_config_default() {
        let config = StressConfig::default();

        assert_eq!(config.max_iterations, 1_000_000);
        assert_eq!(config.start_iteration, 0);
        assert!(config.seed.is_none());
        assert!(config.timeout().is_none());
        assert_eq!(config.tolerance_mode, ToleranceMode::Float);
        assert_eq!(config.generator, ProgramSpec::new("./gen"));
        assert_eq!(config.reference, ProgramSpec::new("./standard"));
        assert_eq!(config.candidate, ProgramSpec::new("./main"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generation_params_default_args() {
        let params = GenerationParams::default();
        assert_eq!(params.to_args(), vec!["n=100", "max_weight=500", "cost=10000"]);
    }

    #[test]
    fn test_extra_params_follow_named_ones_sorted() {
        let mut params = GenerationParams::default();
        params.set("zeta=1").unwrap();
        params.set("alpha=x").unwrap();
        assert_eq!(
            params.to_args(),
            vec!["n=100", "max_weight=500", "cost=10000", "alpha=x", "zeta=1"]
        );
    }

    // ============================================================================
    // OVERRIDE TESTS
    // ============================================================================

    #[test]
    fn test_set_named_param() {
        let mut params = GenerationParams::default();
        params.set("n=5").unwrap();
        params.set("max_weight=40").unwrap();
        params.set("cost=7").unwrap();
        assert_eq!((params.n, params.max_weight, params.cost), (5, 40, 7));
        assert!(params.extra.is_empty());
    }

    #[test]
    fn test_set_rejects_malformed() {
        let mut params = GenerationParams::default();
        assert!(params.set("n").is_err());
        assert!(params.set("n=ten").is_err());
        assert!(params.set("precision=0.5").is_err());
    }

    #[test]
    fn test_set_value_may_contain_equals() {
        let mut params = GenerationParams::default();
        params.set("expr=a=b").unwrap();
        assert_eq!(params.extra.get("expr").map(String::as_str), Some("a=b"));
    }

    // ============================================================================
    // VALIDATION TESTS
    // ============================================================================

    #[test]
    fn test_validate_rejects_zero_budget() {
        let config = StressConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = StressConfig {
            timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_params() {
        let mut config = StressConfig::default();
        config.params.n = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("n must be positive"));
    }

    #[test]
    fn test_validate_rejects_reserved_extra_key() {
        let mut config = StressConfig::default();
        config.params.extra.insert("cost".to_string(), "1".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_extra_key() {
        let mut config = StressConfig::default();
        config.params.extra.insert("a b".to_string(), "1".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_program() {
        let config = StressConfig {
            candidate: ProgramSpec::new(""),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_end_iteration_saturates() {
        let config = StressConfig {
            start_iteration: u64::MAX - 1,
            max_iterations: 10,
            ..Default::default()
        };
        assert_eq!(config.end_iteration(), u64::MAX);
    }

    // ============================================================================
    // FILE I/O TESTS
    // ============================================================================

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);

        let mut config = StressConfig {
            seed: Some(42),
            timeout_ms: Some(2_000),
            tolerance_mode: ToleranceMode::Rational,
            reference: ProgramSpec::new("python3").with_args(["ref.py"]),
            ..Default::default()
        };
        config.params.extra.insert("mode".to_string(), "dense".to_string());

        config.save(&path).unwrap();
        let loaded = StressConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            r#"
max_iterations = 25

[candidate]
path = "./fast"

[params]
n = 10
"#,
        )
        .unwrap();

        let config = StressConfig::load(&path).unwrap();
        assert_eq!(config.max_iterations, 25);
        assert_eq!(config.candidate, ProgramSpec::new("./fast"));
        assert_eq!(config.reference, ProgramSpec::new("./standard"));
        assert_eq!(config.params.n, 10);
        assert_eq!(config.params.max_weight, 500);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "max_iterations = \"lots\"").unwrap();
        let err = StressConfig::load(&path).unwrap_err();
        assert!(matches!(err, HarnessError::ConfigParse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = StressConfig::load(Path::new("/nonexistent/stress.toml")).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}

//! Configuration management for the swap executor
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::coordination::{PollPolicy, DEFAULT_APPROVAL_GRACE_POLLS};
use crate::model::{UserSettings, Validations};

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

lazy_static! {
    static ref ENV_VAR: regex::Regex =
        regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern");
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
    #[serde(default = "default_approval_interval_ms")]
    pub approval_interval_ms: u64,
    /// Unset means poll until a terminal answer arrives
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_max_approval_rounds")]
    pub max_approval_rounds: u32,
    /// Extra approval polls allowed once the approval is mined but the
    /// allowance still reads short
    #[serde(default = "default_approval_grace_polls")]
    pub approval_grace_polls: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_slippage")]
    pub slippage: f64,
    #[serde(default)]
    pub infinite_approve: bool,
    #[serde(default = "default_true")]
    pub check_balance: bool,
    #[serde(default = "default_true")]
    pub check_fee: bool,
    #[serde(default)]
    pub broadcast_timeout_ms: Option<u64>,
    #[serde(default = "default_report_timeout_ms")]
    pub report_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

fn default_status_interval_ms() -> u64 {
    5_000
}

fn default_approval_interval_ms() -> u64 {
    3_000
}

fn default_max_approval_rounds() -> u32 {
    3
}

fn default_approval_grace_polls() -> u32 {
    DEFAULT_APPROVAL_GRACE_POLLS
}

fn default_slippage() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_report_timeout_ms() -> u64 {
    10_000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: default_status_interval_ms(),
            approval_interval_ms: default_approval_interval_ms(),
            max_attempts: None,
            timeout_secs: None,
            max_approval_rounds: default_max_approval_rounds(),
            approval_grace_polls: default_approval_grace_polls(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            slippage: default_slippage(),
            infinite_approve: false,
            check_balance: true,
            check_fee: true,
            broadcast_timeout_ms: None,
            report_timeout_ms: default_report_timeout_ms(),
        }
    }
}

impl Settings {
    /// Load settings from the file named by `XSWAP_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = env::var("XSWAP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::from_path(&config_path)
    }

    /// Load settings for a specific environment
    pub fn load_env(env_name: &str) -> Result<Self> {
        Self::from_path(format!("config/{}.toml", env_name))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&config_str)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(raw);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must be set");
        }
        if self.api.api_key.is_empty() {
            tracing::warn!("api.api_key is empty - requests will be unauthenticated");
        }
        if self.polling.status_interval_ms == 0 || self.polling.approval_interval_ms == 0 {
            anyhow::bail!("Polling intervals must be greater than zero");
        }
        if self.polling.max_attempts == Some(0) {
            anyhow::bail!("polling.max_attempts must be at least 1 when set");
        }
        if self.polling.max_approval_rounds == 0 {
            anyhow::bail!("polling.max_approval_rounds must be at least 1");
        }
        if !(self.execution.slippage > 0.0 && self.execution.slippage <= 100.0) {
            anyhow::bail!(
                "execution.slippage must be in (0, 100], got {}",
                self.execution.slippage
            );
        }

        Ok(())
    }

    /// Runtime options for the route executor
    pub fn executor_config(&self) -> ExecutorConfig {
        let timeout = self.polling.timeout_secs.map(Duration::from_secs);

        ExecutorConfig {
            status_policy: PollPolicy {
                interval: Duration::from_millis(self.polling.status_interval_ms),
                max_attempts: self.polling.max_attempts,
                timeout,
            },
            approval_policy: PollPolicy {
                interval: Duration::from_millis(self.polling.approval_interval_ms),
                max_attempts: self.polling.max_attempts,
                timeout,
            },
            max_approval_rounds: self.polling.max_approval_rounds,
            approval_grace_polls: self.polling.approval_grace_polls,
            user_settings: UserSettings {
                slippage: format_slippage(self.execution.slippage),
                infinite_approve: self.execution.infinite_approve,
            },
            validations: Validations {
                balance: self.execution.check_balance,
                fee: self.execution.check_fee,
                approve: true,
            },
            broadcast_timeout: self.execution.broadcast_timeout_ms.map(Duration::from_millis),
            report_timeout: Some(Duration::from_millis(self.execution.report_timeout_ms)),
        }
    }
}

/// Options consumed by the executors, independent of how they were loaded
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub status_policy: PollPolicy,
    pub approval_policy: PollPolicy,
    pub max_approval_rounds: u32,
    pub approval_grace_polls: u32,
    pub user_settings: UserSettings,
    pub validations: Validations,
    pub broadcast_timeout: Option<Duration>,
    pub report_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            status_policy: PollPolicy::every(Duration::from_millis(default_status_interval_ms())),
            approval_policy: PollPolicy::every(Duration::from_millis(
                default_approval_interval_ms(),
            )),
            max_approval_rounds: default_max_approval_rounds(),
            approval_grace_polls: default_approval_grace_polls(),
            user_settings: UserSettings::default(),
            validations: Validations::default(),
            broadcast_timeout: None,
            report_timeout: Some(Duration::from_millis(default_report_timeout_ms())),
        }
    }
}

/// Percent string sent to the routing service. Whole numbers keep one
/// decimal place (`1.0`, not `1`).
fn format_slippage(slippage: f64) -> String {
    if slippage.fract() == 0.0 {
        format!("{:.1}", slippage)
    } else {
        slippage.to_string()
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

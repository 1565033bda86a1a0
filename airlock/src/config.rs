use airlock_core::AirlockLimits;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{AirlockError, Result};

/// Top-level configuration for the airlock daemon.
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Address the untrusted (ingress) side connects to.
    pub ingress_listen: SocketAddr,
    /// Address of the trusted (egress) side the forwarded stream is sent to.
    pub egress_connect: SocketAddr,
    /// `false` = ingress/strict (a violation locks the airlock shut).
    /// `true` = egress/permissive (a violation only drops the current frame).
    #[serde(default)]
    pub egress_mode: bool,
    /// Optional control listener: any received byte toggles the heartbeat input.
    #[serde(default)]
    pub heartbeat_listen: Option<SocketAddr>,
    /// Optional control listener: any received byte pulses `rst_lock`.
    #[serde(default)]
    pub reset_listen: Option<SocketAddr>,
    /// Cycle period. The core advances one byte per cycle; this bounds how
    /// fast the runner drains the ingress stream.
    #[serde(default = "default_cycle_period_micros")]
    pub cycle_period_micros: u64,
    #[serde(default)]
    pub limits: AirlockLimits,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_cycle_period_micros() -> u64 {
    1
}

/// Controls observability features: metrics and OpenTelemetry internals.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelemetryConfig {
    /// Metrics server port. If absent, the observability server is not started.
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_otel_log_level")]
    pub otel_log_level: String,
}

fn default_otel_log_level() -> String {
    "warn".to_string()
}

/// Controls application-level structured logging.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub show_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<RunnerConfig> {
    let txt = fs::read_to_string(p)
        .map_err(|e| AirlockError::Config(format!("failed to read config file: {e}")))?;
    let cfg: RunnerConfig = toml::from_str(&txt)
        .map_err(|e| AirlockError::Config(format!("failed to parse config: {e}")))?;
    validate_config(&cfg)?;
    Ok(cfg)
}

fn validate_config(cfg: &RunnerConfig) -> Result<()> {
    if cfg.ingress_listen == cfg.egress_connect {
        return Err(AirlockError::Config(
            "ingress_listen and egress_connect must not be the same address".to_string(),
        ));
    }
    if cfg.limits.arp_burst_limit == 0 {
        return Err(AirlockError::Config(
            "limits.arp_burst_limit must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Tunables for a capture engine.
///
/// Loaded by the host from its own settings (JSON); every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long `start()` waits for the worker to finish initializing.
    pub start_timeout_ms: u64,

    /// How long `stop()` waits for the worker to exit before detaching it.
    pub stop_timeout_ms: u64,

    /// Sleep between polls when no native data was available.
    pub idle_poll_ms: u64,

    /// Sleep between polls while paused.
    pub paused_poll_ms: u64,

    /// Deliver `level_changed` events for every emitted buffer.
    pub emit_levels: bool,

    /// When mixing, how much audio one source may queue while the other
    /// delivers nothing before it is passed through unmixed.
    pub max_pending_ms: u64,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| {
                CaptureError::InitializationFailed(format!("invalid engine config: {}", e))
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.start_timeout_ms == 0 || self.stop_timeout_ms == 0 {
            return Err(CaptureError::InitializationFailed(
                "timeouts must be positive".into(),
            ));
        }
        for poll in [self.idle_poll_ms, self.paused_poll_ms] {
            if poll == 0 || poll > 1000 {
                return Err(CaptureError::InitializationFailed(format!(
                    "poll interval out of range: {} ms",
                    poll
                )));
            }
        }
        if self.max_pending_ms == 0 {
            return Err(CaptureError::InitializationFailed(
                "max_pending_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn paused_poll(&self) -> Duration {
        Duration::from_millis(self.paused_poll_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_timeout_ms: 1000,
            stop_timeout_ms: 2000,
            idle_poll_ms: 5,
            paused_poll_ms: 20,
            emit_levels: true,
            max_pending_ms: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{ "stop_timeout_ms": 500 }"#).unwrap();
        assert_eq!(config.stop_timeout_ms, 500);
        assert_eq!(config.start_timeout_ms, 1000);
        assert!(config.emit_levels);
    }

    #[test]
    fn rejects_zero_poll() {
        let err = EngineConfig::from_json(r#"{ "idle_poll_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, CaptureError::InitializationFailed(_)));
    }

    #[test]
    fn rejects_zero_pending_limit() {
        assert!(EngineConfig::from_json(r#"{ "max_pending_ms": 0 }"#).is_err());
        assert_eq!(EngineConfig::default().max_pending_ms, 200);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(EngineConfig::from_json("{ nope").is_err());
    }
}

//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: engine error (unknown preset, invalid config, bad dimensions)
//! - 11: I/O error (reading scenario/config files, writing the snapshot)
//! - 12: input error (malformed or out-of-range scenario, bad config JSON, bad colour)
//! - 13: serialization error

use thiserror::Error;
use warpfield_core::EngineError;

/// Failures of a CLI run, each mapped to a distinct exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// Preset lookup, validation or dimension failure inside the engine.
    #[error("{0}")]
    Engine(EngineError),
    /// Reading a scenario/config file or writing the snapshot failed.
    #[error("{0}")]
    Io(String),
    /// The user supplied malformed JSON, a rejected scenario or a bad colour.
    #[error("{0}")]
    Input(String),
    /// Report output could not be serialized.
    #[error("{0}")]
    Serialization(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Io(msg) => CliError::Io(msg),
            e @ (EngineError::InvalidColor(_) | EngineError::InvalidScenario(_)) => {
                CliError::Input(e.to_string())
            }
            other => CliError::Engine(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_exit_code_is_10() {
        let err = CliError::Engine(EngineError::UnknownPreset("foo".into()));
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn io_error_exit_code_is_11() {
        let err = CliError::Io("write failed".into());
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn input_error_exit_code_is_12() {
        let err = CliError::Input("bad scenario".into());
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn serialization_error_exit_code_is_13() {
        let err = CliError::Serialization("json fail".into());
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn from_engine_error_io_routes_to_cli_io() {
        let cli_err = CliError::from(EngineError::Io("disk full".into()));
        assert_eq!(cli_err.exit_code(), 11);
        assert!(cli_err.to_string().contains("disk full"));
    }

    #[test]
    fn from_engine_error_color_routes_to_input() {
        let cli_err = CliError::from(EngineError::InvalidColor("#zz".into()));
        assert_eq!(cli_err.exit_code(), 12);
        assert!(cli_err.to_string().contains("#zz"));
    }

    #[test]
    fn from_engine_error_scenario_routes_to_input() {
        let cli_err = CliError::from(EngineError::InvalidScenario("tick 99".into()));
        assert_eq!(cli_err.exit_code(), 12);
        assert!(cli_err.to_string().contains("tick 99"));
    }

    #[test]
    fn from_engine_error_other_routes_to_cli_engine() {
        let cli_err = CliError::from(EngineError::InvalidConfig("spawn_cap".into()));
        assert_eq!(cli_err.exit_code(), 10);
        assert!(cli_err.to_string().contains("spawn_cap"));
    }

    #[test]
    fn from_serde_json_error_routes_to_serialization() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{invalid");
        let cli_err = CliError::from(bad_json.unwrap_err());
        assert_eq!(cli_err.exit_code(), 13);
    }
}

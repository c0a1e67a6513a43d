//! Error types for the warpfield core.

use thiserror::Error;

/// Errors produced by world, engine loop, and configuration operations.
///
/// Most runtime problems in the simulation are not errors at all: invalid
/// commands are dropped when dequeued and numeric singularities are clamped
/// structurally. What remains is construction-time validation and the
/// host-reported loss of a drawing surface.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero or non-finite when building a world or surface.
    #[error("invalid dimensions: width and height must be finite and non-zero")]
    InvalidDimensions,

    /// A configuration value was out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A command failed validation. Returned by [`Command::validate`]; the
    /// world logs and drops such commands instead of propagating this.
    ///
    /// [`Command::validate`]: crate::command::Command::validate
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A scheduled command referenced a tick outside the scenario length.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    /// The world owning the command queue has been dropped.
    #[error("command queue closed")]
    QueueClosed,

    /// The drawing surface went away; the engine loop has stopped.
    #[error("drawing surface unavailable")]
    SurfaceUnavailable,

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A preset name was not recognized by the registry.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// An I/O failure (snapshot write, scenario read).
    #[error("i/o error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimensions_displays_readable_message() {
        let msg = EngineError::InvalidDimensions.to_string();
        assert!(
            msg.contains("width") && msg.contains("height"),
            "expected message mentioning width and height, got: {msg}"
        );
    }

    #[test]
    fn invalid_config_includes_message() {
        let msg = EngineError::InvalidConfig("spawn_cap must be > 0".into()).to_string();
        assert!(msg.contains("spawn_cap"), "missing detail in: {msg}");
    }

    #[test]
    fn invalid_command_includes_message() {
        let msg = EngineError::InvalidCommand("negative count -3".into()).to_string();
        assert!(msg.contains("-3"), "missing detail in: {msg}");
    }

    #[test]
    fn unknown_preset_includes_name() {
        let msg = EngineError::UnknownPreset("wormhole-party".into()).to_string();
        assert!(msg.contains("wormhole-party"), "missing name in: {msg}");
    }

    #[test]
    fn surface_unavailable_mentions_surface() {
        let msg = EngineError::SurfaceUnavailable.to_string();
        assert!(msg.contains("surface"), "got: {msg}");
    }

    #[test]
    fn engine_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }

    #[test]
    fn engine_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<EngineError>();
    }
}

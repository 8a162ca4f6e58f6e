use thiserror::Error;

/// Configuration problems detected while building a control. Nothing after
/// construction reports an error.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("parameter range is degenerate: min {min} == max {max}")]
    DegenerateRange { min: f32, max: f32 },
    #[error("parameter bounds must be finite (min {min}, max {max})")]
    NonFiniteBound { min: f32, max: f32 },
    #[error("max rotation must be finite and positive, got {0}")]
    InvalidMaxRotation(f32),
    #[error("initial value must be finite, got {0}")]
    NonFiniteInitialValue(f32),
}

use thiserror::Error;

/// Errors raised by the simulation model, the control plane and the weather feed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Construction-time invariant violation or an unknown enum value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Control-plane value outside its accepted range. State is left untouched.
    #[error("{parameter} must be between {min} and {max} {unit} (got {value})")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
        unit: &'static str,
    },

    #[error("Cannot set outside temperature while real weather is in use")]
    RealWeatherActive,

    #[error("No results found for the address: {0}")]
    LocationNotFound(String),

    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),
}

pub type SimulationResult<T> = Result<T, SimulationError>;

impl SimulationError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SimulationError::InvalidParameter(msg.into())
    }

    /// True for errors a caller can recover from without restarting the engine.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SimulationError::InvalidParameter(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = SimulationError::OutOfRange {
            parameter: "Boiler power",
            value: 500.0,
            min: 1000.0,
            max: 35000.0,
            unit: "W",
        };
        assert_eq!(
            err.to_string(),
            "Boiler power must be between 1000 and 35000 W (got 500)"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_invalid_parameter_is_fatal() {
        assert!(!SimulationError::invalid("edge").is_recoverable());
    }
}

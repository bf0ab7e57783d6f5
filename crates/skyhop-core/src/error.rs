//! Error types.
//!
//! Errors only surface at construction time (building a level, validating a
//! config) and from explicit scene-graph edits. Once a level is running, a
//! failing component disables itself and logs instead of returning errors.

use thiserror::Error;

use crate::entity::EntityId;

/// Invalid component or level configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric setting is out of range.
    #[error("{component}: `{field}` must be {expected}, got {value}")]
    InvalidValue {
        /// Component being configured.
        component: &'static str,
        /// Offending field.
        field: &'static str,
        /// Human-readable constraint.
        expected: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A mover was configured without one of its endpoints.
    #[error("{component} `{name}` is missing its {endpoint} point")]
    MissingEndpoint {
        /// Component being configured.
        component: &'static str,
        /// Entity name in the level description.
        name: String,
        /// `"start"` or `"end"`.
        endpoint: &'static str,
    },

    /// A level entity refers to a name that does not exist.
    #[error("`{from}` refers to unknown entity `{to}`")]
    UnknownReference {
        /// Referring entity.
        from: String,
        /// Missing name.
        to: String,
    },

    /// Two level entities share a name.
    #[error("duplicate entity name `{0}`")]
    DuplicateName(String),

    /// The level description is not valid JSON.
    #[error("malformed level description: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Rejects negative or non-finite durations.
    pub(crate) fn check_duration(
        component: &'static str,
        field: &'static str,
        value: f32,
    ) -> Result<(), Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidValue {
                component,
                field,
                expected: "a finite non-negative duration",
                value,
            })
        }
    }

    /// Rejects negative or non-finite speeds and magnitudes.
    pub(crate) fn check_non_negative(
        component: &'static str,
        field: &'static str,
        value: f32,
    ) -> Result<(), Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidValue {
                component,
                field,
                expected: "finite and non-negative",
                value,
            })
        }
    }
}

/// Invalid scene-graph operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// The entity does not exist.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// Parenting `child` under `parent` would create a cycle.
    #[error("parenting {child} under {parent} would create a cycle")]
    ParentCycle {
        /// Entity being parented.
        child: EntityId,
        /// Requested parent.
        parent: EntityId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = ConfigError::MissingEndpoint {
            component: "moving platform",
            name: "lift".to_string(),
            endpoint: "end",
        };
        assert_eq!(err.to_string(), "moving platform `lift` is missing its end point");

        let err = SceneError::ParentCycle {
            child: EntityId::new(1),
            parent: EntityId::new(2),
        };
        assert_eq!(err.to_string(), "parenting 1 under 2 would create a cycle");
    }

    #[test]
    fn duration_checks() {
        assert!(ConfigError::check_duration("spikes", "rise_duration", 0.0).is_ok());
        assert!(ConfigError::check_duration("spikes", "rise_duration", -0.1).is_err());
        assert!(ConfigError::check_duration("spikes", "rise_duration", f32::NAN).is_err());
        assert!(ConfigError::check_non_negative("box", "speed", f32::INFINITY).is_err());
    }

    #[test]
    fn json_errors_convert() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}

//! Error types for micromesh-control.
//!
//! None of these ever reach the user as a failure message. The input handlers
//! absorb every variant locally; they exist so collaborators and the option
//! builders can say *why* something was discarded.

use thiserror::Error;

use crate::picking::ElementId;

/// Result type alias using [`InteractError`].
pub type Result<T> = std::result::Result<T, InteractError>;

/// Recoverable conditions raised by the interaction core and its collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InteractError {
    /// A picked element no longer exists in the mesh.
    #[error("element {0:?} no longer exists")]
    InvalidTarget(ElementId),

    /// An edit was finalized while no edit session was active.
    #[error("no edit session is active")]
    InvalidModalTransition,

    /// A camera or viewport quantity reached a degenerate value.
    #[error("degenerate geometry: {what}")]
    DegenerateGeometry {
        /// What went degenerate.
        what: &'static str,
    },

    /// A level-of-detail rank was requested while no LOD mode is active.
    #[error("level-of-detail mode is not active")]
    LodInactive,

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl InteractError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        InteractError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Whether this error means the command's target went stale.
    pub fn is_stale_target(&self) -> bool {
        matches!(self, InteractError::InvalidTarget(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = InteractError::InvalidTarget(ElementId::new(7));
        assert_eq!(e.to_string(), "element #7 no longer exists");
        assert!(e.is_stale_target());

        let e = InteractError::invalid_param("zoom_factor", 0.5, "must be greater than 1");
        assert_eq!(
            e.to_string(),
            "invalid parameter: zoom_factor = 0.5 (must be greater than 1)"
        );
        assert!(!e.is_stale_target());
    }
}

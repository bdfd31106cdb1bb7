//! Structural validation of a command list
//!
//! Context-free checks run before any planning. The list is scanned in
//! sequence order and the first violation is reported.

use thiserror::Error;

use seqblend_core::MotionCommand;

/// Structural violations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Command {index} has negative blend radius {radius}")]
    NegativeBlendRadius { index: usize, radius: f64 },
    #[error("Last command {index} has non-zero blend radius {radius}")]
    LastBlendRadiusNotZero { index: usize, radius: f64 },
    #[error("Command {index} sets a start state; only the first command may")]
    StartStateAlreadySet { index: usize },
}

impl ValidationError {
    /// Index of the offending command
    pub fn index(&self) -> usize {
        match self {
            ValidationError::NegativeBlendRadius { index, .. }
            | ValidationError::LastBlendRadiusNotZero { index, .. }
            | ValidationError::StartStateAlreadySet { index } => *index,
        }
    }
}

/// Check the inter-command invariants of a command list
///
/// Blend radii are checked first (all of them), then the last radius, then
/// start states, so a list with several problems always reports the same one.
pub fn validate(commands: &[MotionCommand]) -> Result<(), ValidationError> {
    // NaN radii are rejected together with negative ones
    if let Some(command) = commands.iter().find(|c| !(c.blend_radius >= 0.0)) {
        return Err(ValidationError::NegativeBlendRadius {
            index: command.sequence_index,
            radius: command.blend_radius,
        });
    }

    if let Some(last) = commands.last() {
        if last.blend_radius != 0.0 {
            return Err(ValidationError::LastBlendRadiusNotZero {
                index: last.sequence_index,
                radius: last.blend_radius,
            });
        }
    }

    if let Some(command) = commands.iter().skip(1).find(|c| c.explicit_start.is_some()) {
        return Err(ValidationError::StartStateAlreadySet {
            index: command.sequence_index,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;
    use seqblend_core::MotionSequence;

    fn q(x: f64) -> DVector<f64> {
        DVector::from_row_slice(&[x, 0.0, 0.0])
    }

    fn three_commands() -> MotionSequence {
        MotionSequence::new()
            .with(MotionCommand::ptp("arm", q(0.1)).with_start(q(0.0)).with_blend_radius(0.02))
            .with(MotionCommand::lin("arm", q(0.2)).with_blend_radius(0.02))
            .with(MotionCommand::ptp("arm", q(0.3)))
    }

    #[test]
    fn test_valid_sequence() {
        assert!(validate(three_commands().commands()).is_ok());
    }

    #[test]
    fn test_empty_sequence_is_valid() {
        assert!(validate(&[]).is_ok());
    }

    #[test]
    fn test_negative_blend_radius() {
        let mut sequence = three_commands();
        sequence.set_blend_radius(1, -0.3);

        assert_eq!(
            validate(sequence.commands()),
            Err(ValidationError::NegativeBlendRadius { index: 1, radius: -0.3 })
        );
    }

    #[test]
    fn test_nan_blend_radius_rejected() {
        let mut sequence = three_commands();
        sequence.set_blend_radius(0, f64::NAN);

        let err = validate(sequence.commands()).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeBlendRadius { index: 0, .. }));
    }

    #[test]
    fn test_last_blend_radius_not_zero() {
        let mut sequence = three_commands();
        sequence.set_blend_radius(2, 0.03);

        assert_eq!(
            validate(sequence.commands()),
            Err(ValidationError::LastBlendRadiusNotZero { index: 2, radius: 0.03 })
        );
    }

    #[test]
    fn test_negative_last_radius_reports_negative() {
        let mut sequence = three_commands();
        sequence.set_blend_radius(2, -0.1);

        let err = validate(sequence.commands()).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeBlendRadius { index: 2, .. }));
    }

    #[test]
    fn test_start_state_on_later_command() {
        let mut sequence = three_commands();
        sequence.get_mut(2).unwrap().explicit_start = Some(q(0.2));

        assert_eq!(
            validate(sequence.commands()),
            Err(ValidationError::StartStateAlreadySet { index: 2 })
        );
        assert_eq!(validate(sequence.commands()).unwrap_err().index(), 2);
    }

    #[test]
    fn test_checks_run_by_category_not_by_position() {
        let mut sequence = three_commands()
            .with(MotionCommand::ptp("arm", q(0.4)))
            .with(MotionCommand::ptp("arm", q(0.5)));
        sequence.get_mut(1).unwrap().explicit_start = Some(q(0.1));
        sequence.set_blend_radius(3, -0.1);
        sequence.set_blend_radius(4, 0.05);

        // Earlier start state and later non-zero last radius lose to the negative radius
        assert_eq!(
            validate(sequence.commands()),
            Err(ValidationError::NegativeBlendRadius { index: 3, radius: -0.1 })
        );

        sequence.set_blend_radius(3, 0.0);
        assert_eq!(
            validate(sequence.commands()),
            Err(ValidationError::LastBlendRadiusNotZero { index: 4, radius: 0.05 })
        );
    }

    #[test]
    fn test_first_command_without_start_is_valid() {
        let mut sequence = three_commands();
        sequence.get_mut(0).unwrap().explicit_start = None;

        assert!(validate(sequence.commands()).is_ok());
    }
}

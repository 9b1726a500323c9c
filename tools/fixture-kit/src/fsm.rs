use crate::errors::FixtureError;
use crate::types::FixtureState;

/// Progress of one fixture through a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckProgress {
    pub state: FixtureState,
    pub failure_reason: Option<String>,
}

impl Default for CheckProgress {
    fn default() -> Self {
        Self {
            state: FixtureState::Pending,
            failure_reason: None,
        }
    }
}

impl CheckProgress {
    pub fn transition(&mut self, next: FixtureState) -> Result<(), FixtureError> {
        validate_transition(self.state, next)?;
        self.state = next;
        Ok(())
    }

    /// Moves to `Failed`, remembering the state the failure happened in.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<FixtureState, FixtureError> {
        let reached = self.state;
        self.transition(FixtureState::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(reached)
    }
}

pub fn validate_transition(from: FixtureState, to: FixtureState) -> Result<(), FixtureError> {
    use FixtureState as S;

    let allowed = match from {
        S::Pending => matches!(to, S::Invoked | S::Failed),
        S::Invoked => matches!(to, S::Parsed | S::Failed),
        S::Parsed => matches!(to, S::Compared | S::Failed),
        S::Compared => matches!(to, S::Passed | S::Failed),
        S::Passed | S::Failed => false,
    };

    if !allowed {
        return Err(FixtureError::IllegalTransition(format!(
            "{} -> {}",
            from.as_str(),
            to.as_str()
        )));
    }
    Ok(())
}

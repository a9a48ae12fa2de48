//! Stage progression for the wizard.
//!
//! The wizard keeps two pointers: the stage on screen and the furthest stage
//! ever reached. Going back is always allowed and free of side effects;
//! going forward past the watermark only happens through a stage action
//! succeeding or an explicit gated "continue".

use clab_models::Stage;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardStateMachine {
    current: Stage,
    max_reached: Stage,
}

impl WizardStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore pointers from a snapshot; the watermark never ends up below
    /// the current stage.
    pub fn restore(current: Stage, max_reached: Stage) -> Self {
        Self {
            current,
            max_reached: max_reached.max(current),
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    pub fn max_reached(&self) -> Stage {
        self.max_reached
    }

    pub fn can_navigate(&self, target: Stage) -> bool {
        target <= self.max_reached
    }

    /// Move the pointer to an already reached stage.
    pub fn navigate(&mut self, target: Stage) -> PipelineResult<()> {
        if !self.can_navigate(target) {
            return Err(PipelineError::Unreachable {
                target,
                watermark: self.max_reached,
            });
        }
        debug!(from = %self.current, to = %target, "Navigating");
        self.current = target;
        Ok(())
    }

    /// Enter `stage`, raising the watermark if needed.
    ///
    /// Returns true when the watermark moved.
    pub(crate) fn advance_to(&mut self, stage: Stage) -> bool {
        self.current = stage;
        if stage > self.max_reached {
            self.max_reached = stage;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_input() {
        let wizard = WizardStateMachine::new();
        assert_eq!(wizard.current(), Stage::InputUrl);
        assert_eq!(wizard.max_reached(), Stage::InputUrl);
    }

    #[test]
    fn test_navigation_beyond_watermark_rejected() {
        let mut wizard = WizardStateMachine::new();
        wizard.advance_to(Stage::ReviewProduct);
        let before = wizard.clone();

        let err = wizard.navigate(Stage::GenerateModel).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Unreachable {
                target: Stage::GenerateModel,
                watermark: Stage::ReviewProduct
            }
        ));
        assert_eq!(wizard, before);
    }

    #[test]
    fn test_navigation_within_watermark() {
        let mut wizard = WizardStateMachine::new();
        wizard.advance_to(Stage::GenerateVideos);

        for stage in Stage::ALL.iter().copied().filter(|s| *s <= Stage::GenerateVideos) {
            wizard.navigate(stage).unwrap();
            assert_eq!(wizard.current(), stage);
            assert_eq!(wizard.max_reached(), Stage::GenerateVideos);
        }
    }

    #[test]
    fn test_watermark_never_decreases() {
        let mut wizard = WizardStateMachine::new();
        assert!(wizard.advance_to(Stage::GenerateVideos));
        assert!(!wizard.advance_to(Stage::ReviewProduct));
        assert_eq!(wizard.current(), Stage::ReviewProduct);
        assert_eq!(wizard.max_reached(), Stage::GenerateVideos);
    }

    #[test]
    fn test_restore_clamps_watermark() {
        let wizard = WizardStateMachine::restore(Stage::FinalEditor, Stage::ReviewProduct);
        assert_eq!(wizard.max_reached(), Stage::FinalEditor);
    }
}

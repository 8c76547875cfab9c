//! Constant grader: assigns the same configured grades to every exercise.

use crate::behavior::{probability_param, GraderBehavior};
use crate::error::BehaviorError;
use crate::exercise::{Exercise, GradeDraft};
use crate::knowledge::Topic;
use crate::types::Parameters;

pub struct Constant {
    grades: GradeDraft,
}

impl Constant {
    pub fn new(grades: GradeDraft) -> Self {
        Self { grades }
    }

    /// Reads `difficulty`, `correctness` and `relevance` (defaults 0.5, 1.0, 1.0)
    pub fn from_parameters(parameters: &Parameters) -> Result<Self, BehaviorError> {
        Ok(Self::new(GradeDraft::new(
            probability_param(parameters, "difficulty", 0.5)?,
            probability_param(parameters, "correctness", 1.0)?,
            probability_param(parameters, "relevance", 1.0)?,
        )))
    }
}

pub(crate) fn build(parameters: &Parameters) -> Result<Box<dyn GraderBehavior>, BehaviorError> {
    Ok(Box::new(Constant::from_parameters(parameters)?))
}

impl GraderBehavior for Constant {
    fn setup(&mut self, _topic: &Topic) -> Result<(), BehaviorError> {
        Ok(())
    }

    fn grade_one(&self, _exercise: &Exercise) -> Result<GradeDraft, BehaviorError> {
        Ok(self.grades)
    }
}

//! Blind-guess grader.
//!
//! Difficulty is the probability that a learner guessing blindly picks a wrong
//! choice. Correctness is 1 for well-formed multiple-choice exercises and 0
//! otherwise. Relevance is 1 when the question mentions the topic name and the
//! `off-topic-relevance` parameter (default 0.5) otherwise.

use crate::behavior::{probability_param, GraderBehavior};
use crate::error::BehaviorError;
use crate::exercise::{Exercise, GradeDraft};
use crate::knowledge::Topic;
use crate::types::Parameters;

pub const OFF_TOPIC_RELEVANCE: &str = "off-topic-relevance";

pub struct BlindGuess {
    off_topic_relevance: f64,
    /// Lower-cased name tokens of the topic, set by `setup`
    topic_tokens: Option<Vec<String>>,
}

impl BlindGuess {
    pub fn new(off_topic_relevance: f64) -> Self {
        Self {
            off_topic_relevance,
            topic_tokens: None,
        }
    }

    pub fn from_parameters(parameters: &Parameters) -> Result<Self, BehaviorError> {
        Ok(Self::new(probability_param(parameters, OFF_TOPIC_RELEVANCE, 0.5)?))
    }
}

pub(crate) fn build(parameters: &Parameters) -> Result<Box<dyn GraderBehavior>, BehaviorError> {
    Ok(Box::new(BlindGuess::from_parameters(parameters)?))
}

impl GraderBehavior for BlindGuess {
    fn setup(&mut self, topic: &Topic) -> Result<(), BehaviorError> {
        let tokens = topic
            .name()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>();
        self.topic_tokens = Some(tokens);
        Ok(())
    }

    fn grade_one(&self, exercise: &Exercise) -> Result<GradeDraft, BehaviorError> {
        let topic_tokens = self.topic_tokens.as_ref().ok_or(BehaviorError::NotSetUp)?;
        let Some(mc) = exercise.multiple_choice() else {
            return Ok(GradeDraft::new(0.0, 0.0, self.off_topic_relevance));
        };

        let difficulty = if mc.choices.is_empty() {
            0.0
        } else {
            1.0 - 1.0 / mc.choices.len() as f64
        };
        let correctness = if mc.is_well_formed() { 1.0 } else { 0.0 };
        let question = mc.question.to_lowercase();
        let on_topic = question
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| topic_tokens.iter().any(|token| token == word));
        let relevance = if on_topic { 1.0 } else { self.off_topic_relevance };

        Ok(GradeDraft::new(difficulty, correctness, relevance))
    }
}

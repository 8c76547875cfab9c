//! Quasi exercises creator.
//!
//! Uses quasi-facts: facts which encode a single exercise and are useless for
//! anything else. A term-in-sentence quasi-fact is a node typed
//! `"term-in-sentence"` with the sentence parts before and after a term:
//!
//! ```text
//! _:f rdf:type            "term-in-sentence"
//! _:f drill:part-before-term "Lincoln was born in"
//! _:f drill:term            dbpedia:Kentucky
//! _:f drill:part-after-term  "in 1809"
//! ```
//!
//! Distractors are the terms linked to the correct term by `drill:similar-term`
//! in either direction.

use crate::behavior::{count_param, DraftStream, GeneratorBehavior};
use crate::error::BehaviorError;
use crate::exercise::{ExerciseDraft, MultipleChoice, TERM_PAIRS};
use crate::knowledge::namespaces::{
    PART_AFTER_TERM, PART_BEFORE_TERM, RDF_TYPE, SIMILAR_TERM, TERM, TERM_IN_SENTENCE,
};
use crate::knowledge::terms::term_to_name;
use crate::knowledge::KnowledgeGraph;
use crate::types::Parameters;
use serde_json::json;
use std::collections::BTreeSet;

pub const MAX_DISTRACTORS: &str = "max-distractors";
pub const DEFAULT_MAX_DISTRACTORS: usize = 3;

/// Blank placed where the term was
pub const GAP: &str = "_______";

pub struct Quasi {
    max_distractors: usize,
}

impl Quasi {
    pub fn new(max_distractors: usize) -> Self {
        Self { max_distractors }
    }

    pub fn from_parameters(parameters: &Parameters) -> Result<Self, BehaviorError> {
        let max_distractors = count_param(parameters, MAX_DISTRACTORS, DEFAULT_MAX_DISTRACTORS)?;
        Ok(Self::new(max_distractors))
    }
}

pub(crate) fn build(parameters: &Parameters) -> Result<Box<dyn GeneratorBehavior>, BehaviorError> {
    Ok(Box::new(Quasi::from_parameters(parameters)?))
}

impl GeneratorBehavior for Quasi {
    fn generate<'g>(&self, graph: &'g KnowledgeGraph) -> DraftStream<'g> {
        let max_distractors = self.max_distractors;
        Box::new(
            graph
                .subjects(RDF_TYPE, TERM_IN_SENTENCE)
                .filter_map(move |fact| TermInSentence::lookup(graph, fact))
                .map(move |fact| Ok::<_, BehaviorError>(fact.into_draft(graph, max_distractors))),
        )
    }
}

struct TermInSentence<'g> {
    before: &'g str,
    term: &'g str,
    after: &'g str,
}

impl<'g> TermInSentence<'g> {
    /// Facts missing any part do not match the quasi-fact pattern
    fn lookup(graph: &'g KnowledgeGraph, fact: &'g str) -> Option<Self> {
        Some(Self {
            before: graph.value(fact, PART_BEFORE_TERM)?,
            term: graph.value(fact, TERM)?,
            after: graph.value(fact, PART_AFTER_TERM)?,
        })
    }

    fn into_draft(self, graph: &KnowledgeGraph, max_distractors: usize) -> ExerciseDraft {
        let distractors = similar_terms(graph, self.term, max_distractors);
        let (choices, correct_answer) = choice_list(graph, self.term, &distractors);
        let term_name = term_to_name(self.term);
        let term_pairs: Vec<[String; 2]> = distractors
            .iter()
            .map(|d| [term_name.clone(), term_to_name(d)])
            .collect();

        let data = MultipleChoice {
            question: format!("{} {} {}", self.before, GAP, self.after),
            choices,
            correct_answer,
        }
        .into_data();
        ExerciseDraft::new(data).with_semantics(json!({ TERM_PAIRS: term_pairs }))
    }
}

/// Terms similar to `term`, in graph order, without duplicates
fn similar_terms(graph: &KnowledgeGraph, term: &str, limit: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    graph
        .objects(term, SIMILAR_TERM)
        .chain(graph.subjects(SIMILAR_TERM, term))
        .filter(|candidate| *candidate != term)
        .filter(|candidate| seen.insert(*candidate))
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Sorted, de-duplicated choice labels and the label of the correct term
fn choice_list(graph: &KnowledgeGraph, correct: &str, distractors: &[String]) -> (Vec<String>, String) {
    let correct_label = graph.label(correct);
    let mut labels = BTreeSet::new();
    labels.insert(correct_label.clone());
    for distractor in distractors {
        labels.insert(graph.label(distractor));
    }
    (labels.into_iter().collect(), correct_label)
}

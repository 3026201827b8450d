// src/persona/mod.rs

//! Investor-animal questionnaire scoring.

mod data;

use serde::Serialize;
use serde_json::{Map, Value, json};

pub use data::{ANIMALS, ARCHETYPES, QUESTIONS};

pub const REQUIRED_ANSWERS: usize = 10;

#[derive(Debug)]
pub struct AnswerOption {
    pub text: &'static str,
    pub scores: [i64; 5],
}

#[derive(Debug)]
pub struct Question {
    pub id: u32,
    pub question: &'static str,
    pub options: &'static [AnswerOption],
}

#[derive(Debug)]
pub struct Animal {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub stats: &'static [(&'static str, i64)],
}

impl Animal {
    fn stats_json(&self) -> Value {
        let stats: Map<String, Value> = self
            .stats
            .iter()
            .map(|(label, value)| (label.to_string(), json!(value)))
            .collect();
        Value::Object(stats)
    }
}

/// Question as shown to the user, without the scores.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: u32,
    pub question: &'static str,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub text: &'static str,
}

pub fn question_views() -> Vec<QuestionView> {
    QUESTIONS
        .iter()
        .map(|q| QuestionView {
            id: q.id,
            question: q.question,
            options: q.options.iter().map(|o| OptionView { text: o.text }).collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaResult {
    pub animal: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub stats: Value,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PersonaError {
    #[error("expected 10 answers, got {0}")]
    AnswerCount(usize),
}

/// Option index chosen for an answer. Numbers and numeric strings are
/// accepted; anything else is no answer.
fn option_index(answer: &Value) -> Option<usize> {
    match answer {
        Value::Number(n) => n.as_u64().and_then(|i| usize::try_from(i).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}

/// Sums the score vectors of the chosen options.
pub fn tally(answers: &[Value]) -> [i64; 5] {
    let mut totals = [0i64; 5];
    for (question, answer) in QUESTIONS.iter().zip(answers) {
        let Some(option) = option_index(answer).and_then(|i| question.options.get(i)) else {
            continue;
        };
        for (total, score) in totals.iter_mut().zip(option.scores) {
            *total += score;
        }
    }
    totals
}

/// Maps ten answers to an archetype. Ties go to the archetype listed first.
pub fn classify(answers: &[Value]) -> Result<PersonaResult, PersonaError> {
    if answers.len() != REQUIRED_ANSWERS {
        return Err(PersonaError::AnswerCount(answers.len()));
    }

    let totals = tally(answers);
    let mut best = 0;
    for (index, total) in totals.iter().enumerate() {
        if *total > totals[best] {
            best = index;
        }
    }

    let animal = &ANIMALS[best];
    Ok(PersonaResult {
        animal: animal.key,
        name: animal.name,
        description: animal.description,
        stats: animal.stats_json(),
    })
}

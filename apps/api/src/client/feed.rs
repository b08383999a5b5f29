//! Question feed: the growing list of questions plus what has been shown.
//!
//! Rendering is append-only. `displayed_count` only moves forward unless a
//! render is explicitly reset.

use std::fmt;

use crate::client::BATCH_SIZE;
use crate::models::question::{Difficulty, Question, DEFAULT_CATEGORY, FALLBACK_TEXT};

const MISSING_TEXT: &str = "No question text available";

/// One rendered question, numbered from 1 across the whole session.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionCard {
    pub number: usize,
    pub text: String,
    pub category: String,
    pub difficulty: Difficulty,
    /// Set when the gateway handed back a diagnosed fallback.
    pub is_fallback: bool,
}

impl QuestionCard {
    fn from_question(number: usize, question: &Question) -> Self {
        let text = if question.text.trim().is_empty() {
            MISSING_TEXT.to_string()
        } else {
            question.text.clone()
        };
        let category = if question.category.trim().is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            question.category.clone()
        };
        Self {
            number,
            text,
            category,
            difficulty: question.difficulty,
            is_fallback: question.is_fallback(),
        }
    }

    pub fn difficulty_label(&self) -> String {
        self.difficulty.as_str().to_uppercase()
    }
}

impl fmt::Display for QuestionCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Q{}  [{}]", self.number, self.difficulty_label())?;
        writeln!(f, "    {}", self.text)?;
        write!(f, "    Category: {}", self.category)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedCard {
    Question(QuestionCard),
    /// Shown instead of an empty page when a generation returned nothing.
    NoQuestions,
}

impl fmt::Display for RenderedCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderedCard::Question(card) => fmt::Display::fmt(card, f),
            RenderedCard::NoQuestions => {
                writeln!(f, "{FALLBACK_TEXT}")?;
                write!(f, "    Category: {DEFAULT_CATEGORY}")
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuestionFeed {
    all: Vec<Question>,
    displayed_count: usize,
    rendered: Vec<RenderedCard>,
}

impl QuestionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole feed. Nothing is rendered until the next batch.
    pub fn replace(&mut self, questions: Vec<Question>) {
        self.all = questions;
        self.displayed_count = 0;
        self.rendered.clear();
    }

    pub fn append(&mut self, questions: Vec<Question>) {
        self.all.extend(questions);
    }

    /// Renders the next `BATCH_SIZE` questions and returns just those cards.
    /// `reset` clears rendered output and restarts numbering first; the
    /// question list itself is kept.
    pub fn render_next_batch(&mut self, reset: bool) -> Vec<QuestionCard> {
        if reset {
            self.rendered.clear();
            self.displayed_count = 0;
        }

        let start = self.displayed_count;
        let end = (start + BATCH_SIZE).min(self.all.len());
        let batch: Vec<QuestionCard> = self.all[start..end]
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionCard::from_question(start + i + 1, q))
            .collect();

        self.displayed_count = end;
        self.rendered
            .extend(batch.iter().cloned().map(RenderedCard::Question));
        batch
    }

    /// Clears output and shows the single "no questions" card.
    pub fn render_placeholder(&mut self) {
        self.rendered.clear();
        self.displayed_count = 0;
        self.rendered.push(RenderedCard::NoQuestions);
    }

    pub fn has_undisplayed(&self) -> bool {
        self.displayed_count < self.all.len()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn displayed_count(&self) -> usize {
        self.displayed_count
    }

    pub fn questions(&self) -> &[Question] {
        &self.all
    }

    pub fn rendered(&self) -> &[RenderedCard] {
        &self.rendered
    }
}

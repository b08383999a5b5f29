//! Session controller for one user's batch & pagination state machine.
//!
//! ```text
//! Idle → Extracting → Requesting → Ready ⇄ RequestingMore
//! ```
//!
//! All mutable state lives in one `SessionState` behind a mutex that is never
//! held across an await. The phase tag is the in-flight guard: an operation
//! that finds another one running fails with `ClientError::Busy` instead of
//! queueing. An `InFlight` drop guard restores the phase and re-enables the
//! controls on every exit path, including when the caller drops the future.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::client::extract::{TextExtractor, UploadedFile};
use crate::client::feed::{QuestionCard, QuestionFeed, RenderedCard};
use crate::client::gateway::QuestionSource;
use crate::client::{ClientError, GenerationQuery, DEFAULT_DIFFICULTY, MAX_RESUME_CHARS};
use crate::models::question::Question;
use crate::text::truncate_chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Extracting,
    Requesting,
    Ready,
    RequestingMore,
}

impl Phase {
    fn is_busy(self) -> bool {
        matches!(
            self,
            Phase::Extracting | Phase::Requesting | Phase::RequestingMore
        )
    }
}

/// What the "generate more" control currently says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoreLabel {
    GenerateMore,
    Generating,
    NoMoreAvailable,
    FailedToGenerate,
}

impl MoreLabel {
    pub fn text(&self) -> &'static str {
        match self {
            MoreLabel::GenerateMore => "Generate More Questions",
            MoreLabel::Generating => "Generating more questions...",
            MoreLabel::NoMoreAvailable => "No more questions available",
            MoreLabel::FailedToGenerate => "Failed to generate more",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoreAffordance {
    pub visible: bool,
    pub enabled: bool,
    pub label: MoreLabel,
}

impl Default for MoreAffordance {
    fn default() -> Self {
        Self {
            visible: false,
            enabled: true,
            label: MoreLabel::GenerateMore,
        }
    }
}

/// Form fields of a top-level generation.
#[derive(Debug, Clone, Default)]
pub struct SubmitForm {
    pub position: String,
    pub company: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// First page of the new feed.
    Batch(Vec<QuestionCard>),
    /// The gateway returned nothing; one placeholder card is shown.
    NoQuestions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoreOutcome {
    /// Next page of questions already held locally. No network call made.
    Revealed(Vec<QuestionCard>),
    /// Fresh questions fetched with the stored query, appended and shown.
    Fetched(Vec<QuestionCard>),
    /// The gateway had nothing more to give.
    Exhausted,
}

/// Point-in-time copy of everything a front end needs to draw.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub phase: Phase,
    pub file_name: Option<String>,
    pub submit_enabled: bool,
    pub more: MoreAffordance,
    pub total_questions: usize,
    pub displayed_count: usize,
    pub rendered: Vec<RenderedCard>,
}

#[derive(Debug)]
struct SessionState {
    phase: Phase,
    file: Option<UploadedFile>,
    query: Option<GenerationQuery>,
    feed: QuestionFeed,
    submit_enabled: bool,
    more: MoreAffordance,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            file: None,
            query: None,
            feed: QuestionFeed::new(),
            submit_enabled: true,
            more: MoreAffordance::default(),
        }
    }

    fn show_more(&mut self, label: MoreLabel) {
        self.more = MoreAffordance {
            visible: true,
            enabled: true,
            label,
        };
    }
}

pub struct Session {
    id: Uuid,
    source: Arc<dyn QuestionSource>,
    extractor: Arc<dyn TextExtractor>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(source: Arc<dyn QuestionSource>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            extractor,
            state: Mutex::new(SessionState::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Selects the resume for the next `submit`. Intake checks already ran
    /// when the `UploadedFile` was built.
    pub fn select_file(&self, file: UploadedFile) {
        info!(session = %self.id, "Selected {} ({} bytes)", file.name, file.bytes.len());
        self.state().file = Some(file);
    }

    pub fn clear_file(&self) {
        self.state().file = None;
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn query(&self) -> Option<GenerationQuery> {
        self.state().query.clone()
    }

    pub fn view(&self) -> SessionView {
        let state = self.state();
        SessionView {
            phase: state.phase,
            file_name: state.file.as_ref().map(|f| f.name.clone()),
            submit_enabled: state.submit_enabled,
            more: state.more,
            total_questions: state.feed.len(),
            displayed_count: state.feed.displayed_count(),
            rendered: state.feed.rendered().to_vec(),
        }
    }

    /// Top-level generation: extract, truncate, ask the gateway, replace the
    /// feed and render its first page.
    ///
    /// Fails fast with `Validation` (no side effects) when no file is
    /// selected or the position is blank. On any later failure the previous
    /// feed and query are left exactly as they were.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn submit(&self, form: &SubmitForm) -> Result<SubmitOutcome, ClientError> {
        let position = form.position.trim();
        let (file, guard) = {
            let mut state = self.state();
            let file = state.file.clone().ok_or_else(|| {
                ClientError::Validation("Please upload your resume first".to_string())
            })?;
            if position.is_empty() {
                return Err(ClientError::Validation(
                    "Please enter the target position".to_string(),
                ));
            }
            let guard = InFlight::begin(&self.state, &mut state, Phase::Extracting)?;
            state.submit_enabled = false;
            (file, guard)
        };

        let text = self.extractor.extract(&file).await?;
        let resume_text = truncate_chars(&text, MAX_RESUME_CHARS).to_string();
        if resume_text.len() < text.len() {
            info!(
                "Resume truncated to {MAX_RESUME_CHARS} of {} chars",
                text.chars().count()
            );
        }

        let difficulty = match form.difficulty.trim() {
            "" => DEFAULT_DIFFICULTY,
            d => d,
        };
        let query = GenerationQuery {
            resume_text,
            position: position.to_string(),
            company: form.company.trim().to_string(),
            difficulty: difficulty.to_string(),
        };

        self.state().phase = Phase::Requesting;
        let questions = self.source.generate(&query).await.map_err(|e| {
            warn!("Generation failed: {e}");
            e
        })?;
        let questions = real_questions(questions);

        let mut state = self.state();
        state.query = Some(query);
        state.feed.replace(questions);
        let outcome = if state.feed.is_empty() {
            state.feed.render_placeholder();
            state.more.visible = false;
            SubmitOutcome::NoQuestions
        } else {
            let batch = state.feed.render_next_batch(true);
            state.show_more(MoreLabel::GenerateMore);
            SubmitOutcome::Batch(batch)
        };
        info!("Received {} questions", state.feed.len());
        guard.commit(&mut state, Phase::Ready);
        Ok(outcome)
    }

    /// Renders the next local page and leaves the "generate more" control
    /// showing. Never touches the network.
    pub fn render_next_batch(&self, reset: bool) -> Vec<QuestionCard> {
        let mut state = self.state();
        let batch = state.feed.render_next_batch(reset);
        state.show_more(MoreLabel::GenerateMore);
        batch
    }

    /// "Generate more": reveals the next local page if one exists, otherwise
    /// re-asks the gateway with the stored query and appends the result.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn request_more(&self) -> Result<MoreOutcome, ClientError> {
        let (query, guard) = {
            let mut state = self.state();
            if state.phase.is_busy() {
                return Err(ClientError::Busy);
            }
            // Local pagination always wins over a network call.
            if state.feed.has_undisplayed() {
                let batch = state.feed.render_next_batch(false);
                state.show_more(MoreLabel::GenerateMore);
                return Ok(MoreOutcome::Revealed(batch));
            }
            let query = state.query.clone().ok_or_else(|| {
                ClientError::Validation("Generate questions before asking for more".to_string())
            })?;
            let guard = InFlight::begin(&self.state, &mut state, Phase::RequestingMore)?;
            state.more = MoreAffordance {
                visible: true,
                enabled: false,
                label: MoreLabel::Generating,
            };
            (query, guard)
        };

        let result = self.source.generate(&query).await.map(real_questions);

        let mut state = self.state();
        let outcome = match result {
            Ok(questions) if !questions.is_empty() => {
                info!("Fetched {} more questions", questions.len());
                state.feed.append(questions);
                let batch = state.feed.render_next_batch(false);
                state.show_more(MoreLabel::GenerateMore);
                Ok(MoreOutcome::Fetched(batch))
            }
            Ok(_) => {
                state.show_more(MoreLabel::NoMoreAvailable);
                Ok(MoreOutcome::Exhausted)
            }
            Err(e) => {
                warn!("Generating more failed: {e}");
                state.show_more(MoreLabel::FailedToGenerate);
                Err(e)
            }
        };
        guard.commit(&mut state, Phase::Ready);
        outcome
    }
}

/// Drops diagnosed fallback placeholders; a batch made only of them counts
/// as no questions at all.
fn real_questions(mut questions: Vec<Question>) -> Vec<Question> {
    questions.retain(|q| match &q.diagnostic {
        Some(diagnostic) => {
            warn!("Gateway returned a fallback question: {}", diagnostic.message);
            false
        }
        None => true,
    });
    questions
}

/// Marks an operation in flight. Dropping it without `commit` puts the
/// phase back; either way both controls end up enabled again.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    restore: Phase,
    committed: bool,
}

impl<'a> InFlight<'a> {
    fn begin(
        lock: &'a Mutex<SessionState>,
        state: &mut SessionState,
        phase: Phase,
    ) -> Result<Self, ClientError> {
        if state.phase.is_busy() {
            return Err(ClientError::Busy);
        }
        let restore = state.phase;
        state.phase = phase;
        Ok(Self {
            state: lock,
            restore,
            committed: false,
        })
    }

    /// Sets the final phase while the caller still holds the lock.
    fn commit(mut self, state: &mut SessionState, phase: Phase) {
        state.phase = phase;
        state.submit_enabled = true;
        state.more.enabled = true;
        self.committed = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.phase = self.restore;
        state.submit_enabled = true;
        state.more.enabled = true;
    }
}

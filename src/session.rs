//! The training state machine.
//!
//! One [`Session`] lives for the whole process. Each play-through is a
//! [`Run`] carried inside the phase that currently owns it, so leaving a
//! phase drops everything the phase held, memorize timers included.

use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::Locale;
use crate::discipline::Discipline;
use crate::error::{ConfigError, HistoryError, RecallError};
use crate::generator::ContentGenerator;
use crate::history::{HistoryEntry, HistoryStore};
use crate::scoring::{self, ResultSummary, SlotVerdict};
use crate::sequence::{standard_deck, Answer, PaletteColor, Responses, Sequence};
use crate::timer::MemorizeTimers;

pub const QUANTITY_RANGE: RangeInclusive<usize> = 1..=500;
pub const TIME_LIMIT_RANGE: RangeInclusive<u32> = 1..=3600;
pub const MAX_PACE: u32 = 600;
pub const GROUPING_RANGE: RangeInclusive<usize> = 1..=12;

/// Per-run settings. Only constructible through [`SessionConfig::new`], so a
/// value in hand is always within range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub quantity: usize,
    pub time_limit_secs: u32,
    /// Items per minute; 0 means manual navigation only.
    pub pace_items_per_minute: u32,
    pub grouping: usize,
}

impl SessionConfig {
    pub fn new(
        quantity: usize,
        time_limit_secs: u32,
        pace_items_per_minute: u32,
        grouping: usize,
    ) -> Result<Self, ConfigError> {
        if !QUANTITY_RANGE.contains(&quantity) {
            return Err(ConfigError::Quantity {
                min: *QUANTITY_RANGE.start(),
                max: *QUANTITY_RANGE.end(),
                got: quantity,
            });
        }
        if !TIME_LIMIT_RANGE.contains(&time_limit_secs) {
            return Err(ConfigError::TimeLimit {
                min: *TIME_LIMIT_RANGE.start(),
                max: *TIME_LIMIT_RANGE.end(),
                got: time_limit_secs,
            });
        }
        if pace_items_per_minute > MAX_PACE {
            return Err(ConfigError::Pace {
                max: MAX_PACE,
                got: pace_items_per_minute,
            });
        }
        if !GROUPING_RANGE.contains(&grouping) {
            return Err(ConfigError::Grouping {
                min: *GROUPING_RANGE.start(),
                max: *GROUPING_RANGE.end(),
                got: grouping,
            });
        }
        Ok(Self {
            quantity,
            time_limit_secs,
            pace_items_per_minute,
            grouping,
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quantity: 20,
            time_limit_secs: 60,
            pace_items_per_minute: 0,
            grouping: 2,
        }
    }
}

pub type RunId = u64;

/// Everything one play-through owns.
#[derive(Debug, Clone)]
pub struct Run {
    pub id: RunId,
    pub discipline: Discipline,
    pub config: SessionConfig,
    pub locale: Locale,
    pub sequence: Sequence,
    pub responses: Responses,
    pub time_remaining: u32,
}

#[derive(Debug)]
pub struct MemorizeState {
    pub run: Run,
    pub cursor: usize,
    timers: MemorizeTimers,
}

impl MemorizeState {
    /// Number of navigable positions.
    pub fn positions(&self) -> usize {
        self.run
            .discipline
            .memorize_positions(self.run.sequence.len(), self.run.config.grouping)
    }

    /// Sequence slots shown at the cursor.
    pub fn visible_slots(&self) -> Range<usize> {
        let group = self.run.discipline.effective_group(self.run.config.grouping);
        let start = self.cursor * group;
        start..(start + group).min(self.run.sequence.len())
    }

    pub fn is_paced(&self) -> bool {
        self.timers.pace_period().is_some()
    }

    fn clamp(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.positions().saturating_sub(1));
    }
}

#[derive(Debug)]
pub struct RecallState {
    pub run: Run,
    pub cursor: usize,
    /// Picker contents for disciplines recalled by choice.
    pub choices: Vec<Answer>,
    pub time_used_secs: u32,
}

impl RecallState {
    pub fn last_slot(&self) -> usize {
        self.run.sequence.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoachState {
    Idle,
    Pending,
    Ready(String),
}

#[derive(Debug)]
pub struct ResultsState {
    pub run: Run,
    pub summary: ResultSummary,
    pub verdicts: Vec<SlotVerdict>,
    pub coach: CoachState,
}

#[derive(Debug)]
pub enum Phase {
    Menu,
    History,
    Guide,
    Setup,
    Generating { run_id: RunId },
    Memorize(MemorizeState),
    Recall(RecallState),
    Results(ResultsState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PhaseKind {
    Menu,
    History,
    Guide,
    Setup,
    Generating,
    Memorize,
    Recall,
    Results,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Menu => PhaseKind::Menu,
            Phase::History => PhaseKind::History,
            Phase::Guide => PhaseKind::Guide,
            Phase::Setup => PhaseKind::Setup,
            Phase::Generating { .. } => PhaseKind::Generating,
            Phase::Memorize(_) => PhaseKind::Memorize,
            Phase::Recall(_) => PhaseKind::Recall,
            Phase::Results(_) => PhaseKind::Results,
        }
    }
}

/// Work the caller must run off the event thread, then report back through
/// [`Session::complete_generation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub run_id: RunId,
    pub discipline: Discipline,
    pub quantity: usize,
    pub locale: Locale,
}

/// Reported back through [`Session::complete_advice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceRequest {
    pub run_id: RunId,
    pub discipline: Discipline,
    pub sequence: Sequence,
    pub locale: Locale,
}

/// What a front-end needs to draw the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: PhaseKind,
    pub discipline: Discipline,
    pub time_remaining: Option<u32>,
    /// `(cursor, positions)` while memorizing.
    pub memorize: Option<(usize, usize)>,
    /// `(cursor, slots)` while recalling.
    pub recall: Option<(usize, usize)>,
    pub summary: Option<ResultSummary>,
}

pub struct Session {
    discipline: Discipline,
    config: SessionConfig,
    locale: Locale,
    phase: Phase,
    history: Box<dyn HistoryStore>,
    next_run: RunId,
    finalized: Option<RunId>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("discipline", &self.discipline)
            .field("config", &self.config)
            .field("locale", &self.locale)
            .field("phase", &self.phase.kind())
            .field("next_run", &self.next_run)
            .finish()
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Session {
    pub fn new(history: Box<dyn HistoryStore>) -> Self {
        Self {
            discipline: Discipline::Numbers,
            config: SessionConfig::default(),
            locale: Locale::default(),
            phase: Phase::Menu,
            history,
            next_run: 1,
            finalized: None,
        }
    }

    pub fn with_settings(
        mut self,
        discipline: Discipline,
        config: SessionConfig,
        locale: Locale,
    ) -> Self {
        self.discipline = discipline;
        self.config = config;
        self.locale = locale;
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn history_entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        self.history.read_all()
    }

    pub fn clear_history(&mut self) -> Result<(), HistoryError> {
        self.history.clear_all()?;
        tracing::info!("history cleared");
        Ok(())
    }

    fn transition(&mut self, next: Phase) {
        self.transition_from(self.phase.kind(), next);
    }

    fn transition_from(&mut self, from: PhaseKind, next: Phase) {
        tracing::info!(%from, to = %next.kind(), "phase change");
        self.phase = next;
    }

    pub fn open_setup(&mut self, discipline: Discipline) -> bool {
        if !matches!(self.phase, Phase::Menu | Phase::Setup) {
            return false;
        }
        self.discipline = discipline;
        self.transition(Phase::Setup);
        true
    }

    /// Settings can only change outside a run.
    pub fn configure(&mut self, config: SessionConfig) -> bool {
        if !matches!(self.phase, Phase::Menu | Phase::Setup) {
            return false;
        }
        self.config = config;
        true
    }

    pub fn set_locale(&mut self, locale: Locale) -> bool {
        if !matches!(self.phase, Phase::Menu | Phase::Setup | Phase::History | Phase::Guide) {
            return false;
        }
        self.locale = locale;
        true
    }

    pub fn open_history(&mut self) -> bool {
        if !matches!(self.phase, Phase::Menu) {
            return false;
        }
        self.transition(Phase::History);
        true
    }

    pub fn open_guide(&mut self) -> bool {
        if !matches!(self.phase, Phase::Menu) {
            return false;
        }
        self.transition(Phase::Guide);
        true
    }

    /// Returns to the menu from anywhere, discarding any run in progress.
    /// A pending generation or advice result becomes stale.
    pub fn back_to_menu(&mut self) {
        if matches!(self.phase, Phase::Menu) {
            return;
        }
        if let Phase::Generating { run_id } = self.phase {
            tracing::info!(run_id, "abandoning run before generation finished");
        }
        self.transition(Phase::Menu);
    }

    /// Setup to Generating. The caller runs the returned request.
    pub fn start(&mut self) -> Option<GenerationRequest> {
        if !matches!(self.phase, Phase::Setup) {
            return None;
        }
        let run_id = self.next_run;
        self.next_run += 1;
        self.transition(Phase::Generating { run_id });
        Some(GenerationRequest {
            run_id,
            discipline: self.discipline,
            quantity: self.config.quantity,
            locale: self.locale,
        })
    }

    /// Generating to Memorize, if `run_id` is still the run being waited on.
    pub fn complete_generation(&mut self, run_id: RunId, sequence: Sequence, now: Instant) -> bool {
        match self.phase {
            Phase::Generating { run_id: pending } if pending == run_id => {}
            _ => {
                tracing::debug!(
                    run_id,
                    phase = %self.phase.kind(),
                    "dropping stale generation result"
                );
                return false;
            }
        }
        if sequence.discipline() != self.discipline || sequence.len() != self.config.quantity {
            tracing::warn!(
                run_id,
                expected = self.config.quantity,
                got = sequence.len(),
                "generation result does not match settings, back to setup"
            );
            self.transition(Phase::Setup);
            return false;
        }
        let responses = Responses::unanswered(&sequence);
        let run = Run {
            id: run_id,
            discipline: self.discipline,
            config: self.config,
            locale: self.locale,
            sequence,
            responses,
            time_remaining: self.config.time_limit_secs,
        };
        let timers = MemorizeTimers::start(run.discipline, &run.config, now);
        self.transition(Phase::Memorize(MemorizeState {
            run,
            cursor: 0,
            timers,
        }));
        true
    }

    /// Starts and generates in one step, on the calling thread.
    pub fn start_with<R: Rng + ?Sized>(
        &mut self,
        generator: &ContentGenerator,
        rng: &mut R,
        now: Instant,
    ) -> bool {
        let Some(req) = self.start() else {
            return false;
        };
        let sequence = generator.generate(req.discipline, req.quantity, req.locale, rng);
        self.complete_generation(req.run_id, sequence, now)
    }

    /// Drives the memorize timers. Outside Memorize there are no timers and
    /// this does nothing.
    pub fn on_tick(&mut self, now: Instant) {
        let Phase::Memorize(state) = &mut self.phase else {
            return;
        };
        let fires = state.timers.poll(now);
        if fires.pace > 0 {
            state.clamp(state.cursor + fires.pace as usize);
        }
        if fires.seconds > 0 {
            state.run.time_remaining = state.run.time_remaining.saturating_sub(fires.seconds);
            if state.run.time_remaining == 0 {
                tracing::info!(run_id = state.run.id, "time is up");
                self.enter_recall();
            }
        }
    }

    fn memorize_mut(&mut self) -> Option<&mut MemorizeState> {
        match &mut self.phase {
            Phase::Memorize(state) => Some(state),
            _ => None,
        }
    }

    pub fn memorize_next(&mut self) {
        if let Some(state) = self.memorize_mut() {
            state.clamp(state.cursor + 1);
        }
    }

    pub fn memorize_prev(&mut self) {
        if let Some(state) = self.memorize_mut() {
            state.cursor = state.cursor.saturating_sub(1);
        }
    }

    pub fn memorize_goto(&mut self, position: usize) {
        if let Some(state) = self.memorize_mut() {
            state.clamp(position);
        }
    }

    pub fn finish_memorizing(&mut self) {
        if matches!(self.phase, Phase::Memorize(_)) {
            self.enter_recall();
        }
    }

    fn enter_recall(&mut self) {
        let from = self.phase.kind();
        let phase = std::mem::replace(&mut self.phase, Phase::Menu);
        let next = match phase {
            Phase::Memorize(MemorizeState { mut run, .. }) => {
                run.responses = Responses::unanswered(&run.sequence);
                let time_used_secs = run.config.time_limit_secs - run.time_remaining;
                let choices = recall_choices(&run.sequence, &mut rand::thread_rng());
                Phase::Recall(RecallState {
                    run,
                    cursor: 0,
                    choices,
                    time_used_secs,
                })
            }
            other => other,
        };
        self.transition_from(from, next);
    }

    fn recall_mut(&mut self) -> Result<&mut RecallState, RecallError> {
        match &mut self.phase {
            Phase::Recall(state) => Ok(state),
            _ => Err(RecallError::NotRecalling),
        }
    }

    /// Records a picked or typed answer at the cursor. A first answer moves
    /// to the next slot; overwriting keeps the cursor in place. The last
    /// slot never finishes recall on its own.
    pub fn answer(&mut self, answer: Answer) -> Result<(), RecallError> {
        let state = self.recall_mut()?;
        let was_answered = state.run.responses.record(state.cursor, answer)?;
        if !was_answered && state.cursor < state.last_slot() {
            state.cursor += 1;
        }
        Ok(())
    }

    /// Replaces the text of the current typed slot without moving.
    pub fn set_text(&mut self, text: &str) -> Result<(), RecallError> {
        let state = self.recall_mut()?;
        state
            .run
            .responses
            .record(state.cursor, Answer::Text(text.to_string()))?;
        Ok(())
    }

    /// Commits the current typed slot, same as [`Session::recall_next`].
    pub fn submit(&mut self) -> Result<(), RecallError> {
        self.recall_mut()?;
        self.recall_next();
        Ok(())
    }

    pub fn clear_answer(&mut self) -> Result<(), RecallError> {
        let state = self.recall_mut()?;
        state.run.responses.clear(state.cursor)
    }

    /// Typed input. Buffered disciplines append to the shared buffer; typed
    /// slots append to the current entry.
    pub fn type_char(&mut self, c: char) -> bool {
        let Ok(state) = self.recall_mut() else {
            return false;
        };
        if state.run.discipline.is_buffered() {
            let accepted = state.run.responses.type_char(c);
            if accepted {
                state.cursor = buffer_cursor(state);
            }
            return accepted;
        }
        if !state.run.discipline.is_typed_per_slot() {
            return false;
        }
        let mut text = state.run.responses.text(state.cursor).unwrap_or_default().to_string();
        text.push(c);
        state
            .run
            .responses
            .record(state.cursor, Answer::Text(text))
            .is_ok()
    }

    pub fn backspace(&mut self) -> bool {
        let Ok(state) = self.recall_mut() else {
            return false;
        };
        if state.run.discipline.is_buffered() {
            let removed = state.run.responses.backspace();
            state.cursor = buffer_cursor(state);
            return removed;
        }
        let Some(mut text) = state.run.responses.text(state.cursor).map(str::to_string) else {
            return false;
        };
        if text.pop().is_none() {
            return false;
        }
        state
            .run
            .responses
            .record(state.cursor, Answer::Text(text))
            .is_ok()
    }

    /// Moves to the next slot; past the last slot, or for a buffered
    /// recall, finishes.
    pub fn recall_next(&mut self) {
        let Ok(state) = self.recall_mut() else {
            return;
        };
        if state.run.discipline.is_buffered() || state.cursor >= state.last_slot() {
            self.enter_results();
        } else {
            state.cursor += 1;
        }
    }

    pub fn recall_prev(&mut self) {
        if let Ok(state) = self.recall_mut() {
            state.cursor = state.cursor.saturating_sub(1);
        }
    }

    pub fn recall_goto(&mut self, slot: usize) {
        if let Ok(state) = self.recall_mut() {
            if !state.run.discipline.is_buffered() {
                state.cursor = slot.min(state.last_slot());
            }
        }
    }

    /// Ends recall now; remaining slots stay unanswered.
    pub fn finish_all(&mut self) {
        if matches!(self.phase, Phase::Recall(_)) {
            self.enter_results();
        }
    }

    fn enter_results(&mut self) {
        let from = self.phase.kind();
        let phase = std::mem::replace(&mut self.phase, Phase::Menu);
        let next = match phase {
            Phase::Recall(RecallState {
                run, time_used_secs, ..
            }) => {
                let summary = scoring::score(&run.sequence, &run.responses, time_used_secs);
                let verdicts = scoring::verdicts(&run.sequence, &run.responses);
                self.finalize(&run, &summary);
                Phase::Results(ResultsState {
                    run,
                    summary,
                    verdicts,
                    coach: CoachState::Idle,
                })
            }
            other => other,
        };
        self.transition_from(from, next);
    }

    /// Appends the run to history at most once.
    fn finalize(&mut self, run: &Run, summary: &ResultSummary) {
        if self.finalized == Some(run.id) {
            tracing::debug!(run_id = run.id, "run already recorded");
            return;
        }
        self.finalized = Some(run.id);
        let timestamp = now_millis();
        let entry = HistoryEntry::new(
            format!("{timestamp}-{}", run.id),
            timestamp,
            run.discipline,
            summary,
        );
        tracing::info!(
            run_id = run.id,
            discipline = %run.discipline,
            score = summary.score,
            total = summary.total,
            accuracy = summary.accuracy,
            "run finished"
        );
        if let Err(err) = self.history.append(entry) {
            tracing::warn!(%err, run_id = run.id, "could not record run");
        }
    }

    /// Results to Setup with the same discipline and settings.
    pub fn play_again(&mut self) -> bool {
        if !matches!(self.phase, Phase::Results(_)) {
            return false;
        }
        self.transition(Phase::Setup);
        true
    }

    /// Marks coaching as pending. Only one request per run.
    pub fn request_advice(&mut self) -> Option<AdviceRequest> {
        let Phase::Results(state) = &mut self.phase else {
            return None;
        };
        if state.coach != CoachState::Idle {
            return None;
        }
        state.coach = CoachState::Pending;
        Some(AdviceRequest {
            run_id: state.run.id,
            discipline: state.run.discipline,
            sequence: state.run.sequence.clone(),
            locale: state.run.locale,
        })
    }

    pub fn complete_advice(&mut self, run_id: RunId, text: String) -> bool {
        match &mut self.phase {
            Phase::Results(state)
                if state.run.id == run_id && state.coach == CoachState::Pending =>
            {
                state.coach = CoachState::Ready(text);
                true
            }
            _ => {
                tracing::debug!(run_id, phase = %self.phase.kind(), "dropping stale advice");
                false
            }
        }
    }

    pub fn view(&self) -> SessionView {
        let mut view = SessionView {
            phase: self.phase.kind(),
            discipline: self.discipline,
            time_remaining: None,
            memorize: None,
            recall: None,
            summary: None,
        };
        match &self.phase {
            Phase::Memorize(state) => {
                view.time_remaining = Some(state.run.time_remaining);
                view.memorize = Some((state.cursor, state.positions()));
            }
            Phase::Recall(state) => {
                view.recall = Some((state.cursor, state.run.sequence.len()));
            }
            Phase::Results(state) => view.summary = Some(state.summary),
            _ => {}
        }
        view
    }
}

fn buffer_cursor(state: &RecallState) -> usize {
    let typed = state.run.responses.buffer().map_or(0, |b| b.chars().count());
    typed.min(state.last_slot())
}

fn recall_choices<R: Rng + ?Sized>(sequence: &Sequence, rng: &mut R) -> Vec<Answer> {
    match sequence {
        Sequence::Cards(_) => standard_deck().into_iter().map(Answer::Card).collect(),
        Sequence::Images(images) => {
            let mut shuffled = images.clone();
            shuffled.shuffle(rng);
            shuffled.into_iter().map(Answer::Image).collect()
        }
        Sequence::Colors(_) => PaletteColor::ALL.into_iter().map(Answer::Color).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryStore;
    use crate::sequence::{Card, Rank, Suit};
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Store handle the test keeps a clone of, to inspect appends.
    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<HistoryEntry>>>);

    impl HistoryStore for Shared {
        fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
            self.0.borrow_mut().push(entry);
            Ok(())
        }
        fn read_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
            Ok(self.0.borrow().clone())
        }
        fn clear_all(&mut self) -> Result<(), HistoryError> {
            self.0.borrow_mut().clear();
            Ok(())
        }
    }

    fn config(quantity: usize, time: u32, pace: u32, grouping: usize) -> SessionConfig {
        SessionConfig::new(quantity, time, pace, grouping).unwrap()
    }

    fn session_at_memorize(
        sequence: Sequence,
        config: SessionConfig,
        t0: Instant,
    ) -> (Session, Shared) {
        let store = Shared::default();
        let mut session = Session::new(Box::new(store.clone()));
        assert!(session.configure(config));
        assert!(session.open_setup(sequence.discipline()));
        let req = session.start().unwrap();
        assert!(session.complete_generation(req.run_id, sequence, t0));
        (session, store)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn config_bounds_are_enforced() {
        assert_matches!(SessionConfig::new(0, 60, 0, 1), Err(ConfigError::Quantity { .. }));
        assert_matches!(SessionConfig::new(501, 60, 0, 1), Err(ConfigError::Quantity { .. }));
        assert_matches!(SessionConfig::new(5, 0, 0, 1), Err(ConfigError::TimeLimit { .. }));
        assert_matches!(SessionConfig::new(5, 60, 601, 1), Err(ConfigError::Pace { .. }));
        assert_matches!(SessionConfig::new(5, 60, 0, 0), Err(ConfigError::Grouping { .. }));
        assert!(SessionConfig::new(500, 3600, 600, 12).is_ok());
    }

    #[test]
    fn countdown_to_zero_enters_recall_exactly_once() {
        let t0 = Instant::now();
        let (mut session, _) =
            session_at_memorize(Sequence::Numbers("12345".into()), config(5, 3, 0, 1), t0);
        session.on_tick(t0 + secs(1));
        session.on_tick(t0 + secs(2));
        assert_eq!(session.view().time_remaining, Some(1));
        session.on_tick(t0 + secs(3));
        assert_matches!(session.phase(), Phase::Recall(r) if r.time_used_secs == 3);

        session.type_char('1');
        session.on_tick(t0 + secs(10));
        assert_matches!(session.phase(), Phase::Recall(r) if r.run.responses.buffer() == Some("1"));
    }

    #[test]
    fn late_tick_still_transitions_once() {
        let t0 = Instant::now();
        let (mut session, _) = session_at_memorize(
            Sequence::Colors(vec![PaletteColor::Red; 3]),
            config(3, 2, 0, 1),
            t0,
        );
        session.on_tick(t0 + secs(30));
        assert_eq!(session.phase_kind(), PhaseKind::Recall);
    }

    #[test]
    fn pace_advances_and_clamps() {
        let t0 = Instant::now();
        let words: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let (mut session, _) =
            session_at_memorize(Sequence::Words(words), config(3, 60, 60, 1), t0);
        session.on_tick(t0 + secs(1));
        assert_eq!(session.view().memorize, Some((1, 3)));
        session.on_tick(t0 + secs(5));
        assert_eq!(session.view().memorize, Some((2, 3)));
        assert_eq!(session.phase_kind(), PhaseKind::Memorize);
    }

    #[test]
    fn manual_pace_never_moves_and_navigation_clamps() {
        let t0 = Instant::now();
        let (mut session, _) = session_at_memorize(
            Sequence::Numbers("01234567890123456789".into()),
            config(20, 600, 0, 3),
            t0,
        );
        session.on_tick(t0 + secs(100));
        assert_eq!(session.view().memorize, Some((0, 7)));
        session.memorize_prev();
        assert_eq!(session.view().memorize, Some((0, 7)));
        for _ in 0..20 {
            session.memorize_next();
        }
        assert_eq!(session.view().memorize, Some((6, 7)));
        session.memorize_goto(2);
        let Phase::Memorize(state) = session.phase() else {
            panic!("expected memorize");
        };
        assert_eq!(state.visible_slots(), 6..9);
        session.memorize_goto(99);
        assert_eq!(session.view().memorize, Some((6, 7)));
    }

    #[test]
    fn finish_memorizing_prepares_card_picker() {
        let t0 = Instant::now();
        let seq = Sequence::Cards(vec![
            Card::new(Rank::Ace, Suit::Spades),
            Card::new(Rank::Two, Suit::Hearts),
            Card::new(Rank::King, Suit::Clubs),
        ]);
        let (mut session, store) = session_at_memorize(seq, config(3, 60, 0, 1), t0);
        session.on_tick(t0 + secs(20));
        session.finish_memorizing();
        let Phase::Recall(state) = session.phase() else {
            panic!("expected recall");
        };
        assert_eq!(state.time_used_secs, 20);
        assert_eq!(state.choices.len(), 52);

        session.answer(Answer::Card(Card::new(Rank::Ace, Suit::Spades))).unwrap();
        session.answer(Answer::Card(Card::new(Rank::Three, Suit::Hearts))).unwrap();
        session.answer(Answer::Card(Card::new(Rank::King, Suit::Clubs))).unwrap();
        // answering the last slot stays in recall
        assert_eq!(session.view().recall, Some((2, 3)));
        session.recall_next();

        let summary = session.view().summary.unwrap();
        assert_eq!((summary.score, summary.mistakes), (2, 1));
        assert_eq!(store.0.borrow().len(), 1);
    }

    #[test]
    fn overwrite_keeps_cursor() {
        let t0 = Instant::now();
        let (mut session, _) = session_at_memorize(
            Sequence::Colors(vec![PaletteColor::Red; 3]),
            config(3, 60, 0, 1),
            t0,
        );
        session.finish_memorizing();
        session.answer(Answer::Color(PaletteColor::Red)).unwrap();
        assert_eq!(session.view().recall, Some((1, 3)));
        session.recall_prev();
        session.answer(Answer::Color(PaletteColor::Blue)).unwrap();
        assert_eq!(session.view().recall, Some((0, 3)));
        session.clear_answer().unwrap();
        session.answer(Answer::Color(PaletteColor::Red)).unwrap();
        assert_eq!(session.view().recall, Some((1, 3)));
        assert_eq!(
            session.answer(Answer::Text("red".into())),
            Err(RecallError::WrongAnswerKind {
                discipline: Discipline::Colors,
                answer: "text"
            })
        );
    }

    #[test]
    fn typed_slots_edit_in_place_and_submit_advances() {
        let t0 = Instant::now();
        let words: Vec<String> = vec!["Moon".into(), "Kite".into()];
        let (mut session, _) = session_at_memorize(Sequence::Words(words), config(2, 60, 0, 1), t0);
        session.finish_memorizing();
        for c in "moob".chars() {
            session.type_char(c);
        }
        session.backspace();
        session.type_char('n');
        assert_eq!(session.view().recall, Some((0, 2)));
        session.submit().unwrap();
        session.set_text(" kite ").unwrap();
        session.submit().unwrap();
        let summary = session.view().summary.unwrap();
        assert_eq!(summary.score, 2);
    }

    #[test]
    fn buffered_recall_filters_and_submits_as_a_whole() {
        let t0 = Instant::now();
        let (mut session, _) =
            session_at_memorize(Sequence::Numbers("13579".into()), config(5, 60, 0, 2), t0);
        session.finish_memorizing();
        for c in "13a56-9".chars() {
            session.type_char(c);
        }
        assert_eq!(session.view().recall, Some((4, 5)));
        assert_matches!(
            session.answer(Answer::Text("1".into())),
            Err(RecallError::BufferOnly(Discipline::Numbers))
        );
        session.recall_next();
        assert_matches!(
            session.view().summary,
            Some(ResultSummary { score: 4, mistakes: 1, accuracy: 80, .. })
        );
    }

    #[test]
    fn finalize_twice_appends_one_entry() {
        let t0 = Instant::now();
        let (mut session, store) =
            session_at_memorize(Sequence::Binaries("0101".into()), config(4, 60, 0, 2), t0);
        session.finish_memorizing();
        session.finish_all();
        let (run, summary) = match session.phase() {
            Phase::Results(r) => (r.run.clone(), r.summary),
            _ => panic!("expected results"),
        };
        session.finalize(&run, &summary);
        session.finish_all();
        assert_eq!(store.0.borrow().len(), 1);
        assert!(store.0.borrow()[0].id.ends_with(&format!("-{}", run.id)));
    }

    #[test]
    fn stale_generation_after_abandon_is_ignored() {
        let mut session = Session::new(Box::new(MemoryHistoryStore::new()));
        session.configure(config(2, 60, 0, 1));
        session.open_setup(Discipline::Binaries);
        let stale = session.start().unwrap();
        session.back_to_menu();
        session.open_setup(Discipline::Binaries);
        let fresh = session.start().unwrap();
        assert_ne!(stale.run_id, fresh.run_id);

        let now = Instant::now();
        assert!(!session.complete_generation(stale.run_id, Sequence::Binaries("01".into()), now));
        assert_eq!(session.phase_kind(), PhaseKind::Generating);
        assert!(session.complete_generation(fresh.run_id, Sequence::Binaries("10".into()), now));
        assert_eq!(session.phase_kind(), PhaseKind::Memorize);
    }

    #[test]
    fn mismatched_generation_returns_to_setup() {
        let mut session = Session::new(Box::new(MemoryHistoryStore::new()));
        session.configure(config(4, 60, 0, 1));
        session.open_setup(Discipline::Numbers);
        let req = session.start().unwrap();

        let short = Sequence::Numbers("12".into());
        assert!(!session.complete_generation(req.run_id, short, Instant::now()));
        assert_eq!(session.phase_kind(), PhaseKind::Setup);

        let retry = session.start().unwrap();
        assert_ne!(retry.run_id, req.run_id);
        let colors = Sequence::Colors(vec![PaletteColor::Red; 4]);
        assert!(!session.complete_generation(retry.run_id, colors, Instant::now()));
        assert_eq!(session.phase_kind(), PhaseKind::Setup);
    }

    #[test]
    fn abandoning_memorize_drops_timers() {
        let t0 = Instant::now();
        let (mut session, store) =
            session_at_memorize(Sequence::Numbers("12".into()), config(2, 1, 60, 1), t0);
        session.back_to_menu();
        session.on_tick(t0 + secs(5));
        assert_eq!(session.phase_kind(), PhaseKind::Menu);
        assert!(store.0.borrow().is_empty());
    }

    #[test]
    fn advice_is_guarded_by_run_id() {
        let t0 = Instant::now();
        let (mut session, _) =
            session_at_memorize(Sequence::Numbers("12".into()), config(2, 60, 0, 1), t0);
        session.finish_memorizing();
        session.finish_all();
        let req = session.request_advice().unwrap();
        assert!(session.request_advice().is_none());
        assert!(!session.complete_advice(req.run_id + 1, "nope".into()));
        assert!(session.complete_advice(req.run_id, "link them".into()));
        assert_matches!(
            session.phase(),
            Phase::Results(r) if r.coach == CoachState::Ready("link them".into())
        );

        assert!(session.play_again());
        assert_eq!(session.phase_kind(), PhaseKind::Setup);
        assert_eq!(session.discipline(), Discipline::Numbers);
        assert!(!session.complete_advice(req.run_id, "late".into()));
    }

    #[test]
    fn side_states_only_from_menu() {
        let mut session = Session::new(Box::new(MemoryHistoryStore::new()));
        assert!(session.open_history());
        assert!(!session.open_guide());
        session.back_to_menu();
        assert!(session.open_guide());
        assert!(session.set_locale(Locale::Uk));
        assert_eq!(session.locale(), Locale::Uk);
        session.back_to_menu();
        assert!(session.start().is_none());
    }

    #[test]
    fn start_with_generates_synchronously() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut session = Session::new(Box::new(MemoryHistoryStore::new()))
            .with_settings(Discipline::Images, config(6, 30, 0, 1), Locale::En);
        session.open_setup(Discipline::Images);
        let generator = ContentGenerator::bundled();
        assert!(session.start_with(&generator, &mut StdRng::seed_from_u64(3), Instant::now()));
        session.finish_memorizing();
        let Phase::Recall(state) = session.phase() else {
            panic!("expected recall");
        };
        assert_eq!(state.choices.len(), 6);
    }
}

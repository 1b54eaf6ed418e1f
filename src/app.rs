//! Key handling and screen-local state on top of the session controller.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::{Config, ConfigStore};
use crate::discipline::Discipline;
use crate::history::{self, DisciplineSummary, HistoryEntry};
use crate::runtime::DrillEvent;
use crate::session::{
    AdviceRequest, GenerationRequest, Phase, PhaseKind, Session, SessionConfig, GROUPING_RANGE,
    MAX_PACE, QUANTITY_RANGE, TIME_LIMIT_RANGE,
};

/// Work the event loop has to hand off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate(GenerationRequest),
    Advise(AdviceRequest),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Drill(Discipline),
    History,
    Guide,
}

pub fn menu_items() -> Vec<MenuItem> {
    Discipline::ALL
        .iter()
        .map(|&d| MenuItem::Drill(d))
        .chain([MenuItem::History, MenuItem::Guide])
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SetupField {
    Quantity,
    #[strum(to_string = "Time limit")]
    TimeLimit,
    Pace,
    Grouping,
}

impl SetupField {
    pub fn fields_for(discipline: Discipline) -> &'static [SetupField] {
        if discipline.is_buffered() {
            &[
                SetupField::Quantity,
                SetupField::TimeLimit,
                SetupField::Pace,
                SetupField::Grouping,
            ]
        } else {
            &[SetupField::Quantity, SetupField::TimeLimit, SetupField::Pace]
        }
    }
}

/// Editable copy of the settings shown on the setup screen.
#[derive(Debug, Clone)]
pub struct SetupForm {
    pub values: SessionConfig,
    pub field: usize,
}

impl SetupForm {
    pub fn new(values: SessionConfig) -> Self {
        Self { values, field: 0 }
    }

    fn adjust(&mut self, discipline: Discipline, delta: i64) {
        let fields = SetupField::fields_for(discipline);
        let Some(field) = fields.get(self.field.min(fields.len() - 1)) else {
            return;
        };
        let v = &mut self.values;
        match field {
            SetupField::Quantity => {
                v.quantity = step_usize(
                    v.quantity,
                    delta,
                    *QUANTITY_RANGE.start(),
                    *QUANTITY_RANGE.end(),
                )
            }
            SetupField::TimeLimit => {
                v.time_limit_secs = step_u32(
                    v.time_limit_secs,
                    delta * 5,
                    *TIME_LIMIT_RANGE.start(),
                    *TIME_LIMIT_RANGE.end(),
                )
            }
            SetupField::Pace => {
                v.pace_items_per_minute = step_u32(v.pace_items_per_minute, delta * 5, 0, MAX_PACE)
            }
            SetupField::Grouping => {
                v.grouping = step_usize(
                    v.grouping,
                    delta,
                    *GROUPING_RANGE.start(),
                    *GROUPING_RANGE.end(),
                )
            }
        }
    }
}

fn step_usize(value: usize, delta: i64, min: usize, max: usize) -> usize {
    (value as i64 + delta).clamp(min as i64, max as i64) as usize
}

fn step_u32(value: u32, delta: i64, min: u32, max: u32) -> u32 {
    (i64::from(value) + delta).clamp(i64::from(min), i64::from(max)) as u32
}

#[derive(Debug, Default)]
pub struct HistoryView {
    pub entries: Vec<HistoryEntry>,
    pub summary: Vec<DisciplineSummary>,
    pub scroll: usize,
    pub confirm_clear: bool,
}

pub struct App {
    pub session: Session,
    pub config: Config,
    store: Box<dyn ConfigStore>,
    pub menu_cursor: usize,
    pub setup: SetupForm,
    pub picker_cursor: usize,
    pub results_scroll: usize,
    pub guide_scroll: u16,
    pub history: HistoryView,
    pub notice: Option<String>,
}

impl App {
    pub fn new(session: Session, config: Config, store: Box<dyn ConfigStore>) -> Self {
        let menu_cursor = Discipline::ALL
            .iter()
            .position(|&d| d == session.discipline())
            .unwrap_or(0);
        let setup = SetupForm::new(*session.config());
        Self {
            session,
            config,
            store,
            menu_cursor,
            setup,
            picker_cursor: 0,
            results_scroll: 0,
            guide_scroll: 0,
            history: HistoryView::default(),
            notice: None,
        }
    }

    pub fn on_event(&mut self, event: DrillEvent, now: Instant) -> Option<Command> {
        let before = self.session.phase_kind();
        // Deadlines are checked on every event so steady input cannot starve the countdown.
        self.session.on_tick(now);
        let expired = self.session.phase_kind() != before;
        let command = match event {
            DrillEvent::Tick | DrillEvent::Resize => None,
            // A key aimed at a phase the deadline just closed is dropped.
            DrillEvent::Key(_) if expired => None,
            DrillEvent::Generated { run_id, sequence } => {
                self.session.complete_generation(run_id, sequence, now);
                None
            }
            DrillEvent::Advice { run_id, text } => {
                self.session.complete_advice(run_id, text);
                None
            }
            DrillEvent::Key(key) => self.on_key(key),
        };
        if self.session.phase_kind() != before {
            self.picker_cursor = 0;
            self.results_scroll = 0;
            self.guide_scroll = 0;
        }
        command
    }

    fn on_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }
        self.notice = None;
        match self.session.phase_kind() {
            PhaseKind::Menu => self.on_menu_key(key),
            PhaseKind::History => {
                self.on_history_key(key);
                None
            }
            PhaseKind::Guide => {
                match key.code {
                    KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('q') => {
                        self.session.back_to_menu()
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        self.guide_scroll = self.guide_scroll.saturating_sub(1)
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        self.guide_scroll = self.guide_scroll.saturating_add(1)
                    }
                    _ => {}
                }
                None
            }
            PhaseKind::Setup => self.on_setup_key(key),
            PhaseKind::Generating => {
                if key.code == KeyCode::Esc {
                    self.session.back_to_menu();
                }
                None
            }
            PhaseKind::Memorize => {
                self.on_memorize_key(key);
                None
            }
            PhaseKind::Recall => {
                self.on_recall_key(key);
                None
            }
            PhaseKind::Results => self.on_results_key(key),
        }
    }

    fn on_menu_key(&mut self, key: KeyEvent) -> Option<Command> {
        let items = menu_items();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Some(Command::Quit),
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_cursor = self.menu_cursor.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_cursor = (self.menu_cursor + 1).min(items.len() - 1)
            }
            KeyCode::Char('l') => {
                let locale = self.session.locale().toggled();
                self.session.set_locale(locale);
                self.config.locale = locale;
                self.save_config();
            }
            KeyCode::Char('h') => self.open_history(),
            KeyCode::Char('g') => {
                self.session.open_guide();
            }
            KeyCode::Enter => match items.get(self.menu_cursor) {
                Some(MenuItem::Drill(discipline)) => {
                    self.session.open_setup(*discipline);
                    self.setup = SetupForm::new(*self.session.config());
                }
                Some(MenuItem::History) => self.open_history(),
                Some(MenuItem::Guide) => {
                    self.session.open_guide();
                }
                None => {}
            },
            _ => {}
        }
        None
    }

    fn open_history(&mut self) {
        if self.session.open_history() {
            self.refresh_history();
        }
    }

    fn refresh_history(&mut self) {
        let entries = match self.session.history_entries() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(%err, "could not read history");
                self.notice = Some(format!("could not read history: {err}"));
                Vec::new()
            }
        };
        self.history = HistoryView {
            summary: history::summarize(&entries),
            entries: history::newest_first(&entries),
            scroll: 0,
            confirm_clear: false,
        };
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        if self.history.confirm_clear {
            self.history.confirm_clear = false;
            if key.code == KeyCode::Char('y') {
                match self.session.clear_history() {
                    Ok(()) => self.refresh_history(),
                    Err(err) => self.notice = Some(format!("could not clear history: {err}")),
                }
            }
            return;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('q') => self.session.back_to_menu(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.history.scroll = self.history.scroll.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.history.scroll =
                    (self.history.scroll + 1).min(self.history.entries.len().saturating_sub(1))
            }
            KeyCode::Char('x') if !self.history.entries.is_empty() => {
                self.history.confirm_clear = true
            }
            _ => {}
        }
    }

    fn on_setup_key(&mut self, key: KeyEvent) -> Option<Command> {
        let discipline = self.session.discipline();
        let field_count = SetupField::fields_for(discipline).len();
        match key.code {
            KeyCode::Esc => self.session.back_to_menu(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.setup.field = self.setup.field.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.setup.field = (self.setup.field + 1).min(field_count - 1)
            }
            KeyCode::Left | KeyCode::Char('h') => self.setup.adjust(discipline, -1),
            KeyCode::Right | KeyCode::Char('l') => self.setup.adjust(discipline, 1),
            KeyCode::PageDown => self.setup.adjust(discipline, -10),
            KeyCode::PageUp => self.setup.adjust(discipline, 10),
            KeyCode::Enter => return self.start_run(),
            _ => {}
        }
        None
    }

    fn start_run(&mut self) -> Option<Command> {
        let v = self.setup.values;
        let settings = match SessionConfig::new(
            v.quantity,
            v.time_limit_secs,
            v.pace_items_per_minute,
            v.grouping,
        ) {
            Ok(settings) => settings,
            Err(err) => {
                self.notice = Some(err.to_string());
                return None;
            }
        };
        self.session.configure(settings);
        self.config
            .remember(self.session.discipline(), &settings, self.session.locale());
        self.save_config();
        self.session.start().map(Command::Generate)
    }

    fn save_config(&self) {
        if let Err(err) = self.store.save(&self.config) {
            tracing::warn!(%err, "could not save preferences");
        }
    }

    fn on_memorize_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.session.back_to_menu(),
            KeyCode::Left | KeyCode::Char('h') => self.session.memorize_prev(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
                self.session.memorize_next()
            }
            KeyCode::Home => self.session.memorize_goto(0),
            KeyCode::End => self.session.memorize_goto(usize::MAX),
            KeyCode::Enter => self.session.finish_memorizing(),
            _ => {}
        }
    }

    fn on_recall_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.session.back_to_menu();
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('f') {
            self.session.finish_all();
            return;
        }
        let discipline = self.session.discipline();
        if discipline.is_picked() {
            self.on_picker_key(key);
            return;
        }
        let outcome = match key.code {
            KeyCode::Char(c) => {
                self.session.type_char(c);
                Ok(())
            }
            KeyCode::Backspace => {
                self.session.backspace();
                Ok(())
            }
            KeyCode::Enter if discipline.is_typed_per_slot() => self.session.submit(),
            KeyCode::Enter => {
                self.session.recall_next();
                Ok(())
            }
            KeyCode::Down | KeyCode::Tab => {
                self.session.recall_next();
                Ok(())
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.session.recall_prev();
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(err) = outcome {
            self.notice = Some(err.to_string());
        }
    }

    fn on_picker_key(&mut self, key: KeyEvent) {
        let Phase::Recall(state) = self.session.phase() else {
            return;
        };
        let choices = state.choices.len();
        let row = picker_row_width(self.session.discipline());
        let outcome = match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.picker_cursor = self.picker_cursor.saturating_sub(1);
                Ok(())
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.picker_cursor = (self.picker_cursor + 1).min(choices.saturating_sub(1));
                Ok(())
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.picker_cursor = self.picker_cursor.saturating_sub(row);
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.picker_cursor = (self.picker_cursor + row).min(choices.saturating_sub(1));
                Ok(())
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                match state.choices.get(self.picker_cursor).cloned() {
                    Some(answer) => self.session.answer(answer),
                    None => Ok(()),
                }
            }
            KeyCode::Backspace | KeyCode::Delete => self.session.clear_answer(),
            KeyCode::Tab | KeyCode::Char('n') => {
                self.session.recall_next();
                Ok(())
            }
            KeyCode::BackTab | KeyCode::Char('p') => {
                self.session.recall_prev();
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(err) = outcome {
            self.notice = Some(err.to_string());
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('m') => self.session.back_to_menu(),
            KeyCode::Char('r') => {
                self.session.play_again();
                self.setup = SetupForm::new(*self.session.config());
            }
            KeyCode::Char('c') => return self.session.request_advice().map(Command::Advise),
            KeyCode::Up | KeyCode::Char('k') => {
                self.results_scroll = self.results_scroll.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => self.results_scroll += 1,
            _ => {}
        }
        None
    }
}

/// Picker items per row on screen.
pub fn picker_row_width(discipline: Discipline) -> usize {
    match discipline {
        Discipline::Cards => 13,
        Discipline::Colors => 5,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Locale, MemoryConfigStore};
    use crate::generator::ContentGenerator;
    use crate::history::MemoryHistoryStore;
    use crate::sequence::Sequence;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn key(code: KeyCode) -> DrillEvent {
        DrillEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app() -> App {
        let session = Session::new(Box::new(MemoryHistoryStore::new()));
        App::new(session, Config::default(), Box::new(MemoryConfigStore::default()))
    }

    /// Runs a generation request inline and feeds the result back.
    fn generate_inline(app: &mut App, command: Option<Command>, now: Instant) {
        let Some(Command::Generate(req)) = command else {
            panic!("expected a generation request, got {command:?}");
        };
        let sequence = ContentGenerator::bundled().generate(
            req.discipline,
            req.quantity,
            req.locale,
            &mut StdRng::seed_from_u64(11),
        );
        app.on_event(
            DrillEvent::Generated {
                run_id: req.run_id,
                sequence,
            },
            now,
        );
    }

    #[test]
    fn menu_enter_opens_setup_for_selected_discipline() {
        let mut app = app();
        let now = Instant::now();
        app.on_event(key(KeyCode::Down), now);
        app.on_event(key(KeyCode::Down), now);
        app.on_event(key(KeyCode::Enter), now);
        assert_eq!(app.session.phase_kind(), PhaseKind::Setup);
        assert_eq!(app.session.discipline(), Discipline::Cards);
    }

    #[test]
    fn setup_adjusts_within_bounds_and_starts() {
        let mut app = app();
        let now = Instant::now();
        app.on_event(key(KeyCode::Enter), now);
        for _ in 0..30 {
            app.on_event(key(KeyCode::Left), now);
        }
        assert_eq!(app.setup.values.quantity, 1);
        app.on_event(key(KeyCode::Right), now);
        let command = app.on_event(key(KeyCode::Enter), now);
        assert_matches!(&command, Some(Command::Generate(req)) if req.quantity == 2);
        assert_eq!(app.config.quantity, 2);
        assert_eq!(app.store.load().quantity, 2);
        generate_inline(&mut app, command, now);
        assert_eq!(app.session.phase_kind(), PhaseKind::Memorize);
    }

    #[test]
    fn any_event_enforces_the_countdown() {
        let mut app = app();
        let t0 = Instant::now();
        app.on_event(key(KeyCode::Enter), t0);
        let command = app.on_event(key(KeyCode::Enter), t0);
        generate_inline(&mut app, command, t0);
        assert_eq!(app.session.phase_kind(), PhaseKind::Memorize);

        let late = t0 + Duration::from_secs(61);
        app.on_event(key(KeyCode::Enter), late);
        // the key that arrived after the deadline is not replayed as a recall submit
        assert_eq!(app.session.phase_kind(), PhaseKind::Recall);
    }

    #[test]
    fn guide_scrolls_and_resets() {
        let mut app = app();
        let now = Instant::now();
        assert!(app.session.open_guide());
        app.on_event(key(KeyCode::Down), now);
        app.on_event(key(KeyCode::Down), now);
        app.on_event(key(KeyCode::Up), now);
        assert_eq!(app.guide_scroll, 1);
        app.on_event(key(KeyCode::Esc), now);
        assert_eq!(app.session.phase_kind(), PhaseKind::Menu);
        assert_eq!(app.guide_scroll, 0);
    }

    #[test]
    fn color_picker_answers_and_finishes() {
        let mut app = app();
        let now = Instant::now();
        let session = Session::new(Box::new(MemoryHistoryStore::new())).with_settings(
            Discipline::Colors,
            SessionConfig::new(2, 30, 0, 1).unwrap(),
            Locale::En,
        );
        app.session = session;
        app.session.open_setup(Discipline::Colors);
        app.setup = SetupForm::new(*app.session.config());
        let command = app.on_event(key(KeyCode::Enter), now);
        generate_inline(&mut app, command, now);
        app.on_event(key(KeyCode::Enter), now);
        assert_eq!(app.session.phase_kind(), PhaseKind::Recall);

        app.on_event(key(KeyCode::Right), now);
        assert_eq!(app.picker_cursor, 1);
        app.on_event(key(KeyCode::Enter), now);
        app.on_event(key(KeyCode::Enter), now);
        assert_eq!(app.session.view().recall, Some((1, 2)));
        app.on_event(key(KeyCode::Tab), now);
        assert_eq!(app.session.phase_kind(), PhaseKind::Results);
        assert_eq!(app.session.history_entries().unwrap().len(), 1);
    }

    #[test]
    fn history_clear_needs_confirmation() {
        let mut app = app();
        let now = Instant::now();
        app.session.open_setup(Discipline::Binaries);
        let req = app.session.start().unwrap();
        app.session
            .complete_generation(req.run_id, Sequence::Binaries("01".repeat(10)), now);
        app.session.finish_memorizing();
        app.session.finish_all();
        app.session.back_to_menu();

        app.on_event(key(KeyCode::Char('h')), now);
        assert_eq!(app.history.entries.len(), 1);
        app.on_event(key(KeyCode::Char('x')), now);
        assert!(app.history.confirm_clear);
        app.on_event(key(KeyCode::Char('n')), now);
        assert_eq!(app.history.entries.len(), 1);
        app.on_event(key(KeyCode::Char('x')), now);
        app.on_event(key(KeyCode::Char('y')), now);
        assert!(app.history.entries.is_empty());
        assert!(app.session.history_entries().unwrap().is_empty());
    }

    #[test]
    fn locale_toggle_is_remembered() {
        let mut app = app();
        app.on_event(key(KeyCode::Char('l')), Instant::now());
        assert_eq!(app.session.locale(), Locale::Uk);
        assert_eq!(app.store.load().locale, Locale::Uk);
    }

    #[test]
    fn ctrl_c_quits_from_any_phase() {
        let mut app = app();
        app.session.open_guide();
        let ev = DrillEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.on_event(ev, Instant::now()), Some(Command::Quit));
    }
}

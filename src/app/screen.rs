//! Application screen state management
//!
//! Maps key presses onto the session and tracks the few bits of UI state the
//! engine does not own: the setup form, the vote cursor, the guess being
//! typed, the guess verdict being computed in the background, and a one-line
//! notice for feedback and errors.

use std::sync::Arc;

use crate::config::Settings;
use crate::game::judge::{GuessJudge, PendingVerdict};
use crate::game::reveal::RevealStep;
use crate::game::round::{GuessTicket, RoundPhase, VoteOutcome};
use crate::game::{RoleConfig, WordPair};

use super::session::{Session, Stage};

/// Longest name or word accepted from the keyboard
const MAX_INPUT_LEN: usize = 24;

/// Which screen the UI should draw, derived from the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Names, role counts and words
    Setup,
    /// "Pass the device to ..." (nothing secret visible)
    Handover,
    /// One player's card
    Card,
    /// Players give clues out loud
    Clue,
    /// Picking someone to eliminate
    Voting,
    /// Captured Mr. White types a guess
    Guess,
    /// Winner and full roster
    GameOver,
}

/// Field with keyboard focus on the setup screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Name,
    MrWhite,
    Undercover,
    CommonWord,
    UndercoverWord,
}

impl SetupField {
    pub fn all() -> &'static [SetupField] {
        &[
            SetupField::Name,
            SetupField::MrWhite,
            SetupField::Undercover,
            SetupField::CommonWord,
            SetupField::UndercoverWord,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SetupField::Name => "Add player",
            SetupField::MrWhite => "Mr. White",
            SetupField::Undercover => "Undercover",
            SetupField::CommonWord => "Civilian word",
            SetupField::UndercoverWord => "Undercover word",
        }
    }

    fn next(self) -> Self {
        let all = Self::all();
        let i = all.iter().position(|f| *f == self).unwrap_or(0);
        all[(i + 1) % all.len()]
    }
}

/// Editable setup state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupForm {
    pub names: Vec<String>,
    pub name_input: String,
    pub config: RoleConfig,
    pub common_word: String,
    pub undercover_word: String,
    pub focus: SetupField,
}

impl SetupForm {
    fn new(config: RoleConfig, words: WordPair) -> Self {
        Self {
            names: Vec::new(),
            name_input: String::new(),
            config,
            common_word: words.common_word,
            undercover_word: words.undercover_word,
            focus: SetupField::Name,
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            SetupField::Name => Some(&mut self.name_input),
            SetupField::CommonWord => Some(&mut self.common_word),
            SetupField::UndercoverWord => Some(&mut self.undercover_word),
            SetupField::MrWhite | SetupField::Undercover => None,
        }
    }
}

/// Main application coordinator
pub struct AppCoordinator {
    pub session: Session,
    pub setup: SetupForm,
    /// Mr. White's guess as typed
    pub guess_input: String,
    /// Highlighted row in the vote list
    pub vote_cursor: usize,
    /// Last feedback or error line
    pub notice: Option<String>,
    pub should_quit: bool,
    judge: Arc<dyn GuessJudge>,
    pending: Option<(GuessTicket, PendingVerdict)>,
}

impl AppCoordinator {
    /// Build the coordinator from loaded settings.
    pub fn new(settings: &Settings) -> Self {
        let session = Session::new(settings.word_bank(), settings.round_settings());
        Self::with_session(session, settings.role_config(), settings.build_judge())
    }

    pub fn with_session(mut session: Session, config: RoleConfig, judge: Arc<dyn GuessJudge>) -> Self {
        let words = session.draw_setup_pair();
        Self {
            session,
            setup: SetupForm::new(config, words),
            guess_input: String::new(),
            vote_cursor: 0,
            notice: None,
            should_quit: false,
            judge,
            pending: None,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn screen(&self) -> Screen {
        match self.session.stage() {
            Stage::Setup => Screen::Setup,
            Stage::Reveal(seq) => match seq.step() {
                RevealStep::Revealed { .. } => Screen::Card,
                RevealStep::Handover { .. } | RevealStep::Complete => Screen::Handover,
            },
            Stage::Round(engine) => match engine.phase() {
                RoundPhase::Clue => Screen::Clue,
                RoundPhase::Voting { .. } => Screen::Voting,
                RoundPhase::MrWhiteCaptured(_) => Screen::Guess,
                RoundPhase::GameOver(_) => Screen::GameOver,
            },
        }
    }

    /// Whether the current capture is waiting on the judge. A request whose
    /// guess the engine has already decided does not count.
    pub fn is_judging(&self) -> bool {
        match (&self.pending, self.session.round().and_then(|e| e.capture())) {
            (Some((ticket, _)), Some(capture)) => capture.ticket() == Some(*ticket),
            _ => false,
        }
    }

    /// Put config warnings on the first screen. The log has the full list.
    pub fn show_warnings(&mut self, warnings: &[String]) {
        self.notice = match warnings {
            [] => None,
            [only] => Some(format!("Config: {}", only)),
            [first, rest @ ..] => Some(format!(
                "Config: {} (+{} more, see log)",
                first,
                rest.len()
            )),
        };
    }

    pub fn on_char(&mut self, c: char) {
        match self.screen() {
            Screen::Setup => {
                if let Some(text) = self.setup.focused_text() {
                    if text.chars().count() < MAX_INPUT_LEN {
                        text.push(c);
                    }
                }
            }
            Screen::Guess => {
                if self.guess_editable() && self.guess_input.chars().count() < MAX_INPUT_LEN {
                    self.guess_input.push(c);
                }
            }
            _ => {}
        }
    }

    pub fn on_backspace(&mut self) {
        match self.screen() {
            Screen::Setup => {
                if self.setup.focus == SetupField::Name && self.setup.name_input.is_empty() {
                    self.setup.names.pop();
                } else if let Some(text) = self.setup.focused_text() {
                    text.pop();
                }
            }
            Screen::Guess => {
                if self.guess_editable() {
                    self.guess_input.pop();
                }
            }
            _ => {}
        }
    }

    pub fn on_tab(&mut self) {
        if self.screen() == Screen::Setup {
            self.setup.focus = self.setup.focus.next();
        }
    }

    pub fn on_up(&mut self) {
        match self.screen() {
            Screen::Setup => match self.setup.focus {
                SetupField::MrWhite => self.setup.config.mr_white_count += 1,
                SetupField::Undercover => self.setup.config.undercover_count += 1,
                _ => {}
            },
            Screen::Voting => self.vote_cursor = self.vote_cursor.saturating_sub(1),
            _ => {}
        }
    }

    pub fn on_down(&mut self) {
        match self.screen() {
            Screen::Setup => match self.setup.focus {
                SetupField::MrWhite => {
                    self.setup.config.mr_white_count = self.setup.config.mr_white_count.saturating_sub(1)
                }
                SetupField::Undercover => {
                    self.setup.config.undercover_count =
                        self.setup.config.undercover_count.saturating_sub(1)
                }
                _ => {}
            },
            Screen::Voting => {
                let last = self
                    .session
                    .round()
                    .map(|e| e.candidates().len().saturating_sub(1))
                    .unwrap_or(0);
                if self.vote_cursor < last {
                    self.vote_cursor += 1;
                }
            }
            _ => {}
        }
    }

    /// Replace the setup words with a random catalogue pair.
    pub fn draw_words(&mut self) {
        if self.screen() == Screen::Setup {
            let pair = self.session.draw_setup_pair();
            self.setup.common_word = pair.common_word;
            self.setup.undercover_word = pair.undercover_word;
        }
    }

    pub fn on_enter(&mut self) {
        match self.screen() {
            Screen::Setup => self.setup_enter(),
            Screen::Handover | Screen::Card => self.reveal_enter(),
            Screen::Clue => {
                if let Some(engine) = self.session.round_mut() {
                    let result = engine.start_vote();
                    self.vote_cursor = 0;
                    self.report(result);
                }
            }
            Screen::Voting => self.vote_enter(),
            Screen::Guess => self.guess_enter(),
            Screen::GameOver => self.play_again(),
        }
    }

    pub fn on_escape(&mut self) {
        match self.screen() {
            Screen::Setup => self.quit(),
            Screen::Voting => {
                if let Some(engine) = self.session.round_mut() {
                    let result = engine.cancel_vote();
                    self.report(result);
                }
            }
            Screen::GameOver => self.new_game(),
            _ => {}
        }
    }

    /// Check for a finished guess verdict (call regularly).
    pub fn poll(&mut self) {
        self.drop_stale_request();
        let verdict = match &self.pending {
            Some((_, pending)) => pending.poll(),
            None => return,
        };
        let Some(verdict) = verdict else {
            return;
        };
        let Some((ticket, _)) = self.pending.take() else {
            return;
        };
        let Some(engine) = self.session.round_mut() else {
            return;
        };
        match engine.resolve_guess(ticket, verdict) {
            Ok(Some(verdict)) => self.notice = Some(verdict.message().to_string()),
            Ok(None) => {}
            Err(e) => self.notice = Some(format!("{e}. Press Enter to try again.")),
        }
    }

    /// One-second timer step.
    pub fn tick(&mut self) {
        if let Some(engine) = self.session.round_mut() {
            engine.tick();
        }
        self.drop_stale_request();
    }

    /// Forget a judge request once the engine no longer waits for it, so a
    /// slow answer cannot block a later capture.
    fn drop_stale_request(&mut self) {
        if self.pending.is_some() && !self.is_judging() {
            tracing::debug!("dropping judge request for a decided guess");
            self.pending = None;
        }
    }

    fn setup_enter(&mut self) {
        if self.setup.focus == SetupField::Name && !self.setup.name_input.trim().is_empty() {
            let name = self.setup.name_input.trim().to_string();
            self.setup.names.push(name);
            self.setup.name_input.clear();
            return;
        }
        let words = match WordPair::from_input(&self.setup.common_word, &self.setup.undercover_word) {
            Ok(words) => words,
            Err(e) => {
                self.notice = Some(e.to_string());
                return;
            }
        };
        let result = self
            .session
            .start_match(self.setup.names.clone(), self.setup.config, words);
        self.report(result);
    }

    fn reveal_enter(&mut self) {
        let Some(seq) = self.session.reveal_mut() else {
            return;
        };
        let result = match seq.step() {
            RevealStep::Handover { .. } => seq.confirm_ready().map(|_| ()),
            RevealStep::Revealed { .. } => seq.acknowledge().map(|_| ()),
            RevealStep::Complete => Ok(()),
        };
        let complete = seq.is_complete();
        self.report(result);
        if complete {
            let result = self.session.begin_round();
            self.report(result);
        }
    }

    fn vote_enter(&mut self) {
        let Some(engine) = self.session.round_mut() else {
            return;
        };
        let Some(id) = engine.candidates().get(self.vote_cursor).map(|p| p.id) else {
            return;
        };
        let outcome = engine.select_candidate(id).and_then(|_| engine.submit_vote());
        match outcome {
            Ok(VoteOutcome::Eliminated { player, role, .. }) => {
                let name = engine.player(player).map(|p| p.name.clone()).unwrap_or_default();
                self.notice = Some(format!("{} was eliminated. They were {}.", name, role.label()));
            }
            Ok(VoteOutcome::MrWhiteCaptured { player }) => {
                let name = engine.player(player).map(|p| p.name.clone()).unwrap_or_default();
                self.guess_input.clear();
                self.notice = Some(format!("{} is Mr. White! One guess at the civilian word.", name));
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
        self.vote_cursor = 0;
    }

    fn guess_enter(&mut self) {
        if self.is_judging() {
            return;
        }
        let Some(engine) = self.session.round_mut() else {
            return;
        };
        if engine.capture().is_some_and(|c| c.verdict().is_some()) {
            let result = engine.conclude_guess();
            self.report(result);
            return;
        }
        match engine.submit_guess(&self.guess_input) {
            Ok(ticket) => {
                let pending = PendingVerdict::spawn(
                    Arc::clone(&self.judge),
                    engine.common_word().to_string(),
                    self.guess_input.clone(),
                );
                self.pending = Some((ticket, pending));
                self.notice = Some("Judging...".to_string());
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn guess_editable(&self) -> bool {
        !self.is_judging()
            && self
                .session
                .round()
                .and_then(|e| e.capture())
                .is_some_and(|c| c.verdict().is_none())
    }

    fn play_again(&mut self) {
        self.pending = None;
        self.guess_input.clear();
        match self.session.play_again() {
            Ok(_) => self.notice = None,
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn new_game(&mut self) {
        self.pending = None;
        self.guess_input.clear();
        self.session.reset();
        let pair = self.session.draw_setup_pair();
        self.setup.common_word = pair.common_word;
        self.setup.undercover_word = pair.undercover_word;
        self.setup.focus = SetupField::Name;
        self.notice = None;
    }

    fn report<T, E: std::fmt::Display>(&mut self, result: Result<T, E>) {
        match result {
            Ok(_) => self.notice = None,
            Err(e) => self.notice = Some(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::judge::{exact_match, ExactJudge, JudgeError};
    use crate::game::Faction;
    use crate::game::round::RoundSettings;
    use crate::game::words::WordBank;
    use crate::game::Role;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::{Duration, Instant};

    /// Exact match, but only after a pause
    struct SlowJudge(Duration);

    impl GuessJudge for SlowJudge {
        fn judge(&self, secret_word: &str, guess: &str) -> Result<bool, JudgeError> {
            std::thread::sleep(self.0);
            Ok(exact_match(secret_word, guess))
        }
    }

    fn coordinator(seed: u64) -> AppCoordinator {
        let settings = RoundSettings {
            guess_seconds: 30,
            verdict_display_seconds: 3,
        };
        coordinator_with(seed, settings, Arc::new(ExactJudge))
    }

    fn coordinator_with(seed: u64, settings: RoundSettings, judge: Arc<dyn GuessJudge>) -> AppCoordinator {
        let session = Session::with_rng(
            WordBank::builtin().clone(),
            settings,
            StdRng::seed_from_u64(seed),
        );
        AppCoordinator::with_session(session, RoleConfig::default(), judge)
    }

    fn type_text(app: &mut AppCoordinator, text: &str) {
        for c in text.chars() {
            app.on_char(c);
        }
    }

    fn add_players(app: &mut AppCoordinator, names: &[&str]) {
        for name in names {
            type_text(app, name);
            app.on_enter();
        }
    }

    fn set_words(app: &mut AppCoordinator, common: &str, undercover: &str) {
        app.setup.common_word = common.to_string();
        app.setup.undercover_word = undercover.to_string();
    }

    fn reveal_everyone(app: &mut AppCoordinator) {
        while matches!(app.screen(), Screen::Handover | Screen::Card) {
            app.on_enter();
        }
    }

    fn wait_for_verdict(app: &mut AppCoordinator) {
        let started = Instant::now();
        while app.is_judging() {
            app.poll();
            assert!(started.elapsed() < Duration::from_secs(5), "verdict never arrived");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn select_role(app: &mut AppCoordinator, role: Role) {
        let engine = app.session.round().unwrap();
        app.vote_cursor = engine.candidates().iter().position(|p| p.role == role).unwrap();
    }

    #[test]
    fn test_setup_collects_names() {
        let mut app = coordinator(1);
        assert_eq!(app.screen(), Screen::Setup);
        add_players(&mut app, &["Ana", "  Budi "]);
        assert_eq!(app.setup.names, vec!["Ana".to_string(), "Budi".to_string()]);

        app.on_backspace();
        assert_eq!(app.setup.names, vec!["Ana".to_string()]);
    }

    #[test]
    fn test_invalid_setup_shows_notice() {
        let mut app = coordinator(2);
        add_players(&mut app, &["Ana", "Budi"]);
        app.on_enter();
        assert_eq!(app.screen(), Screen::Setup);
        assert!(app.notice.as_deref().unwrap().contains("at least 3 players"));
    }

    #[test]
    fn test_role_counts_adjust_with_arrows() {
        let mut app = coordinator(3);
        app.on_tab();
        assert_eq!(app.setup.focus, SetupField::MrWhite);
        app.on_down();
        app.on_down();
        assert_eq!(app.setup.config.mr_white_count, 0);
        app.on_tab();
        app.on_up();
        assert_eq!(app.setup.config.undercover_count, 2);
    }

    #[test]
    fn test_full_match_with_mr_white_guess() {
        let mut app = coordinator(4);
        add_players(&mut app, &["Ana", "Budi", "Citra", "Dewi", "Eka"]);
        set_words(&mut app, "Kopi", "Teh");
        app.on_enter();
        assert_eq!(app.screen(), Screen::Handover);

        reveal_everyone(&mut app);
        assert_eq!(app.screen(), Screen::Clue);

        app.on_enter();
        assert_eq!(app.screen(), Screen::Voting);
        select_role(&mut app, Role::MrWhite);
        app.on_enter();
        assert_eq!(app.screen(), Screen::Guess);

        type_text(&mut app, "kopi");
        app.on_enter();
        assert!(app.is_judging());
        app.on_char('x');
        assert_eq!(app.guess_input, "kopi");

        wait_for_verdict(&mut app);
        assert_eq!(app.screen(), Screen::Guess);
        app.on_enter();
        assert_eq!(app.screen(), Screen::GameOver);

        app.on_enter();
        assert_eq!(app.screen(), Screen::Handover);
        assert_eq!(app.session.history().len(), 4);
    }

    #[test]
    fn test_slow_answer_does_not_block_next_mr_white() {
        let settings = RoundSettings {
            guess_seconds: 1,
            verdict_display_seconds: 0,
        };
        let mut app = coordinator_with(9, settings, Arc::new(SlowJudge(Duration::from_millis(500))));
        add_players(&mut app, &["Ana", "Budi", "Citra", "Dewi", "Eka", "Fajar"]);
        set_words(&mut app, "Kopi", "Teh");
        app.setup.config = RoleConfig {
            mr_white_count: 2,
            undercover_count: 0,
        };
        app.on_enter();
        reveal_everyone(&mut app);

        app.on_enter();
        select_role(&mut app, Role::MrWhite);
        app.on_enter();
        type_text(&mut app, "teh");
        app.on_enter();
        assert!(app.is_judging());

        // Countdown runs out while the judge is still thinking.
        app.tick();
        assert_eq!(app.screen(), Screen::Clue);
        assert!(!app.is_judging());

        app.on_enter();
        select_role(&mut app, Role::MrWhite);
        app.on_enter();
        assert_eq!(app.screen(), Screen::Guess);

        type_text(&mut app, "kopi");
        assert_eq!(app.guess_input, "kopi");
        app.on_enter();
        assert!(app.is_judging());

        wait_for_verdict(&mut app);
        let result = app.session.round().unwrap().result().unwrap();
        assert_eq!(result.winning_faction, Faction::MrWhite);
    }

    #[test]
    fn test_enter_concludes_while_old_request_runs() {
        let settings = RoundSettings {
            guess_seconds: 1,
            verdict_display_seconds: 3,
        };
        let mut app = coordinator_with(10, settings, Arc::new(SlowJudge(Duration::from_millis(500))));
        add_players(&mut app, &["Ana", "Budi", "Citra", "Dewi", "Eka"]);
        app.on_enter();
        reveal_everyone(&mut app);
        app.on_enter();
        select_role(&mut app, Role::MrWhite);
        app.on_enter();
        type_text(&mut app, "kopi");
        app.on_enter();

        app.tick();
        assert_eq!(app.screen(), Screen::Guess);
        assert!(!app.is_judging());
        app.on_enter();
        assert_eq!(app.screen(), Screen::Clue);
    }

    #[test]
    fn test_config_warnings_shown_once() {
        let mut app = coordinator(11);
        app.show_warnings(&[]);
        assert!(app.notice.is_none());

        app.show_warnings(&["guess_seconds is 0".to_string()]);
        assert_eq!(app.notice.as_deref(), Some("Config: guess_seconds is 0"));

        app.show_warnings(&["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(app.notice.as_deref(), Some("Config: a (+2 more, see log)"));
    }

    #[test]
    fn test_cancel_vote_returns_to_clues() {
        let mut app = coordinator(5);
        add_players(&mut app, &["Ana", "Budi", "Citra", "Dewi"]);
        app.on_enter();
        reveal_everyone(&mut app);
        app.on_enter();
        app.on_down();
        assert_eq!(app.vote_cursor, 1);
        app.on_escape();
        assert_eq!(app.screen(), Screen::Clue);
    }

    #[test]
    fn test_guess_times_out_on_ticks() {
        let mut app = coordinator(6);
        add_players(&mut app, &["Ana", "Budi", "Citra", "Dewi", "Eka"]);
        app.on_enter();
        reveal_everyone(&mut app);
        app.on_enter();
        select_role(&mut app, Role::MrWhite);
        app.on_enter();

        for _ in 0..30 {
            app.tick();
        }
        assert_eq!(app.screen(), Screen::Guess);
        assert!(!app.guess_editable());
        for _ in 0..3 {
            app.tick();
        }
        assert_eq!(app.screen(), Screen::Clue);
    }

    #[test]
    fn test_new_game_returns_to_setup_keeping_names() {
        let mut app = coordinator(7);
        add_players(&mut app, &["Ana", "Budi", "Citra"]);
        app.setup.config = RoleConfig {
            mr_white_count: 0,
            undercover_count: 1,
        };
        app.on_enter();
        reveal_everyone(&mut app);
        app.on_enter();
        select_role(&mut app, Role::Undercover);
        app.on_enter();
        assert_eq!(app.screen(), Screen::GameOver);

        app.on_escape();
        assert_eq!(app.screen(), Screen::Setup);
        assert!(app.session.history().is_empty());
        assert_eq!(app.setup.names.len(), 3);
    }

    #[test]
    fn test_escape_in_setup_quits() {
        let mut app = coordinator(8);
        app.on_escape();
        assert!(app.should_quit);
    }
}

//! Session controller
//!
//! Owns everything that outlives a single match: the word catalogue, the
//! word history, the name list, role counts and the RNG. Moves a match from
//! setup through the reveal pass into the round loop, and deals a fresh
//! match over the same names on "play again".

use crate::game::reveal::RevealSequencer;
use crate::game::roles::assign_with_rng;
use crate::game::round::{RoundEngine, RoundSettings};
use crate::game::words::{Selection, WordBank, WordHistory};
use crate::game::{GameError, RoleConfig, WordPair};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Notice shown during the reveal pass after a replay
pub const REPLAY_ANNOUNCEMENT: &str = "New game started with the same players.";

/// Where the session currently is
#[derive(Debug, Clone)]
pub enum Stage {
    /// Collecting names, role counts and words
    Setup,
    /// Private reveal pass
    Reveal(RevealSequencer),
    /// Clue / vote loop, including game over
    Round(RoundEngine),
}

impl Stage {
    fn describe(&self) -> &'static str {
        match self {
            Stage::Setup => "in setup",
            Stage::Reveal(_) => "revealing cards",
            Stage::Round(engine) if engine.is_over() => "the game is over",
            Stage::Round(_) => "a match is in progress",
        }
    }
}

/// Top-level game controller for one shared device
#[derive(Debug, Clone)]
pub struct Session {
    bank: WordBank,
    history: WordHistory,
    names: Vec<String>,
    config: RoleConfig,
    words: Option<WordPair>,
    settings: RoundSettings,
    stage: Stage,
    rng: StdRng,
}

impl Session {
    pub fn new(bank: WordBank, settings: RoundSettings) -> Self {
        Self::with_rng(bank, settings, StdRng::from_os_rng())
    }

    /// Build a session around a specific RNG (for testing/seeding).
    pub fn with_rng(bank: WordBank, settings: RoundSettings, rng: StdRng) -> Self {
        Self {
            bank,
            history: WordHistory::new(),
            names: Vec::new(),
            config: RoleConfig::default(),
            words: None,
            settings,
            stage: Stage::Setup,
            rng,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn history(&self) -> &WordHistory {
        &self.history
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn config(&self) -> RoleConfig {
        self.config
    }

    /// Words of the current match
    pub fn words(&self) -> Option<&WordPair> {
        self.words.as_ref()
    }

    pub fn settings(&self) -> RoundSettings {
        self.settings
    }

    pub fn bank(&self) -> &WordBank {
        &self.bank
    }

    pub fn reveal(&self) -> Option<&RevealSequencer> {
        match &self.stage {
            Stage::Reveal(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn reveal_mut(&mut self) -> Option<&mut RevealSequencer> {
        match &mut self.stage {
            Stage::Reveal(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn round(&self) -> Option<&RoundEngine> {
        match &self.stage {
            Stage::Round(engine) => Some(engine),
            _ => None,
        }
    }

    pub fn round_mut(&mut self) -> Option<&mut RoundEngine> {
        match &mut self.stage {
            Stage::Round(engine) => Some(engine),
            _ => None,
        }
    }

    /// Suggest a pair for the setup screen. History is not consulted yet;
    /// it starts with whatever pair the match is actually started with.
    pub fn draw_setup_pair(&mut self) -> WordPair {
        self.bank.select_pair_with_rng(&[], &mut self.rng).pair
    }

    /// Validate the setup, deal roles and enter the reveal pass.
    pub fn start_match(
        &mut self,
        names: Vec<String>,
        config: RoleConfig,
        words: WordPair,
    ) -> Result<(), GameError> {
        if !matches!(self.stage, Stage::Setup) {
            return Err(GameError::invalid("start a match", self.stage.describe()));
        }
        let words = WordPair::from_input(&words.common_word, &words.undercover_word)?;
        let roster = assign_with_rng(&names, &words, config, &mut self.rng)?;

        self.history.push_pair(&words);
        self.names = roster.iter().map(|p| p.name.clone()).collect();
        self.config = config;
        self.words = Some(words);
        self.stage = Stage::Reveal(RevealSequencer::new(roster));
        tracing::info!(players = self.names.len(), "match started");
        Ok(())
    }

    /// Hand the revealed roster to the round loop.
    pub fn begin_round(&mut self) -> Result<(), GameError> {
        let complete = matches!(&self.stage, Stage::Reveal(seq) if seq.is_complete());
        if !complete {
            return Err(GameError::invalid("start the round", self.stage.describe()));
        }
        let common_word = match &self.words {
            Some(words) => words.common_word.clone(),
            None => return Err(GameError::invalid("start the round", "no words are dealt")),
        };
        let Stage::Reveal(seq) = std::mem::replace(&mut self.stage, Stage::Setup) else {
            return Err(GameError::invalid("start the round", "not revealing cards"));
        };
        let roster = seq.finish()?;
        let rng = StdRng::from_rng(&mut self.rng);
        self.stage = Stage::Round(RoundEngine::with_rng(
            roster,
            common_word,
            self.settings,
            rng,
        ));
        Ok(())
    }

    /// Deal a new match over the same names with a fresh, non-repeating pair.
    /// Elimination state from the previous match is discarded.
    pub fn play_again(&mut self) -> Result<Selection, GameError> {
        if !matches!(&self.stage, Stage::Round(engine) if engine.is_over()) {
            return Err(GameError::invalid("play again", self.stage.describe()));
        }

        let selection = self
            .bank
            .select_pair_with_rng(self.history.as_slice(), &mut self.rng);
        let roster = assign_with_rng(&self.names, &selection.pair, self.config, &mut self.rng)?;

        self.history.record(&selection);
        self.words = Some(selection.pair.clone());
        self.stage = Stage::Reveal(RevealSequencer::new(roster).with_announcement(REPLAY_ANNOUNCEMENT));
        tracing::info!(
            did_reset = selection.did_reset,
            history = self.history.len(),
            "replaying with the same players"
        );
        Ok(selection)
    }

    /// Back to setup. Clears the roster and the word history.
    pub fn reset(&mut self) {
        self.stage = Stage::Setup;
        self.history.clear();
        self.names.clear();
        self.words = None;
        tracing::info!("session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::judge::{FallbackJudge, GuessJudge, JudgeError};
    use crate::game::round::{RoundPhase, VoteOutcome};
    use crate::game::{Faction, Role};

    struct OfflineJudge;

    impl GuessJudge for OfflineJudge {
        fn judge(&self, _secret_word: &str, _guess: &str) -> Result<bool, JudgeError> {
            Err(JudgeError::Transport("no route to host".into()))
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn instant() -> RoundSettings {
        RoundSettings {
            guess_seconds: 30,
            verdict_display_seconds: 0,
        }
    }

    fn session(seed: u64) -> Session {
        Session::with_rng(WordBank::builtin().clone(), instant(), StdRng::seed_from_u64(seed))
    }

    fn reveal_all(session: &mut Session) {
        let seq = session.reveal_mut().unwrap();
        while !seq.is_complete() {
            seq.confirm_ready().unwrap();
            seq.acknowledge().unwrap();
        }
        session.begin_round().unwrap();
    }

    fn vote(session: &mut Session, pick: impl Fn(Role) -> bool) -> VoteOutcome {
        let engine = session.round_mut().unwrap();
        let id = engine
            .active_players()
            .iter()
            .find(|p| pick(p.role))
            .unwrap()
            .id;
        engine.start_vote().unwrap();
        engine.select_candidate(id).unwrap();
        engine.submit_vote().unwrap()
    }

    fn finish_quickly(session: &mut Session) {
        // Vote out every impostor until civilians win or impostors reach parity.
        while !session.round().unwrap().is_over() {
            match vote(session, |r| r.is_impostor()) {
                VoteOutcome::MrWhiteCaptured { .. } => {
                    let engine = session.round_mut().unwrap();
                    let ticket = engine.submit_guess("definitely wrong").unwrap();
                    engine.resolve_guess(ticket, Ok(false)).unwrap();
                }
                VoteOutcome::Eliminated { .. } => {}
            }
        }
    }

    #[test]
    fn test_start_match_enters_reveal() {
        let mut session = session(1);
        session
            .start_match(
                names(&["Ana", "Budi", "Citra"]),
                RoleConfig {
                    mr_white_count: 0,
                    undercover_count: 1,
                },
                WordPair::new("Kopi", "Teh"),
            )
            .unwrap();

        assert!(matches!(session.stage(), Stage::Reveal(_)));
        assert_eq!(session.history().as_slice(), &["Kopi".to_string(), "Teh".to_string()]);
        assert_eq!(session.reveal().unwrap().roster().len(), 3);
    }

    #[test]
    fn test_invalid_setup_stays_in_setup() {
        let mut session = session(1);
        let err = session
            .start_match(
                names(&["Ana", "Budi", "Citra"]),
                RoleConfig {
                    mr_white_count: 1,
                    undercover_count: 2,
                },
                WordPair::new("Kopi", "Teh"),
            )
            .unwrap_err();
        assert!(matches!(err, GameError::Configuration(_)));
        assert!(matches!(session.stage(), Stage::Setup));
        assert!(session.history().is_empty());

        let err = session
            .start_match(
                names(&["Ana", "Budi", "Citra"]),
                RoleConfig::default(),
                WordPair::new("Kopi", " "),
            )
            .unwrap_err();
        assert!(matches!(err, GameError::Configuration(_)));
    }

    #[test]
    fn test_round_cannot_start_before_reveal_completes() {
        let mut session = session(2);
        session
            .start_match(names(&["A", "B", "C", "D"]), RoleConfig::default(), WordPair::new("Kopi", "Teh"))
            .unwrap();
        assert!(session.begin_round().is_err());
        assert!(matches!(session.stage(), Stage::Reveal(_)));
        assert_eq!(session.reveal().unwrap().roster().len(), 4);
    }

    #[test]
    fn test_scenario_b_mr_white_guess_with_judge_down() {
        let mut session = session(3);
        session
            .start_match(
                names(&["Ana", "Budi", "Citra", "Dewi", "Eka"]),
                RoleConfig {
                    mr_white_count: 1,
                    undercover_count: 1,
                },
                WordPair::new("Kopi", "Teh"),
            )
            .unwrap();
        reveal_all(&mut session);

        let outcome = vote(&mut session, |r| r == Role::Undercover);
        assert!(matches!(outcome, VoteOutcome::Eliminated { winner: None, .. }));
        assert_eq!(session.round().unwrap().active_players().len(), 4);

        let outcome = vote(&mut session, |r| r == Role::MrWhite);
        assert!(matches!(outcome, VoteOutcome::MrWhiteCaptured { .. }));

        // Service is down; the fallback still recognises the word.
        let judge = FallbackJudge::new(OfflineJudge);
        let engine = session.round_mut().unwrap();
        let ticket = engine.submit_guess("  kOPI ").unwrap();
        let verdict = judge.judge(engine.common_word(), "  kOPI ");
        engine.resolve_guess(ticket, verdict).unwrap();

        assert_eq!(
            session.round().unwrap().result().unwrap().winning_faction,
            Faction::MrWhite
        );
    }

    #[test]
    fn test_play_again_reuses_names_and_rotates_words() {
        let mut session = session(4);
        let list = names(&["Ana", "Budi", "Citra", "Dewi"]);
        session
            .start_match(list.clone(), RoleConfig::default(), WordPair::new("Kopi", "Teh"))
            .unwrap();
        reveal_all(&mut session);
        assert!(session.play_again().is_err());
        finish_quickly(&mut session);

        let selection = session.play_again().unwrap();
        assert!(!selection.did_reset);
        assert_ne!(selection.pair.common_word, "Kopi");
        assert_eq!(session.history().len(), 4);

        let seq = session.reveal().unwrap();
        assert_eq!(seq.announcement(), Some(REPLAY_ANNOUNCEMENT));
        let replay_names: Vec<String> = seq.roster().iter().map(|p| p.name.clone()).collect();
        assert_eq!(replay_names, list);
        assert!(seq.roster().iter().all(|p| !p.is_eliminated));
        assert_eq!(session.words(), Some(&selection.pair));
    }

    #[test]
    fn test_history_resets_after_catalogue_exhausted() {
        let bank = WordBank::new(vec![
            WordPair::new("Kopi", "Teh"),
            WordPair::new("Gitar", "Biola"),
        ])
        .unwrap();
        let mut session = Session::with_rng(bank, instant(), StdRng::seed_from_u64(5));
        session
            .start_match(names(&["A", "B", "C"]), RoleConfig { mr_white_count: 0, undercover_count: 1 }, WordPair::new("Kopi", "Teh"))
            .unwrap();
        reveal_all(&mut session);
        finish_quickly(&mut session);

        let second = session.play_again().unwrap();
        assert!(!second.did_reset);
        assert_eq!(second.pair.common_word, "Gitar");
        reveal_all(&mut session);
        finish_quickly(&mut session);

        let third = session.play_again().unwrap();
        assert!(third.did_reset);
        assert_eq!(
            session.history().as_slice(),
            &[third.pair.common_word.clone(), third.pair.undercover_word.clone()]
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = session(6);
        session
            .start_match(names(&["A", "B", "C"]), RoleConfig { mr_white_count: 0, undercover_count: 1 }, WordPair::new("Kopi", "Teh"))
            .unwrap();
        session.reset();
        assert!(matches!(session.stage(), Stage::Setup));
        assert!(session.history().is_empty());
        assert!(session.names().is_empty());
        assert!(session.words().is_none());
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut session = session(7);
        let list = names(&["A", "B", "C"]);
        let config = RoleConfig { mr_white_count: 0, undercover_count: 1 };
        session.start_match(list.clone(), config, WordPair::new("Kopi", "Teh")).unwrap();
        assert!(session.start_match(list, config, WordPair::new("Gula", "Garam")).is_err());
        assert_eq!(session.words(), Some(&WordPair::new("Kopi", "Teh")));
    }

    #[test]
    fn test_draw_setup_pair_comes_from_bank() {
        let mut session = session(8);
        let pair = session.draw_setup_pair();
        assert!(WordBank::builtin().pairs().contains(&pair));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_round_starts_in_clue_phase() {
        let mut session = session(9);
        session
            .start_match(names(&["A", "B", "C", "D"]), RoleConfig::default(), WordPair::new("Kopi", "Teh"))
            .unwrap();
        reveal_all(&mut session);
        let engine = session.round().unwrap();
        assert_eq!(engine.phase(), &RoundPhase::Clue);
        assert_eq!(engine.common_word(), "Kopi");
        assert_eq!(engine.clue_order().len(), 4);
    }
}

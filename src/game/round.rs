//! Round loop: clues, voting, elimination and the Mr. White guess
//!
//! The engine owns the roster for the length of a match and holds exactly
//! one authoritative phase. Every operation checks the phase first and
//! leaves the engine untouched when it is called out of turn.
//!
//! A captured Mr. White races two timelines: the countdown driven by
//! [`RoundEngine::tick`] and the judge verdict delivered through
//! [`RoundEngine::resolve_guess`]. Whichever lands first is latched; the
//! other becomes a no-op.

use super::judge::JudgeError;
use super::{shuffle_with_rng, Faction, GameError, MatchResult, Player, PlayerId, Role};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seconds Mr. White has to guess
pub const DEFAULT_GUESS_SECONDS: u32 = 30;

/// Seconds a verdict stays on screen before the round moves on
pub const DEFAULT_VERDICT_DISPLAY_SECONDS: u32 = 3;

/// Timing knobs for the round loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSettings {
    pub guess_seconds: u32,
    /// Zero applies the verdict immediately
    pub verdict_display_seconds: u32,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            guess_seconds: DEFAULT_GUESS_SECONDS,
            verdict_display_seconds: DEFAULT_VERDICT_DISPLAY_SECONDS,
        }
    }
}

/// Identifies one judge request so late answers can be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuessTicket(u64);

/// Latched outcome of a Mr. White guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessVerdict {
    Correct,
    Wrong,
    TimedOut,
}

impl GuessVerdict {
    pub fn message(&self) -> &'static str {
        match self {
            GuessVerdict::Correct => "Correct guess. Mr. White wins.",
            GuessVerdict::Wrong => "Wrong guess. Mr. White is eliminated.",
            GuessVerdict::TimedOut => "Time's up. Mr. White failed to guess.",
        }
    }
}

/// State of a captured Mr. White
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    player: PlayerId,
    time_remaining: u32,
    guess: Option<String>,
    in_flight: Option<GuessTicket>,
    verdict: Option<GuessVerdict>,
    display_remaining: u32,
}

impl Capture {
    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    /// Last submitted guess
    pub fn guess(&self) -> Option<&str> {
        self.guess.as_deref()
    }

    /// A judge request is outstanding
    pub fn is_judging(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Ticket of the outstanding judge request, if any
    pub fn ticket(&self) -> Option<GuessTicket> {
        self.in_flight
    }

    pub fn verdict(&self) -> Option<GuessVerdict> {
        self.verdict
    }
}

/// Current phase of the round loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundPhase {
    /// Players give verbal clues in the advisory clue order
    Clue,
    /// The table picks one active player
    Voting { selected: Option<PlayerId> },
    /// A voted-out Mr. White gets one guess at the common word
    MrWhiteCaptured(Capture),
    /// Terminal
    GameOver(MatchResult),
}

impl RoundPhase {
    fn describe(&self) -> &'static str {
        match self {
            RoundPhase::Clue => "giving clues",
            RoundPhase::Voting { .. } => "voting",
            RoundPhase::MrWhiteCaptured(_) => "Mr. White is guessing",
            RoundPhase::GameOver(_) => "the game is over",
        }
    }
}

/// What a submitted vote did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Player removed; `winner` is set if that ended the match
    Eliminated {
        player: PlayerId,
        role: Role,
        winner: Option<Faction>,
    },
    /// Mr. White was caught and now gets a guess
    MrWhiteCaptured { player: PlayerId },
}

/// Drives one match from the first clue to a winner
#[derive(Debug, Clone)]
pub struct RoundEngine {
    roster: Vec<Player>,
    common_word: String,
    phase: RoundPhase,
    clue_order: Vec<PlayerId>,
    round: u32,
    settings: RoundSettings,
    rng: StdRng,
    next_ticket: u64,
}

impl RoundEngine {
    pub fn new(roster: Vec<Player>, common_word: impl Into<String>, settings: RoundSettings) -> Self {
        Self::with_rng(roster, common_word, settings, StdRng::from_os_rng())
    }

    /// Build an engine around a specific RNG (for testing/seeding).
    pub fn with_rng(
        roster: Vec<Player>,
        common_word: impl Into<String>,
        settings: RoundSettings,
        rng: StdRng,
    ) -> Self {
        let mut engine = Self {
            roster,
            common_word: common_word.into(),
            phase: RoundPhase::Clue,
            clue_order: Vec::new(),
            round: 1,
            settings,
            rng,
            next_ticket: 0,
        };
        engine.reshuffle_clue_order();
        tracing::info!(players = engine.roster.len(), "round 1 started");
        engine
    }

    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    pub fn round_number(&self) -> u32 {
        self.round
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    /// The word Mr. White must guess
    pub fn common_word(&self) -> &str {
        &self.common_word
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.roster.iter().find(|p| p.id == id)
    }

    /// Players still in the game, in roster order
    pub fn active_players(&self) -> Vec<&Player> {
        self.roster.iter().filter(|p| p.is_active()).collect()
    }

    /// Players voted out so far, in roster order
    pub fn eliminated_players(&self) -> Vec<&Player> {
        self.roster.iter().filter(|p| p.is_eliminated).collect()
    }

    /// Advisory speaking order for the current round
    pub fn clue_order(&self) -> Vec<&Player> {
        self.clue_order
            .iter()
            .filter_map(|id| self.player(*id))
            .collect()
    }

    /// Vote candidates: every active player
    pub fn candidates(&self) -> Vec<&Player> {
        self.active_players()
    }

    pub fn capture(&self) -> Option<&Capture> {
        match &self.phase {
            RoundPhase::MrWhiteCaptured(capture) => Some(capture),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&MatchResult> {
        match &self.phase {
            RoundPhase::GameOver(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, RoundPhase::GameOver(_))
    }

    /// `Clue -> Voting`
    pub fn start_vote(&mut self) -> Result<(), GameError> {
        if self.phase != RoundPhase::Clue {
            return Err(GameError::invalid("start a vote", self.phase.describe()));
        }
        self.phase = RoundPhase::Voting { selected: None };
        Ok(())
    }

    /// `Voting -> Clue` without eliminating anyone
    pub fn cancel_vote(&mut self) -> Result<(), GameError> {
        match self.phase {
            RoundPhase::Voting { .. } => {
                self.phase = RoundPhase::Clue;
                Ok(())
            }
            _ => Err(GameError::invalid("cancel the vote", self.phase.describe())),
        }
    }

    /// Mark the player the table voted for. Only active players qualify.
    pub fn select_candidate(&mut self, id: PlayerId) -> Result<(), GameError> {
        if !matches!(self.phase, RoundPhase::Voting { .. }) {
            return Err(GameError::invalid("select a candidate", self.phase.describe()));
        }
        if !self.player(id).is_some_and(Player::is_active) {
            return Err(GameError::invalid(
                "select a candidate",
                "that player is not in the game",
            ));
        }
        self.phase = RoundPhase::Voting { selected: Some(id) };
        Ok(())
    }

    /// Commit the vote for the selected player.
    pub fn submit_vote(&mut self) -> Result<VoteOutcome, GameError> {
        let id = match self.phase {
            RoundPhase::Voting { selected: Some(id) } => id,
            RoundPhase::Voting { selected: None } => {
                return Err(GameError::invalid("submit a vote", "no candidate is selected"))
            }
            _ => return Err(GameError::invalid("submit a vote", self.phase.describe())),
        };
        let role = self
            .player(id)
            .map(|p| p.role)
            .ok_or(GameError::invalid("submit a vote", "that player is not in the game"))?;

        if role == Role::MrWhite {
            tracing::info!(player = %id, "Mr. White captured");
            self.phase = RoundPhase::MrWhiteCaptured(Capture {
                player: id,
                time_remaining: self.settings.guess_seconds,
                guess: None,
                in_flight: None,
                verdict: None,
                display_remaining: 0,
            });
            if self.settings.guess_seconds == 0 {
                self.latch(GuessVerdict::TimedOut);
            }
            return Ok(VoteOutcome::MrWhiteCaptured { player: id });
        }

        self.eliminate(id);
        let winner = self.evaluate_win();
        Ok(VoteOutcome::Eliminated {
            player: id,
            role,
            winner,
        })
    }

    /// Submit Mr. White's guess. The caller sends it to the judge and hands
    /// the answer back through [`RoundEngine::resolve_guess`] with the ticket.
    pub fn submit_guess(&mut self, guess: &str) -> Result<GuessTicket, GameError> {
        let capture = match &mut self.phase {
            RoundPhase::MrWhiteCaptured(capture) => capture,
            other => return Err(GameError::invalid("submit a guess", other.describe())),
        };
        if capture.verdict.is_some() {
            return Err(GameError::invalid("submit a guess", "the guess is already decided"));
        }
        if capture.in_flight.is_some() {
            return Err(GameError::invalid("submit a guess", "a guess is being judged"));
        }
        let guess = guess.trim();
        if guess.is_empty() {
            return Err(GameError::invalid("submit a guess", "the guess is empty"));
        }

        self.next_ticket += 1;
        let ticket = GuessTicket(self.next_ticket);
        capture.guess = Some(guess.to_string());
        capture.in_flight = Some(ticket);
        Ok(ticket)
    }

    /// Deliver the judge's answer for `ticket`.
    ///
    /// Answers for stale tickets, or arriving after the countdown already
    /// latched a timeout, are ignored and return `Ok(None)`. A judge failure
    /// clears the pending request so the guess can be retried.
    pub fn resolve_guess(
        &mut self,
        ticket: GuessTicket,
        verdict: Result<bool, JudgeError>,
    ) -> Result<Option<GuessVerdict>, GameError> {
        let capture = match &mut self.phase {
            RoundPhase::MrWhiteCaptured(capture) => capture,
            _ => return Ok(None),
        };
        if capture.verdict.is_some() || capture.in_flight != Some(ticket) {
            tracing::debug!("ignoring late judge answer");
            return Ok(None);
        }
        capture.in_flight = None;

        let verdict = match verdict {
            Ok(true) => GuessVerdict::Correct,
            Ok(false) => GuessVerdict::Wrong,
            Err(e) => {
                tracing::warn!(error = %e, "judge failed, guess may be retried");
                return Err(GameError::JudgeUnavailable(e));
            }
        };
        self.latch(verdict);
        Ok(Some(verdict))
    }

    /// One-second heartbeat. Runs the guess countdown while no verdict is
    /// latched (judging does not pause it), then the verdict display delay.
    pub fn tick(&mut self) {
        let capture = match &mut self.phase {
            RoundPhase::MrWhiteCaptured(capture) => capture,
            _ => return,
        };

        if capture.verdict.is_none() {
            if capture.time_remaining > 0 {
                capture.time_remaining -= 1;
                if capture.time_remaining == 0 {
                    self.latch(GuessVerdict::TimedOut);
                }
            }
        } else if capture.display_remaining > 0 {
            capture.display_remaining -= 1;
            if capture.display_remaining == 0 {
                self.apply_verdict();
            }
        }
    }

    /// Skip the remaining display delay and apply the latched verdict.
    pub fn conclude_guess(&mut self) -> Result<(), GameError> {
        match self.capture() {
            Some(capture) if capture.verdict.is_some() => {
                self.apply_verdict();
                Ok(())
            }
            Some(_) => Err(GameError::invalid("conclude the guess", "no verdict yet")),
            None => Err(GameError::invalid("conclude the guess", self.phase.describe())),
        }
    }

    fn latch(&mut self, verdict: GuessVerdict) {
        let delay = self.settings.verdict_display_seconds;
        if let RoundPhase::MrWhiteCaptured(capture) = &mut self.phase {
            tracing::info!(?verdict, "Mr. White guess decided");
            capture.verdict = Some(verdict);
            capture.in_flight = None;
            capture.display_remaining = delay;
        }
        if delay == 0 {
            self.apply_verdict();
        }
    }

    fn apply_verdict(&mut self) {
        let (player, verdict) = match &self.phase {
            RoundPhase::MrWhiteCaptured(Capture {
                player,
                verdict: Some(verdict),
                ..
            }) => (*player, *verdict),
            _ => return,
        };

        match verdict {
            GuessVerdict::Correct => self.finish(Faction::MrWhite),
            GuessVerdict::Wrong | GuessVerdict::TimedOut => {
                self.eliminate(player);
                self.evaluate_win();
            }
        }
    }

    fn eliminate(&mut self, id: PlayerId) {
        if let Some(player) = self.roster.iter_mut().find(|p| p.id == id) {
            player.is_eliminated = true;
            tracing::info!(player = %player.name, role = player.role.label(), "player eliminated");
        }
    }

    /// Decide the match after an elimination. Parity goes to the impostors.
    fn evaluate_win(&mut self) -> Option<Faction> {
        let winner = check_winner(&self.roster);
        match winner {
            Some(faction) => self.finish(faction),
            None => {
                self.round += 1;
                self.phase = RoundPhase::Clue;
                self.reshuffle_clue_order();
                tracing::info!(round = self.round, "next round");
            }
        }
        winner
    }

    fn finish(&mut self, faction: Faction) {
        tracing::info!(winner = faction.label(), round = self.round, "game over");
        self.phase = RoundPhase::GameOver(MatchResult {
            winning_faction: faction,
            final_roster: self.roster.clone(),
        });
    }

    fn reshuffle_clue_order(&mut self) {
        let mut order: Vec<PlayerId> = self
            .roster
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.id)
            .collect();
        shuffle_with_rng(&mut order, &mut self.rng);
        self.clue_order = order;
    }
}

/// Win check over the active players: no impostors left means the
/// civilians win, impostors at or above civilian count means they win.
pub fn check_winner(roster: &[Player]) -> Option<Faction> {
    let (impostors, loyalists) = roster
        .iter()
        .filter(|p| p.is_active())
        .fold((0usize, 0usize), |(imp, loy), p| {
            if p.role.is_impostor() {
                (imp + 1, loy)
            } else {
                (imp, loy + 1)
            }
        });

    if impostors == 0 {
        Some(Faction::Loyalists)
    } else if impostors >= loyalists {
        Some(Faction::Impostors)
    } else {
        None
    }
}

//! Private reveal pass
//!
//! The device travels around the table once. For each player the sequencer
//! waits in `Handover` until that player confirms they hold the device, then
//! shows their card in `Revealed` until they acknowledge it. Acknowledging
//! re-arms `Handover` for the next player before anything else is visible.
//! There is no way back to an earlier card.

use super::{GameError, Player, Role};

/// Where the reveal pass currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStep {
    /// Device is being passed to the player at `index`; nothing secret is shown
    Handover { index: usize },
    /// The player at `index` is looking at their card
    Revealed { index: usize },
    /// Every player has seen their card
    Complete,
}

impl RevealStep {
    fn describe(&self) -> &'static str {
        match self {
            RevealStep::Handover { .. } => "waiting for handover",
            RevealStep::Revealed { .. } => "showing a card",
            RevealStep::Complete => "the reveal pass is complete",
        }
    }
}

/// What the current player is allowed to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealCard<'a> {
    pub name: &'a str,
    pub role: Role,
    pub word: Option<&'a str>,
}

/// Walks the roster once in roster order
#[derive(Debug, Clone)]
pub struct RevealSequencer {
    roster: Vec<Player>,
    step: RevealStep,
    announcement: Option<String>,
}

impl RevealSequencer {
    pub fn new(roster: Vec<Player>) -> Self {
        let step = if roster.is_empty() {
            RevealStep::Complete
        } else {
            RevealStep::Handover { index: 0 }
        };
        Self {
            roster,
            step,
            announcement: None,
        }
    }

    /// Attach a notice shown on handover screens (e.g. after a replay).
    pub fn with_announcement(mut self, announcement: impl Into<String>) -> Self {
        self.announcement = Some(announcement.into());
        self
    }

    pub fn announcement(&self) -> Option<&str> {
        self.announcement.as_deref()
    }

    pub fn step(&self) -> RevealStep {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step == RevealStep::Complete
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    /// The player holding (or about to hold) the device
    pub fn current_player(&self) -> Option<&Player> {
        match self.step {
            RevealStep::Handover { index } | RevealStep::Revealed { index } => {
                self.roster.get(index)
            }
            RevealStep::Complete => None,
        }
    }

    /// 1-based position and roster size, e.g. `(2, 5)` for "player 2 of 5"
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self.step {
            RevealStep::Handover { index } | RevealStep::Revealed { index } => {
                Some((index + 1, self.roster.len()))
            }
            RevealStep::Complete => None,
        }
    }

    /// The visible card. Only ever `Some` for the single revealed player.
    pub fn revealed_card(&self) -> Option<RevealCard<'_>> {
        match self.step {
            RevealStep::Revealed { index } => self.roster.get(index).map(|p| RevealCard {
                name: &p.name,
                role: p.role,
                word: p.word.as_deref(),
            }),
            _ => None,
        }
    }

    /// `Handover -> Revealed`: the current player confirms they hold the device.
    pub fn confirm_ready(&mut self) -> Result<RevealCard<'_>, GameError> {
        let index = match self.step {
            RevealStep::Handover { index } => index,
            other => return Err(GameError::invalid("reveal a card", other.describe())),
        };
        self.step = RevealStep::Revealed { index };
        tracing::debug!(position = index + 1, "card revealed");
        self.revealed_card()
            .ok_or(GameError::invalid("reveal a card", "the roster is empty"))
    }

    /// `Revealed -> Handover(next)` or `Complete` after the last player.
    pub fn acknowledge(&mut self) -> Result<RevealStep, GameError> {
        let index = match self.step {
            RevealStep::Revealed { index } => index,
            other => return Err(GameError::invalid("hide the card", other.describe())),
        };
        self.step = if index + 1 < self.roster.len() {
            RevealStep::Handover { index: index + 1 }
        } else {
            tracing::info!(players = self.roster.len(), "reveal pass complete");
            RevealStep::Complete
        };
        Ok(self.step)
    }

    /// Hand the roster on once every card has been seen.
    pub fn finish(self) -> Result<Vec<Player>, GameError> {
        if !self.is_complete() {
            return Err(GameError::invalid("start the round", self.step.describe()));
        }
        Ok(self.roster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::roles::assign_with_rng;
    use crate::game::{RoleConfig, WordPair};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn roster(n: usize) -> Vec<Player> {
        let names: Vec<String> = (0..n).map(|i| format!("P{}", i)).collect();
        assign_with_rng(
            &names,
            &WordPair::new("Kopi", "Teh"),
            RoleConfig::default(),
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap()
    }

    #[test]
    fn test_starts_in_handover_with_nothing_visible() {
        let seq = RevealSequencer::new(roster(4));
        assert_eq!(seq.step(), RevealStep::Handover { index: 0 });
        assert!(seq.revealed_card().is_none());
        assert_eq!(seq.progress(), Some((1, 4)));
        assert_eq!(seq.current_player().unwrap().name, "P0");
    }

    #[test]
    fn test_full_pass_in_roster_order() {
        let players = roster(5);
        let expected: Vec<String> = players.iter().map(|p| p.name.clone()).collect();
        let mut seq = RevealSequencer::new(players);
        let mut seen = Vec::new();

        while !seq.is_complete() {
            let card = seq.confirm_ready().unwrap();
            seen.push(card.name.to_string());
            seq.acknowledge().unwrap();
            assert!(seq.revealed_card().is_none());
        }

        assert_eq!(seen, expected);
        assert_eq!(seq.step(), RevealStep::Complete);
        assert_eq!(seq.finish().unwrap().len(), 5);
    }

    #[test]
    fn test_card_shows_own_role_and_word() {
        let players = roster(4);
        let first = players[0].clone();
        let mut seq = RevealSequencer::new(players);

        let card = seq.confirm_ready().unwrap();
        assert_eq!(card.name, first.name);
        assert_eq!(card.role, first.role);
        assert_eq!(card.word, first.word.as_deref());
    }

    #[test]
    fn test_cannot_reveal_twice() {
        let mut seq = RevealSequencer::new(roster(3));
        seq.confirm_ready().unwrap();
        assert!(matches!(
            seq.confirm_ready(),
            Err(GameError::InvalidTransition { .. })
        ));
        assert_eq!(seq.step(), RevealStep::Revealed { index: 0 });
    }

    #[test]
    fn test_cannot_acknowledge_during_handover() {
        let mut seq = RevealSequencer::new(roster(3));
        assert!(seq.acknowledge().is_err());
        assert_eq!(seq.step(), RevealStep::Handover { index: 0 });
    }

    #[test]
    fn test_cannot_advance_past_complete() {
        let mut seq = RevealSequencer::new(roster(3));
        for _ in 0..3 {
            seq.confirm_ready().unwrap();
            seq.acknowledge().unwrap();
        }
        assert!(seq.confirm_ready().is_err());
        assert!(seq.acknowledge().is_err());
        assert!(seq.current_player().is_none());
    }

    #[test]
    fn test_finish_before_complete_fails() {
        let seq = RevealSequencer::new(roster(3));
        assert!(matches!(
            seq.finish(),
            Err(GameError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_announcement_is_carried() {
        let seq = RevealSequencer::new(roster(3)).with_announcement("New game");
        assert_eq!(seq.announcement(), Some("New game"));
    }
}

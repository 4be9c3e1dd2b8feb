//! Game engine: roles, word pairs, the reveal pass and the round loop

pub mod error;
pub mod judge;
pub mod reveal;
pub mod roles;
pub mod round;
pub mod words;

pub use error::{ConfigurationError, GameError};

use rand::Rng;
use std::fmt;

/// Minimum number of players for a match
pub const MIN_PLAYERS: usize = 3;

/// Opaque player identity. Two players may share a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(uuid::Uuid);

impl PlayerId {
    /// Derive an id from the game RNG so seeded matches are fully reproducible.
    pub fn generate_with_rng<R: Rng>(rng: &mut R) -> Self {
        let bytes: [u8; 16] = rng.random();
        PlayerId(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Secret role dealt to a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Civilian,
    Undercover,
    MrWhite,
}

impl Role {
    /// Undercover and Mr. White both count against the civilians.
    pub fn is_impostor(&self) -> bool {
        matches!(self, Role::Undercover | Role::MrWhite)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Civilian => "Civilian",
            Role::Undercover => "Undercover",
            Role::MrWhite => "Mr. White",
        }
    }
}

/// The side that won a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    Loyalists,
    Impostors,
    MrWhite,
}

impl Faction {
    pub fn label(&self) -> &'static str {
        match self {
            Faction::Loyalists => "Civilians",
            Faction::Impostors => "Undercover",
            Faction::MrWhite => "Mr. White",
        }
    }
}

/// A seat at the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    /// `None` exactly when the role is Mr. White
    pub word: Option<String>,
    pub is_eliminated: bool,
}

impl Player {
    pub fn is_active(&self) -> bool {
        !self.is_eliminated
    }
}

/// How many of each impostor role to deal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleConfig {
    pub mr_white_count: usize,
    pub undercover_count: usize,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            mr_white_count: 1,
            undercover_count: 1,
        }
    }
}

impl RoleConfig {
    pub fn impostor_count(&self) -> usize {
        self.mr_white_count + self.undercover_count
    }

    /// Check the counts against a table of `players` seats.
    /// At least one civilian must remain.
    pub fn validate(&self, players: usize) -> Result<(), ConfigurationError> {
        if players < MIN_PLAYERS {
            return Err(ConfigurationError::TooFewPlayers {
                found: players,
                required: MIN_PLAYERS,
            });
        }
        if self.impostor_count() >= players {
            return Err(ConfigurationError::TooManyImpostors {
                impostors: self.impostor_count(),
                players,
            });
        }
        Ok(())
    }
}

/// A common word and its look-alike
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WordPair {
    pub common_word: String,
    pub undercover_word: String,
}

impl WordPair {
    pub fn new(common_word: impl Into<String>, undercover_word: impl Into<String>) -> Self {
        Self {
            common_word: common_word.into(),
            undercover_word: undercover_word.into(),
        }
    }

    /// Build a pair from user input, trimming both words.
    pub fn from_input(common_word: &str, undercover_word: &str) -> Result<Self, ConfigurationError> {
        let common = common_word.trim();
        let undercover = undercover_word.trim();
        if common.is_empty() || undercover.is_empty() {
            return Err(ConfigurationError::BlankWord);
        }
        Ok(Self::new(common, undercover))
    }
}

/// Final outcome of a match, frozen at the moment a win is detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub winning_faction: Faction,
    pub final_roster: Vec<Player>,
}

/// In-place Fisher–Yates: for i from the last index down to 1, swap with
/// a uniform index in `[0, i]`.
pub fn shuffle_with_rng<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

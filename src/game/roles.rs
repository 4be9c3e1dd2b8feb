//! Role assignment
//!
//! Every player starts as a civilian holding the common word. A uniform
//! permutation of seats then hands the first `mr_white_count` seats to
//! Mr. White and the next `undercover_count` seats to the undercover word.
//! The RNG is the only source of variance.

use super::{shuffle_with_rng, ConfigurationError, Player, PlayerId, Role, RoleConfig, WordPair};
use rand::Rng;

/// Deal roles and words to `names`, in name order.
pub fn assign(
    names: &[String],
    words: &WordPair,
    config: RoleConfig,
) -> Result<Vec<Player>, ConfigurationError> {
    assign_with_rng(names, words, config, &mut rand::rng())
}

/// Deal roles using a specific RNG (for testing/seeding).
pub fn assign_with_rng<R: Rng>(
    names: &[String],
    words: &WordPair,
    config: RoleConfig,
    rng: &mut R,
) -> Result<Vec<Player>, ConfigurationError> {
    validate_names(names)?;
    config.validate(names.len())?;

    let mut players: Vec<Player> = names
        .iter()
        .map(|name| Player {
            id: PlayerId::generate_with_rng(rng),
            name: name.trim().to_string(),
            role: Role::Civilian,
            word: Some(words.common_word.clone()),
            is_eliminated: false,
        })
        .collect();

    let mut seats: Vec<usize> = (0..players.len()).collect();
    shuffle_with_rng(&mut seats, rng);

    let (mr_whites, rest) = seats.split_at(config.mr_white_count);
    for &seat in mr_whites {
        players[seat].role = Role::MrWhite;
        players[seat].word = None;
    }
    for &seat in &rest[..config.undercover_count] {
        players[seat].role = Role::Undercover;
        players[seat].word = Some(words.undercover_word.clone());
    }

    tracing::info!(
        players = players.len(),
        mr_white = config.mr_white_count,
        undercover = config.undercover_count,
        "roles assigned"
    );
    Ok(players)
}

/// Reject blank names. Duplicates are allowed; players differ by id.
pub fn validate_names(names: &[String]) -> Result<(), ConfigurationError> {
    if let Some(index) = names.iter().position(|n| n.trim().is_empty()) {
        return Err(ConfigurationError::BlankName { index });
    }
    Ok(())
}

//! Undercover - pass-and-play social deduction party game
//!
//! Civilians share a word, the Undercover hold a look-alike, Mr. White holds
//! nothing. Give clues, vote, and find the impostors.

pub mod app;
pub mod config;
pub mod game;
pub mod tui;

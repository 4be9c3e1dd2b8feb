//! Application state and core logic

pub mod screen;
pub mod session;

pub use screen::{AppCoordinator, Screen, SetupField, SetupForm};
pub use session::{Session, Stage, REPLAY_ANNOUNCEMENT};

//! Lyrics parsing core of the player, plus the config it reads.

pub mod config;
pub mod lyrics;

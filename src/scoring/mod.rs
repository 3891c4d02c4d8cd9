// src/scoring/mod.rs
//
// Pure scoring and leaderboard engine. No I/O, no shared state: handlers
// snapshot rows from the database and call in.

pub mod grouping;
pub mod identity;
pub mod matcher;
pub mod ranking;

pub use grouping::{SubmissionGroup, group_by_identity};
pub use matcher::{Verdict, grade};
pub use ranking::{LeaderboardEntry, rank};

pub mod race_results;
pub mod races;
pub mod scores;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Scoring was requested before a result was recorded for the race.
    #[error("no result has been recorded for race {0}")]
    ResultNotFound(i32),
    /// A placing that pays out has no usable odds value.
    #[error("race {race_id}: odds for rank {rank} are missing or not a valid number")]
    MalformedOdds { race_id: i32, rank: i32 },
    #[error("predictions for race {0} are closed")]
    SubmissionClosed(i32),
    #[error("race {0} does not exist")]
    RaceNotFound(i32),
    #[error("user {0} does not exist")]
    UnknownUser(String),
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("race {0} has no valid start time")]
    InvalidRaceTime(i32),
    #[error("{0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    PersistenceFailure(#[from] diesel::result::Error),
    #[error("could not connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

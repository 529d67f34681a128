use thiserror::Error as ThisError;

/// How a rejection should be surfaced to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing was mutated.
    Validation,
    /// The request conflicts with work already done or in flight; nothing was mutated.
    ConcurrencyGuard,
    /// Anything else. Logged and survived at the scheduler boundary.
    UnexpectedFault,
}

#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum ArenaError {
    #[error("unknown tribute {0}")]
    UnknownTribute(String),
    #[error("tribute {0} has been eliminated")]
    TributeEliminated(String),
    #[error("zone {0} is not active")]
    InvalidZone(String),
    #[error("betting window closed (day={day}, last_day={last_day})")]
    BettingWindowClosed { day: u32, last_day: u32 },
    #[error("insufficient funds (balance={balance}, required={required})")]
    InsufficientFunds { balance: u64, required: u64 },
    #[error("stake amount must be positive")]
    InvalidAmount,
    #[error("name must be 1..={max} characters")]
    InvalidName { max: usize },
    #[error("no game is running")]
    NotRunning,
    #[error("signup is not open")]
    SignupNotOpen,
    #[error("not enough tributes to start (have={have}, required={required})")]
    NotEnoughTributes { have: usize, required: usize },
    #[error("arena is full (max={max})")]
    ArenaFull { max: usize },
    #[error("{0} is already registered")]
    AlreadyRegistered(String),
    #[error("a game is already active")]
    GameAlreadyActive,
    #[error("day already resolved (expected={expected}, actual={actual})")]
    DuplicateResolution { expected: u32, actual: u32 },
    #[error("no active zones left to resolve")]
    NoActiveZones,
}

impl ArenaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArenaError::UnknownTribute(_)
            | ArenaError::TributeEliminated(_)
            | ArenaError::InvalidZone(_)
            | ArenaError::BettingWindowClosed { .. }
            | ArenaError::InsufficientFunds { .. }
            | ArenaError::InvalidAmount
            | ArenaError::InvalidName { .. }
            | ArenaError::NotRunning
            | ArenaError::SignupNotOpen
            | ArenaError::NotEnoughTributes { .. }
            | ArenaError::ArenaFull { .. } => ErrorKind::Validation,
            ArenaError::AlreadyRegistered(_)
            | ArenaError::GameAlreadyActive
            | ArenaError::DuplicateResolution { .. } => ErrorKind::ConcurrencyGuard,
            ArenaError::NoActiveZones => ErrorKind::UnexpectedFault,
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ArenaError::UnknownTribute(_) => "UNKNOWN_TRIBUTE",
            ArenaError::TributeEliminated(_) => "TRIBUTE_ELIMINATED",
            ArenaError::InvalidZone(_) => "INVALID_ZONE",
            ArenaError::BettingWindowClosed { .. } => "BETTING_CLOSED",
            ArenaError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            ArenaError::InvalidAmount => "INVALID_AMOUNT",
            ArenaError::InvalidName { .. } => "INVALID_NAME",
            ArenaError::NotRunning => "NOT_RUNNING",
            ArenaError::SignupNotOpen => "SIGNUP_NOT_OPEN",
            ArenaError::NotEnoughTributes { .. } => "NOT_ENOUGH_TRIBUTES",
            ArenaError::ArenaFull { .. } => "ARENA_FULL",
            ArenaError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            ArenaError::GameAlreadyActive => "GAME_ALREADY_ACTIVE",
            ArenaError::DuplicateResolution { .. } => "DUPLICATE_RESOLUTION",
            ArenaError::NoActiveZones => "NO_ACTIVE_ZONES",
        }
    }
}

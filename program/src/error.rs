use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstruction,

    /// The lottery account was already initialized
    #[error("Lottery already initialized")]
    AlreadyInitialized,

    /// The lottery account has not been initialized
    #[error("Lottery not initialized")]
    NotInitialized,

    /// Initialization parameters are out of range
    #[error("Invalid lottery configuration")]
    InvalidConfig,

    /// Payment is below the entrance fee
    #[error("Not enough fee entered")]
    InsufficientFee,

    /// The lottery is not accepting entries
    #[error("Lottery is not open")]
    NotOpen,

    /// A drawing is not due yet
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment for a request that is not the pending one
    #[error("Unknown randomness request")]
    UnknownRequest,

    /// The prize could not be paid to the winner
    #[error("Prize transfer failed")]
    TransferFailed,

    /// Fulfillment was not signed by the configured authority
    #[error("Fulfillment not signed by the randomness provider")]
    UnauthorizedFulfillment,

    /// Fulfillment carried no random words
    #[error("No random words supplied")]
    MissingRandomWords,

    /// The coordinator did not answer with a request id
    #[error("Invalid coordinator response")]
    InvalidCoordinatorResponse,

    /// Arithmetic overflow
    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}

impl PrintProgramError for LotteryError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

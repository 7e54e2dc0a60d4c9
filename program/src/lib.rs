// VRF Lottery
// A recurring drawing: fixed-fee entries, upkeep-triggered randomness requests,
// payout on fulfillment

pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod randomness;
pub mod state;
pub mod utils;

// Round operations on `state::Lottery`
pub mod entry;
pub mod fulfill;
pub mod request;
pub mod upkeep;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{error::LotteryError, utils::find_lottery_address};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum LotteryInstruction {
    /// Create the lottery account. Called once at deployment.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer funding the lottery account
    /// 1. `[writable]` The lottery account (PDA)
    /// 2. `[]` The VRF coordinator program that will receive randomness requests
    /// 3. `[]` The authority allowed to deliver fulfillments
    /// 4. `[]` The system program
    InitializeLottery {
        /// Minimum payment per entry in lamports
        entrance_fee: u64,
        /// Minimum seconds between drawings
        interval: u64,
        /// Gas lane forwarded to the coordinator
        key_hash: [u8; 32],
        /// Coordinator subscription paying for requests
        subscription_id: u64,
        /// Confirmations the coordinator waits for
        request_confirmations: u16,
        /// Callback budget granted to the coordinator
        callback_gas_limit: u32,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The participant paying the entry
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The system program
    Enter {
        /// Lamports paid, at least the entrance fee
        payment: u64,
    },

    /// Report whether a drawing is due. Publishes a `CheckUpkeepResult` as return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    CheckUpkeep { check_data: Vec<u8> },

    /// Close the round and request randomness if a drawing is due
    ///
    /// Accounts expected:
    /// 0. `[writable]` The lottery account
    /// 1. `[]` The VRF coordinator program
    /// Remaining accounts are forwarded to the coordinator
    PerformUpkeep { perform_data: Vec<u8> },

    /// Deliver the random words for the pending request. Randomness provider only.
    ///
    /// Accounts expected:
    /// 0. `[signer]` The fulfillment authority
    /// 1. `[writable]` The lottery account
    /// 2. `[writable]` The winner receiving the pool
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<u64>,
    },
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| LotteryError::InvalidInstruction.into())
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        borsh::to_vec(self).map_err(|_| LotteryError::InvalidInstruction.into())
    }
}

/// Return data of `CheckUpkeep`
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct CheckUpkeepResult {
    pub upkeep_needed: bool,
    pub perform_data: Vec<u8>,
}

impl CheckUpkeepResult {
    pub fn decode(data: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(data).map_err(|_| ProgramError::InvalidAccountData)
    }
}

/// Create initialize_lottery instruction
#[allow(clippy::too_many_arguments)]
pub fn initialize_lottery(
    program_id: &Pubkey,
    payer: &Pubkey,
    coordinator: &Pubkey,
    fulfillment_authority: &Pubkey,
    entrance_fee: u64,
    interval: u64,
    key_hash: [u8; 32],
    subscription_id: u64,
    request_confirmations: u16,
    callback_gas_limit: u32,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::InitializeLottery {
        entrance_fee,
        interval,
        key_hash,
        subscription_id,
        request_confirmations,
        callback_gas_limit,
    }
    .pack()?;
    let (lottery, _) = find_lottery_address(program_id);

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(lottery, false),
        AccountMeta::new_readonly(*coordinator, false),
        AccountMeta::new_readonly(*fulfillment_authority, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    payment: u64,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::Enter { payment }.pack()?;
    let (lottery, _) = find_lottery_address(program_id);

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(lottery, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, check_data: Vec<u8>) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::CheckUpkeep { check_data }.pack()?;
    let (lottery, _) = find_lottery_address(program_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(lottery, false)],
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    coordinator: &Pubkey,
    perform_data: Vec<u8>,
    remaining_accounts: &[AccountMeta],
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::PerformUpkeep { perform_data }.pack()?;
    let (lottery, _) = find_lottery_address(program_id);

    let mut accounts = vec![
        AccountMeta::new(lottery, false),
        AccountMeta::new_readonly(*coordinator, false),
    ];

    // Add all remaining accounts needed by the coordinator
    accounts.extend_from_slice(remaining_accounts);

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    fulfillment_authority: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<u64>,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack()?;
    let (lottery, _) = find_lottery_address(program_id);

    let accounts = vec![
        AccountMeta::new_readonly(*fulfillment_authority, true),
        AccountMeta::new(lottery, false),
        AccountMeta::new(*winner, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

// Randomness provider seam: the lottery only issues requests and accepts callbacks
use arrayref::array_ref;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::error::LotteryError;

/// Parameters of a single randomness request, passed through to the coordinator unchanged
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

/// Instructions understood by a VRF coordinator program
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorInstruction {
    /// Request random words for the consumer in account 0.
    ///
    /// The coordinator answers with the request id as 8 little-endian bytes of return data
    /// and later invokes `FulfillRandomWords` on the consumer.
    ///
    /// Accounts expected:
    /// 0. `[signer]` The consumer (lottery PDA)
    /// Remaining accounts are coordinator specific
    RequestRandomWords(RandomnessRequest),
}

/// Something that accepts randomness requests and hands back a request id
pub trait RandomnessProvider {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, ProgramError>;
}

/// Requests randomness by CPI into the configured coordinator program
pub struct CoordinatorCpi<'a, 'b, 'info> {
    pub coordinator_program: &'a AccountInfo<'info>,
    pub consumer: &'a AccountInfo<'info>,
    pub remaining_accounts: &'a [AccountInfo<'info>],
    pub consumer_seeds: &'b [&'b [u8]],
}

impl<'a, 'b, 'info> RandomnessProvider for CoordinatorCpi<'a, 'b, 'info> {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, ProgramError> {
        let data = borsh::to_vec(&CoordinatorInstruction::RequestRandomWords(request.clone()))
            .map_err(|_| ProgramError::InvalidInstructionData)?;

        let mut accounts = vec![AccountMeta::new_readonly(*self.consumer.key, true)];
        accounts.extend(self.remaining_accounts.iter().map(|acc| AccountMeta {
            pubkey: *acc.key,
            is_signer: acc.is_signer,
            is_writable: acc.is_writable,
        }));

        let mut account_infos = vec![self.consumer.clone(), self.coordinator_program.clone()];
        account_infos.extend_from_slice(self.remaining_accounts);

        invoke_signed(
            &Instruction {
                program_id: *self.coordinator_program.key,
                accounts,
                data,
            },
            &account_infos,
            &[self.consumer_seeds],
        )?;

        parse_request_id(self.coordinator_program.key, get_return_data())
    }
}

/// Reads the request id out of the coordinator's return data
pub fn parse_request_id(
    coordinator: &Pubkey,
    return_data: Option<(Pubkey, Vec<u8>)>,
) -> Result<u64, ProgramError> {
    let (program_id, data) = return_data.ok_or_else(|| {
        msg!("Coordinator returned no request id");
        LotteryError::InvalidCoordinatorResponse
    })?;

    if program_id != *coordinator {
        msg!("Return data set by {} instead of coordinator {}", program_id, coordinator);
        return Err(LotteryError::InvalidCoordinatorResponse.into());
    }
    if data.len() != 8 {
        msg!("Expected 8 bytes of request id, got {}", data.len());
        return Err(LotteryError::InvalidCoordinatorResponse.into());
    }

    Ok(u64::from_le_bytes(*array_ref![data, 0, 8]))
}

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    error::LotteryError,
    events::LotteryEvent,
    fulfill::PrizeTransfer,
    instruction::{CheckUpkeepResult, LotteryInstruction},
    randomness::CoordinatorCpi,
    state::{Lottery, VrfConfig},
    utils::{self, find_lottery_address, LOTTERY_SEED},
};

/// Program state handler.
///
/// Every handler works on an unpacked copy of the lottery and writes it back only after the
/// operation succeeded; the runtime's write lock on the lottery account serializes callers.
pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::InitializeLottery {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                request_confirmations,
                callback_gas_limit,
            } => {
                msg!("Instruction: Initialize Lottery");
                Self::process_initialize_lottery(
                    program_id,
                    accounts,
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    request_confirmations,
                    callback_gas_limit,
                )
            }
            LotteryInstruction::Enter { payment } => {
                msg!("Instruction: Enter");
                Self::process_enter(program_id, accounts, payment)
            }
            LotteryInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(program_id, accounts, &check_data)
            }
            LotteryInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(program_id, accounts, &perform_data)
            }
            LotteryInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(program_id, accounts, request_id, &random_words)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_initialize_lottery(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        entrance_fee: u64,
        interval: u64,
        key_hash: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_gas_limit: u32,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let fulfillment_authority_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_lottery, bump) = find_lottery_address(program_id);
        if *lottery_info.key != expected_lottery {
            msg!("Invalid lottery account address");
            return Err(ProgramError::InvalidArgument);
        }

        if lottery_info.owner == program_id {
            msg!("Lottery account is already initialized");
            return Err(LotteryError::AlreadyInitialized.into());
        }

        if request_confirmations == 0 || callback_gas_limit == 0 {
            msg!(
                "Request confirmations ({}) and callback gas limit ({}) must be non-zero",
                request_confirmations,
                callback_gas_limit
            );
            return Err(LotteryError::InvalidConfig.into());
        }

        let now = Clock::get()?.unix_timestamp;
        let vrf = VrfConfig {
            coordinator: *coordinator_info.key,
            fulfillment_authority: *fulfillment_authority_info.key,
            key_hash,
            subscription_id,
            request_confirmations,
            callback_gas_limit,
        };
        let lottery = Lottery::new(bump, entrance_fee, interval, vrf, now);

        let space = lottery.packed_len();
        let rent_lamports = Rent::get()?.minimum_balance(space);
        let bump_seed = [bump];
        let lottery_seeds: &[&[u8]] = &[LOTTERY_SEED, &bump_seed];
        if lottery_info.lamports() == 0 {
            invoke_signed(
                &system_instruction::create_account(
                    payer_info.key,
                    lottery_info.key,
                    rent_lamports,
                    space as u64,
                    program_id,
                ),
                &[
                    payer_info.clone(),
                    lottery_info.clone(),
                    system_program_info.clone(),
                ],
                &[lottery_seeds],
            )?;
        } else {
            // create_account refuses a funded address, so top up and claim it instead
            let top_up = rent_lamports.saturating_sub(lottery_info.lamports());
            if top_up > 0 {
                invoke(
                    &system_instruction::transfer(payer_info.key, lottery_info.key, top_up),
                    &[
                        payer_info.clone(),
                        lottery_info.clone(),
                        system_program_info.clone(),
                    ],
                )?;
            }
            invoke_signed(
                &system_instruction::allocate(lottery_info.key, space as u64),
                &[lottery_info.clone(), system_program_info.clone()],
                &[lottery_seeds],
            )?;
            invoke_signed(
                &system_instruction::assign(lottery_info.key, program_id),
                &[lottery_info.clone(), system_program_info.clone()],
                &[lottery_seeds],
            )?;
        }

        lottery.pack(&mut lottery_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: EntranceFee={} Interval={}s Coordinator={} FulfillmentAuthority={}",
            entrance_fee,
            interval,
            coordinator_info.key,
            fulfillment_authority_info.key
        );
        Ok(())
    }

    fn process_enter(program_id: &Pubkey, accounts: &[AccountInfo], payment: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut lottery = Self::load_lottery(program_id, lottery_info)?;
        let event = lottery.enter(*player_info.key, payment)?;

        // Grow the account for the new player; the player covers the extra rent
        let new_len = lottery.packed_len();
        if new_len > lottery_info.data_len() {
            lottery_info.realloc(new_len, false)?;
        }
        let required = Rent::get()?
            .minimum_balance(lottery_info.data_len())
            .checked_add(lottery.pooled_funds())
            .ok_or(LotteryError::Overflow)?;
        let funded = lottery_info
            .lamports()
            .checked_add(payment)
            .ok_or(LotteryError::Overflow)?;
        let rent_top_up = required.saturating_sub(funded);
        let amount = payment
            .checked_add(rent_top_up)
            .ok_or(LotteryError::Overflow)?;

        msg!(
            "Transferring {} lamports ({} SOL entry, {} rent) to the lottery",
            amount,
            utils::lamports_to_sol(payment),
            rent_top_up
        );
        invoke(
            &system_instruction::transfer(player_info.key, lottery_info.key, amount),
            &[
                player_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        lottery.pack(&mut lottery_info.data.borrow_mut())?;
        LotteryEvent::from(event).emit();
        Ok(())
    }

    fn process_check_upkeep(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        check_data: &[u8],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;

        let lottery = Self::load_lottery(program_id, lottery_info)?;
        let now = Clock::get()?.unix_timestamp;

        let (upkeep_needed, perform_data) = lottery.check_upkeep(now, check_data);
        msg!(
            "Upkeep needed: {} (players={}, pooled={})",
            upkeep_needed,
            lottery.number_of_players(),
            lottery.pooled_funds()
        );

        let result = CheckUpkeepResult {
            upkeep_needed,
            perform_data,
        };
        let data = borsh::to_vec(&result).map_err(|_| ProgramError::InvalidArgument)?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        perform_data: &[u8],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let remaining_accounts = account_info_iter.as_slice();

        let mut lottery = Self::load_lottery(program_id, lottery_info)?;

        if *coordinator_info.key != lottery.vrf_config().coordinator {
            msg!(
                "Coordinator {} does not match the configured {}",
                coordinator_info.key,
                lottery.vrf_config().coordinator
            );
            return Err(ProgramError::InvalidArgument);
        }

        let now = Clock::get()?.unix_timestamp;
        let bump_seed = [lottery.bump()];
        let consumer_seeds: &[&[u8]] = &[LOTTERY_SEED, &bump_seed];
        let mut provider = CoordinatorCpi {
            coordinator_program: coordinator_info,
            consumer: lottery_info,
            remaining_accounts,
            consumer_seeds,
        };

        let event = lottery.perform_upkeep(now, perform_data, &mut provider)?;

        lottery.pack(&mut lottery_info.data.borrow_mut())?;
        LotteryEvent::from(event).emit();
        Ok(())
    }

    fn process_fulfill_random_words(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[u64],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Fulfillment authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut lottery = Self::load_lottery(program_id, lottery_info)?;

        if *authority_info.key != lottery.vrf_config().fulfillment_authority {
            msg!("Fulfillment from {} rejected", authority_info.key);
            return Err(LotteryError::UnauthorizedFulfillment.into());
        }

        let now = Clock::get()?.unix_timestamp;
        let rent = Rent::get()?;
        let mut payout = LamportPayout {
            lottery_info,
            winner_info,
            rent_exempt_minimum: rent.minimum_balance(lottery_info.data_len()),
            winner_rent_minimum: rent.minimum_balance(winner_info.data_len()),
        };

        let event = lottery.fulfill_random_words(request_id, random_words, now, &mut payout)?;

        lottery.pack(&mut lottery_info.data.borrow_mut())?;
        LotteryEvent::from(event).emit();
        Ok(())
    }

    fn load_lottery(program_id: &Pubkey, lottery_info: &AccountInfo) -> Result<Lottery, ProgramError> {
        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let (expected_lottery, _) = find_lottery_address(program_id);
        if *lottery_info.key != expected_lottery {
            msg!("Invalid lottery account address");
            return Err(ProgramError::InvalidArgument);
        }

        Lottery::unpack(&lottery_info.data.borrow())
    }
}

/// Pays the prize by moving lamports out of the program-owned lottery account
struct LamportPayout<'a, 'info> {
    lottery_info: &'a AccountInfo<'info>,
    winner_info: &'a AccountInfo<'info>,
    rent_exempt_minimum: u64,
    /// The runtime rejects a credited account left holding less than this
    winner_rent_minimum: u64,
}

impl PrizeTransfer for LamportPayout<'_, '_> {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        if self.winner_info.key != winner {
            msg!(
                "Winner account {} does not match drawn winner {}",
                self.winner_info.key,
                winner
            );
            return Err(ProgramError::InvalidArgument);
        }
        if !self.winner_info.is_writable {
            msg!("Winner account must be writable");
            return Err(ProgramError::InvalidArgument);
        }

        let remaining = self
            .lottery_info
            .lamports()
            .checked_sub(amount)
            .ok_or(ProgramError::InsufficientFunds)?;
        if remaining < self.rent_exempt_minimum {
            msg!("Payout would leave the lottery below rent exemption");
            return Err(ProgramError::InsufficientFunds);
        }
        let credited = self
            .winner_info
            .lamports()
            .checked_add(amount)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        if credited < self.winner_rent_minimum {
            msg!(
                "Winner {} would hold {} lamports, below the rent-exempt minimum of {}",
                self.winner_info.key,
                credited,
                self.winner_rent_minimum
            );
            return Err(ProgramError::AccountNotRentExempt);
        }

        **self.lottery_info.try_borrow_mut_lamports()? = remaining;
        **self.winner_info.try_borrow_mut_lamports()? = credited;

        msg!(
            "Paid {} SOL to {}",
            utils::lamports_to_sol(amount),
            self.winner_info.key
        );
        Ok(())
    }
}

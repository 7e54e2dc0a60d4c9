use solana_program::{msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    error::LotteryError,
    events::EntryRecorded,
    state::{Lottery, LotteryState},
};

impl Lottery {
    /// Record `player` as an entrant of the current round for `payment` lamports.
    ///
    /// Fails with `InsufficientFee` below the entrance fee and with `NotOpen` while a
    /// drawing is in flight. Moving the lamports is the caller's job.
    pub fn enter(&mut self, player: Pubkey, payment: u64) -> Result<EntryRecorded, ProgramError> {
        if payment < self.entrance_fee {
            msg!(
                "Payment of {} lamports is below the entrance fee of {}",
                payment,
                self.entrance_fee
            );
            return Err(LotteryError::InsufficientFee.into());
        }
        if self.state != LotteryState::Open {
            msg!("Lottery is not open for entries");
            return Err(LotteryError::NotOpen.into());
        }

        let pooled_funds = self
            .pooled_funds
            .checked_add(payment)
            .ok_or(LotteryError::Overflow)?;

        self.players.push(player);
        self.pooled_funds = pooled_funds;

        Ok(EntryRecorded {
            round: self.round,
            player,
            payment,
        })
    }
}

use solana_program::{clock::UnixTimestamp, msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    error::LotteryError,
    events::WinnerPicked,
    state::{Lottery, LotteryState},
    utils,
};

/// Pays the prize out of the pool
pub trait PrizeTransfer {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError>;
}

impl Lottery {
    /// Resolve the pending request: pick the winner, pay the whole pool and open the next
    /// round.
    ///
    /// Callers must already have checked that the fulfillment came from the trusted
    /// provider. Anything but the pending request id fails with `UnknownRequest`. If the
    /// payout fails the lottery is left exactly as it was and `TransferFailed` is returned.
    pub fn fulfill_random_words<T: PrizeTransfer>(
        &mut self,
        request_id: u64,
        random_words: &[u64],
        now: UnixTimestamp,
        payout: &mut T,
    ) -> Result<WinnerPicked, ProgramError> {
        let pending = match (self.state, self.pending_request) {
            (LotteryState::Closing, Some(pending)) if pending.request_id == request_id => pending,
            _ => {
                msg!("No pending request with id {}", request_id);
                return Err(LotteryError::UnknownRequest.into());
            }
        };

        let random_word = *random_words
            .first()
            .ok_or(LotteryError::MissingRandomWords)?;

        // Entries are blocked while closing, so the snapshot must still match
        if self.players.is_empty()
            || pending.player_count as usize != self.players.len()
            || pending.pooled_funds != self.pooled_funds
        {
            msg!("Round state diverged from request {}", request_id);
            return Err(ProgramError::InvalidAccountData);
        }

        let index = utils::winner_index(random_word, self.players.len());
        let winner = self.players[index];
        let prize = self.pooled_funds;
        let next_round = pending.round.checked_add(1).ok_or(LotteryError::Overflow)?;
        msg!("Winning index {} of {} players", index, self.players.len());

        payout.transfer(&winner, prize).map_err(|err| {
            msg!("Paying {} lamports to {} failed: {}", prize, winner, err);
            ProgramError::from(LotteryError::TransferFailed)
        })?;

        self.recent_winner = Some(winner);
        self.players.clear();
        self.last_timestamp = now;
        self.state = LotteryState::Open;
        self.pending_request = None;
        self.pooled_funds = 0;
        self.round = next_round;

        Ok(WinnerPicked {
            round: pending.round,
            winner,
            prize,
        })
    }
}

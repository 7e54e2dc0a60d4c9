use solana_program::{clock::UnixTimestamp, msg, program_error::ProgramError};

use crate::{
    error::LotteryError,
    events::RequestedRandomness,
    randomness::{RandomnessProvider, RandomnessRequest},
    state::{Lottery, LotteryState, PendingRequest, NUM_WORDS},
};

impl Lottery {
    /// Close the round and ask `provider` for randomness.
    ///
    /// The upkeep predicate is evaluated again here, so a stale `check_upkeep` answer or a
    /// second poller racing the first gets `UpkeepNotNeeded`. `_perform_data` is accepted
    /// for interface compatibility and ignored. State only changes once the provider has
    /// handed back a request id.
    pub fn perform_upkeep<P: RandomnessProvider>(
        &mut self,
        now: UnixTimestamp,
        _perform_data: &[u8],
        provider: &mut P,
    ) -> Result<RequestedRandomness, ProgramError> {
        if !self.upkeep_needed(now) {
            msg!(
                "Upkeep not needed: state={:?} players={} pooled={} elapsed={:?} interval={}",
                self.state,
                self.players.len(),
                self.pooled_funds,
                self.elapsed(now),
                self.interval
            );
            return Err(LotteryError::UpkeepNotNeeded.into());
        }

        let player_count = u32::try_from(self.players.len()).map_err(|_| LotteryError::Overflow)?;
        let request = RandomnessRequest {
            key_hash: self.vrf.key_hash,
            subscription_id: self.vrf.subscription_id,
            request_confirmations: self.vrf.request_confirmations,
            callback_gas_limit: self.vrf.callback_gas_limit,
            num_words: NUM_WORDS,
        };
        let request_id = provider.request_random_words(&request)?;

        self.state = LotteryState::Closing;
        self.pending_request = Some(PendingRequest {
            request_id,
            round: self.round,
            requested_at: now,
            player_count,
            pooled_funds: self.pooled_funds,
        });

        Ok(RequestedRandomness {
            round: self.round,
            request_id,
        })
    }
}

use solana_program::clock::UnixTimestamp;

use crate::state::{Lottery, LotteryState};

impl Lottery {
    /// Whether a drawing is due at `now`. Never mutates state; `check_data` is handed back
    /// unchanged as the perform data.
    pub fn check_upkeep(&self, now: UnixTimestamp, check_data: &[u8]) -> (bool, Vec<u8>) {
        (self.upkeep_needed(now), check_data.to_vec())
    }

    pub(crate) fn upkeep_needed(&self, now: UnixTimestamp) -> bool {
        let is_open = self.state == LotteryState::Open;
        let time_passed = self
            .elapsed(now)
            .map_or(false, |elapsed| elapsed >= self.interval);
        let has_players = !self.players.is_empty();
        let has_balance = self.pooled_funds > 0;
        is_open && time_passed && has_players && has_balance
    }

    /// Seconds since the last drawing, `None` if the clock reads earlier than that
    pub(crate) fn elapsed(&self, now: UnixTimestamp) -> Option<u64> {
        now.checked_sub(self.last_timestamp)
            .and_then(|elapsed| u64::try_from(elapsed).ok())
    }
}

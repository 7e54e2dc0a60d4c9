use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

/// A participant joined the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct EntryRecorded {
    pub round: u64,
    pub player: Pubkey,
    pub payment: u64,
}

/// The round closed and randomness was requested
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RequestedRandomness {
    pub round: u64,
    pub request_id: u64,
}

/// A winner was paid and the next round opened
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct WinnerPicked {
    pub round: u64,
    pub winner: Pubkey,
    pub prize: u64,
}

/// Notifications logged by the program, borsh-encoded through `sol_log_data`
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum LotteryEvent {
    EntryRecorded(EntryRecorded),
    RequestedRandomness(RequestedRandomness),
    WinnerPicked(WinnerPicked),
}

impl LotteryEvent {
    pub fn emit(&self) {
        match self {
            LotteryEvent::EntryRecorded(event) => msg!(
                "EntryRecorded: round={} player={} payment={}",
                event.round,
                event.player,
                event.payment
            ),
            LotteryEvent::RequestedRandomness(event) => msg!(
                "RequestedRandomness: round={} request_id={}",
                event.round,
                event.request_id
            ),
            LotteryEvent::WinnerPicked(event) => msg!(
                "WinnerPicked: round={} winner={} prize={}",
                event.round,
                event.winner,
                event.prize
            ),
        }

        match borsh::to_vec(self) {
            Ok(data) => sol_log_data(&[&data]),
            Err(err) => msg!("Failed to encode event: {}", err),
        }
    }
}

impl From<EntryRecorded> for LotteryEvent {
    fn from(event: EntryRecorded) -> Self {
        LotteryEvent::EntryRecorded(event)
    }
}

impl From<RequestedRandomness> for LotteryEvent {
    fn from(event: RequestedRandomness) -> Self {
        LotteryEvent::RequestedRandomness(event)
    }
}

impl From<WinnerPicked> for LotteryEvent {
    fn from(event: WinnerPicked) -> Self {
        LotteryEvent::WinnerPicked(event)
    }
}

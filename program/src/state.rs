use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::IsInitialized,
    pubkey::{Pubkey, PUBKEY_BYTES},
};
use std::convert::TryFrom;

use crate::error::LotteryError;

/// Number of random words requested per drawing
pub const NUM_WORDS: u32 = 1;

/// Phase of the current round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LotteryState {
    /// Accepting entries
    Open,
    /// A randomness request is outstanding
    Closing,
}

impl TryFrom<u8> for LotteryState {
    type Error = ProgramError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(LotteryState::Open),
            1 => Ok(LotteryState::Closing),
            _ => Err(ProgramError::InvalidAccountData),
        }
    }
}

impl From<LotteryState> for u8 {
    fn from(state: LotteryState) -> Self {
        match state {
            LotteryState::Open => 0,
            LotteryState::Closing => 1,
        }
    }
}

/// Randomness provider routing, fixed at initialization and forwarded unchanged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VrfConfig {
    /// Coordinator program that receives randomness requests
    pub coordinator: Pubkey,
    /// Only this key may deliver fulfillments
    pub fulfillment_authority: Pubkey,
    /// Gas lane / throughput lane selector
    pub key_hash: [u8; 32],
    /// Subscription funding the requests
    pub subscription_id: u64,
    /// Confirmation depth the coordinator waits before answering
    pub request_confirmations: u16,
    /// Budget the coordinator may spend on the callback
    pub callback_gas_limit: u32,
}

/// The outstanding randomness request and the round it closes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    pub round: u64,
    pub requested_at: UnixTimestamp,
    pub player_count: u32,
    pub pooled_funds: u64,
}

/// Lottery account data
#[derive(Clone, Debug, PartialEq)]
pub struct Lottery {
    pub(crate) is_initialized: bool,
    pub(crate) bump: u8,
    pub(crate) state: LotteryState,
    /// Minimum payment in lamports
    pub(crate) entrance_fee: u64,
    /// Minimum seconds between drawings
    pub(crate) interval: u64,
    /// Time of the last drawing, or of initialization
    pub(crate) last_timestamp: UnixTimestamp,
    /// Lamports collected since the last drawing
    pub(crate) pooled_funds: u64,
    /// Number of completed drawings
    pub(crate) round: u64,
    pub(crate) recent_winner: Option<Pubkey>,
    /// Set exactly while `state == Closing`
    pub(crate) pending_request: Option<PendingRequest>,
    pub(crate) vrf: VrfConfig,
    pub(crate) players: Vec<Pubkey>,
}

impl IsInitialized for Lottery {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Lottery {
    /// Fixed part of the account; players follow as 32-byte keys
    pub const HEADER_LEN: usize =
        1 + 1 + 1 + 8 + 8 + 8 + 8 + 8 + 1 + 32 + 1 + 8 + 8 + 8 + 4 + 8 + 32 + 32 + 32 + 8 + 2 + 4 + 4;

    pub fn new(
        bump: u8,
        entrance_fee: u64,
        interval: u64,
        vrf: VrfConfig,
        now: UnixTimestamp,
    ) -> Self {
        Self {
            is_initialized: true,
            bump,
            state: LotteryState::Open,
            entrance_fee,
            interval,
            last_timestamp: now,
            pooled_funds: 0,
            round: 0,
            recent_winner: None,
            pending_request: None,
            vrf,
            players: Vec::new(),
        }
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn state(&self) -> LotteryState {
        self.state
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.players.get(index)
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn latest_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn pooled_funds(&self) -> u64 {
        self.pooled_funds
    }

    pub fn pending_request(&self) -> Option<&PendingRequest> {
        self.pending_request.as_ref()
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn bump(&self) -> u8 {
        self.bump
    }

    pub fn vrf_config(&self) -> &VrfConfig {
        &self.vrf
    }

    pub fn request_confirmations(&self) -> u16 {
        self.vrf.request_confirmations
    }

    pub const fn num_words() -> u32 {
        NUM_WORDS
    }

    /// Bytes needed to store this lottery with its current players
    pub fn packed_len(&self) -> usize {
        Self::HEADER_LEN + self.players.len() * PUBKEY_BYTES
    }

    pub fn unpack(src: &[u8]) -> Result<Self, ProgramError> {
        if src.len() < Self::HEADER_LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        let header = array_ref![src, 0, Lottery::HEADER_LEN];
        let (
            is_initialized,
            bump,
            state,
            entrance_fee,
            interval,
            last_timestamp,
            pooled_funds,
            round,
            has_winner,
            recent_winner,
            has_pending,
            request_id,
            pending_round,
            requested_at,
            pending_player_count,
            pending_pooled_funds,
            coordinator,
            fulfillment_authority,
            key_hash,
            subscription_id,
            request_confirmations,
            callback_gas_limit,
            player_count,
        ) = array_refs![
            header, 1, 1, 1, 8, 8, 8, 8, 8, 1, 32, 1, 8, 8, 8, 4, 8, 32, 32, 32, 8, 2, 4, 4
        ];

        if is_initialized[0] == 0 {
            return Err(LotteryError::NotInitialized.into());
        }

        let state = LotteryState::try_from(state[0])?;
        let pending_request = match has_pending[0] {
            0 => None,
            1 => Some(PendingRequest {
                request_id: u64::from_le_bytes(*request_id),
                round: u64::from_le_bytes(*pending_round),
                requested_at: UnixTimestamp::from_le_bytes(*requested_at),
                player_count: u32::from_le_bytes(*pending_player_count),
                pooled_funds: u64::from_le_bytes(*pending_pooled_funds),
            }),
            _ => return Err(ProgramError::InvalidAccountData),
        };
        // Closing and a pending request go together or not at all
        if (state == LotteryState::Closing) != pending_request.is_some() {
            return Err(ProgramError::InvalidAccountData);
        }

        let recent_winner = match has_winner[0] {
            0 => None,
            1 => Some(Pubkey::new_from_array(*recent_winner)),
            _ => return Err(ProgramError::InvalidAccountData),
        };

        let player_count = u32::from_le_bytes(*player_count) as usize;
        let players_len = player_count
            .checked_mul(PUBKEY_BYTES)
            .ok_or(ProgramError::InvalidAccountData)?;
        let players_src = src[Self::HEADER_LEN..]
            .get(..players_len)
            .ok_or(ProgramError::InvalidAccountData)?;
        let players = players_src
            .chunks_exact(PUBKEY_BYTES)
            .map(|key| Pubkey::new_from_array(*array_ref![key, 0, PUBKEY_BYTES]))
            .collect();

        Ok(Lottery {
            is_initialized: true,
            bump: bump[0],
            state,
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: u64::from_le_bytes(*interval),
            last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
            pooled_funds: u64::from_le_bytes(*pooled_funds),
            round: u64::from_le_bytes(*round),
            recent_winner,
            pending_request,
            vrf: VrfConfig {
                coordinator: Pubkey::new_from_array(*coordinator),
                fulfillment_authority: Pubkey::new_from_array(*fulfillment_authority),
                key_hash: *key_hash,
                subscription_id: u64::from_le_bytes(*subscription_id),
                request_confirmations: u16::from_le_bytes(*request_confirmations),
                callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            },
            players,
        })
    }

    pub fn pack(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        if dst.len() < self.packed_len() {
            return Err(ProgramError::AccountDataTooSmall);
        }
        let player_count = u32::try_from(self.players.len()).map_err(|_| LotteryError::Overflow)?;

        let (header_dst, players_dst) = dst.split_at_mut(Self::HEADER_LEN);
        let header_dst = array_mut_ref![header_dst, 0, Lottery::HEADER_LEN];
        let (
            is_initialized_dst,
            bump_dst,
            state_dst,
            entrance_fee_dst,
            interval_dst,
            last_timestamp_dst,
            pooled_funds_dst,
            round_dst,
            has_winner_dst,
            recent_winner_dst,
            has_pending_dst,
            request_id_dst,
            pending_round_dst,
            requested_at_dst,
            pending_player_count_dst,
            pending_pooled_funds_dst,
            coordinator_dst,
            fulfillment_authority_dst,
            key_hash_dst,
            subscription_id_dst,
            request_confirmations_dst,
            callback_gas_limit_dst,
            player_count_dst,
        ) = mut_array_refs![
            header_dst, 1, 1, 1, 8, 8, 8, 8, 8, 1, 32, 1, 8, 8, 8, 4, 8, 32, 32, 32, 8, 2, 4, 4
        ];

        is_initialized_dst[0] = self.is_initialized as u8;
        bump_dst[0] = self.bump;
        state_dst[0] = self.state.into();
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        *last_timestamp_dst = self.last_timestamp.to_le_bytes();
        *pooled_funds_dst = self.pooled_funds.to_le_bytes();
        *round_dst = self.round.to_le_bytes();

        match self.recent_winner {
            Some(winner) => {
                has_winner_dst[0] = 1;
                recent_winner_dst.copy_from_slice(winner.as_ref());
            }
            None => {
                has_winner_dst[0] = 0;
                *recent_winner_dst = [0u8; 32];
            }
        }

        let pending = self.pending_request.unwrap_or(PendingRequest {
            request_id: 0,
            round: 0,
            requested_at: 0,
            player_count: 0,
            pooled_funds: 0,
        });
        has_pending_dst[0] = self.pending_request.is_some() as u8;
        *request_id_dst = pending.request_id.to_le_bytes();
        *pending_round_dst = pending.round.to_le_bytes();
        *requested_at_dst = pending.requested_at.to_le_bytes();
        *pending_player_count_dst = pending.player_count.to_le_bytes();
        *pending_pooled_funds_dst = pending.pooled_funds.to_le_bytes();

        coordinator_dst.copy_from_slice(self.vrf.coordinator.as_ref());
        fulfillment_authority_dst.copy_from_slice(self.vrf.fulfillment_authority.as_ref());
        *key_hash_dst = self.vrf.key_hash;
        *subscription_id_dst = self.vrf.subscription_id.to_le_bytes();
        *request_confirmations_dst = self.vrf.request_confirmations.to_le_bytes();
        *callback_gas_limit_dst = self.vrf.callback_gas_limit.to_le_bytes();
        *player_count_dst = player_count.to_le_bytes();

        for (slot, player) in players_dst
            .chunks_exact_mut(PUBKEY_BYTES)
            .zip(self.players.iter())
        {
            slot.copy_from_slice(player.as_ref());
        }

        Ok(())
    }
}

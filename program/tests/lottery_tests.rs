use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use vrf_lottery::{
    error::LotteryError,
    events::{EntryRecorded, RequestedRandomness, WinnerPicked},
    fulfill::PrizeTransfer,
    randomness::{RandomnessProvider, RandomnessRequest},
    state::{Lottery, LotteryState, VrfConfig},
};

const ENTRANCE_FEE: u64 = 1_000;
const INTERVAL: u64 = 30;
const START: i64 = 1_700_000_000;

// Hands out sequential ids and remembers what it was asked for
#[derive(Default)]
struct MockCoordinator {
    next_id: u64,
    requests: Vec<RandomnessRequest>,
    fail: bool,
}

impl RandomnessProvider for MockCoordinator {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, ProgramError> {
        if self.fail {
            return Err(ProgramError::Custom(999));
        }
        self.next_id += 1;
        self.requests.push(request.clone());
        Ok(self.next_id)
    }
}

#[derive(Default)]
struct MockBank {
    paid: Vec<(Pubkey, u64)>,
    fail: bool,
}

impl MockBank {
    fn balance_of(&self, key: &Pubkey) -> u64 {
        self.paid
            .iter()
            .filter(|(to, _)| to == key)
            .map(|(_, amount)| amount)
            .sum()
    }
}

impl PrizeTransfer for MockBank {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        if self.fail {
            return Err(ProgramError::InsufficientFunds);
        }
        self.paid.push((*winner, amount));
        Ok(())
    }
}

fn vrf_config() -> VrfConfig {
    VrfConfig {
        coordinator: Pubkey::new_unique(),
        fulfillment_authority: Pubkey::new_unique(),
        key_hash: [0xab; 32],
        subscription_id: 588,
        request_confirmations: 3,
        callback_gas_limit: 500_000,
    }
}

fn new_lottery() -> Lottery {
    Lottery::new(255, ENTRANCE_FEE, INTERVAL, vrf_config(), START)
}

/// Lottery with one entry per player, already in Closing with the returned request id
fn closing_lottery(players: &[Pubkey], coordinator: &mut MockCoordinator) -> (Lottery, u64) {
    let mut lottery = new_lottery();
    for player in players {
        lottery.enter(*player, ENTRANCE_FEE).unwrap();
    }
    let requested = lottery
        .perform_upkeep(START + INTERVAL as i64 + 1, &[], coordinator)
        .unwrap();
    (lottery, requested.request_id)
}

#[test]
fn test_new_lottery_is_open_and_empty() {
    let lottery = new_lottery();
    assert_eq!(lottery.state(), LotteryState::Open);
    assert_eq!(lottery.entrance_fee(), ENTRANCE_FEE);
    assert_eq!(lottery.interval(), INTERVAL);
    assert_eq!(lottery.number_of_players(), 0);
    assert_eq!(lottery.pooled_funds(), 0);
    assert_eq!(lottery.latest_timestamp(), START);
    assert_eq!(lottery.recent_winner(), None);
    assert_eq!(lottery.pending_request(), None);
    assert_eq!(Lottery::num_words(), 1);
    assert_eq!(lottery.request_confirmations(), 3);
}

#[test]
fn test_enter_below_fee_changes_nothing() {
    let mut lottery = new_lottery();
    let before = lottery.clone();

    for payment in [0, 1, 500, ENTRANCE_FEE - 1] {
        assert_eq!(
            lottery.enter(Pubkey::new_unique(), payment),
            Err(LotteryError::InsufficientFee.into())
        );
    }
    assert_eq!(lottery, before);
}

#[test]
fn test_enter_records_players_in_order() {
    let mut lottery = new_lottery();
    let a = Pubkey::new_unique();
    let b = Pubkey::new_unique();

    let event = lottery.enter(a, ENTRANCE_FEE).unwrap();
    assert_eq!(
        event,
        EntryRecorded {
            round: 0,
            player: a,
            payment: ENTRANCE_FEE,
        }
    );
    lottery.enter(b, ENTRANCE_FEE * 2).unwrap();
    lottery.enter(a, ENTRANCE_FEE).unwrap();

    assert_eq!(lottery.players(), &[a, b, a]);
    assert_eq!(lottery.player(1), Some(&b));
    assert_eq!(lottery.player(3), None);
    assert_eq!(lottery.pooled_funds(), ENTRANCE_FEE * 4);
}

#[test]
fn test_enter_while_closing_is_rejected() {
    let mut coordinator = MockCoordinator::default();
    let (mut lottery, _) = closing_lottery(&[Pubkey::new_unique()], &mut coordinator);
    let before = lottery.clone();

    assert_eq!(
        lottery.enter(Pubkey::new_unique(), ENTRANCE_FEE),
        Err(LotteryError::NotOpen.into())
    );
    // The fee is checked before the state
    assert_eq!(
        lottery.enter(Pubkey::new_unique(), 1),
        Err(LotteryError::InsufficientFee.into())
    );
    assert_eq!(lottery, before);
}

#[test]
fn test_enter_pool_overflow() {
    let mut lottery = new_lottery();
    lottery.enter(Pubkey::new_unique(), u64::MAX).unwrap();
    let before = lottery.clone();

    assert_eq!(
        lottery.enter(Pubkey::new_unique(), ENTRANCE_FEE),
        Err(LotteryError::Overflow.into())
    );
    assert_eq!(lottery, before);
}

#[test]
fn test_check_upkeep_conditions() {
    let due = START + INTERVAL as i64;
    let mut lottery = new_lottery();

    // No players, no funds
    assert!(!lottery.check_upkeep(due + 100, &[]).0);

    lottery.enter(Pubkey::new_unique(), ENTRANCE_FEE).unwrap();

    // Time boundary
    assert!(!lottery.check_upkeep(START, &[]).0);
    assert!(!lottery.check_upkeep(due - 1, &[]).0);
    assert!(lottery.check_upkeep(due, &[]).0);
    assert!(lottery.check_upkeep(due + 1, &[]).0);

    // Clock running behind the last drawing
    assert!(!lottery.check_upkeep(START - 1, &[]).0);

    // Closing
    let mut coordinator = MockCoordinator::default();
    lottery.perform_upkeep(due, &[], &mut coordinator).unwrap();
    assert!(!lottery.check_upkeep(due + 100, &[]).0);
}

#[test]
fn test_check_upkeep_needs_funds_and_players() {
    let due = START + INTERVAL as i64;

    // A zero entrance fee lets a player in without funding the pool
    let mut free = Lottery::new(255, 0, INTERVAL, vrf_config(), START);
    free.enter(Pubkey::new_unique(), 0).unwrap();
    assert_eq!(free.number_of_players(), 1);
    assert!(!free.check_upkeep(due, &[]).0);

    free.enter(Pubkey::new_unique(), 1).unwrap();
    assert!(free.check_upkeep(due, &[]).0);
}

#[test]
fn test_check_upkeep_passes_data_through() {
    let lottery = new_lottery();
    let before = lottery.clone();
    let (needed, perform_data) = lottery.check_upkeep(START, b"opaque");
    assert!(!needed);
    assert_eq!(perform_data, b"opaque".to_vec());
    assert_eq!(lottery, before);
}

#[test]
fn test_perform_upkeep_not_needed() {
    let mut coordinator = MockCoordinator::default();
    let mut lottery = new_lottery();
    let before = lottery.clone();

    // Too early and nobody entered
    assert_eq!(
        lottery.perform_upkeep(START + 10, &[], &mut coordinator),
        Err(LotteryError::UpkeepNotNeeded.into())
    );

    lottery.enter(Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    assert_eq!(
        lottery.perform_upkeep(START + INTERVAL as i64 - 1, &[], &mut coordinator),
        Err(LotteryError::UpkeepNotNeeded.into())
    );
    assert_eq!(lottery.state(), LotteryState::Open);
    assert!(coordinator.requests.is_empty());
    assert_eq!(before.state(), lottery.state());
}

#[test]
fn test_perform_upkeep_requests_randomness() {
    let mut coordinator = MockCoordinator::default();
    let mut lottery = new_lottery();
    let player = Pubkey::new_unique();
    lottery.enter(player, ENTRANCE_FEE).unwrap();

    let now = START + INTERVAL as i64 + 1;
    let event = lottery.perform_upkeep(now, b"ignored", &mut coordinator).unwrap();
    assert_eq!(
        event,
        RequestedRandomness {
            round: 0,
            request_id: 1,
        }
    );

    assert_eq!(lottery.state(), LotteryState::Closing);
    let pending = lottery.pending_request().unwrap();
    assert_eq!(pending.request_id, 1);
    assert_eq!(pending.requested_at, now);
    assert_eq!(pending.player_count, 1);
    assert_eq!(pending.pooled_funds, ENTRANCE_FEE);

    assert_eq!(
        coordinator.requests,
        vec![RandomnessRequest {
            key_hash: [0xab; 32],
            subscription_id: 588,
            request_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: 1,
        }]
    );
}

#[test]
fn test_second_perform_upkeep_is_rejected() {
    let mut coordinator = MockCoordinator::default();
    let (mut lottery, request_id) = closing_lottery(&[Pubkey::new_unique()], &mut coordinator);
    let before = lottery.clone();

    assert_eq!(
        lottery.perform_upkeep(START + 1_000, &[], &mut coordinator),
        Err(LotteryError::UpkeepNotNeeded.into())
    );
    assert_eq!(lottery, before);
    assert_eq!(lottery.pending_request().unwrap().request_id, request_id);
    assert_eq!(coordinator.requests.len(), 1);
}

#[test]
fn test_perform_upkeep_provider_failure_keeps_round_open() {
    let mut coordinator = MockCoordinator {
        fail: true,
        ..Default::default()
    };
    let mut lottery = new_lottery();
    lottery.enter(Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    let before = lottery.clone();

    assert_eq!(
        lottery.perform_upkeep(START + INTERVAL as i64, &[], &mut coordinator),
        Err(ProgramError::Custom(999))
    );
    assert_eq!(lottery, before);
}

#[test]
fn test_fulfill_single_player() {
    let mut coordinator = MockCoordinator::default();
    let mut bank = MockBank::default();
    let a = Pubkey::new_unique();
    let (mut lottery, request_id) = closing_lottery(&[a], &mut coordinator);

    let now = START + 100;
    let event = lottery
        .fulfill_random_words(request_id, &[7], now, &mut bank)
        .unwrap();
    assert_eq!(
        event,
        WinnerPicked {
            round: 0,
            winner: a,
            prize: ENTRANCE_FEE,
        }
    );

    assert_eq!(bank.balance_of(&a), ENTRANCE_FEE);
    assert_eq!(lottery.recent_winner(), Some(a));
    assert_eq!(lottery.state(), LotteryState::Open);
    assert_eq!(lottery.number_of_players(), 0);
    assert_eq!(lottery.pooled_funds(), 0);
    assert_eq!(lottery.pending_request(), None);
    assert_eq!(lottery.latest_timestamp(), now);
    assert_eq!(lottery.round(), 1);
}

#[test]
fn test_fulfill_picks_by_modulo() {
    let mut coordinator = MockCoordinator::default();
    let mut bank = MockBank::default();
    let players: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
    let (mut lottery, request_id) = closing_lottery(&players, &mut coordinator);

    // Only the first word counts
    let event = lottery
        .fulfill_random_words(request_id, &[102, 1], START + 100, &mut bank)
        .unwrap();

    assert_eq!(event.winner, players[2]);
    assert_eq!(bank.balance_of(&players[2]), 4 * ENTRANCE_FEE);
    assert_eq!(bank.paid.len(), 1);
}

#[test]
fn test_fulfill_without_request() {
    let mut bank = MockBank::default();
    let mut lottery = new_lottery();
    lottery.enter(Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    let before = lottery.clone();

    for request_id in [0, 1, 99] {
        assert_eq!(
            lottery.fulfill_random_words(request_id, &[5], START + 100, &mut bank),
            Err(LotteryError::UnknownRequest.into())
        );
    }
    assert_eq!(lottery, before);
    assert!(bank.paid.is_empty());
}

#[test]
fn test_fulfill_wrong_request_id() {
    let mut coordinator = MockCoordinator::default();
    let mut bank = MockBank::default();
    let (mut lottery, request_id) = closing_lottery(&[Pubkey::new_unique()], &mut coordinator);
    let before = lottery.clone();

    assert_eq!(
        lottery.fulfill_random_words(request_id + 1, &[5], START + 100, &mut bank),
        Err(LotteryError::UnknownRequest.into())
    );
    assert_eq!(lottery, before);
}

#[test]
fn test_fulfill_replay_is_rejected() {
    let mut coordinator = MockCoordinator::default();
    let mut bank = MockBank::default();
    let (mut lottery, request_id) = closing_lottery(&[Pubkey::new_unique()], &mut coordinator);

    lottery
        .fulfill_random_words(request_id, &[5], START + 100, &mut bank)
        .unwrap();
    assert_eq!(
        lottery.fulfill_random_words(request_id, &[5], START + 101, &mut bank),
        Err(LotteryError::UnknownRequest.into())
    );
    assert_eq!(bank.paid.len(), 1);
}

#[test]
fn test_fulfill_without_words() {
    let mut coordinator = MockCoordinator::default();
    let mut bank = MockBank::default();
    let (mut lottery, request_id) = closing_lottery(&[Pubkey::new_unique()], &mut coordinator);
    let before = lottery.clone();

    assert_eq!(
        lottery.fulfill_random_words(request_id, &[], START + 100, &mut bank),
        Err(LotteryError::MissingRandomWords.into())
    );
    assert_eq!(lottery, before);
}

#[test]
fn test_fulfill_transfer_failure_is_atomic() {
    let mut coordinator = MockCoordinator::default();
    let mut bank = MockBank {
        fail: true,
        ..Default::default()
    };
    let (mut lottery, request_id) =
        closing_lottery(&[Pubkey::new_unique(), Pubkey::new_unique()], &mut coordinator);
    let before = lottery.clone();

    assert_eq!(
        lottery.fulfill_random_words(request_id, &[3], START + 100, &mut bank),
        Err(LotteryError::TransferFailed.into())
    );
    assert_eq!(lottery, before);
    assert_eq!(lottery.state(), LotteryState::Closing);

    // The provider may retry once the payout can go through
    bank.fail = false;
    lottery
        .fulfill_random_words(request_id, &[3], START + 100, &mut bank)
        .unwrap();
    assert_eq!(lottery.state(), LotteryState::Open);
}

#[test]
fn test_rounds_repeat_without_leftovers() {
    let mut coordinator = MockCoordinator::default();
    let mut bank = MockBank::default();
    let mut lottery = new_lottery();
    let players: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();
    let mut now = START;

    for round in 0..5u64 {
        for (i, player) in players.iter().enumerate().take(round as usize % 3 + 1) {
            lottery.enter(*player, ENTRANCE_FEE + i as u64).unwrap();
        }
        let pool = lottery.pooled_funds();

        // Not due until a full interval after the previous drawing
        assert!(!lottery.check_upkeep(now + INTERVAL as i64 - 1, &[]).0);
        now += INTERVAL as i64;
        assert!(lottery.check_upkeep(now, &[]).0);

        let requested = lottery.perform_upkeep(now, &[], &mut coordinator).unwrap();
        assert_eq!(requested.round, round);
        let picked = lottery
            .fulfill_random_words(requested.request_id, &[round * 31], now, &mut bank)
            .unwrap();

        assert_eq!(picked.round, round);
        assert_eq!(picked.prize, pool);
        assert_eq!(lottery.round(), round + 1);
        assert_eq!(lottery.state(), LotteryState::Open);
        assert_eq!(lottery.number_of_players(), 0);
        assert_eq!(lottery.pooled_funds(), 0);
        assert_eq!(lottery.pending_request(), None);
        assert_eq!(lottery.recent_winner(), Some(picked.winner));
        assert_eq!(lottery.latest_timestamp(), now);
    }

    let total_paid: u64 = bank.paid.iter().map(|(_, amount)| amount).sum();
    let total_entered: u64 = (0..5u64)
        .map(|round| {
            (0..(round % 3 + 1))
                .map(|i| ENTRANCE_FEE + i)
                .sum::<u64>()
        })
        .sum();
    assert_eq!(total_paid, total_entered);
}

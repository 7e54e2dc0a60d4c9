use solana_program::pubkey::Pubkey;

pub const LOTTERY_SEED: &[u8] = b"lottery";

/// Find the program derived address of the lottery account
pub fn find_lottery_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[LOTTERY_SEED], program_id)
}

/// Index of the winning entry for a random word
pub fn winner_index(random_word: u64, player_count: usize) -> usize {
    if player_count == 0 {
        return 0;
    }
    (random_word % player_count as u64) as usize
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}

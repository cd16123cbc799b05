use crate::board::Piece;
use crate::square::{Square, SQUARE_NB};
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Fixed seed so keys, and with them the transposition table tests, are
/// reproducible across runs.
const ZOBRIST_SEED: u64 = 1_070_372;

pub struct ZobristKeys {
    /// One key per (piece, square); indexed by the raw piece code
    /// (`color << 3 | type`), so half the rows are unused padding.
    pub psq: [[u64; SQUARE_NB]; 16],
    /// XOR-ed into the key when black is to move.
    pub side: u64,
}

impl ZobristKeys {
    #[inline(always)]
    pub fn piece_square(&self, pc: Piece, s: Square) -> u64 {
        self.psq[pc.index()][s.index()]
    }
}

fn generate_keys() -> ZobristKeys {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
    // Avoid zero keys to keep XOR cancellation patterns honest.
    fn non_zero(r: &mut StdRng) -> u64 {
        loop {
            let v = r.next_u64();
            if v != 0 {
                return v;
            }
        }
    }

    let mut psq = [[0u64; SQUARE_NB]; 16];
    for row in psq.iter_mut() {
        for key in row.iter_mut() {
            *key = non_zero(&mut rng);
        }
    }
    let side = non_zero(&mut rng);
    ZobristKeys { psq, side }
}

/// Global keys, initialized on first use.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(generate_keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_stable_and_non_zero() {
        let keys = zobrist_keys();
        assert_ne!(keys.side, 0);
        for row in keys.psq.iter() {
            for &key in row.iter() {
                assert_ne!(key, 0);
            }
        }
        // Two lookups observe the same table.
        assert_eq!(keys.psq[1][0], zobrist_keys().psq[1][0]);
    }
}

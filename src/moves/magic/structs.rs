use crate::bitboard::{file_bb, rank_bb, Bitboard, FILES, RANKS};
use crate::board::PieceType;
use crate::moves::magic::attacks::{lame_leaper_attack, lame_leaper_path, sliding_attack};
use crate::moves::magic::search::{find_magic, subsets_of};
use crate::square::{Square, SQUARE_NB};
use rand::RngCore;

/// A single magic bitboard entry: the relevant-occupancy mask, the searched
/// multiplier, the shift (`128 - popcount(mask)`), and the per-square attack
/// table indexed by `((occupied & mask) * magic) >> shift`.
#[derive(Debug, Clone)]
pub struct MagicEntry {
    pub mask: Bitboard,
    pub magic: Bitboard,
    pub shift: u32,
    pub table: Box<[Bitboard]>,
}

impl MagicEntry {
    #[inline(always)]
    pub fn index(&self, occupied: Bitboard) -> usize {
        (occupied & self.mask)
            .wrapping_mul(self.magic)
            .shr(self.shift)
            .lo() as usize
    }

    #[inline(always)]
    pub fn attacks(&self, occupied: Bitboard) -> Bitboard {
        self.table[self.index(occupied)]
    }
}

/// The 90 magic entries of one piece kind.
#[derive(Debug)]
pub struct PieceMagics {
    pub entries: Vec<MagicEntry>,
}

impl PieceMagics {
    #[inline(always)]
    pub fn get_attacks(&self, s: Square, occupied: Bitboard) -> Bitboard {
        self.entries[s.index()].attacks(occupied)
    }
}

/// Rook/cannon masks keep the full rays minus the board rim; leaper masks
/// are the leg/eye squares. The knight-to mask is deliberately not
/// rim-trimmed: a leg on the rim still decides whether a knight out there
/// attacks inward.
fn relevant_mask(pt: PieceType, s: Square) -> Bitboard {
    let edges = ((RANKS[0] | RANKS[9]) & !rank_bb(s)) | ((FILES[0] | FILES[8]) & !file_bb(s));
    match pt {
        PieceType::Rook | PieceType::Cannon => {
            sliding_attack(s, Bitboard::EMPTY, PieceType::Rook) & !edges
        }
        PieceType::KnightTo => lame_leaper_path(pt, s),
        _ => lame_leaper_path(pt, s) & !edges,
    }
}

fn reference_attack(pt: PieceType, s: Square, occupied: Bitboard) -> Bitboard {
    match pt {
        PieceType::Rook | PieceType::Cannon => sliding_attack(s, occupied, pt),
        _ => lame_leaper_attack(pt, s, occupied),
    }
}

/// Builds one piece kind's magic table set: per square, enumerate all
/// occupancy subsets of the mask, compute the reference attacks, and search
/// a multiplier that hashes them perfectly.
pub fn init_magics<R: RngCore>(pt: PieceType, rng: &mut R) -> PieceMagics {
    let mut entries = Vec::with_capacity(SQUARE_NB);
    for si in 0..SQUARE_NB as u8 {
        let s = Square(si);
        let mask = relevant_mask(pt, s);
        let shift = 128 - mask.pop_count();
        let occupancies = subsets_of(mask);
        let reference: Vec<Bitboard> = occupancies
            .iter()
            .map(|&occ| reference_attack(pt, s, occ))
            .collect();
        let (magic, table) = find_magic(mask, &occupancies, &reference, shift, rng);
        entries.push(MagicEntry {
            mask,
            magic,
            shift,
            table,
        });
    }
    PieceMagics { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn elephant_magic_lookup_matches_scan() {
        let mut rng = StdRng::seed_from_u64(0x45);
        let magics = init_magics(PieceType::Bishop, &mut rng);
        for si in 0..SQUARE_NB as u8 {
            let s = Square(si);
            let mask = magics.entries[s.index()].mask;
            for occ in subsets_of(mask) {
                assert_eq!(
                    magics.get_attacks(s, occ),
                    lame_leaper_attack(PieceType::Bishop, s, occ),
                    "elephant magic mismatch on {s}"
                );
            }
        }
    }

    #[test]
    fn knight_magic_lookup_matches_scan() {
        let mut rng = StdRng::seed_from_u64(0x45);
        let magics = init_magics(PieceType::Knight, &mut rng);
        for si in 0..SQUARE_NB as u8 {
            let s = Square(si);
            let mask = magics.entries[s.index()].mask;
            for occ in subsets_of(mask) {
                assert_eq!(
                    magics.get_attacks(s, occ),
                    lame_leaper_attack(PieceType::Knight, s, occ),
                    "knight magic mismatch on {s}"
                );
            }
        }
    }

    #[test]
    fn cannon_magic_lookup_matches_scan_on_samples() {
        let mut rng = StdRng::seed_from_u64(0x45);
        let magics = init_magics(PieceType::Cannon, &mut rng);
        let s = sq("e4");
        let entry = &magics.entries[s.index()];
        // Occupancy beyond the mask must not affect the lookup.
        let screen = crate::bitboard::square_bb(sq("e6"));
        let target = crate::bitboard::square_bb(sq("e8"));
        let noise = crate::bitboard::square_bb(sq("a0")) | crate::bitboard::square_bb(sq("i9"));
        let occ = screen | target | noise;
        assert_eq!(
            entry.attacks(occ),
            sliding_attack(s, occ & entry.mask, PieceType::Cannon)
        );
        assert!(entry.attacks(occ).contains(sq("e8")));
        assert!(!entry.attacks(occ).contains(sq("e6")));
    }
}

//! Startup search for magic multipliers. Candidates are sparse random
//! 128-bit numbers; a candidate is accepted once it hashes every occupancy
//! subset of the mask to a slot whose stored attack set agrees.

use crate::bitboard::Bitboard;
use rand::RngCore;

/// AND-ing three random draws keeps the candidate sparse, which is what
/// makes the multiply-then-shift hash spread the mask bits into the top of
/// the product.
#[inline]
pub fn random_sparse_u128<R: RngCore>(rng: &mut R) -> u128 {
    let draw = |r: &mut R| ((r.next_u64() as u128) << 64) | r.next_u64() as u128;
    draw(rng) & draw(rng) & draw(rng)
}

/// Finds a multiplier that perfectly hashes `occupancies` (collisions are
/// allowed only between subsets with identical attack sets) and returns it
/// together with the filled attack table.
///
/// The collision table is reused across attempts with an epoch stamp
/// instead of being cleared, the classic trick from magic initializers.
pub fn find_magic<R: RngCore>(
    mask: Bitboard,
    occupancies: &[Bitboard],
    reference: &[Bitboard],
    shift: u32,
    rng: &mut R,
) -> (Bitboard, Box<[Bitboard]>) {
    debug_assert_eq!(occupancies.len(), reference.len());
    let size = occupancies.len();
    let mut table = vec![Bitboard::EMPTY; size].into_boxed_slice();

    // A mask with no relevant bits has a single (empty) subset; any
    // multiplier works and the table is the one reference entry.
    if size == 1 {
        table[0] = reference[0];
        return (Bitboard(1), table);
    }

    let mut epoch = vec![0u32; size];
    let mut attempt = 0u32;
    loop {
        let magic = Bitboard(random_sparse_u128(rng));
        // Cheap pre-filter: a workable multiplier pushes several mask bits
        // into the top of the product.
        if size >= 64 && mask.wrapping_mul(magic).shr(122).pop_count() < 6 {
            continue;
        }
        attempt += 1;
        let mut ok = true;
        for i in 0..size {
            let idx = occupancies[i].wrapping_mul(magic).shr(shift).lo() as usize;
            if epoch[idx] < attempt {
                epoch[idx] = attempt;
                table[idx] = reference[i];
            } else if table[idx] != reference[i] {
                ok = false;
                break;
            }
        }
        if ok {
            return (magic, table);
        }
    }
}

/// Enumerates every subset of `mask` with the carry-Rippler.
pub fn subsets_of(mask: Bitboard) -> Vec<Bitboard> {
    let mut subsets = Vec::with_capacity(1usize << mask.pop_count());
    let mut b = Bitboard::EMPTY;
    loop {
        subsets.push(b);
        b = b.wrapping_sub(mask) & mask;
        if b.is_empty() {
            break;
        }
    }
    subsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::square_bb;
    use crate::square::Square;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn subsets_enumerate_the_powerset() {
        let mask = square_bb(Square(3)) | square_bb(Square(70)) | square_bb(Square(89));
        let subsets = subsets_of(mask);
        assert_eq!(subsets.len(), 8);
        for s in &subsets {
            assert_eq!(*s & !mask, crate::bitboard::Bitboard::EMPTY);
        }
    }

    #[test]
    fn find_magic_produces_a_perfect_hash() {
        let mask = square_bb(Square(9)) | square_bb(Square(18)) | square_bb(Square(27))
            | square_bb(Square(72));
        let occupancies = subsets_of(mask);
        // Distinct reference values per subset force true injectivity.
        let reference: Vec<Bitboard> = occupancies
            .iter()
            .map(|o| Bitboard(o.0 ^ 0xDEAD_BEEF))
            .collect();
        let shift = 128 - mask.pop_count();
        let mut rng = StdRng::seed_from_u64(7);
        let (magic, table) = find_magic(mask, &occupancies, &reference, shift, &mut rng);
        for (occ, want) in occupancies.iter().zip(reference.iter()) {
            let idx = occ.wrapping_mul(magic).shr(shift).lo() as usize;
            assert_eq!(table[idx], *want);
        }
    }
}

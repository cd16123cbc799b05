//! Repetition filtering and the Xiangqi rule judgments: the 60-move rule
//! with check adjustments, draw by repetition, and the conservative
//! perpetual-check verdicts.

use crate::board::{mate_in, mated_in, Position, Value, VALUE_DRAW};
use crate::moves::movegen::has_legal_moves;

const FILTER_BITS: usize = 14;
const FILTER_MASK: u64 = (1 << FILTER_BITS) - 1;

/// A single-hash counting filter over a 14-bit slice of the Zobrist key.
/// Every make increments at the pre-move key, every undo decrements, so a
/// zero count proves the key was never an ancestor — no false negatives.
#[derive(Clone)]
pub struct BloomFilter {
    table: Box<[u8; 1 << FILTER_BITS]>,
}

impl BloomFilter {
    pub fn new() -> BloomFilter {
        BloomFilter {
            table: Box::new([0; 1 << FILTER_BITS]),
        }
    }

    #[inline(always)]
    pub fn incr(&mut self, key: u64) {
        self.table[(key & FILTER_MASK) as usize] += 1;
    }

    #[inline(always)]
    pub fn decr(&mut self, key: u64) {
        self.table[(key & FILTER_MASK) as usize] -= 1;
    }

    #[inline(always)]
    pub fn value(&self, key: u64) -> u8 {
        self.table[(key & FILTER_MASK) as usize]
    }

    pub fn reset(&mut self) {
        self.table.fill(0);
    }
}

impl Default for BloomFilter {
    fn default() -> BloomFilter {
        BloomFilter::new()
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let occupied = self.table.iter().filter(|&&v| v > 0).count();
        write!(f, "BloomFilter({occupied} live slots)")
    }
}

impl Position {
    /// Triple repetition: the current key has already occurred at least
    /// twice among the ancestor states of this null-move window. Keys can
    /// only recur at even distances, so the walk steps by two.
    pub fn is_repetition(&self) -> bool {
        let st = self.st();
        if st.plies_from_null < 8 {
            return false;
        }
        if self.filter.value(st.key) == 0 {
            return false;
        }
        let mut found = 0;
        let mut i = 4;
        while i <= st.plies_from_null {
            if self.st_prev(i as usize).key == st.key {
                found += 1;
                if found == 2 {
                    return true;
                }
            }
            i += 2;
        }
        false
    }

    /// True when the current key occurred at least once earlier inside the
    /// current null-move window. Cheaper than full repetition detection and
    /// used by the search's repetition penalty.
    pub fn has_repeated(&self) -> bool {
        let st = self.st();
        if self.filter.value(st.key) == 0 {
            return false;
        }
        let mut i = 4;
        while i <= st.plies_from_null {
            if self.st_prev(i as usize).key == st.key {
                return true;
            }
            i += 2;
        }
        false
    }

    /// Draw by the 60-move rule or by repetition.
    pub fn is_draw(&self) -> bool {
        self.st().rule60 >= 120 || self.is_repetition()
    }

    /// Full rule judgment at search ply `ply`: perpetual check loses for
    /// the checking side, mutual perpetuals draw, and an exhausted rule-60
    /// counter draws unless the side to move has no reply. Chase
    /// repetitions are judged as draws. Returns `None` when no rule
    /// applies.
    pub fn rule_judge(&self, ply: i32) -> Option<Value> {
        let st = self.st();
        let end = ((2 * st.check10[0] as i32 - 10).max(0)
            + st.rule60
            + (2 * st.check10[1] as i32 - 10).max(0))
        .min(st.plies_from_null);

        if end >= 4 && self.filter.value(st.key) >= 1 {
            let mut cnt = 0;
            let mut check_them = st.checkers.any() && self.st_prev(2).checkers.any();
            let mut check_us =
                self.st_prev(1).checkers.any() && self.st_prev(3).checkers.any();

            let mut i = 4;
            while i <= end {
                let stp = self.st_prev(i as usize);
                check_them &= stp.checkers.any();

                // A score applies if the position repeated once strictly
                // inside the search tree, or twice anywhere.
                if stp.key == st.key {
                    cnt += 1;
                    if cnt == 2 || ply > i {
                        let result = if !check_them && !check_us {
                            // A chase would be judged here; chases count as
                            // draws until a chase detector exists.
                            VALUE_DRAW
                        } else if !check_us {
                            mate_in(ply)
                        } else if !check_them {
                            mated_in(ply)
                        } else {
                            VALUE_DRAW
                        };
                        if result == VALUE_DRAW || cnt == 2 {
                            return Some(result);
                        }
                        // Only one fold can still be out there.
                        if self.filter.value(st.key) <= 1 {
                            return None;
                        }
                    }
                }
                if i + 1 <= end {
                    check_us &= self.st_prev(i as usize + 1).checkers.any();
                }
                i += 2;
            }
        }

        if st.rule60 >= 120 {
            return Some(if has_legal_moves(self) {
                VALUE_DRAW
            } else {
                mated_in(ply)
            });
        }
        None
    }
}

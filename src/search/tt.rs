use crate::board::Value;
use crate::moves::types::Move;

/// Scores at or beyond this magnitude are mate scores and get the
/// distance-to-root adjustment on store and probe.
pub const MATE_SCORE: Value = 31_000;

/// Probe result meaning "no usable score"; outside the legal range.
pub const NO_HASH: Value = 32_767;

pub const FLAG_ALPHA: u8 = 1;
pub const FLAG_BETA: u8 = 2;
pub const FLAG_EXACT: u8 = 3;

#[derive(Clone, Copy, Debug)]
struct TTEntry {
    key: u64,
    score: i16,
    depth: u8,
    flag: u8,
    mv: Move,
    age: u8,
}

const EMPTY_ENTRY: TTEntry = TTEntry {
    key: 0,
    score: 0,
    depth: 0,
    flag: 0,
    mv: Move::NONE,
    age: 0,
};

/// Direct-mapped, power-of-two-sized transposition table. Persists across
/// searches; `new_search` bumps the age so stale entries lose replacement
/// fights.
pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    mask: u64,
    age: u8,
}

impl TranspositionTable {
    pub const DEFAULT_MB: usize = 16;

    pub fn new(megabytes: usize) -> TranspositionTable {
        let megabytes = megabytes.clamp(1, 4096);
        let wanted = megabytes * 1024 * 1024 / std::mem::size_of::<TTEntry>();
        let mut capacity = 1usize;
        while capacity * 2 <= wanted {
            capacity *= 2;
        }
        TranspositionTable {
            entries: vec![EMPTY_ENTRY; capacity],
            mask: capacity as u64 - 1,
            age: 0,
        }
    }

    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.entries.fill(EMPTY_ENTRY);
        self.age = 0;
    }

    /// Stores a result. The slot is overwritten when it is empty, when the
    /// occupant is from an older search and the incoming bound is exact, or
    /// when the occupant's depth, discounted by its age and by an
    /// exact-replaced-by-bound penalty, no longer beats the incoming depth.
    pub fn save(&mut self, key: u64, score: Value, flag: u8, ply: i32, depth: u8, mv: Move) {
        let age = self.age;
        let entry = &mut self.entries[(key & self.mask) as usize];
        let age_diff = age.wrapping_sub(entry.age) as i32;
        let demoted = flag != FLAG_EXACT && entry.flag == FLAG_EXACT;
        let replace = entry.key == 0
            || (entry.age != age && flag == FLAG_EXACT)
            || entry.depth as i32 - 2 * age_diff + demoted as i32 <= depth as i32;
        if !replace {
            return;
        }
        // Mate scores are stored relative to this node, not the root, so
        // a mate found here reads correctly from any other distance.
        let mut score = score;
        if score > MATE_SCORE {
            score += ply;
        } else if score < -MATE_SCORE {
            score -= ply;
        }
        *entry = TTEntry {
            key,
            score: score.clamp(i16::MIN as Value, i16::MAX as Value) as i16,
            depth,
            flag,
            mv,
            age,
        };
    }

    /// Probes for `key`. Returns the stored score when the entry is deep
    /// enough and its bound applies to the `(alpha, beta)` window, else
    /// `NO_HASH`; the stored move comes back as an ordering hint whenever
    /// the key matches.
    pub fn probe(
        &self,
        key: u64,
        depth: u8,
        alpha: Value,
        beta: Value,
        ply: i32,
    ) -> (Value, Move) {
        let entry = &self.entries[(key & self.mask) as usize];
        if entry.key != key {
            return (NO_HASH, Move::NONE);
        }
        if entry.depth >= depth {
            let mut score = entry.score as Value;
            if score < -MATE_SCORE {
                score += ply;
            } else if score > MATE_SCORE {
                score -= ply;
            }
            match entry.flag {
                FLAG_EXACT => return (score, entry.mv),
                FLAG_ALPHA if score <= alpha => return (score, entry.mv),
                FLAG_BETA if score >= beta => return (score, entry.mv),
                _ => {}
            }
        }
        (NO_HASH, entry.mv)
    }

    /// Fraction of a small sample of slots holding entries from the current
    /// search, in permille.
    pub fn hashfull(&self) -> usize {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample]
            .iter()
            .filter(|e| e.key != 0 && e.age == self.age)
            .count();
        used * 1000 / sample
    }
}

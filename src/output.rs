use crate::board::Value;
use crate::moves::types::Move;
use std::fmt;
use std::time::Duration;

/// One iterative-deepening iteration's result as a structured record. The
/// `Display` form is the UCCI `info` line; protocol layers may format the
/// fields themselves instead.
#[derive(Debug, Clone)]
pub struct SearchInfo {
    pub depth: u8,
    pub score: Value,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
}

impl fmt::Display for SearchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "info depth {} score cp {} nodes {} time {}",
            self.depth,
            self.score,
            self.nodes,
            self.elapsed.as_millis()
        )?;
        if !self.pv.is_empty() {
            write!(f, " pv")?;
            for m in &self.pv {
                write!(f, " {}", m)?;
            }
        }
        Ok(())
    }
}

//! Append-only record of every instruction accepted in a session.
//!
//! The log is the only program text the VM keeps. Loop bodies are replayed
//! straight out of it by index, so entries are never rewritten or dropped
//! short of a full reset.

use std::fmt::Display;

use crate::bfir::BfIR;

#[derive(Debug, Default, Clone)]
pub struct InstrLog {
    code: Vec<BfIR>,
}

impl InstrLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `ir` and returns its index.
    pub fn push(&mut self, ir: BfIR) -> usize {
        debug_assert!(!ir.is_nop());
        self.code.push(ir);
        self.code.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<BfIR> {
        self.code.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.code.clear();
    }
}

impl Display for InstrLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.code.iter().try_for_each(|ir| write!(f, "{ir}"))
    }
}

#[test]
fn test_instr_log() {
    let mut log = InstrLog::new();
    assert!(log.is_empty());

    assert_eq!(log.push(BfIR::AddVal), 0);
    assert_eq!(log.push(BfIR::LoopStart), 1);
    assert_eq!(log.push(BfIR::LoopEnd), 2);

    assert_eq!(log.len(), 3);
    assert_eq!(log.get(1), Some(BfIR::LoopStart));
    assert_eq!(log.get(3), None);
    assert_eq!(log.to_string(), "+[]");

    log.clear();
    assert!(log.is_empty());
}

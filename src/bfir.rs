use std::fmt::Display;

/// One recognised Brainfuck instruction, or `Nop` for any other byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BfIR {
    AddVal,
    SubVal,
    AddPtr,
    SubPtr,
    GetByte,
    PutByte,
    LoopStart,
    LoopEnd,
    Nop,
}

impl BfIR {
    pub const fn decode(ch: u8) -> BfIR {
        use BfIR::*;
        match ch {
            b'+' => AddVal,
            b'-' => SubVal,
            b'>' => AddPtr,
            b'<' => SubPtr,
            b',' => GetByte,
            b'.' => PutByte,
            b'[' => LoopStart,
            b']' => LoopEnd,
            _ => Nop,
        }
    }

    /// The source byte of the instruction. `Nop` has none.
    pub const fn symbol(self) -> Option<u8> {
        use BfIR::*;
        let ch = match self {
            AddVal => b'+',
            SubVal => b'-',
            AddPtr => b'>',
            SubPtr => b'<',
            GetByte => b',',
            PutByte => b'.',
            LoopStart => b'[',
            LoopEnd => b']',
            Nop => return None,
        };
        Some(ch)
    }

    pub const fn is_nop(self) -> bool {
        matches!(self, BfIR::Nop)
    }
}

impl Display for BfIR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.symbol() {
            Some(ch) => write!(f, "{}", ch as char),
            None => Ok(()),
        }
    }
}

#[test]
fn test_decode() {
    assert_eq!(BfIR::decode(b'+'), BfIR::AddVal);
    assert_eq!(BfIR::decode(b'-'), BfIR::SubVal);
    assert_eq!(BfIR::decode(b'>'), BfIR::AddPtr);
    assert_eq!(BfIR::decode(b'<'), BfIR::SubPtr);
    assert_eq!(BfIR::decode(b','), BfIR::GetByte);
    assert_eq!(BfIR::decode(b'.'), BfIR::PutByte);
    assert_eq!(BfIR::decode(b'['), BfIR::LoopStart);
    assert_eq!(BfIR::decode(b']'), BfIR::LoopEnd);

    for ch in [b' ', b'\n', b'a', b'#', 0, 0x7f, 0xff] {
        assert!(BfIR::decode(ch).is_nop());
    }
}

#[test]
fn test_symbol() {
    for &ch in b"+-><,.[]" {
        assert_eq!(BfIR::decode(ch).symbol(), Some(ch));
    }
    assert_eq!(BfIR::Nop.symbol(), None);
    assert_eq!(BfIR::LoopEnd.to_string(), "]");
    assert_eq!(BfIR::Nop.to_string(), "");
}

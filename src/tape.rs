use std::collections::HashMap;

/// Sparse byte tape. Unwritten cells read as zero and the pointer may go
/// anywhere in the `i64` range, wrapping at its ends.
#[derive(Debug, Default, Clone)]
pub struct Tape {
    cells: HashMap<i64, u8>,
    ptr: i64,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr(&self) -> i64 {
        self.ptr
    }

    /// Value under the pointer.
    pub fn get(&self) -> u8 {
        self.value_at(self.ptr)
    }

    pub fn set(&mut self, value: u8) {
        self.cells.insert(self.ptr, value);
    }

    pub fn value_at(&self, addr: i64) -> u8 {
        self.cells.get(&addr).copied().unwrap_or(0)
    }

    pub fn add_val(&mut self, x: u8) {
        let cell = self.cells.entry(self.ptr).or_insert(0);
        *cell = cell.wrapping_add(x);
    }

    pub fn sub_val(&mut self, x: u8) {
        let cell = self.cells.entry(self.ptr).or_insert(0);
        *cell = cell.wrapping_sub(x);
    }

    pub fn add_ptr(&mut self, x: i64) {
        self.ptr = self.ptr.wrapping_add(x);
    }

    pub fn sub_ptr(&mut self, x: i64) {
        self.ptr = self.ptr.wrapping_sub(x);
    }

    /// Number of cells ever written.
    pub fn touched(&self) -> usize {
        self.cells.len()
    }

    pub fn reset(&mut self) {
        self.cells.clear();
        self.ptr = 0;
    }
}

#[test]
fn test_tape() {
    let mut tape = Tape::new();
    assert_eq!(tape.get(), 0);
    assert_eq!(tape.value_at(-42), 0);
    assert_eq!(tape.touched(), 0);

    tape.sub_val(1);
    assert_eq!(tape.get(), 255);
    tape.add_val(1);
    assert_eq!(tape.get(), 0);

    tape.sub_ptr(3);
    assert_eq!(tape.ptr(), -3);
    tape.set(b'A');
    assert_eq!(tape.value_at(-3), b'A');
    assert_eq!(tape.value_at(0), 0);

    tape.add_ptr(5);
    assert_eq!(tape.ptr(), 2);
    assert_eq!(tape.get(), 0);

    tape.reset();
    assert_eq!(tape.ptr(), 0);
    assert_eq!(tape.value_at(-3), 0);
    assert_eq!(tape.touched(), 0);
}

#[test]
fn test_tape_pointer_wraps() {
    let mut tape = Tape::new();
    tape.sub_ptr(1);
    tape.add_ptr(i64::MAX);
    tape.add_ptr(2);
    assert_eq!(tape.ptr(), i64::MIN);
}

//! Property-based tests for the VM, using proptest.

use proptest::prelude::*;

use crate::bfvm::BfVM;

fn quiet_vm<'io>() -> BfVM<'io> {
    BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()))
}

/// Straight-line code without loops or input.
fn flat_code() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!['+', '-', '>', '<', '.', ' ']), 0..64)
        .prop_map(|v| v.into_iter().collect())
}

proptest! {
    /// Any mix of `+` and `-` on one cell leaves the count modulo 256.
    #[test]
    fn prop_value_wraps(ops in prop::collection::vec(any::<bool>(), 0..1024)) {
        let mut vm = quiet_vm();
        let mut expected = 0_i64;
        for inc in ops {
            vm.feed(if inc { b'+' } else { b'-' }).unwrap();
            expected += if inc { 1 } else { -1 };
        }
        prop_assert_eq!(vm.tape().get() as i64, expected.rem_euclid(256));
    }

    /// The pointer lands at k - m and writes go to exactly that address.
    #[test]
    fn prop_pointer_moves(moves in prop::collection::vec(any::<bool>(), 0..256)) {
        let mut vm = quiet_vm();
        let (mut k, mut m) = (0_i64, 0_i64);
        for right in moves {
            vm.feed(if right { b'>' } else { b'<' }).unwrap();
            if right { k += 1 } else { m += 1 }
        }
        prop_assert_eq!(vm.tape().ptr(), k - m);

        vm.feed(b'+').unwrap();
        prop_assert_eq!(vm.tape().value_at(k - m), 1);
        prop_assert_eq!(vm.tape().touched(), 1);
    }

    /// Resetting once or twice ends in the same initial state.
    #[test]
    fn prop_reset_idempotent(code in "[-+<>\\[., ]{0,64}", twice in any::<bool>()) {
        let mut vm = quiet_vm();
        let _ = vm.feed_str(&code);
        vm.reset();
        if twice {
            vm.reset();
        }

        prop_assert_eq!(vm.cursor(), None);
        prop_assert!(vm.instructions().is_empty());
        prop_assert!(vm.open_loops().is_empty());
        prop_assert_eq!(vm.skip_depth(), 0);
        prop_assert_eq!(vm.tape().ptr(), 0);
        prop_assert_eq!(vm.tape().touched(), 0);
        for addr in -8..8 {
            prop_assert_eq!(vm.tape().value_at(addr), 0);
        }
    }

    /// A body that decrements the counter once runs exactly v times.
    #[test]
    fn prop_loop_runs_v_times(v in 1_u8..=255) {
        let mut out = vec![];
        {
            let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(&mut out));
            vm.feed_bytes(&vec![b'+'; v as usize]).unwrap();
            vm.feed_str("[>+<.-]").unwrap();
            prop_assert_eq!(vm.tape().value_at(0), 0);
            prop_assert_eq!(vm.tape().value_at(1), v);
            prop_assert_eq!(vm.tape().ptr(), 0);
            prop_assert!(vm.open_loops().is_empty());
        }
        prop_assert_eq!(out.len(), v as usize);
        prop_assert_eq!(out.first().copied(), Some(v));
        prop_assert_eq!(out.last().copied(), Some(1));
    }

    /// Loops entered on a zero cell leave no trace, however deeply nested.
    #[test]
    fn prop_skipped_body_inert(outer in flat_code(), inner in flat_code()) {
        let mut out = vec![];
        {
            let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(&mut out));
            vm.feed_str(&format!("[{outer}[{inner}]{outer}]")).unwrap();
            prop_assert_eq!(vm.skip_depth(), 0);
            prop_assert_eq!(vm.tape().touched(), 0);
            prop_assert_eq!(vm.tape().ptr(), 0);

            vm.feed_str("+.").unwrap();
        }
        prop_assert_eq!(out, vec![1]);
    }

    /// Feeding a program in pieces behaves like feeding it whole.
    #[test]
    fn prop_split_feed(split in 0_usize..=35) {
        let src = "++++[>+++[>++<-]<-]>>[->+>+<<]>>.<.";
        let run = |parts: &[&str]| {
            let mut out = vec![];
            {
                let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(&mut out));
                for part in parts {
                    vm.feed_str(part).unwrap();
                }
            }
            out
        };

        let split = split.min(src.len());
        prop_assert_eq!(run(&[src]), run(&[&src[..split], &src[split..]]));
    }
}

//! Property tests: random operation sequences never break the tree.

use proptest::prelude::*;
use retrofs::vfs::Snapshot;

#[derive(Debug, Clone)]
enum Op {
    Mkdir(String),
    Touch(String),
    Write(String, String),
    Remove(String),
    Move(String, String),
    Ensure(String),
}

/// Paths drawn from a small alphabet so operations keep colliding.
fn arb_path() -> impl Strategy<Value = String> {
    let segment = prop_oneof![Just("a"), Just("b"), Just("ab"), Just("home"), Just("user"), Just("x.log")];
    prop::collection::vec(segment, 1..5).prop_map(|segments| format!("/{}", segments.join("/")))
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_path().prop_map(Op::Mkdir),
        2 => arb_path().prop_map(Op::Touch),
        1 => (arb_path(), "[a-z ]{0,8}").prop_map(|(p, c)| Op::Write(p, c)),
        1 => arb_path().prop_map(Op::Remove),
        2 => (arb_path(), arb_path()).prop_map(|(from, to)| Op::Move(from, to)),
        1 => arb_path().prop_map(Op::Ensure),
    ]
}

fn apply(snapshot: &mut Snapshot, op: &Op) -> bool {
    match op {
        Op::Mkdir(p) => snapshot.mkdir(p).is_ok(),
        Op::Touch(p) => snapshot.touch(p).is_ok(),
        Op::Write(p, c) => snapshot.write(p, c).is_ok(),
        Op::Remove(p) => snapshot.remove(p).is_ok(),
        Op::Move(from, to) => snapshot.move_node(from, to).is_ok(),
        Op::Ensure(p) => snapshot.ensure_path(p).is_ok(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariants_hold_after_every_step(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut snapshot = Snapshot::bootstrap("user");
        for op in &ops {
            let before = snapshot.clone();
            let applied = apply(&mut snapshot, op);
            if let Err(violation) = snapshot.check_invariants() {
                return Err(TestCaseError::fail(format!("{op:?} broke the tree: {violation}")));
            }
            if !applied {
                prop_assert_eq!(&snapshot, &before, "failed {:?} changed the snapshot", op);
            }
        }
    }

    #[test]
    fn written_content_reads_back(path in arb_path(), content in ".*") {
        let mut snapshot = Snapshot::empty();
        prop_assume!(snapshot.ensure_path(&path).is_ok());
        prop_assume!(snapshot.touch(&path).is_ok());
        prop_assume!(snapshot.read(&path).is_some());
        snapshot.write(&path, &content).unwrap();
        prop_assert_eq!(&snapshot.read(&path).unwrap().content, &content);
    }

    // The limit is checked at creation time, so moves are left out here.
    #[test]
    fn created_directories_respect_the_home_limit(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut snapshot = Snapshot::bootstrap("user");
        for op in ops.iter().filter(|op| !matches!(op, Op::Move(..))) {
            apply(&mut snapshot, op);
        }
        let too_deep = snapshot.nodes().filter(|n| n.is_directory()).any(|n| {
            n.path().starts_with("/home/") && n.path().split('/').filter(|s| !s.is_empty()).count() > 3
        });
        prop_assert!(!too_deep);
    }
}

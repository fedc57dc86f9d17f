use sixlines::oracle::transition::{LineState, Operator, StateTransitionEngine};

#[test]
fn progression_from_top_line_moves_to_next_hexagram() {
    for id in 1..=64u8 {
        let next = StateTransitionEngine::progress(LineState::new(id, 6).unwrap());
        assert_eq!(next.line_position(), 1);
        assert_eq!(next.hexagram_id(), id % 64 + 1);
    }
}

#[test]
fn six_progressions_cycle_through_one_hexagram() {
    let mut s = LineState::new(30, 1).unwrap();
    for expected in 2..=6 {
        s = StateTransitionEngine::apply(s, Operator::Progression);
        assert_eq!((s.hexagram_id(), s.line_position()), (30, expected));
    }
    s = StateTransitionEngine::apply(s, Operator::Progression);
    assert_eq!((s.hexagram_id(), s.line_position()), (31, 1));
}

#[test]
fn mutation_twice_restores_the_hexagram() {
    for id in 1..=64u8 {
        for line in 1..=6u8 {
            let s = LineState::new(id, line).unwrap();
            let twice = StateTransitionEngine::apply(
                StateTransitionEngine::apply(s, Operator::Mutation),
                Operator::Mutation,
            );
            assert_eq!(twice, s);
        }
    }
}

#[test]
fn mutation_keeps_the_line_and_changes_one_bit() {
    use sixlines::oracle::hexagram::HexagramResolver;
    for id in 1..=64u8 {
        for line in 1..=6u8 {
            let m = StateTransitionEngine::mutate(LineState::new(id, line).unwrap());
            assert_eq!(m.line_position(), line);
            let before = HexagramResolver::line_bits(id).unwrap();
            let after = HexagramResolver::line_bits(m.hexagram_id()).unwrap();
            let differing = before
                .as_array()
                .iter()
                .zip(after.as_array())
                .filter(|(a, b)| a != b)
                .count();
            assert_eq!(differing, 1);
            assert_ne!(before.line(line).unwrap(), after.line(line).unwrap());
        }
    }
}

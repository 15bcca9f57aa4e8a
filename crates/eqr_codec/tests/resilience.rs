use eqr_codec::encode::{ExprToken as T, PayloadBuilder};
use eqr_codec::{decode, Tag};

fn prefix() -> PayloadBuilder {
    PayloadBuilder::new()
        .label(Tag::Plus, "Addition")
        .rand_int("a", 1, 20)
        .end_header()
        .solution("2+3?", "2+3=5", &[Tag::Plus])
        .solution("7-4?", "7-4=3", &[Tag::Minus])
        .end_solutions()
}

fn two_exercises() -> PayloadBuilder {
    prefix()
        .exercise(None, &[T::name("a"), T::Plus, T::Int(3)], &[Tag::Plus])
        .exercise(Some("Twice"), &[T::name("a"), T::Times, T::Int(2)], &[Tag::Star])
}

// ── truncation ───────────────────────────────────────────────────

#[test]
fn truncated_mid_exercise_keeps_earlier_sections() {
    let complete_bits = two_exercises().bit_len();
    let third = two_exercises().exercise(
        None,
        &[T::name("alpha"), T::Minus, T::Int(1000), T::Plus, T::name("beta")],
        &[Tag::Minus],
    );
    let full_bits = third.bit_len();
    let bytes = third.end_exercises().finish();

    // cut somewhere inside the third exercise, on a byte boundary
    let cut = (complete_bits + (full_bits - complete_bits) / 2) / 8;
    assert!(cut * 8 > complete_bits && cut * 8 < full_bits);
    let ir = decode(&bytes[..cut]).expect("truncated payload still decodes");

    assert_eq!(ir.labels[&Tag::Plus], "Addition");
    assert_eq!(ir.solutions.len(), 2);
    assert_eq!(ir.solutions[1].steps, "7-4=3");
    assert_eq!(ir.exercises.len(), 2);
    assert_eq!(ir.exercises[0].expression, "a + 3");
    assert_eq!(ir.exercises[1].expression, "Twice: a * 2");
}

#[test]
fn every_truncation_point_after_header_decodes() {
    let header_bytes = (PayloadBuilder::new()
        .label(Tag::Plus, "Addition")
        .rand_int("a", 1, 20)
        .end_header()
        .bit_len()
        + 7)
        / 8;
    let bytes = two_exercises().end_exercises().finish();
    let full = decode(&bytes).unwrap();
    for cut in header_bytes..=bytes.len() {
        let ir = decode(&bytes[..cut]).unwrap_or_else(|e| panic!("cut {cut}: {e}"));
        assert!(ir.solutions.len() <= full.solutions.len());
        assert!(ir.exercises.len() <= full.exercises.len());
        for (got, want) in ir.solutions.iter().zip(&full.solutions) {
            assert_eq!(got, want, "cut {cut}");
        }
        for (got, want) in ir.exercises.iter().zip(&full.exercises) {
            assert_eq!(got.expression, want.expression, "cut {cut}");
            assert_eq!(got.tags, want.tags, "cut {cut}");
        }
    }
}

#[test]
fn tag_list_cut_by_end_of_data_drops_the_entry() {
    // the constant's code length shifts where the tag lists fall within a byte
    for value in 1..=16 {
        let bytes = PayloadBuilder::new()
            .end_header()
            .solution("q", "s", &[Tag::Plus, Tag::Star])
            .end_solutions()
            .exercise(None, &[T::Int(value)], &[Tag::Star, Tag::Minus])
            .end_exercises()
            .finish();
        let full = decode(&bytes).unwrap();
        assert_eq!(full.solutions[0].tags, vec![Tag::Plus, Tag::Star]);
        assert_eq!(full.exercises[0].tags, vec![Tag::Star, Tag::Minus]);

        for cut in 1..bytes.len() {
            let Ok(ir) = decode(&bytes[..cut]) else {
                continue;
            };
            assert!(
                ir.solutions.is_empty() || ir.solutions == full.solutions,
                "value {value} cut {cut}: {:?}",
                ir.solutions
            );
            assert!(
                ir.exercises.is_empty() || ir.exercises == full.exercises,
                "value {value} cut {cut}: {:?}",
                ir.exercises
            );
        }
    }
}

#[test]
fn truncated_inside_solutions_keeps_header() {
    let before = prefix().bit_len();
    let bytes = prefix().finish();
    let ir = decode(&bytes[..(before / 8) - 4]).unwrap();
    assert_eq!(ir.rand_generators.len(), 1);
    assert!(ir.solutions.len() < 2);
    assert!(ir.exercises.is_empty());
}

// ── resynchronization ────────────────────────────────────────────

#[test]
fn malformed_string_inside_exercise_prefix_resyncs() {
    // exercise marker, prefix flag, then an invalid selector 11
    let bytes = prefix()
        .raw(0b01, 2)
        .raw(1, 1)
        .raw(0b11, 2)
        .raw(0, 24)
        .finish();
    let ir = decode(&bytes).unwrap();
    assert_eq!(ir.solutions.len(), 2);
    assert!(ir.exercises.is_empty());
}

#[test]
fn literal_payload_bytes() {
    // header: 22 zero bits, end 00; solutions end 00; exercise 01, no prefix,
    // const int +5 (0 01 00 0 + elias "01101"), EOE 1110, tags PLUS 010, 000, end 00
    let bytes = hex::decode("000000110de400").unwrap();
    let ir = decode(&bytes).unwrap();
    assert_eq!(ir.exercises.len(), 1);
    assert_eq!(ir.exercises[0].expression, "5");
    assert_eq!(ir.exercises[0].tags, vec![Tag::Plus]);
}

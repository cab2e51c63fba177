//! Property tests for chunk reassembly.

use ndstream_transport::{EventDecoder, LineFramer, Utf8Decoder};
use proptest::prelude::*;

/// Split `input` at the given (unsorted, possibly out-of-range) offsets.
fn split_at_points(input: &[u8], mut points: Vec<usize>) -> Vec<&[u8]> {
    points.retain(|&p| p <= input.len());
    points.sort_unstable();
    points.dedup();

    let mut pieces = Vec::with_capacity(points.len() + 1);
    let mut start = 0;
    for point in points {
        pieces.push(&input[start..point]);
        start = point;
    }
    pieces.push(&input[start..]);
    pieces
}

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("\n".to_string()),
            Just("é".to_string()),
            Just("\u{1F980}".to_string()),
            "[a-z{}\":, ]{1,8}",
        ],
        0..40,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn framer_reproduces_input(
        text in arb_text(),
        points in prop::collection::vec(0usize..200, 0..12),
    ) {
        let mut framer = LineFramer::new();
        let mut rebuilt = String::new();

        // Split on char boundaries only; the framer works on text.
        let mut cuts: Vec<usize> = points
            .into_iter()
            .filter(|&p| text.is_char_boundary(p))
            .collect();
        cuts.sort_unstable();
        cuts.dedup();
        let mut start = 0;
        for cut in cuts.into_iter().chain(std::iter::once(text.len())) {
            for line in framer.append(&text[start..cut]) {
                prop_assert!(line.ends_with('\n'));
                prop_assert_eq!(line.matches('\n').count(), 1);
                rebuilt.push_str(&line);
            }
            start = cut;
        }
        let rest = framer.flush();
        prop_assert!(!rest.contains('\n'));
        rebuilt.push_str(&rest);

        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn utf8_decoding_ignores_chunk_boundaries(
        bytes in prop::collection::vec(any::<u8>(), 0..256),
        points in prop::collection::vec(0usize..256, 0..16),
    ) {
        let mut decoder = Utf8Decoder::new();
        let mut decoded = String::new();
        for piece in split_at_points(&bytes, points) {
            decoded.push_str(&decoder.decode(piece));
        }
        decoded.push_str(&decoder.finish());

        prop_assert_eq!(decoded, String::from_utf8_lossy(&bytes).into_owned());
    }

    #[test]
    fn events_survive_any_fragmentation(
        values in prop::collection::vec(any::<i64>(), 1..20),
        points in prop::collection::vec(0usize..512, 0..16),
    ) {
        let body: String = values.iter().map(|v| format!("{{\"n\":{v}}}\n")).collect();
        let mut utf8 = Utf8Decoder::new();
        let mut framer = LineFramer::new();
        let mut decoder = EventDecoder::new();
        let mut seen = Vec::new();

        for piece in split_at_points(body.as_bytes(), points) {
            for line in framer.append(&utf8.decode(piece)) {
                if let Some(event) = decoder.decode(&line).expect("well-formed line") {
                    seen.push(event.get("n").and_then(serde_json::Value::as_i64));
                }
            }
        }
        prop_assert!(framer.flush().is_empty());

        let expected: Vec<Option<i64>> = values.into_iter().map(Some).collect();
        prop_assert_eq!(seen, expected);
    }
}

// tests/line_protocol_props.rs

use proptest::prelude::*;

use engine_supervisor::protocol::{DecodedLine, LineDecoder, LineKind, classify_stdout};
use engine_supervisor::types::StreamSource;

const TOKEN: &str = "ENGINE_READY";

/// Decode `bytes` delivered as the given chunks.
fn decode_chunked(bytes: &[u8], cuts: &[usize]) -> Vec<String> {
    let mut decoder = LineDecoder::new(StreamSource::Stdout);
    let mut out = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        for line in decoder.push(&bytes[start..cut]) {
            out.push(line.expect("valid utf-8"));
        }
        start = cut;
    }
    for line in decoder.push(&bytes[start..]) {
        out.push(line.expect("valid utf-8"));
    }
    if let Some(line) = decoder.finish() {
        out.push(line.expect("valid utf-8"));
    }
    out
}

/// Like [`decode_chunked`] but with a tiny line limit, keeping errors.
fn decode_limited(bytes: &[u8], cuts: &[usize], limit: usize) -> Vec<DecodedLine> {
    let mut decoder = LineDecoder::with_max_line(StreamSource::Stderr, limit);
    let mut out = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        out.extend(decoder.push(&bytes[start..cut]));
        start = cut;
    }
    out.extend(decoder.push(&bytes[start..]));
    out.extend(decoder.finish());
    out
}

// Lines of mixed ASCII / multi-byte text, optionally CRLF-terminated, with
// the readiness token sprinkled in.
fn stream_strategy() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    let line = prop_oneof![
        Just(TOKEN.to_string()),
        Just(format!(" {TOKEN}\r")),
        "[a-zA-Z0-9 _.é€]{0,24}",
    ];
    (proptest::collection::vec(line, 0..12), any::<bool>())
        .prop_map(|(lines, trailing_newline)| {
            let mut text = lines.join("\n");
            if trailing_newline {
                text.push('\n');
            }
            text.into_bytes()
        })
        .prop_flat_map(|bytes| {
            let len = bytes.len();
            let cuts = proptest::collection::vec(0..=len, 0..8).prop_map(|mut cuts| {
                cuts.sort_unstable();
                cuts
            });
            (Just(bytes), cuts)
        })
}

proptest! {
    #[test]
    fn chunk_boundaries_do_not_change_decoded_lines((bytes, cuts) in stream_strategy()) {
        let whole = decode_chunked(&bytes, &[]);
        let chunked = decode_chunked(&bytes, &cuts);
        prop_assert_eq!(&whole, &chunked);

        let ready_whole = whole.iter().filter(|l| classify_stdout(l, TOKEN) == LineKind::Ready).count();
        let ready_chunked = chunked.iter().filter(|l| classify_stdout(l, TOKEN) == LineKind::Ready).count();
        prop_assert_eq!(ready_whole, ready_chunked);
    }

    #[test]
    fn byte_at_a_time_matches_whole_stream((bytes, _cuts) in stream_strategy()) {
        let every_byte: Vec<usize> = (1..bytes.len()).collect();
        prop_assert_eq!(decode_chunked(&bytes, &[]), decode_chunked(&bytes, &every_byte));
    }

    #[test]
    fn ready_iff_trimmed_line_is_token(line in "\\PC{0,30}") {
        let expected = line.trim() == TOKEN;
        prop_assert_eq!(classify_stdout(&line, TOKEN) == LineKind::Ready, expected);
    }

    #[test]
    fn token_embedded_in_text_is_never_ready(
        prefix in "[a-z!]{1,8}",
        suffix in "[a-z!]{0,8}",
    ) {
        let with_prefix = format!("{prefix} {TOKEN}{suffix}");
        prop_assert_eq!(classify_stdout(&with_prefix, TOKEN), LineKind::Passthrough);
        let glued = format!("{TOKEN}{prefix}");
        prop_assert_eq!(classify_stdout(&glued, TOKEN), LineKind::Passthrough);
    }

    #[test]
    fn overlong_lines_fail_the_same_way_for_any_chunking((bytes, cuts) in stream_strategy()) {
        prop_assert_eq!(decode_limited(&bytes, &[], 10), decode_limited(&bytes, &cuts, 10));
    }
}

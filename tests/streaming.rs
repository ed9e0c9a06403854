//! End-to-end tests for the streaming compressor and decompressor.

use lzutf8_rs::*;
use proptest::prelude::*;

fn compress_chunked(inp: &[u8], chunk_sizes: &[usize]) -> Vec<u8> {
    let mut state = Compressor::new();
    let mut outp = Vec::new();
    for chunk in chunks(inp, chunk_sizes) {
        outp.extend(state.compress_block(chunk).unwrap());
    }
    outp
}

fn decompress_chunked(inp: &[u8], chunk_sizes: &[usize]) -> Vec<u8> {
    let mut state = Decompressor::new();
    let mut outp = Vec::new();
    for chunk in chunks(inp, chunk_sizes) {
        let out = state.decompress_block(chunk).unwrap();
        // never hands out half a codepoint
        assert!(std::str::from_utf8(&out).is_ok());
        outp.extend(out);
    }
    outp.extend(state.finish().unwrap());
    outp
}

/// Split `inp` into chunks, cycling through `chunk_sizes`
fn chunks<'a>(mut inp: &'a [u8], chunk_sizes: &[usize]) -> Vec<&'a [u8]> {
    let mut ret = Vec::new();
    let mut sizes = chunk_sizes.iter().cycle();
    while !inp.is_empty() {
        let size = usize::min(*sizes.next().unwrap(), inp.len());
        ret.push(&inp[..size]);
        inp = &inp[size..];
    }
    ret
}

/// (distance, length) of every pointer in a stream compressed from ASCII input
fn pointers(comp: &[u8]) -> Vec<(usize, usize)> {
    let mut ret = Vec::new();
    let mut pos = 0;
    while pos < comp.len() {
        let b = comp[pos];
        let len = (b & 0x1f) as usize;
        match b >> 5 {
            0b110 => {
                ret.push((comp[pos + 1] as usize, len));
                pos += 2;
            }
            0b111 => {
                ret.push((((comp[pos + 1] as usize) << 8) | comp[pos + 2] as usize, len));
                pos += 3;
            }
            _ => pos += 1,
        }
    }
    ret
}

fn random_letters(len: usize, mut seed: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
        out.push(b'a' + ((seed >> 16) % 26) as u8);
    }
    out
}

#[test]
fn test_repeated_run() {
    let inp = "a".repeat(20);
    let comp = compress(inp.as_bytes()).unwrap();
    assert_eq!(comp[0], b'a');
    assert!(!pointers(&comp).is_empty());
    assert_eq!(decompress(&comp).unwrap(), inp.as_bytes());
}

#[test]
fn test_hello_world_in_two_blocks() {
    let mut comp_state = Compressor::new();
    assert_eq!(comp_state.compress_block(""), Err(CompressError::InvalidInput));

    let mut comp = comp_state.compress_block("hello").unwrap();
    comp.extend(comp_state.compress_block(" world").unwrap());

    let mut dec_state = Decompressor::new();
    assert_eq!(
        dec_state.decompress_block_to_string(&comp).unwrap(),
        "hello world"
    );
}

#[test]
fn test_pointer_before_any_output() {
    let mut state = Decompressor::new();
    let err = state.decompress_block([0xe4u8, 0x01, 0x00]).unwrap_err();
    assert!(matches!(
        err,
        DecompressError::MalformedToken {
            distance: 256,
            available: 0,
            ..
        }
    ));
}

#[test]
fn test_distances_stay_in_window() {
    let r = random_letters(30000, 0x1234_5678);
    let inp = [&r[..], &r[..], &r[..]].concat();

    for chunk_size in [inp.len(), 4096, 1000] {
        let comp = compress_chunked(&inp, &[chunk_size]);
        let ptrs = pointers(&comp);
        assert!(ptrs.iter().all(|&(d, _)| d >= 1 && d <= MAX_MATCH_DISTANCE));
        assert!(ptrs.iter().any(|&(d, l)| d == 30000 && l == MAX_SEQUENCE_LENGTH));
        assert!(comp.len() < inp.len() / 2);

        assert_eq!(decompress_chunked(&comp, &[chunk_size]), inp);
        assert_eq!(decompress_chunked(&comp, &[7, 1, 2]), inp);
    }
}

#[test]
fn test_beyond_window_is_not_matched() {
    let r = random_letters(20000, 42);
    let filler = random_letters(20000, 7);
    let inp = [&r[..], &filler[..], &r[..]].concat();

    let comp = compress(&inp).unwrap();
    // the repeat is 40000 bytes back, out of reach, so only chance matches remain
    assert!(pointers(&comp).iter().all(|&(d, _)| d <= MAX_MATCH_DISTANCE));
    assert!(comp.len() > inp.len() * 8 / 10);
    assert_eq!(decompress(&comp).unwrap(), inp);
}

#[test]
fn test_determinism() {
    let inp = "Grüße aus Köln! Grüße aus Köln! 😀😀😀 ok ok ok ok".repeat(50);
    assert_eq!(
        compress(inp.as_bytes()).unwrap(),
        compress(inp.as_bytes()).unwrap()
    );
    assert_eq!(
        compress_chunked(inp.as_bytes(), &[13, 100]),
        compress_chunked(inp.as_bytes(), &[13, 100])
    );
}

#[test]
fn test_every_split_point() {
    let inp = "€uro ÄÖÜ äöü 😀 €uro ÄÖÜ äöü 😀 €uro ÄÖÜ".as_bytes();
    let comp = compress(inp).unwrap();
    for split in 1..inp.len() {
        assert_eq!(decompress_chunked(&compress_chunked(inp, &[split]), &[split]), inp);
    }
    for split in 1..comp.len() {
        let mut state = Decompressor::new();
        let mut out = state.decompress_block(&comp[..split]).unwrap();
        out.extend(state.decompress_block(&comp[split..]).unwrap());
        assert_eq!(out, inp, "split at {}", split);
    }
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "a", "b", "ab", " ", "hello ", "ä", "ß", "€", "日本", "😀", "\n", "{\"url\": \"",
        ]),
        1..300,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_round_trip(text in text_strategy()) {
        let comp = compress(text.as_bytes()).unwrap();
        prop_assert_eq!(decompress(&comp).unwrap(), text.as_bytes());
    }

    #[test]
    fn prop_streaming_round_trip(
        text in text_strategy(),
        comp_chunks in prop::collection::vec(1usize..40, 1..8),
        dec_chunks in prop::collection::vec(1usize..40, 1..8),
    ) {
        let comp = compress_chunked(text.as_bytes(), &comp_chunks);
        prop_assert_eq!(decompress_chunked(&comp, &dec_chunks), text.as_bytes());
    }

    #[test]
    fn prop_ascii_bytes_round_trip(data in prop::collection::vec(0u8..0x80, 1..2000)) {
        let comp = compress(&data).unwrap();
        let in_bounds = pointers(&comp).iter().all(|&(d, l)| {
            (1..=MAX_MATCH_DISTANCE).contains(&d)
                && (MIN_SEQUENCE_LENGTH..=MAX_SEQUENCE_LENGTH).contains(&l)
        });
        prop_assert!(in_bounds, "pointer out of bounds: {:?}", pointers(&comp));
        prop_assert_eq!(decompress(&comp).unwrap(), data);
    }
}

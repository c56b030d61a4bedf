mod common;

use bytes::Bytes;
use common::delta_frame;
use futures_util::{stream, StreamExt};
use relaychat::stream::{assemble, SseAssembler, StreamEvent};

fn fold(chunks: &[&[u8]]) -> String {
    let mut asm = SseAssembler::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(asm.feed(chunk));
    }
    events.extend(asm.finish());

    events
        .into_iter()
        .filter_map(|e| match e {
            StreamEvent::Delta(text) => Some(text),
            StreamEvent::Done => None,
        })
        .collect()
}

fn sample_stream() -> (Vec<u8>, String) {
    let deltas = ["你好", "，", "world", " 🦀", "!\n", "\"quoted\"", "é"];
    let mut body = String::from(": ping\n\n");
    body.push_str("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n");
    for d in deltas {
        body.push_str(&delta_frame(d));
    }
    body.push_str("data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n");
    body.push_str("data: [DONE]\n\n");
    (body.into_bytes(), deltas.concat())
}

#[test]
fn hello_split_inside_json() {
    let content = fold(&[
        b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel",
        b"lo\"}}]}\n\ndata: [DONE]\n\n",
    ]);
    assert_eq!(content, "Hello");
}

#[test]
fn every_single_cut_point_gives_the_same_content() {
    let (bytes, expected) = sample_stream();
    for cut in 0..=bytes.len() {
        let (a, b) = bytes.split_at(cut);
        assert_eq!(fold(&[a, b]), expected, "cut at {cut}");
    }
}

#[test]
fn fixed_chunk_sizes_give_the_same_content() {
    let (bytes, expected) = sample_stream();
    for size in 1..=17 {
        let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
        assert_eq!(fold(&chunks), expected, "chunk size {size}");
    }
}

#[test]
fn uneven_segmentation_gives_the_same_content() {
    let (bytes, expected) = sample_stream();
    let pattern = [3usize, 1, 7, 2, 11, 5, 1, 13];
    for offset in 0..pattern.len() {
        let mut chunks = Vec::new();
        let mut rest = bytes.as_slice();
        let mut i = offset;
        while !rest.is_empty() {
            let n = pattern[i % pattern.len()].min(rest.len());
            let (head, tail) = rest.split_at(n);
            chunks.push(head);
            rest = tail;
            i += 1;
        }
        assert_eq!(fold(&chunks), expected, "pattern offset {offset}");
    }
}

#[test]
fn done_never_changes_content() {
    let with = fold(&[b"data: [DONE]\n\n", delta_frame("a").as_bytes(), b"data: [DONE]\n\ndata: [DONE]"]);
    let without = fold(&[delta_frame("a").as_bytes()]);
    assert_eq!(with, without);
    assert_eq!(with, "a");
}

#[test]
fn final_frame_without_newline_is_not_lost() {
    let body = r#"data: {"choices":[{"delta":{"content":"tail"}}]}"#;
    assert_eq!(fold(&[body.as_bytes()]), "tail");
}

#[tokio::test]
async fn async_adapter_matches_sync_fold() {
    let (bytes, expected) = sample_stream();
    let chunks: Vec<Result<Bytes, std::convert::Infallible>> = bytes
        .chunks(5)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();

    let events: Vec<StreamEvent> = assemble(stream::iter(chunks))
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(events.last(), Some(&StreamEvent::Done));
    let content: String = events
        .into_iter()
        .filter_map(|e| match e {
            StreamEvent::Delta(t) => Some(t),
            StreamEvent::Done => None,
        })
        .collect();
    assert_eq!(content, expected);
}

#[tokio::test]
async fn stopping_early_is_just_dropping_the_stream() {
    let (bytes, _) = sample_stream();
    let chunks: Vec<Result<Bytes, std::convert::Infallible>> =
        vec![Ok(Bytes::from(bytes))];

    let first: Vec<_> = assemble(stream::iter(chunks)).take(1).collect().await;
    assert_eq!(first, vec![Ok(StreamEvent::Delta("你好".to_string()))]);
}

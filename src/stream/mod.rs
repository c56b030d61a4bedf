//! Incremental assembly of an SSE chat-completion stream.

pub mod assembler;
pub mod decoder;

pub use assembler::{SseAssembler, StreamEvent};
pub use decoder::Utf8Decoder;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

/// Adapts a byte stream into assembled events. A transport error is yielded
/// once and ends the stream; dropping the returned stream stops the read.
pub fn assemble<S, E>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    async_stream::stream! {
        let mut byte_stream = std::pin::pin!(byte_stream);
        let mut assembler = SseAssembler::new();

        while let Some(chunk) = byte_stream.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in assembler.feed(&bytes) {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        for event in assembler.finish() {
            yield Ok(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn error_ends_the_stream() {
        let chunks: Vec<Result<Bytes, &str>> = vec![
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n")),
            Err("reset"),
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n")),
        ];
        let events: Vec<_> = assemble(stream::iter(chunks)).collect().await;
        assert_eq!(
            events,
            vec![Ok(StreamEvent::Delta("a".to_string())), Err("reset")]
        );
    }
}

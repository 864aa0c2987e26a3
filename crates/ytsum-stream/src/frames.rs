//! Lazy, cancellable frame stream over a byte stream.

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};

use crate::cancel::CancelSignal;
use crate::error::{StreamError, StreamResult};
use crate::parser::{SseFrame, SseParser};

struct FrameState<S> {
    body: Pin<Box<S>>,
    parser: SseParser,
    ready: VecDeque<SseFrame>,
    cancel: CancelSignal,
    exhausted: bool,
}

/// Turn a byte stream into SSE frames.
///
/// Frames are produced on demand. The stream ends when the body ends (after
/// flushing any unterminated last line), after the first transport error, or
/// as soon as `cancel` fires. Dropping the returned stream drops the body.
pub fn sse_frames<S, B, E>(body: S, cancel: CancelSignal) -> impl Stream<Item = StreamResult<SseFrame>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<StreamError> + Send,
{
    let state = FrameState {
        body: Box::pin(body),
        parser: SseParser::new(),
        ready: VecDeque::new(),
        cancel,
        exhausted: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if st.cancel.is_cancelled() {
                return None;
            }
            if let Some(frame) = st.ready.pop_front() {
                return Some((Ok(frame), st));
            }
            if st.exhausted {
                return None;
            }

            let next = tokio::select! {
                biased;
                _ = st.cancel.cancelled() => return None,
                chunk = st.body.next() => chunk,
            };

            match next {
                Some(Ok(bytes)) => {
                    let frames = st.parser.feed(bytes.as_ref());
                    st.ready.extend(frames);
                }
                Some(Err(e)) => {
                    st.exhausted = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.exhausted = true;
                    let frames = st.parser.finish();
                    st.ready.extend(frames);
                }
            }
        }
    })
}

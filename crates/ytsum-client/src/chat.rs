//! Question answering over a transcript.

use tokio::sync::watch;
use tracing::{debug, warn};

use ytsum_models::{ChatMessage, ChatTurn};
use ytsum_stream::{
    CancelSignal, ChatRequest, ChatStreamer, NoopObserver, StreamError, StreamObserver, StreamOutcome,
};

use crate::error::{ClientError, ClientResult};

/// Assistant text used when a reply fails before any content arrived.
pub const CHAT_FALLBACK_MESSAGE: &str = "Sorry, I couldn't answer that. Please try again.";

/// An ordered conversation about one transcript.
///
/// Each question appends a user message and a streaming assistant
/// placeholder that grows in place until the reply completes, is stopped or
/// fails. The message list is published over a `watch` channel.
pub struct ChatSession {
    streamer: ChatStreamer,
    transcript: String,
    messages: watch::Sender<Vec<ChatMessage>>,
}

impl ChatSession {
    pub fn new(streamer: ChatStreamer, transcript: impl Into<String>) -> Self {
        let (messages, _rx) = watch::channel(Vec::new());
        Self {
            streamer,
            transcript: transcript.into(),
            messages,
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.messages.subscribe()
    }

    /// Ask a question and wait for the reply.
    pub async fn ask(&self, question: &str, cancel: CancelSignal) -> ClientResult<ChatMessage> {
        self.ask_with(question, &NoopObserver, cancel).await
    }

    /// Ask a question, forwarding stream callbacks to `observer`.
    ///
    /// Returns the frozen assistant message.
    pub async fn ask_with(
        &self,
        question: &str,
        observer: &dyn StreamObserver,
        cancel: CancelSignal,
    ) -> ClientResult<ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ClientError::invalid_input("question is empty"));
        }

        let user = ChatMessage::user(question);
        let placeholder = ChatMessage::assistant_placeholder();
        let reply_id = placeholder.id.clone();

        let mut turns = Vec::new();
        self.messages.send_modify(|messages| {
            turns = messages
                .iter()
                .filter(|m| !m.is_streaming && !m.content.is_empty())
                .map(ChatTurn::from)
                .collect::<Vec<_>>();
            turns.push(ChatTurn::from(&user));
            messages.push(user);
            messages.push(placeholder);
        });

        let request = ChatRequest {
            messages: turns,
            transcript: self.transcript.clone(),
        };
        let forwarder = MessageObserver {
            messages: &self.messages,
            reply_id: &reply_id,
            inner: observer,
        };

        let outcome = self.streamer.stream(&request, &forwarder, cancel).await;

        let failed = match &outcome {
            StreamOutcome::Failed { error, .. } => {
                warn!(error = %error, "Chat reply failed");
                true
            }
            StreamOutcome::Cancelled { partial } => {
                debug!(received = partial.len(), "Chat reply stopped");
                false
            }
            StreamOutcome::Completed(_) => false,
        };

        let mut reply = None;
        self.messages.send_modify(|messages| {
            if let Some(message) = messages.iter_mut().find(|m| m.id == reply_id) {
                if failed && message.content.is_empty() {
                    message.content = CHAT_FALLBACK_MESSAGE.to_string();
                }
                message.freeze();
                reply = Some(message.clone());
            }
        });

        reply.ok_or_else(|| ClientError::invalid_input("chat reply vanished"))
    }

    /// Drop every message.
    pub fn clear(&self) {
        self.messages.send_modify(Vec::clear);
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("streamer", &self.streamer)
            .field("messages", &self.messages.borrow().len())
            .finish()
    }
}

/// Appends chunks to the assistant placeholder and forwards callbacks.
struct MessageObserver<'a> {
    messages: &'a watch::Sender<Vec<ChatMessage>>,
    reply_id: &'a str,
    inner: &'a dyn StreamObserver,
}

impl StreamObserver for MessageObserver<'_> {
    fn on_chunk(&self, chunk: &str) {
        self.messages.send_if_modified(|messages| {
            messages
                .iter_mut()
                .find(|m| m.id == self.reply_id)
                .is_some_and(|m| m.append(chunk))
        });
        self.inner.on_chunk(chunk);
    }

    fn on_complete(&self, text: &str) {
        self.inner.on_complete(text);
    }

    fn on_error(&self, error: &StreamError) {
        self.inner.on_error(error);
    }
}

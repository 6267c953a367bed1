//! Shared test support: a scripted in-memory stream client plus polling
//! helpers bounded by a deadline.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use streamvisor::{
    Ack, ClientConfig, ClientError, Config, EventHandler, EventStreamClient, MessageSink,
    RecordedEvent, StreamMessage, SubscribeOptions,
};

/// What a subscribe call does after feeding its scripted messages.
#[derive(Clone, Copy, Debug)]
pub enum AfterFeed {
    /// Stay open (idle stream) until the stop token fires.
    StayOpen,
    /// Return cleanly, as if the stream ended.
    End,
    /// Fail with a transport error.
    Fail,
    /// Ignore the stop token entirely; only an abort ends the call.
    Hang,
}

/// In-memory [`EventStreamClient`] replaying the same script on every
/// subscribe call.
pub struct ScriptedClient {
    config: ClientConfig,
    messages: Vec<StreamMessage>,
    after: AfterFeed,
    /// The first N calls fail with a transport error after feeding.
    fail_first: usize,
    decode_fails: bool,
    calls: AtomicUsize,
    captured: Mutex<Vec<SubscribeOptions>>,
}

impl ScriptedClient {
    fn base(messages: Vec<StreamMessage>, after: AfterFeed) -> Self {
        Self {
            config: ClientConfig::default(),
            messages,
            after,
            fail_first: 0,
            decode_fails: false,
            calls: AtomicUsize::new(0),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted(messages: Vec<StreamMessage>, after: AfterFeed) -> Arc<Self> {
        Arc::new(Self::base(messages, after))
    }

    /// No messages; stays open until cancelled.
    pub fn idle() -> Arc<Self> {
        Self::scripted(Vec::new(), AfterFeed::StayOpen)
    }

    /// Every call fails immediately with a transport error.
    pub fn failing() -> Arc<Self> {
        Self::scripted(Vec::new(), AfterFeed::Fail)
    }

    /// Ignores the stop token; only a forced abort ends the read.
    pub fn hanging() -> Arc<Self> {
        Self::scripted(Vec::new(), AfterFeed::Hang)
    }

    /// Feeds `messages`, fails the first call, then stays open on later
    /// calls.
    pub fn fail_once_then_idle(messages: Vec<StreamMessage>) -> Arc<Self> {
        let mut client = Self::base(messages, AfterFeed::StayOpen);
        client.fail_first = 1;
        Arc::new(client)
    }

    /// Every decode attempt fails.
    pub fn decode_failing(messages: Vec<StreamMessage>) -> Arc<Self> {
        let mut client = Self::base(messages, AfterFeed::StayOpen);
        client.decode_fails = true;
        Arc::new(client)
    }

    /// Number of subscribe calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Options captured from each subscribe call, in order.
    pub fn captured_options(&self) -> Vec<SubscribeOptions> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStreamClient for ScriptedClient {
    fn config(&self) -> ClientConfig {
        self.config
    }

    async fn subscribe_to_stream(
        &self,
        _stream: &str,
        options: &SubscribeOptions,
        stop: CancellationToken,
        sink: MessageSink<'_>,
    ) -> Result<(), ClientError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.captured.lock().unwrap().push(options.clone());

        for message in self.messages.clone() {
            if stop.is_cancelled() {
                return Ok(());
            }
            if let Ack::Stop = sink(message) {
                return Ok(());
            }
            tokio::task::yield_now().await;
        }

        if call <= self.fail_first {
            return Err(ClientError::Transport("scripted failure".into()));
        }
        match self.after {
            AfterFeed::StayOpen => {
                stop.cancelled().await;
                Ok(())
            }
            AfterFeed::End => Ok(()),
            AfterFeed::Fail => Err(ClientError::Transport("scripted failure".into())),
            AfterFeed::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    fn decode(
        &self,
        message: &StreamMessage,
        _skip_deserialization: bool,
        _skip_decryption: bool,
    ) -> Result<Option<RecordedEvent>, ClientError> {
        if self.decode_fails {
            return Err(ClientError::Decode("scripted decode failure".into()));
        }
        match message {
            StreamMessage::Event(event) => Ok(Some(event.clone())),
            _ => Ok(None),
        }
    }
}

/// A stored event with the given positions.
pub fn recorded(stream: &str, revision: u64, commit: u64, prepare: u64) -> RecordedEvent {
    RecordedEvent {
        id: format!("{stream}-{revision}"),
        stream_name: stream.to_string(),
        event_type: "tested".to_string(),
        stream_revision: revision,
        commit_position: commit,
        prepare_position: prepare,
        data: Vec::new(),
        metadata: Vec::new(),
    }
}

/// An event message with the given positions.
pub fn event_msg(stream: &str, revision: u64, commit: u64, prepare: u64) -> StreamMessage {
    StreamMessage::Event(recorded(stream, revision, commit, prepare))
}

/// Config with test-sized delays.
pub fn fast_config() -> Config {
    Config {
        forced_shutdown_delay: Duration::from_millis(200),
        halt_poll_interval: Duration::from_millis(10),
        watchdog_interval: Duration::from_millis(50),
        bus_capacity: 64,
    }
}

/// Handler accepting every event.
pub fn ok_handler() -> EventHandler {
    Arc::new(|_| Ok(()))
}

/// Handler counting the events it accepts.
pub fn counting_handler() -> (EventHandler, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let handler: EventHandler = Arc::new(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (handler, count)
}

/// Handler failing on every event.
pub fn failing_handler(message: &'static str) -> EventHandler {
    Arc::new(move |_| Err(message.into()))
}

/// Polls `predicate` every 10ms until it holds, panicking after 5s.
pub async fn wait_until(what: &str, mut predicate: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !predicate() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

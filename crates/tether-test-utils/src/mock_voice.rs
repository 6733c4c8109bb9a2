// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock voice engine SDK.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use tether_core::types::EngineEvent;
use tether_core::{TetherError, VoiceEngine, VoiceEngineFactory};

use crate::lock;

/// One call made on [`MockVoiceEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Initialize { app_id: String },
    EnableAudio,
    Join { token: String, channel: String, uid: u32 },
    Leave,
    Release,
}

/// Records every engine call. Events are injected with [`emit`](Self::emit).
pub struct MockVoiceEngine {
    calls: Mutex<Vec<EngineCall>>,
    events: broadcast::Sender<EngineEvent>,
    fail_initialize: AtomicBool,
    fail_join: AtomicBool,
    fail_leave: AtomicBool,
    join_delay: Mutex<Option<Duration>>,
}

impl MockVoiceEngine {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            calls: Mutex::new(Vec::new()),
            events,
            fail_initialize: AtomicBool::new(false),
            fail_join: AtomicBool::new(false),
            fail_leave: AtomicBool::new(false),
            join_delay: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.calls).clone()
    }

    /// Channels joined, in order.
    pub fn joined_channels(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                EngineCall::Join { channel, .. } => Some(channel.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn leave_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Leave))
    }

    pub fn release_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Release))
    }

    pub fn initialize_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Initialize { .. }))
    }

    fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    pub fn set_initialize_failure(&self, fail: bool) {
        self.fail_initialize.store(fail, Ordering::SeqCst);
    }

    pub fn set_join_failure(&self, fail: bool) {
        self.fail_join.store(fail, Ordering::SeqCst);
    }

    pub fn set_leave_failure(&self, fail: bool) {
        self.fail_leave.store(fail, Ordering::SeqCst);
    }

    /// Makes every following join take `delay` before it completes.
    pub fn set_join_delay(&self, delay: Duration) {
        *lock(&self.join_delay) = Some(delay);
    }

    /// Deliver `event` to every subscriber. Returns the number of receivers.
    pub fn emit(&self, event: EngineEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn record(&self, call: EngineCall) {
        lock(&self.calls).push(call);
    }
}

impl Default for MockVoiceEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoiceEngine for MockVoiceEngine {
    async fn initialize(&self, app_id: &str) -> Result<(), TetherError> {
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(TetherError::engine("initialize rejected"));
        }
        self.record(EngineCall::Initialize {
            app_id: app_id.to_string(),
        });
        Ok(())
    }

    async fn enable_audio(&self) -> Result<(), TetherError> {
        self.record(EngineCall::EnableAudio);
        Ok(())
    }

    async fn join_channel(&self, token: &str, channel: &str, uid: u32) -> Result<(), TetherError> {
        let delay = *lock(&self.join_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_join.load(Ordering::SeqCst) {
            return Err(TetherError::engine("join rejected"));
        }
        self.record(EngineCall::Join {
            token: token.to_string(),
            channel: channel.to_string(),
            uid,
        });
        Ok(())
    }

    async fn leave_channel(&self) -> Result<(), TetherError> {
        self.record(EngineCall::Leave);
        if self.fail_leave.load(Ordering::SeqCst) {
            return Err(TetherError::engine("leave rejected"));
        }
        Ok(())
    }

    async fn release(&self) -> Result<(), TetherError> {
        self.record(EngineCall::Release);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}

/// Hands out one shared [`MockVoiceEngine`] and counts constructions.
pub struct MockVoiceEngineFactory {
    engine: Arc<MockVoiceEngine>,
    created: AtomicUsize,
    fail_create: AtomicBool,
}

impl MockVoiceEngineFactory {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(MockVoiceEngine::new()),
            created: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
        }
    }

    /// The engine every successful `create` returns.
    pub fn engine(&self) -> Arc<MockVoiceEngine> {
        Arc::clone(&self.engine)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn set_create_failure(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockVoiceEngineFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoiceEngineFactory for MockVoiceEngineFactory {
    async fn create(&self) -> Result<Arc<dyn VoiceEngine>, TetherError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(TetherError::engine("engine construction failed"));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self.engine.clone() as Arc<dyn VoiceEngine>)
    }
}

//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use credsync::prelude::*;

/// Opt-in log output for debugging a failing test run.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Target-system updater that records every pushed value.
pub struct StubUpdater {
    pub accept: bool,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl StubUpdater {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            accept: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            accept: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn pushed_values(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, v)| v.clone()).collect()
    }
}

#[async_trait]
impl TargetUpdater for StubUpdater {
    async fn update(&self, name: &str, value: &str) -> EngineResult<bool> {
        self.calls.lock().push((name.to_string(), value.to_string()));
        Ok(self.accept)
    }
}

/// Authentication prober with a fixed verdict.
pub struct StubProber {
    pub accept: bool,
}

impl StubProber {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self { accept: true })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self { accept: false })
    }
}

#[async_trait]
impl AuthProber for StubProber {
    async fn test(&self, _name: &str, _value: &str) -> EngineResult<bool> {
        Ok(self.accept)
    }
}

/// Coordinator over the given store with accepting collaborators.
pub fn coordinator(store: Arc<MemoryStore>, audit: Arc<AuditLog>) -> RotationCoordinator {
    RotationCoordinator::builder()
        .store(store)
        .updater(StubUpdater::accepting())
        .prober(StubProber::accepting())
        .audit(audit)
        .build()
        .unwrap()
}

pub fn event(secret: &str, token: &str, step: RotationStep) -> RotationEvent {
    RotationEvent::new(secret, token, step)
}

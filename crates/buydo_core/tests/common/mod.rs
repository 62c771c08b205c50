#![allow(dead_code)]

use buydo_core::{
    Collaborators, CoreConfig, KvError, KvStore, ManualClock, MemoryKvStore, NotificationCenter,
    NotificationChannel, NotificationError, NotificationRequest, Platform, ReactiveStore,
};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
}

pub fn test_config(platform: Platform) -> CoreConfig {
    CoreConfig {
        platform,
        ..CoreConfig::with_data_dir(std::env::temp_dir().join("buydo-core-tests"))
    }
}

/// Store over a shared in-memory KV with a fixed clock.
pub fn open_memory_store(
    kv: &Arc<MemoryKvStore>,
    collaborators: Collaborators,
) -> ReactiveStore<Arc<MemoryKvStore>> {
    ReactiveStore::open(
        Arc::clone(kv),
        collaborators.with_clock(ManualClock::new(fixed_now())),
        test_config(Platform::Ios),
    )
}

pub fn open_flaky_store(kv: &Arc<FlakyKv>) -> ReactiveStore<Arc<FlakyKv>> {
    ReactiveStore::open(
        Arc::clone(kv),
        Collaborators::default().with_clock(ManualClock::new(fixed_now())),
        test_config(Platform::Ios),
    )
}

/// KV whose reads or writes can be switched to fail, optionally per key.
#[derive(Default)]
pub struct FlakyKv {
    pub inner: MemoryKvStore,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub failing_keys: Mutex<HashSet<String>>,
    pub writes: AtomicUsize,
}

impl FlakyKv {
    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    fn key_fails(&self, key: &str) -> bool {
        self.failing_keys.lock().unwrap().contains(key)
    }
}

impl KvStore for FlakyKv {
    fn get_item(&self, key: &str) -> Result<Option<String>, KvError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("reads disabled".to_string()));
        }
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KvError> {
        if self.fail_writes.load(Ordering::SeqCst) || self.key_fails(key) {
            return Err(KvError::Unavailable(format!("write refused for {key}")));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), KvError> {
        self.inner.remove_item(key)
    }
}

/// Notification center that records every call.
pub struct RecordingNotifications {
    pub granted: AtomicBool,
    pub grant_on_request: bool,
    pub requests: Mutex<Vec<NotificationRequest>>,
    pub channels: Mutex<Vec<NotificationChannel>>,
    pub cancelled: Mutex<Vec<String>>,
    /// When set, `cancel` records the id and then reports a backend error.
    pub fail_cancel: AtomicBool,
    next_id: AtomicUsize,
}

impl RecordingNotifications {
    pub fn granting() -> Arc<Self> {
        Arc::new(Self::new(true))
    }

    pub fn denying() -> Arc<Self> {
        Arc::new(Self::new(false))
    }

    fn new(grant_on_request: bool) -> Self {
        Self {
            granted: AtomicBool::new(false),
            grant_on_request,
            requests: Mutex::new(Vec::new()),
            channels: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            fail_cancel: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn scheduled(&self) -> Vec<NotificationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl NotificationCenter for RecordingNotifications {
    fn permission_granted(&self) -> Result<bool, NotificationError> {
        Ok(self.granted.load(Ordering::SeqCst))
    }

    fn request_permission(&self) -> Result<bool, NotificationError> {
        self.granted.store(self.grant_on_request, Ordering::SeqCst);
        Ok(self.grant_on_request)
    }

    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotificationError> {
        self.channels.lock().unwrap().push(*channel);
        Ok(())
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<String, NotificationError> {
        self.requests.lock().unwrap().push(request.clone());
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("notif-{id}"))
    }

    fn cancel(&self, notification_id: &str) -> Result<(), NotificationError> {
        self.cancelled.lock().unwrap().push(notification_id.to_string());
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(NotificationError::new("cancel rejected"));
        }
        Ok(())
    }
}

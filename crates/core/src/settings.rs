//! Runtime settings with a change bus.
//!
//! Reads are synchronous. Every change of a value is published on a
//! broadcast channel so that dependent state (the result cache) can react.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Capacity of the change channel; slow subscribers see `Lagged`.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Settings options relevant to safebrowsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SettingOption {
    #[serde(rename = "safebrowsing-disabled")]
    DisableSafebrowsing,
}

/// A published settings change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SettingChange {
    pub option: SettingOption,
    pub value: bool,
}

#[derive(Debug)]
pub struct Settings {
    safebrowsing_disabled: AtomicBool,
    events: broadcast::Sender<SettingChange>,
}

impl Settings {
    pub fn new(safebrowsing_disabled: bool) -> Self {
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { safebrowsing_disabled: AtomicBool::new(safebrowsing_disabled), events }
    }

    pub fn is_safebrowsing_disabled(&self) -> bool {
        self.safebrowsing_disabled.load(Ordering::SeqCst)
    }

    /// Update the option, publishing a change only if the value differs.
    pub fn set_safebrowsing_disabled(&self, disabled: bool) {
        let previous = self.safebrowsing_disabled.swap(disabled, Ordering::SeqCst);
        if previous == disabled {
            return;
        }

        let change = SettingChange { option: SettingOption::DisableSafebrowsing, value: disabled };
        if self.events.send(change).is_err() {
            tracing::debug!("no subscribers for settings change");
        }
    }

    /// Subscribe to settings changes made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
        self.events.subscribe()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(false)
    }
}

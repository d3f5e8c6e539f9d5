//! Auto-fetch when the cockpit requests an AOC flight plan uplink.
//!
//! The host polls this from its flight loop with the current MCDU
//! scratchpad bytes and reschedules itself with the returned delay.

use std::time::Duration;

use tracing::info;

/// Scratchpad text shown when the crew requests the uplink.
pub const UPLINK_MESSAGE: &str = "AOC ACT F-PLN UPLINK";

/// Bytes of scratchpad compared.
pub const SCRATCHPAD_LEN: usize = 25;

/// Retry delay while the scratchpad data is not available yet.
pub const UNMAPPED_DELAY: Duration = Duration::from_secs(10);
/// Delay between scratchpad checks.
pub const POLL_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPoll {
    /// Call again after the delay.
    Again(Duration),
    /// The uplink was requested: fetch now. Reported once.
    Fire,
    /// Already fired; stop polling.
    Done,
}

#[derive(Debug, Default)]
pub struct UplinkTrigger {
    fired: bool,
}

impl UplinkTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// `None` for a scratchpad means its data is not available.
    pub fn poll(&mut self, mcdu1: Option<&[u8]>, mcdu2: Option<&[u8]>) -> TriggerPoll {
        if self.fired {
            return TriggerPoll::Done;
        }
        let (Some(mcdu1), Some(mcdu2)) = (mcdu1, mcdu2) else {
            return TriggerPoll::Again(UNMAPPED_DELAY);
        };
        if is_uplink_request(mcdu1) || is_uplink_request(mcdu2) {
            info!("AOC uplink request detected");
            self.fired = true;
            return TriggerPoll::Fire;
        }
        TriggerPoll::Again(POLL_DELAY)
    }
}

/// Scratchpad equals `UPLINK_MESSAGE`, reading at most `SCRATCHPAD_LEN`
/// bytes and stopping at the first NUL.
pub fn is_uplink_request(scratchpad: &[u8]) -> bool {
    let window = &scratchpad[..scratchpad.len().min(SCRATCHPAD_LEN)];
    let text = match window.iter().position(|&b| b == 0) {
        Some(nul) => &window[..nul],
        None => window,
    };
    text == UPLINK_MESSAGE.as_bytes()
}

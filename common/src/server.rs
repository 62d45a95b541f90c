use crate::prayer::PrayerConfig;

use serde::{ Serialize, Deserialize };

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    SetConfig { config: PrayerConfig, cancel_behaviour: CancelBehaviour },
    Rejected { reason: String },
}

/// Whether a pushed config interrupts the receiver's running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelBehaviour {
    Always,
    IfUnequal,
    Never,
}

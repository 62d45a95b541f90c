use serde::{ Deserialize, Serialize };

use crate::prayer::PrayerConfigUpdate;

/// Messages sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    RequestConfig,
    UpdateConfig(PrayerConfigUpdate),
}

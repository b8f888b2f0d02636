//! Update notifications for connected clients.
//!
//! After a new version activates, every connected presentation context
//! receives one `UpdateNotice`. Delivery is fire-and-forget: the manager
//! does not force a reload, the receiver decides whether to prompt the
//! user.

use serde::{Deserialize, Serialize};

/// Message type tag, matching the payload the app shell listens for.
pub const UPDATE_AVAILABLE: &str = "UPDATE_AVAILABLE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNotice {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
}

impl UpdateNotice {
    pub fn new(version: &str) -> Self {
        Self {
            kind: UPDATE_AVAILABLE.to_string(),
            version: version.to_string(),
        }
    }
}

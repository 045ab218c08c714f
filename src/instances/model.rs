//! Instance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored credentials for one remote VMS server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: i64,
    /// Filled in from the device settings after the first connection.
    pub name: Option<String>,
    pub ip: String,
    pub http_port: u16,
    pub rtsp_port: u16,
    pub login: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/instances`. Missing fields deserialize to empty values
/// so that incomplete input is reported as invalid data, not invalid JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewInstance {
    pub ip: String,
    pub http_port: u16,
    pub rtsp_port: u16,
    pub login: String,
    pub password: String,
}

impl NewInstance {
    /// Every field present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.ip.is_empty()
            && self.http_port != 0
            && self.rtsp_port != 0
            && !self.login.is_empty()
            && !self.password.is_empty()
    }

    pub(crate) fn into_instance(self, id: i64) -> Instance {
        Instance {
            id,
            name: None,
            ip: self.ip,
            http_port: self.http_port,
            rtsp_port: self.rtsp_port,
            login: self.login,
            password: self.password,
            created_at: Utc::now(),
        }
    }
}

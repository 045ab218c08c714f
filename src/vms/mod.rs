//! Vendor client subsystem.
//!
//! # Responsibilities
//! - Define the interface the gateway needs from a VMS vendor library
//! - Model channels and stream types shared by every vendor client
//!
//! # Data Flow
//! ```text
//! Instance row (store)
//!     → VmsConnector::connect
//!     → Arc<dyn VmsClient> (cached by instances::pool)
//!     → state / channels / screenshot / video
//! ```
//!
//! # Design Decisions
//! - Device protocol lives behind the traits; the gateway never speaks it
//! - Object-safe traits with boxed futures so clients can be swapped at runtime

pub mod offline;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::body::Bytes;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instances::Instance;

pub use offline::OfflineConnector;

/// Channel group holding the instance's own cameras.
pub const LOCAL_CHANNELS: &str = "channels";

/// Future returned by vendor client calls.
pub type VmsFuture<'a, T> = BoxFuture<'a, Result<T, VmsError>>;

/// Errors reported by vendor clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmsError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Channel not found")]
    ChannelNotFound,

    #[error("{0}")]
    Unavailable(String),
}

/// One camera channel as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub guid: String,
    pub name: String,
    /// Owning server, for channels that live on a remote server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_guid: Option<String>,
}

/// Channels grouped by kind (`channels`, `remote_channels`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMap(BTreeMap<String, Vec<Channel>>);

impl ChannelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: impl Into<String>, channels: Vec<Channel>) {
        self.0.insert(kind.into(), channels);
    }

    /// Find a channel by guid across every kind.
    pub fn locate(&self, guid: &str) -> Option<(&str, &Channel)> {
        self.0.iter().find_map(|(kind, channels)| {
            channels
                .iter()
                .find(|c| c.guid == guid)
                .map(|c| (kind.as_str(), c))
        })
    }

    /// Server that must be asked for media of `guid`: the instance itself for
    /// local channels, the owning server otherwise.
    pub fn media_server<'a>(&'a self, guid: &str, instance_name: &'a str) -> Option<&'a str> {
        let (kind, channel) = self.locate(guid)?;
        if kind == LOCAL_CHANNELS {
            Some(instance_name)
        } else {
            channel.server_guid.as_deref()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

/// Live video delivery protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Hls,
    Rtsp,
}

impl FromStr for StreamType {
    type Err = VmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hls" => Ok(StreamType::Hls),
            "rtsp" => Ok(StreamType::Rtsp),
            other => Err(VmsError::Unavailable(format!("unsupported stream type `{other}`"))),
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamType::Hls => f.write_str("hls"),
            StreamType::Rtsp => f.write_str("rtsp"),
        }
    }
}

/// A connected vendor client for one instance.
pub trait VmsClient: Send + Sync {
    /// Connection state as reported by the vendor library.
    fn state(&self) -> String;

    /// Server name from the device settings, once known.
    fn server_name(&self) -> Option<String>;

    fn channels(&self) -> ChannelMap;

    /// Still image from `channel` on `server`.
    fn screenshot<'a>(&'a self, server: &'a str, channel: &'a str) -> VmsFuture<'a, Bytes>;

    /// Playable URL for `channel` on `server`.
    fn video<'a>(
        &'a self,
        server: &'a str,
        channel: &'a str,
        stream: StreamType,
    ) -> VmsFuture<'a, String>;
}

/// Creates vendor clients from stored instance credentials.
pub trait VmsConnector: Send + Sync {
    fn connect(&self, instance: &Instance) -> VmsFuture<'static, Arc<dyn VmsClient>>;
}

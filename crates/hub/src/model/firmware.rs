// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Firmware update progression. `installed`, `failed`, and `rolled_back`
/// are terminal; a `failed` record is additionally locked against rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Pending,
    Downloading,
    Downloaded,
    Installing,
    Installed,
    Failed,
    RolledBack,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Downloaded => "downloaded",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Failed => "failed",
            Self::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Installed | Self::Failed | Self::RolledBack)
    }
}

/// A firmware update attempt for one device. At most one non-terminal update
/// may exist per device; `progress` is monotonic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareUpdate {
    pub id: String,
    pub device_id: String,
    pub from_version: String,
    pub to_version: String,
    pub status: UpdateStatus,
    pub progress: u8,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Update initiation request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareUpdateRequest {
    pub device_id: String,
    pub to_version: String,
    #[serde(default)]
    pub force: bool,
}

/// Catalog entry for a published firmware version, keyed by version string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareMetadata {
    pub version: String,
    pub size_bytes: u64,
    pub checksum: String,
    pub release_notes: String,
    pub min_compatible_version: String,
    pub created_at_ms: u64,
}

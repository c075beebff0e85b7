// This file is part of the terraform-provider-edgecenter project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Metadata;
use crate::client::{Client, Location};
use crate::error::Result;
use crate::task::TaskResults;

pub const KIND: &str = "volumes";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub size: i64,
    #[serde(default)]
    pub volume_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub bootable: bool,
    #[serde(default)]
    pub snapshot_ids: Vec<String>,
    /// Snapshot the volume was restored from
    #[serde(default)]
    pub snapshot_id: Option<String>,
    /// Image the volume was created from
    #[serde(default)]
    pub volume_image_metadata: Option<VolumeImageMetadata>,
    #[serde(default)]
    pub attachments: Vec<VolumeAttachment>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VolumeImageMetadata {
    #[serde(default)]
    pub image_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VolumeAttachment {
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateVolume {
    pub source: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
struct Rename<'a> {
    name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct Extend {
    size: i64,
}

#[derive(Debug, Clone, Serialize)]
struct Retype<'a> {
    volume_type: &'a str,
}

impl Client {
    pub async fn list_volumes(&self, location: &Location) -> Result<Vec<Volume>> {
        self.list(&location.path(KIND), &[]).await
    }

    pub async fn get_volume(&self, location: &Location, id: &str) -> Result<Volume> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_volume(&self, location: &Location, opts: &CreateVolume) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn rename_volume(&self, location: &Location, id: &str, name: &str) -> Result<Volume> {
        self.patch(&location.item(KIND, id), &Rename { name }).await
    }

    pub async fn extend_volume(&self, location: &Location, id: &str, size: i64) -> Result<TaskResults> {
        self.post(&format!("{}/extend", location.item(KIND, id)), &Extend { size })
            .await
    }

    pub async fn retype_volume(&self, location: &Location, id: &str, volume_type: &str) -> Result<Volume> {
        self.post(
            &format!("{}/retype", location.item(KIND, id)),
            &Retype { volume_type },
        )
        .await
    }

    pub async fn delete_volume(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }
}

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

pub const KIND: &str = "snapshots";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    pub volume_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateSnapshot {
    pub volume_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
struct Rename<'a> {
    name: &'a str,
}

impl Client {
    pub async fn list_snapshots(&self, location: &Location, volume_id: Option<&str>) -> Result<Vec<Snapshot>> {
        let query: Vec<(&str, String)> = volume_id
            .map(|volume_id| ("volume_id", volume_id.to_owned()))
            .into_iter()
            .collect();
        self.list(&location.path(KIND), &query).await
    }

    pub async fn get_snapshot(&self, location: &Location, id: &str) -> Result<Snapshot> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_snapshot(&self, location: &Location, opts: &CreateSnapshot) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn rename_snapshot(&self, location: &Location, id: &str, name: &str) -> Result<Snapshot> {
        self.patch(&location.item(KIND, id), &Rename { name }).await
    }

    pub async fn delete_snapshot(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }
}

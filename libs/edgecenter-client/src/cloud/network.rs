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

pub const KIND: &str = "networks";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub mtu: Option<i64>,
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub default: Option<bool>,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub segmentation_id: Option<i64>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateNetwork {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    pub create_router: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateNetwork {
    pub name: String,
}

impl Client {
    pub async fn list_networks(&self, location: &Location) -> Result<Vec<Network>> {
        self.list(&location.path(KIND), &[]).await
    }

    pub async fn get_network(&self, location: &Location, id: &str) -> Result<Network> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_network(&self, location: &Location, opts: &CreateNetwork) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn update_network(
        &self,
        location: &Location,
        id: &str,
        opts: &UpdateNetwork,
    ) -> Result<Network> {
        self.patch(&location.item(KIND, id), opts).await
    }

    pub async fn delete_network(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }
}

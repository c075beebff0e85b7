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

pub const KIND: &str = "floatingips";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    #[serde(default)]
    pub floating_ip_address: Option<String>,
    #[serde(default)]
    pub fixed_ip_address: Option<String>,
    #[serde(default)]
    pub port_id: Option<String>,
    #[serde(default)]
    pub router_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateFloatingIp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ip_address: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignFloatingIp {
    pub port_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ip_address: Option<String>,
}

impl Client {
    pub async fn list_floating_ips(&self, location: &Location) -> Result<Vec<FloatingIp>> {
        self.list(&location.path(KIND), &[]).await
    }

    pub async fn get_floating_ip(&self, location: &Location, id: &str) -> Result<FloatingIp> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_floating_ip(&self, location: &Location, opts: &CreateFloatingIp) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn assign_floating_ip(
        &self,
        location: &Location,
        id: &str,
        opts: &AssignFloatingIp,
    ) -> Result<FloatingIp> {
        self.post(&format!("{}/assign", location.item(KIND, id)), opts)
            .await
    }

    pub async fn unassign_floating_ip(&self, location: &Location, id: &str) -> Result<FloatingIp> {
        self.post(
            &format!("{}/unassign", location.item(KIND, id)),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn delete_floating_ip(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }
}

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

use serde::{Deserialize, Serialize};

use crate::client::{Client, Location};
use crate::error::Result;
use crate::task::TaskResults;

pub const KIND: &str = "lblisteners";
/// Kind reported by tasks creating a listener
pub const CREATED_KIND: &str = "listeners";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Listener {
    pub id: String,
    pub name: String,
    pub protocol: String,
    pub protocol_port: i64,
    #[serde(default)]
    pub loadbalancer_id: Option<String>,
    #[serde(default)]
    pub insert_x_forwarded: bool,
    #[serde(default)]
    pub secret_id: Option<String>,
    #[serde(default)]
    pub sni_secret_id: Vec<String>,
    #[serde(default)]
    pub allowed_cidrs: Option<Vec<String>>,
    #[serde(default)]
    pub pool_count: i64,
    #[serde(default)]
    pub provisioning_status: Option<String>,
    #[serde(default)]
    pub operating_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateListener {
    pub loadbalancer_id: String,
    pub name: String,
    pub protocol: String,
    pub protocol_port: i64,
    pub insert_x_forwarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sni_secret_id: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_cidrs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateListener {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<String>,
    pub sni_secret_id: Vec<String>,
    pub allowed_cidrs: Option<Vec<String>>,
}

impl Client {
    pub async fn list_listeners(&self, location: &Location, loadbalancer_id: Option<&str>) -> Result<Vec<Listener>> {
        let query: Vec<(&str, String)> = loadbalancer_id
            .map(|lb_id| ("loadbalancer_id", lb_id.to_owned()))
            .into_iter()
            .collect();
        self.list(&location.path(KIND), &query).await
    }

    pub async fn get_listener(&self, location: &Location, id: &str) -> Result<Listener> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_listener(&self, location: &Location, opts: &CreateListener) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn update_listener(&self, location: &Location, id: &str, opts: &UpdateListener) -> Result<Listener> {
        self.patch(&location.item(KIND, id), opts).await
    }

    pub async fn delete_listener(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }
}

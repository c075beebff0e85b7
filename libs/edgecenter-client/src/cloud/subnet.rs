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

use super::{HostRoute, Metadata};
use crate::client::{Client, Location};
use crate::error::Result;
use crate::task::TaskResults;

pub const KIND: &str = "subnets";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub cidr: String,
    pub network_id: String,
    #[serde(default)]
    pub enable_dhcp: bool,
    #[serde(default)]
    pub gateway_ip: Option<String>,
    #[serde(default)]
    pub dns_nameservers: Option<Vec<String>>,
    #[serde(default)]
    pub host_routes: Option<Vec<HostRoute>>,
    #[serde(default)]
    pub ip_version: Option<i64>,
    #[serde(default)]
    pub connect_to_network_router: Option<bool>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateSubnet {
    pub name: String,
    pub cidr: String,
    pub network_id: String,
    pub enable_dhcp: bool,
    pub connect_to_network_router: bool,
    /// `None` lets the API pick a gateway, `Some(None)` disables it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<Option<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_nameservers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub host_routes: Vec<HostRoute>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateSubnet {
    pub name: String,
    pub enable_dhcp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<Option<String>>,
    pub dns_nameservers: Vec<String>,
    pub host_routes: Vec<HostRoute>,
}

impl Client {
    pub async fn list_subnets(&self, location: &Location, network_id: Option<&str>) -> Result<Vec<Subnet>> {
        let query: Vec<(&str, String)> = network_id
            .map(|network_id| ("network_id", network_id.to_owned()))
            .into_iter()
            .collect();
        self.list(&location.path(KIND), &query).await
    }

    pub async fn get_subnet(&self, location: &Location, id: &str) -> Result<Subnet> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_subnet(&self, location: &Location, opts: &CreateSubnet) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn update_subnet(&self, location: &Location, id: &str, opts: &UpdateSubnet) -> Result<Subnet> {
        self.patch(&location.item(KIND, id), opts).await
    }

    pub async fn delete_subnet(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }
}

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

pub const KIND: &str = "reserved_fixed_ips";
/// Kind reported by tasks creating a reserved fixed IP
pub const CREATED_KIND: &str = "ports";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReservedFixedIp {
    pub port_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fixed_ip_address: Option<String>,
    #[serde(default)]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateReservedFixedIp {
    pub r#type: String,
    pub is_vip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct SwitchVip {
    is_vip: bool,
}

impl Client {
    pub async fn list_reserved_fixed_ips(&self, location: &Location) -> Result<Vec<ReservedFixedIp>> {
        self.list(&location.path(KIND), &[]).await
    }

    pub async fn get_reserved_fixed_ip(&self, location: &Location, port_id: &str) -> Result<ReservedFixedIp> {
        self.get(&location.item(KIND, port_id)).await
    }

    pub async fn create_reserved_fixed_ip(
        &self,
        location: &Location,
        opts: &CreateReservedFixedIp,
    ) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn switch_reserved_fixed_ip_vip(
        &self,
        location: &Location,
        port_id: &str,
        is_vip: bool,
    ) -> Result<ReservedFixedIp> {
        self.patch(&location.item(KIND, port_id), &SwitchVip { is_vip })
            .await
    }

    pub async fn delete_reserved_fixed_ip(&self, location: &Location, port_id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, port_id)).await
    }
}

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

pub const KIND: &str = "loadbalancers";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flavor: Option<Flavor>,
    #[serde(default)]
    pub vip_address: Option<String>,
    #[serde(default)]
    pub vip_port_id: Option<String>,
    #[serde(default)]
    pub vip_network_id: Option<String>,
    #[serde(default)]
    pub vip_subnet_id: Option<String>,
    #[serde(default)]
    pub provisioning_status: Option<String>,
    #[serde(default)]
    pub operating_status: Option<String>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Flavor {
    pub flavor_name: String,
    #[serde(default)]
    pub flavor_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateLoadBalancer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_network_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_port_id: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
struct Rename<'a> {
    name: &'a str,
}

impl Client {
    pub async fn list_load_balancers(&self, location: &Location) -> Result<Vec<LoadBalancer>> {
        self.list(&location.path(KIND), &[]).await
    }

    pub async fn get_load_balancer(&self, location: &Location, id: &str) -> Result<LoadBalancer> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_load_balancer(
        &self,
        location: &Location,
        opts: &CreateLoadBalancer,
    ) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn rename_load_balancer(&self, location: &Location, id: &str, name: &str) -> Result<LoadBalancer> {
        self.patch(&location.item(KIND, id), &Rename { name }).await
    }

    pub async fn delete_load_balancer(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }
}

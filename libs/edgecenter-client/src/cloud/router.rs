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

use super::HostRoute;
use crate::client::{Client, Location};
use crate::error::Result;
use crate::task::TaskResults;

pub const KIND: &str = "routers";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Router {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub external_gateway_info: Option<ExternalGatewayInfo>,
    #[serde(default)]
    pub interfaces: Vec<RouterInterface>,
    #[serde(default)]
    pub routes: Vec<HostRoute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalGatewayInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(default)]
    pub enable_snat: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouterInterface {
    pub port_id: String,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub ip_assignments: Vec<IpAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IpAssignment {
    pub subnet_id: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceOpts {
    pub r#type: String,
    pub subnet_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateRouter {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_gateway_info: Option<ExternalGatewayInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<InterfaceOpts>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<HostRoute>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateRouter {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_gateway_info: Option<ExternalGatewayInfo>,
    pub routes: Vec<HostRoute>,
}

#[derive(Debug, Clone, Serialize)]
struct SubnetRef<'a> {
    subnet_id: &'a str,
}

impl Client {
    pub async fn list_routers(&self, location: &Location) -> Result<Vec<Router>> {
        self.list(&location.path(KIND), &[]).await
    }

    pub async fn get_router(&self, location: &Location, id: &str) -> Result<Router> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_router(&self, location: &Location, opts: &CreateRouter) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn update_router(&self, location: &Location, id: &str, opts: &UpdateRouter) -> Result<Router> {
        self.patch(&location.item(KIND, id), opts).await
    }

    pub async fn attach_router_subnet(&self, location: &Location, id: &str, subnet_id: &str) -> Result<Router> {
        self.post(
            &format!("{}/attach", location.item(KIND, id)),
            &SubnetRef { subnet_id },
        )
        .await
    }

    pub async fn detach_router_subnet(&self, location: &Location, id: &str, subnet_id: &str) -> Result<Router> {
        self.post(
            &format!("{}/detach", location.item(KIND, id)),
            &SubnetRef { subnet_id },
        )
        .await
    }

    pub async fn delete_router(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }
}

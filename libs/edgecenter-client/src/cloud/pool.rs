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

pub const KIND: &str = "lbpools";
/// Kind reported by tasks creating a pool
pub const CREATED_KIND: &str = "pools";
/// Kind reported by tasks creating a pool member
pub const MEMBER_CREATED_KIND: &str = "members";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub protocol: String,
    pub lb_algorithm: String,
    #[serde(default)]
    pub loadbalancers: Vec<IdRef>,
    #[serde(default)]
    pub listeners: Vec<IdRef>,
    #[serde(default)]
    pub healthmonitor: Option<HealthMonitor>,
    #[serde(default)]
    pub session_persistence: Option<SessionPersistence>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub provisioning_status: Option<String>,
    #[serde(default)]
    pub operating_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthMonitor {
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
    pub r#type: String,
    pub delay: i64,
    pub max_retries: i64,
    pub timeout: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries_down: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_codes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPersistence {
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_granularity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_timeout: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub id: String,
    pub address: String,
    pub protocol_port: i64,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub operating_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreatePool {
    pub name: String,
    pub protocol: String,
    pub lb_algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loadbalancer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listener_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthmonitor: Option<HealthMonitor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_persistence: Option<SessionPersistence>,
}

/// Pool update; absent health monitor or session persistence are removed
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePool {
    pub name: String,
    pub lb_algorithm: String,
    pub healthmonitor: Option<HealthMonitor>,
    pub session_persistence: Option<SessionPersistence>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemberOpts {
    pub address: String,
    pub protocol_port: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl Client {
    pub async fn list_pools(
        &self,
        location: &Location,
        loadbalancer_id: Option<&str>,
        listener_id: Option<&str>,
    ) -> Result<Vec<Pool>> {
        let mut query: Vec<(&str, String)> = vec![("details", "true".to_owned())];
        if let Some(lb_id) = loadbalancer_id {
            query.push(("loadbalancer_id", lb_id.to_owned()));
        }
        if let Some(listener_id) = listener_id {
            query.push(("listener_id", listener_id.to_owned()));
        }
        self.list(&location.path(KIND), &query).await
    }

    pub async fn get_pool(&self, location: &Location, id: &str) -> Result<Pool> {
        self.get(&location.item(KIND, id)).await
    }

    pub async fn create_pool(&self, location: &Location, opts: &CreatePool) -> Result<TaskResults> {
        self.post(&location.path(KIND), opts).await
    }

    pub async fn update_pool(&self, location: &Location, id: &str, opts: &UpdatePool) -> Result<TaskResults> {
        self.patch(&location.item(KIND, id), opts).await
    }

    pub async fn delete_pool(&self, location: &Location, id: &str) -> Result<TaskResults> {
        self.delete(&location.item(KIND, id)).await
    }

    pub async fn delete_health_monitor(&self, location: &Location, pool_id: &str) -> Result<()> {
        self.delete(&format!("{}/healthmonitor", location.item(KIND, pool_id)))
            .await
    }

    pub async fn create_member(&self, location: &Location, pool_id: &str, opts: &MemberOpts) -> Result<TaskResults> {
        self.post(&format!("{}/member", location.item(KIND, pool_id)), opts)
            .await
    }

    pub async fn update_member(
        &self,
        location: &Location,
        pool_id: &str,
        member_id: &str,
        opts: &MemberOpts,
    ) -> Result<TaskResults> {
        self.patch(
            &format!("{}/member/{member_id}", location.item(KIND, pool_id)),
            opts,
        )
        .await
    }

    pub async fn delete_member(&self, location: &Location, pool_id: &str, member_id: &str) -> Result<TaskResults> {
        self.delete(&format!("{}/member/{member_id}", location.item(KIND, pool_id)))
            .await
    }
}

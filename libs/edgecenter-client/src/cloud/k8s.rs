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

/// Kind reported by tasks creating a cluster
pub const CLUSTER_CREATED_KIND: &str = "k8s_clusters";
/// Kind reported by tasks creating a pool
pub const POOL_CREATED_KIND: &str = "k8s_pools";

fn clusters_path(location: &Location) -> String {
    format!("v1/k8s/clusters/{}/{}", location.project_id, location.region_id)
}

fn cluster_path(location: &Location, cluster_id: &str) -> String {
    format!("{}/{cluster_id}", clusters_path(location))
}

fn pool_path(location: &Location, cluster_id: &str, pool_id: &str) -> String {
    format!("{}/pools/{pool_id}", cluster_path(location, cluster_id))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub keypair: Option<String>,
    #[serde(default)]
    pub fixed_network: Option<String>,
    #[serde(default)]
    pub fixed_subnet: Option<String>,
    #[serde(default)]
    pub pods_ip_pool: Option<String>,
    #[serde(default)]
    pub services_ip_pool: Option<String>,
    #[serde(default)]
    pub api_address: Option<String>,
    #[serde(default)]
    pub node_addresses: Vec<String>,
    #[serde(default)]
    pub master_lb_floating_ip: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub pools: Vec<ClusterPool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClusterPool {
    pub id: String,
    pub name: String,
    pub flavor_id: String,
    pub node_count: i64,
    #[serde(default)]
    pub min_node_count: i64,
    #[serde(default)]
    pub max_node_count: Option<i64>,
    #[serde(default)]
    pub docker_volume_size: Option<i64>,
    #[serde(default)]
    pub docker_volume_type: Option<String>,
    #[serde(default)]
    pub auto_healing_enabled: bool,
    #[serde(default)]
    pub stack_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolOpts {
    pub name: String,
    pub flavor_id: String,
    pub node_count: i64,
    pub min_node_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_node_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_volume_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_volume_type: Option<String>,
    pub auto_healing_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateCluster {
    pub name: String,
    pub fixed_network: String,
    pub fixed_subnet: String,
    pub keypair: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pods_ip_pool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services_ip_pool: Option<String>,
    pub pools: Vec<PoolOpts>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePool {
    pub name: String,
    pub min_node_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_node_count: Option<i64>,
    pub auto_healing_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
struct Resize {
    node_count: i64,
}

#[derive(Debug, Clone, Serialize)]
struct Upgrade<'a> {
    version: &'a str,
}

impl Client {
    pub async fn get_cluster(&self, location: &Location, cluster_id: &str) -> Result<Cluster> {
        self.get(&cluster_path(location, cluster_id)).await
    }

    pub async fn create_cluster(&self, location: &Location, opts: &CreateCluster) -> Result<TaskResults> {
        self.post(&clusters_path(location), opts).await
    }

    pub async fn upgrade_cluster(&self, location: &Location, cluster_id: &str, version: &str) -> Result<TaskResults> {
        self.post(
            &format!("{}/upgrade", cluster_path(location, cluster_id)),
            &Upgrade { version },
        )
        .await
    }

    pub async fn delete_cluster(&self, location: &Location, cluster_id: &str) -> Result<TaskResults> {
        self.delete(&cluster_path(location, cluster_id)).await
    }

    pub async fn get_cluster_pool(&self, location: &Location, cluster_id: &str, pool_id: &str) -> Result<ClusterPool> {
        self.get(&pool_path(location, cluster_id, pool_id)).await
    }

    pub async fn create_cluster_pool(
        &self,
        location: &Location,
        cluster_id: &str,
        opts: &PoolOpts,
    ) -> Result<TaskResults> {
        self.post(&format!("{}/pools", cluster_path(location, cluster_id)), opts)
            .await
    }

    pub async fn update_cluster_pool(
        &self,
        location: &Location,
        cluster_id: &str,
        pool_id: &str,
        opts: &UpdatePool,
    ) -> Result<ClusterPool> {
        self.patch(&pool_path(location, cluster_id, pool_id), opts)
            .await
    }

    pub async fn resize_cluster_pool(
        &self,
        location: &Location,
        cluster_id: &str,
        pool_id: &str,
        node_count: i64,
    ) -> Result<TaskResults> {
        self.post(
            &format!("{}/resize", pool_path(location, cluster_id, pool_id)),
            &Resize { node_count },
        )
        .await
    }

    pub async fn delete_cluster_pool(&self, location: &Location, cluster_id: &str, pool_id: &str) -> Result<TaskResults> {
        self.delete(&pool_path(location, cluster_id, pool_id)).await
    }
}

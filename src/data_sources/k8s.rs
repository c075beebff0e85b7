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

use std::collections::HashMap;

use async_trait::async_trait;
use edgecenter_client::cloud::k8s::{Cluster, ClusterPool};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use super::{computed_attribute, computed_objects};
use crate::attributes::{attribute, list_of, schema};
use crate::location::{impl_location, location_attributes, resolve_location, validate_location};
use crate::provider::ClientHandle;
use crate::resources::{node_pool_attributes, NodePoolState};
use crate::utils::{check, opt_string, string, string_list, ReportError, WithSchema};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct K8sDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub cluster_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub status: ValueString<'a>,
    pub version: ValueString<'a>,
    pub keypair: ValueString<'a>,
    pub fixed_network: ValueString<'a>,
    pub fixed_subnet: ValueString<'a>,
    pub pods_ip_pool: ValueString<'a>,
    pub services_ip_pool: ValueString<'a>,
    pub api_address: ValueString<'a>,
    pub node_addresses: ValueList<ValueString<'a>>,
    pub master_lb_floating_ip: ValueString<'a>,
    pub created_at: ValueString<'a>,
    pub pools: ValueList<Value<NodePoolState<'a>>>,
}

impl_location!(K8sDataSourceState);

impl<'a> WithSchema for K8sDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "id" => computed_attribute(AttributeType::String, "ID of the cluster"),
            "cluster_id" => attribute(AttributeType::String, Required, "ID of the cluster to read"),
            "name" => computed_attribute(AttributeType::String, "Name of the cluster"),
            "status" => computed_attribute(AttributeType::String, "Status of the cluster"),
            "version" => computed_attribute(AttributeType::String, "Kubernetes version"),
            "keypair" => computed_attribute(AttributeType::String, "Keypair installed on the nodes"),
            "fixed_network" => computed_attribute(AttributeType::String, "Network of the nodes"),
            "fixed_subnet" => computed_attribute(AttributeType::String, "Subnet of the nodes"),
            "pods_ip_pool" => computed_attribute(AttributeType::String, "CIDR of the pods"),
            "services_ip_pool" => computed_attribute(AttributeType::String, "CIDR of the services"),
            "api_address" => computed_attribute(AttributeType::String, "Address of the Kubernetes API"),
            "node_addresses" => computed_attribute(list_of(AttributeType::String), "Addresses of the nodes"),
            "master_lb_floating_ip" => computed_attribute(AttributeType::String, "Floating IP of the API load balancer"),
            "created_at" => computed_attribute(AttributeType::String, "Creation date"),
            "pools" => computed_objects(node_pool_attributes(true), "Node pools of the cluster"),
        };
        attributes.extend(location_attributes());
        schema("EdgeCenter Kubernetes cluster", attributes, Default::default())
    }
}

impl<'a> K8sDataSourceState<'a> {
    fn apply(&mut self, cluster: &Cluster) {
        self.id = string(cluster.id.as_str());
        self.name = string(cluster.name.as_str());
        self.status = opt_string(cluster.status.clone());
        self.version = opt_string(cluster.version.clone());
        self.keypair = opt_string(cluster.keypair.clone());
        self.fixed_network = opt_string(cluster.fixed_network.clone());
        self.fixed_subnet = opt_string(cluster.fixed_subnet.clone());
        self.pods_ip_pool = opt_string(cluster.pods_ip_pool.clone());
        self.services_ip_pool = opt_string(cluster.services_ip_pool.clone());
        self.api_address = opt_string(cluster.api_address.clone());
        self.node_addresses = string_list(cluster.node_addresses.clone());
        self.master_lb_floating_ip = opt_string(cluster.master_lb_floating_ip.clone());
        self.created_at = opt_string(cluster.created_at.clone());
        self.pools = Value::Value(
            cluster
                .pools
                .iter()
                .map(|pool| {
                    let mut state = NodePoolState::default();
                    state.apply(pool);
                    Value::Value(state)
                })
                .collect(),
        );
    }
}

#[derive(Debug, Default, Clone)]
pub struct K8sDataSource {
    client: ClientHandle,
}

impl K8sDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for K8sDataSource {
    type State<'a> = K8sDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(K8sDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
        check(diags)
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let mut state = config;
        let location = resolve_location(diags, &client, &mut state).await?;

        let cluster = client
            .get_cluster(&location, &state.cluster_id)
            .await
            .report(diags, "Failed to read cluster")?;
        state.apply(&cluster);
        Some(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct K8sPoolDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub cluster_id: ValueString<'a>,
    pub pool_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub flavor_id: ValueString<'a>,
    pub node_count: ValueNumber,
    pub min_node_count: ValueNumber,
    pub max_node_count: ValueNumber,
    pub docker_volume_size: ValueNumber,
    pub docker_volume_type: ValueString<'a>,
    pub auto_healing_enabled: ValueBool,
    pub stack_id: ValueString<'a>,
    pub status: ValueString<'a>,
    pub created_at: ValueString<'a>,
}

impl_location!(K8sPoolDataSourceState);

impl<'a> WithSchema for K8sPoolDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "cluster_id" => attribute(AttributeType::String, Required, "Cluster of the pool"),
            "pool_id" => attribute(AttributeType::String, Required, "ID of the pool to read"),
        };
        attributes.extend(node_pool_attributes(true));
        attributes.extend(location_attributes());
        schema("EdgeCenter Kubernetes node pool", attributes, Default::default())
    }
}

impl<'a> K8sPoolDataSourceState<'a> {
    fn apply(&mut self, pool: &ClusterPool) {
        let mut node_pool = NodePoolState::default();
        node_pool.apply(pool);
        let NodePoolState {
            id,
            name,
            flavor_id,
            node_count,
            min_node_count,
            max_node_count,
            docker_volume_size,
            docker_volume_type,
            auto_healing_enabled,
            stack_id,
            status,
            created_at,
        } = node_pool;
        self.id = id;
        self.name = name;
        self.flavor_id = flavor_id;
        self.node_count = node_count;
        self.min_node_count = min_node_count;
        self.max_node_count = max_node_count;
        self.docker_volume_size = docker_volume_size;
        self.docker_volume_type = docker_volume_type;
        self.auto_healing_enabled = auto_healing_enabled;
        self.stack_id = stack_id;
        self.status = status;
        self.created_at = created_at;
    }
}

#[derive(Debug, Default, Clone)]
pub struct K8sPoolDataSource {
    client: ClientHandle,
}

impl K8sPoolDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for K8sPoolDataSource {
    type State<'a> = K8sPoolDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(K8sPoolDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
        check(diags)
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let mut state = config;
        let location = resolve_location(diags, &client, &mut state).await?;

        let pool = client
            .get_cluster_pool(&location, &state.cluster_id, &state.pool_id)
            .await
            .report(diags, "Failed to read cluster pool")?;
        state.apply(&pool);
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_pools_are_listed() {
        let cluster: Cluster = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "prod",
            "version": "1.27.3",
            "node_addresses": ["10.0.0.10"],
            "pools": [
                {"id": "p1", "name": "default", "flavor_id": "g1-standard-2-4", "node_count": 2, "min_node_count": 1}
            ]
        }))
        .unwrap();
        let mut state = K8sDataSourceState::default();
        state.apply(&cluster);
        assert_eq!(state.id, string("c1"));
        let pools = state.pools.unwrap();
        assert_eq!(pools.len(), 1);
        let pool = pools[0].as_ref_option().unwrap();
        assert_eq!(pool.node_count, Value::Value(2));
        assert!(pool.max_node_count.is_null());
    }

    #[test]
    fn pool_fields_are_copied() {
        let pool: ClusterPool = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "default",
            "flavor_id": "g1-standard-2-4",
            "node_count": 3,
            "min_node_count": 1,
            "max_node_count": 5,
            "docker_volume_type": "ssd_hiiops",
            "auto_healing_enabled": true
        }))
        .unwrap();
        let mut state = K8sPoolDataSourceState::default();
        state.apply(&pool);
        assert_eq!(state.id, string("p1"));
        assert_eq!(state.max_node_count, Value::Value(5));
        assert_eq!(state.docker_volume_type, string("ssd_hiiops"));
        assert_eq!(state.auto_healing_enabled, Value::Value(true));
        assert!(state.pool_id.is_null());
    }
}

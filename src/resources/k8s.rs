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
use std::time::Duration;

use async_trait::async_trait;
use edgecenter_client::cloud::k8s::{Cluster, CreateCluster, CLUSTER_CREATED_KIND};
use edgecenter_client::{Client, Location};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, NestedBlock, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use super::k8s_pool::{self, node_pool_attributes, NodePoolState};
use crate::attributes::{attribute, block, list_of, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, known, now, opt_string, report_deleted, requires_replace, string,
    string_list, ReportError, WithNormalize, WithSchema,
};
use crate::validate::cidr;

const TIMEOUT: Duration = Duration::from_secs(7200);

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct K8sState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub fixed_network: ValueString<'a>,
    pub fixed_subnet: ValueString<'a>,
    pub pods_ip_pool: ValueString<'a>,
    pub services_ip_pool: ValueString<'a>,
    pub keypair: ValueString<'a>,
    pub version: ValueString<'a>,
    pub pool: ValueList<Value<NodePoolState<'a>>>,
    pub status: ValueString<'a>,
    pub api_address: ValueString<'a>,
    pub node_addresses: ValueList<ValueString<'a>>,
    pub master_lb_floating_ip: ValueString<'a>,
    pub created_at: ValueString<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(K8sState);

impl<'a> WithSchema for K8sState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the cluster"),
            "fixed_network" => attribute(AttributeType::String, Required, "Network of the nodes"),
            "fixed_subnet" => attribute(AttributeType::String, Required, "Subnet of the nodes"),
            "pods_ip_pool" => attribute(AttributeType::String, Optional, "CIDR of the pods"),
            "services_ip_pool" => attribute(AttributeType::String, Optional, "CIDR of the services"),
            "keypair" => attribute(AttributeType::String, Required, "Name of the keypair installed on the nodes"),
            "version" => attribute(AttributeType::String, Required, "Kubernetes version, upgraded in place"),
            "status" => attribute(AttributeType::String, Computed, "Status of the cluster"),
            "api_address" => attribute(AttributeType::String, Computed, "Address of the Kubernetes API"),
            "node_addresses" => attribute(list_of(AttributeType::String), Computed, "Addresses of the nodes"),
            "master_lb_floating_ip" => attribute(AttributeType::String, Computed, "Floating IP of the API load balancer"),
            "created_at" => attribute(AttributeType::String, Computed, "Creation date of the cluster"),
        };
        attributes.extend(resource_attributes("ID of the cluster"));
        schema(
            "EdgeCenter Kubernetes cluster",
            attributes,
            map! {
                "pool" => NestedBlock::List(block(
                    "Initial node pool; further pools are managed with `edgecenter_k8s_pool`",
                    node_pool_attributes(false),
                )),
            },
        )
    }
}

impl<'a> WithNormalize for K8sState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        for pool in self.pool.iter_mut().flatten() {
            if let Value::Value(pool) = pool {
                pool.normalize();
            }
        }
        computed(&mut self.status);
        computed(&mut self.api_address);
        computed(&mut self.node_addresses);
        computed(&mut self.master_lb_floating_ip);
        computed(&mut self.created_at);
    }
}

fn pool_path(name: &'static str) -> AttributePath {
    AttributePath::new("pool").index(0).attribute(name)
}

impl<'a> K8sState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        cidr(diags, AttributePath::new("pods_ip_pool"), &self.pods_ip_pool);
        cidr(diags, AttributePath::new("services_ip_pool"), &self.services_ip_pool);
        if let Value::Value(pools) = &self.pool {
            if pools.len() != 1 {
                diags.error(
                    "Invalid pool count",
                    format!(
                        "A cluster is created with exactly one pool, got {}: add the others with `edgecenter_k8s_pool`",
                        pools.len()
                    ),
                    AttributePath::new("pool"),
                );
            }
        }
        if let Some(pool) = self.node_pool() {
            pool.validate(diags, pool_path);
        }
    }

    fn node_pool(&self) -> Option<&NodePoolState<'a>> {
        self.pool.as_ref_option()?.first()?.as_ref_option()
    }

    fn apply(&mut self, cluster: &Cluster) {
        self.id = string(cluster.id.as_str());
        self.name = string(cluster.name.as_str());
        self.fixed_network = opt_string(cluster.fixed_network.clone());
        self.fixed_subnet = opt_string(cluster.fixed_subnet.clone());
        if !self.pods_ip_pool.is_null() {
            self.pods_ip_pool = opt_string(cluster.pods_ip_pool.clone());
        }
        if !self.services_ip_pool.is_null() {
            self.services_ip_pool = opt_string(cluster.services_ip_pool.clone());
        }
        self.keypair = opt_string(cluster.keypair.clone());
        self.version = opt_string(cluster.version.clone());
        self.status = opt_string(cluster.status.clone());
        self.api_address = opt_string(cluster.api_address.clone());
        self.node_addresses = string_list(cluster.node_addresses.clone());
        self.master_lb_floating_ip = opt_string(cluster.master_lb_floating_ip.clone());
        self.created_at = opt_string(cluster.created_at.clone());

        // The tracked pool is found by ID, then by name, falling back on the first one
        let tracked = self.node_pool().cloned().unwrap_or_default();
        let remote = cluster
            .pools
            .iter()
            .find(|pool| known(&tracked.id).as_deref() == Some(pool.id.as_str()))
            .or_else(|| {
                cluster
                    .pools
                    .iter()
                    .find(|pool| known(&tracked.name).as_deref() == Some(pool.name.as_str()))
            })
            .or_else(|| cluster.pools.first());
        if let Some(remote) = remote {
            let mut pool = tracked;
            pool.apply(remote);
            self.pool = Value::Value(vec![Value::Value(pool)]);
        }
    }
}

async fn get_cluster(
    diags: &mut Diagnostics,
    client: &Client,
    location: &Location,
    id: &str,
) -> Option<Cluster> {
    client
        .get_cluster(location, id)
        .await
        .report(diags, "Failed to read Kubernetes cluster")
}

#[derive(Debug, Default, Clone)]
pub struct K8sResource {
    client: ClientHandle,
}

impl K8sResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for K8sResource {
    type State<'a> = K8sState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(K8sState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags);
        check(diags)
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let mut state = state;
        let location = known_location(diags, &state)?;

        let Some(cluster) = client
            .get_cluster(&location, &state.id)
            .await
            .report_found(diags, "Failed to read Kubernetes cluster")?
        else {
            warn!(id = %state.id, "Kubernetes cluster does not exist anymore");
            return None;
        };
        state.apply(&cluster);
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.id = Value::Unknown;
        state.last_updated = Value::Unknown;
        plan_location(&mut state.project_id, &mut state.region_id);
        state.normalize(diags);
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let mut state = proposed_state;
        state.normalize(diags);

        let mut trigger_replace = requires_replace!(
            prior_state,
            state,
            [
                project_id,
                project_name,
                region_id,
                region_name,
                name,
                fixed_network,
                fixed_subnet,
                pods_ip_pool,
                services_ip_pool,
                keypair
            ]
        );
        if let (Some(planned), Some(prior)) = (state.node_pool(), prior_state.node_pool()) {
            trigger_replace.extend(
                planned
                    .replaced_attributes(prior)
                    .into_iter()
                    .map(pool_path),
            );
        }
        if state != prior_state {
            state.status = Value::Unknown;
            state.last_updated = Value::Unknown;
            if state.version != prior_state.version {
                state.node_addresses = Value::Unknown;
            }
        }
        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let mut state = planned_state;
        let location = resolve_location(diags, &client, &mut state).await?;

        let Some(pool) = state.node_pool() else {
            diags.error_short("Missing pool", AttributePath::new("pool"));
            return None;
        };
        let opts = CreateCluster {
            name: state.name.to_string(),
            fixed_network: state.fixed_network.to_string(),
            fixed_subnet: state.fixed_subnet.to_string(),
            keypair: state.keypair.to_string(),
            version: state.version.to_string(),
            pods_ip_pool: known(&state.pods_ip_pool),
            services_ip_pool: known(&state.services_ip_pool),
            pools: vec![pool.opts()],
        };
        info!(name = %opts.name, version = %opts.version, "Creating Kubernetes cluster");
        let tasks = client
            .create_cluster(&location, &opts)
            .await
            .report(diags, "Failed to create Kubernetes cluster")?;
        let id = client
            .wait_for_created(&tasks, CLUSTER_CREATED_KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create Kubernetes cluster")?;
        let cluster = get_cluster(diags, &client, &location, &id).await?;

        state.apply(&cluster);
        state.last_updated = now();
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags)?;
        let mut state = planned_state;
        let location = known_location(diags, &prior_state)?;
        let id = prior_state.id.to_string();

        if state.version != prior_state.version {
            let version = state.version.to_string();
            info!(%id, %version, "Upgrading Kubernetes cluster");
            let tasks = client
                .upgrade_cluster(&location, &id, &version)
                .await
                .report(diags, "Failed to upgrade Kubernetes cluster")?;
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to upgrade Kubernetes cluster")?;
        }

        if let (Some(planned), Some(prior)) = (state.node_pool(), prior_state.node_pool()) {
            let pool_id = prior.id.to_string();
            if planned.needs_update(prior) {
                info!(%id, %pool_id, "Updating Kubernetes cluster pool");
                client
                    .update_cluster_pool(&location, &id, &pool_id, &planned.update_opts())
                    .await
                    .report(diags, "Failed to update Kubernetes cluster pool")?;
            }
            if let Value::Value(node_count) = planned.node_count {
                if planned.node_count != prior.node_count {
                    info!(%id, %pool_id, node_count, "Resizing Kubernetes cluster pool");
                    let tasks = client
                        .resize_cluster_pool(&location, &id, &pool_id, node_count)
                        .await
                        .report(diags, "Failed to resize Kubernetes cluster pool")?;
                    client
                        .wait_for_tasks(&tasks, k8s_pool::TIMEOUT)
                        .await
                        .report(diags, "Failed to resize Kubernetes cluster pool")?;
                }
            }
        }

        let cluster = get_cluster(diags, &client, &location, &id).await?;
        state.apply(&cluster);
        state.last_updated = now();
        Some((state, planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = self.client.get(diags)?;
        let location = known_location(diags, &state)?;

        info!(id = %state.id, "Deleting Kubernetes cluster");
        let result = client.delete_cluster(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete Kubernetes cluster")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete Kubernetes cluster")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = K8sState {
            id: string(import.id),
            ..Default::default()
        };
        state.set_location(&import.location);
        Some((state, Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_pool<'a>(name: &'static str) -> Value<NodePoolState<'a>> {
        Value::Value(NodePoolState {
            name: name.into(),
            flavor_id: "g1-standard-2-4".into(),
            node_count: Value::Value(1),
            min_node_count: Value::Value(1),
            ..Default::default()
        })
    }

    fn cluster<'a>() -> K8sState<'a> {
        K8sState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            pods_ip_pool: "10.100.0.0/16".into(),
            pool: Value::Value(vec![node_pool("default")]),
            ..Default::default()
        }
    }

    fn errors(state: &K8sState) -> Vec<AttributePath> {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags);
        diags.errors.into_iter().map(|diag| diag.attribute).collect()
    }

    #[test]
    fn cluster_is_created_with_a_single_pool() {
        assert!(errors(&cluster()).is_empty());
        assert_eq!(
            errors(&K8sState {
                pool: Value::Value(vec![node_pool("default"), node_pool("gpu")]),
                ..cluster()
            }),
            vec![AttributePath::new("pool")]
        );
    }

    #[test]
    fn pool_errors_point_into_the_block() {
        let mut state = cluster();
        if let Some(Value::Value(pool)) = state.pool.iter_mut().flatten().next() {
            pool.max_node_count = Value::Value(0);
        }
        assert_eq!(errors(&state), vec![pool_path("node_count")]);
    }

    #[test]
    fn tracked_pool_is_matched_by_name() {
        let cluster: Cluster = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "k8s",
            "version": "1.27.3",
            "node_addresses": ["10.0.0.10"],
            "pools": [
                {"id": "p2", "name": "gpu", "flavor_id": "g2", "node_count": 2},
                {"id": "p1", "name": "default", "flavor_id": "g1", "node_count": 1, "min_node_count": 1}
            ]
        }))
        .unwrap();
        let mut state = self::cluster();
        state.apply(&cluster);
        let pool = state.node_pool().unwrap();
        assert_eq!(pool.id, string("p1"));
        assert_eq!(pool.flavor_id, string("g1"));
        assert_eq!(state.pool.as_ref_option().map(Vec::len), Some(1));
        assert_eq!(state.node_addresses, Value::Value(vec![string("10.0.0.10")]));
        assert!(state.services_ip_pool.is_null());
    }
}

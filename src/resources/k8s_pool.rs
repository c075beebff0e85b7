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
use edgecenter_client::cloud::k8s::{ClusterPool, PoolOpts, UpdatePool, POOL_CREATED_KIND};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use crate::attributes::{attribute, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, default_to, now, opt_string, report_deleted, requires_replace, string,
    ReportError, WithNormalize, WithSchema,
};
use crate::validate::{in_range, one_of};

pub(crate) const TIMEOUT: Duration = Duration::from_secs(3600);
const DOCKER_VOLUME_TYPES: &[&str] = &["standard", "ssd_hiiops", "cold", "ultra"];
const DEFAULT_DOCKER_VOLUME_SIZE: i64 = 10;
const DEFAULT_DOCKER_VOLUME_TYPE: &str = "standard";

/// Node pool of a cluster, as found in the `pool` block of a cluster
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodePoolState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
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

/// Attributes of a node pool; every one is computed when `read_only`
pub(crate) fn node_pool_attributes(read_only: bool) -> HashMap<String, Attribute> {
    let (required, optional) = if read_only {
        (Computed, Computed)
    } else {
        (Required, OptionalComputed)
    };
    map! {
        "id" => attribute(AttributeType::String, Computed, "ID of the pool"),
        "name" => attribute(AttributeType::String, required.clone(), "Name of the pool"),
        "flavor_id" => attribute(AttributeType::String, required.clone(), "Flavor of the nodes"),
        "node_count" => attribute(AttributeType::Number, required.clone(), "Number of nodes"),
        "min_node_count" => attribute(AttributeType::Number, required.clone(), "Minimum number of nodes"),
        "max_node_count" => attribute(AttributeType::Number, optional.clone(), "Maximum number of nodes"),
        "docker_volume_size" => attribute(AttributeType::Number, optional.clone(), "Size of the docker volume in GB (default: 10)"),
        "docker_volume_type" => attribute(
            AttributeType::String,
            optional.clone(),
            "Type of the docker volume: `standard`, `ssd_hiiops`, `cold` or `ultra` (default: standard)",
        ),
        "auto_healing_enabled" => attribute(AttributeType::Bool, optional.clone(), "Replace unhealthy nodes (default: false)"),
        "stack_id" => attribute(AttributeType::String, Computed, "ID of the stack of the pool"),
        "status" => attribute(AttributeType::String, Computed, "Status of the pool"),
        "created_at" => attribute(AttributeType::String, Computed, "Creation date of the pool"),
    }
}

impl<'a> NodePoolState<'a> {
    /// Validate the pool, `path` giving the path of each attribute
    pub(crate) fn validate<F>(&self, diags: &mut Diagnostics, path: F)
    where
        F: Fn(&'static str) -> AttributePath,
    {
        in_range(diags, path("min_node_count"), &self.min_node_count, 1, 200);
        in_range(diags, path("docker_volume_size"), &self.docker_volume_size, 1, 1000);
        one_of(diags, path("docker_volume_type"), &self.docker_volume_type, DOCKER_VOLUME_TYPES);

        if let (Value::Value(min), Value::Value(count)) = (self.min_node_count, self.node_count) {
            if count < min {
                diags.error(
                    "Invalid node count",
                    format!("node_count ({count}) must be at least min_node_count ({min})"),
                    path("node_count"),
                );
            }
        }
        if let (Value::Value(count), Value::Value(max)) = (self.node_count, self.max_node_count) {
            if count > max {
                diags.error(
                    "Invalid node count",
                    format!("node_count ({count}) must be at most max_node_count ({max})"),
                    path("node_count"),
                );
            }
        }
    }

    pub(crate) fn normalize(&mut self) {
        default_to(&mut self.docker_volume_size, DEFAULT_DOCKER_VOLUME_SIZE);
        default_to(&mut self.docker_volume_type, DEFAULT_DOCKER_VOLUME_TYPE.into());
        default_to(&mut self.auto_healing_enabled, false);
        computed(&mut self.id);
        computed(&mut self.max_node_count);
        computed(&mut self.stack_id);
        computed(&mut self.status);
        computed(&mut self.created_at);
    }

    pub(crate) fn opts(&self) -> PoolOpts {
        PoolOpts {
            name: self.name.to_string(),
            flavor_id: self.flavor_id.to_string(),
            node_count: self.node_count.unwrap_or_default(),
            min_node_count: self.min_node_count.unwrap_or_default(),
            max_node_count: self.max_node_count.as_option(),
            docker_volume_size: self.docker_volume_size.as_option(),
            docker_volume_type: self.docker_volume_type.as_deref_option().map(Into::into),
            auto_healing_enabled: self.auto_healing_enabled.unwrap_or(false),
        }
    }

    pub(crate) fn update_opts(&self) -> UpdatePool {
        UpdatePool {
            name: self.name.to_string(),
            min_node_count: self.min_node_count.unwrap_or_default(),
            max_node_count: self.max_node_count.as_option(),
            auto_healing_enabled: self.auto_healing_enabled.unwrap_or(false),
        }
    }

    /// Whether the update endpoint must be called to go from `prior` to `self`
    pub(crate) fn needs_update(&self, prior: &Self) -> bool {
        self.name != prior.name
            || self.min_node_count != prior.min_node_count
            || (self.max_node_count.is_value() && self.max_node_count != prior.max_node_count)
            || self.auto_healing_enabled != prior.auto_healing_enabled
    }

    /// Attributes whose change requires a new pool
    pub(crate) fn replaced_attributes(&self, prior: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.flavor_id != prior.flavor_id {
            changed.push("flavor_id");
        }
        if self.docker_volume_size != prior.docker_volume_size {
            changed.push("docker_volume_size");
        }
        if self.docker_volume_type != prior.docker_volume_type {
            changed.push("docker_volume_type");
        }
        changed
    }

    pub(crate) fn apply(&mut self, pool: &ClusterPool) {
        self.id = string(pool.id.as_str());
        self.name = string(pool.name.as_str());
        self.flavor_id = string(pool.flavor_id.as_str());
        self.node_count = Value::Value(pool.node_count);
        self.min_node_count = Value::Value(pool.min_node_count);
        self.max_node_count = pool.max_node_count.into();
        self.docker_volume_size = pool.docker_volume_size.into();
        self.docker_volume_type = opt_string(pool.docker_volume_type.clone());
        self.auto_healing_enabled = Value::Value(pool.auto_healing_enabled);
        self.stack_id = opt_string(pool.stack_id.clone());
        self.status = opt_string(pool.status.clone());
        self.created_at = opt_string(pool.created_at.clone());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct K8sPoolState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub cluster_id: ValueString<'a>,
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
    pub last_updated: ValueString<'a>,
}

impl_location!(K8sPoolState);

impl<'a> K8sPoolState<'a> {
    fn node_pool(&self) -> NodePoolState<'a> {
        NodePoolState {
            id: self.id.clone(),
            name: self.name.clone(),
            flavor_id: self.flavor_id.clone(),
            node_count: self.node_count,
            min_node_count: self.min_node_count,
            max_node_count: self.max_node_count,
            docker_volume_size: self.docker_volume_size,
            docker_volume_type: self.docker_volume_type.clone(),
            auto_healing_enabled: self.auto_healing_enabled,
            stack_id: self.stack_id.clone(),
            status: self.status.clone(),
            created_at: self.created_at.clone(),
        }
    }

    fn set_node_pool(&mut self, pool: NodePoolState<'a>) {
        self.id = pool.id;
        self.name = pool.name;
        self.flavor_id = pool.flavor_id;
        self.node_count = pool.node_count;
        self.min_node_count = pool.min_node_count;
        self.max_node_count = pool.max_node_count;
        self.docker_volume_size = pool.docker_volume_size;
        self.docker_volume_type = pool.docker_volume_type;
        self.auto_healing_enabled = pool.auto_healing_enabled;
        self.stack_id = pool.stack_id;
        self.status = pool.status;
        self.created_at = pool.created_at;
    }

    fn apply(&mut self, pool: &ClusterPool) {
        let mut node_pool = self.node_pool();
        node_pool.apply(pool);
        self.set_node_pool(node_pool);
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        self.node_pool().validate(diags, AttributePath::new);
    }
}

impl<'a> WithSchema for K8sPoolState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "cluster_id" => attribute(AttributeType::String, Required, "ID of the Kubernetes cluster"),
        };
        attributes.extend(node_pool_attributes(false));
        attributes.extend(resource_attributes("ID of the pool"));
        schema("EdgeCenter Kubernetes node pool", attributes, Default::default())
    }
}

impl<'a> WithNormalize for K8sPoolState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        let mut node_pool = self.node_pool();
        node_pool.normalize();
        self.set_node_pool(node_pool);
    }
}

#[derive(Debug, Default, Clone)]
pub struct K8sPoolResource {
    client: ClientHandle,
}

impl K8sPoolResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for K8sPoolResource {
    type State<'a> = K8sPoolState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(K8sPoolState::schema())
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

        let Some(pool) = client
            .get_cluster_pool(&location, &state.cluster_id, &state.id)
            .await
            .report_found(diags, "Failed to read Kubernetes pool")?
        else {
            warn!(id = %state.id, cluster_id = %state.cluster_id, "Kubernetes pool does not exist anymore");
            return None;
        };
        state.apply(&pool);
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

        let trigger_replace = requires_replace!(
            prior_state,
            state,
            [
                project_id,
                project_name,
                region_id,
                region_name,
                cluster_id,
                flavor_id,
                docker_volume_size,
                docker_volume_type
            ]
        );
        if state != prior_state {
            state.status = Value::Unknown;
            state.last_updated = Value::Unknown;
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
        let cluster_id = state.cluster_id.to_string();

        let opts = state.node_pool().opts();
        info!(%cluster_id, name = %opts.name, node_count = opts.node_count, "Creating Kubernetes pool");
        let tasks = client
            .create_cluster_pool(&location, &cluster_id, &opts)
            .await
            .report(diags, "Failed to create Kubernetes pool")?;
        let id = client
            .wait_for_created(&tasks, POOL_CREATED_KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create Kubernetes pool")?;
        let pool = client
            .get_cluster_pool(&location, &cluster_id, &id)
            .await
            .report(diags, "Failed to read created Kubernetes pool")?;

        state.apply(&pool);
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
        let cluster_id = prior_state.cluster_id.to_string();
        let id = prior_state.id.to_string();

        let planned = state.node_pool();
        let prior = prior_state.node_pool();
        if planned.needs_update(&prior) {
            info!(%id, %cluster_id, "Updating Kubernetes pool");
            client
                .update_cluster_pool(&location, &cluster_id, &id, &planned.update_opts())
                .await
                .report(diags, "Failed to update Kubernetes pool")?;
        }
        if let Value::Value(node_count) = planned.node_count {
            if planned.node_count != prior.node_count {
                info!(%id, %cluster_id, node_count, "Resizing Kubernetes pool");
                let tasks = client
                    .resize_cluster_pool(&location, &cluster_id, &id, node_count)
                    .await
                    .report(diags, "Failed to resize Kubernetes pool")?;
                client
                    .wait_for_tasks(&tasks, TIMEOUT)
                    .await
                    .report(diags, "Failed to resize Kubernetes pool")?;
            }
        }

        let pool = client
            .get_cluster_pool(&location, &cluster_id, &id)
            .await
            .report(diags, "Failed to read Kubernetes pool")?;
        state.apply(&pool);
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

        info!(id = %state.id, cluster_id = %state.cluster_id, "Deleting Kubernetes pool");
        let result = client
            .delete_cluster_pool(&location, &state.cluster_id, &state.id)
            .await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete Kubernetes pool")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete Kubernetes pool")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, true)?;
        let mut state = K8sPoolState {
            id: string(import.id),
            cluster_id: opt_string(import.parent_id),
            ..Default::default()
        };
        state.set_location(&import.location);
        Some((state, Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool<'a>() -> NodePoolState<'a> {
        NodePoolState {
            name: "workers".into(),
            flavor_id: "g1-standard-2-4".into(),
            node_count: Value::Value(2),
            min_node_count: Value::Value(1),
            max_node_count: Value::Value(3),
            ..Default::default()
        }
    }

    fn errors(pool: &NodePoolState) -> Vec<AttributePath> {
        let mut diags = Diagnostics::default();
        pool.validate(&mut diags, AttributePath::new);
        diags.errors.into_iter().map(|diag| diag.attribute).collect()
    }

    #[test]
    fn node_count_stays_within_bounds() {
        assert!(errors(&pool()).is_empty());
        assert_eq!(
            errors(&NodePoolState {
                node_count: Value::Value(4),
                ..pool()
            }),
            vec![AttributePath::new("node_count")]
        );
        assert_eq!(
            errors(&NodePoolState {
                node_count: Value::Value(0),
                min_node_count: Value::Value(0),
                ..pool()
            }),
            vec![AttributePath::new("min_node_count")]
        );
    }

    #[test]
    fn docker_volume_defaults() {
        let mut pool = NodePoolState {
            max_node_count: Value::Null,
            ..pool()
        };
        pool.normalize();
        let json = serde_json::to_value(pool.opts()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "workers",
                "flavor_id": "g1-standard-2-4",
                "node_count": 2,
                "min_node_count": 1,
                "docker_volume_size": 10,
                "docker_volume_type": "standard",
                "auto_healing_enabled": false
            })
        );
    }

    #[test]
    fn resize_alone_does_not_update() {
        let prior = pool();
        let planned = NodePoolState {
            node_count: Value::Value(3),
            ..pool()
        };
        assert!(!planned.needs_update(&prior));
        assert!(planned.replaced_attributes(&prior).is_empty());

        let planned = NodePoolState {
            flavor_id: "g1-standard-4-8".into(),
            auto_healing_enabled: Value::Value(true),
            ..pool()
        };
        assert!(planned.needs_update(&prior));
        assert_eq!(planned.replaced_attributes(&prior), vec!["flavor_id"]);
    }

    #[test]
    fn resource_state_roundtrips_through_node_pool() {
        let mut state = K8sPoolState {
            cluster_id: "c1".into(),
            ..Default::default()
        };
        state.apply(&ClusterPool {
            id: "p1".to_owned(),
            name: "workers".to_owned(),
            flavor_id: "g1".to_owned(),
            node_count: 2,
            min_node_count: 1,
            max_node_count: Some(5),
            docker_volume_size: Some(10),
            docker_volume_type: Some("standard".to_owned()),
            auto_healing_enabled: true,
            stack_id: None,
            status: Some("Running".to_owned()),
            created_at: None,
        });
        assert_eq!(state.id, string("p1"));
        assert_eq!(state.cluster_id, string("c1"));
        assert_eq!(state.max_node_count, Value::Value(5));
        assert!(state.stack_id.is_null());
    }

    #[test]
    fn read_only_pool_attributes_are_computed() {
        let attributes = node_pool_attributes(false);
        assert_eq!(attributes["name"].constraint, Required);
        assert_eq!(attributes["node_count"].constraint, Required);
        assert_eq!(attributes["max_node_count"].constraint, OptionalComputed);
        assert_eq!(attributes["id"].constraint, Computed);

        let attributes = node_pool_attributes(true);
        assert!(attributes
            .values()
            .all(|attribute| attribute.constraint == Computed));
    }
}

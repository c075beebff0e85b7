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
use edgecenter_client::cloud::loadbalancer::{self, CreateLoadBalancer, LoadBalancer};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use crate::attributes::{attribute, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::metadata::{
    apply_metadata, expand_metadata, metadata_attributes, MetadataMap, MetadataReadOnly,
};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, known, now, opt_string, report_deleted, requires_replace, string, ReportError,
    WithNormalize, WithSchema,
};

pub(crate) const TIMEOUT: Duration = Duration::from_secs(2400);

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoadBalancerState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub flavor: ValueString<'a>,
    pub vip_network_id: ValueString<'a>,
    pub vip_subnet_id: ValueString<'a>,
    pub vip_port_id: ValueString<'a>,
    pub vip_address: ValueString<'a>,
    pub provisioning_status: ValueString<'a>,
    pub operating_status: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(LoadBalancerState);

impl<'a> WithSchema for LoadBalancerState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the load balancer"),
            "flavor" => attribute(AttributeType::String, Optional, "Flavor of the load balancer"),
            "vip_network_id" => attribute(AttributeType::String, Optional, "Network of the virtual IP"),
            "vip_subnet_id" => attribute(AttributeType::String, Optional, "Subnet of the virtual IP"),
            "vip_port_id" => attribute(
                AttributeType::String,
                OptionalComputed,
                "Port of the virtual IP, typically a reserved fixed IP",
            ),
            "vip_address" => attribute(AttributeType::String, Computed, "Virtual IP address"),
            "provisioning_status" => attribute(AttributeType::String, Computed, "Provisioning status"),
            "operating_status" => attribute(AttributeType::String, Computed, "Operating status"),
        };
        attributes.extend(resource_attributes("ID of the load balancer"));
        attributes.extend(metadata_attributes());
        schema("EdgeCenter load balancer", attributes, Default::default())
    }
}

impl<'a> WithNormalize for LoadBalancerState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        computed(&mut self.vip_port_id);
        computed(&mut self.vip_address);
        computed(&mut self.provisioning_status);
        computed(&mut self.operating_status);
        computed(&mut self.metadata_read_only);
    }
}

impl<'a> LoadBalancerState<'a> {
    fn apply(&mut self, lb: &LoadBalancer) {
        self.id = string(lb.id.as_str());
        self.name = string(lb.name.as_str());
        if let Some(flavor) = &lb.flavor {
            if self.flavor.is_value() {
                self.flavor = string(flavor.flavor_name.as_str());
            }
        }
        self.vip_port_id = opt_string(lb.vip_port_id.clone());
        self.vip_address = opt_string(lb.vip_address.clone());
        self.provisioning_status = opt_string(lb.provisioning_status.clone());
        self.operating_status = opt_string(lb.operating_status.clone());
        apply_metadata(&mut self.metadata_map, &mut self.metadata_read_only, &lb.metadata);
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoadBalancerResource {
    client: ClientHandle,
}

impl LoadBalancerResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for LoadBalancerResource {
    type State<'a> = LoadBalancerState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(LoadBalancerState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
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

        let Some(lb) = client
            .get_load_balancer(&location, &state.id)
            .await
            .report_found(diags, "Failed to read load balancer")?
        else {
            warn!(id = %state.id, "Load balancer does not exist anymore");
            return None;
        };
        state.apply(&lb);
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
        config_state: Self::State<'a>,
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
                flavor,
                vip_network_id,
                vip_subnet_id
            ]
        );
        if config_state.vip_port_id.is_value() && config_state.vip_port_id != prior_state.vip_port_id {
            trigger_replace.push(AttributePath::new("vip_port_id"));
        }
        if state.metadata_map != prior_state.metadata_map {
            state.metadata_read_only = Value::Unknown;
        }
        if state != prior_state {
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

        let opts = CreateLoadBalancer {
            name: state.name.to_string(),
            flavor: known(&state.flavor),
            vip_network_id: known(&state.vip_network_id),
            vip_subnet_id: known(&state.vip_subnet_id),
            vip_port_id: known(&state.vip_port_id),
            metadata: expand_metadata(&state.metadata_map),
        };
        info!(name = %opts.name, "Creating load balancer");
        let tasks = client
            .create_load_balancer(&location, &opts)
            .await
            .report(diags, "Failed to create load balancer")?;
        let id = client
            .wait_for_created(&tasks, loadbalancer::KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create load balancer")?;
        let lb = client
            .get_load_balancer(&location, &id)
            .await
            .report(diags, "Failed to read created load balancer")?;

        state.apply(&lb);
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

        if state.name != prior_state.name {
            info!(%id, name = %state.name, "Renaming load balancer");
            client
                .rename_load_balancer(&location, &id, &state.name)
                .await
                .report(diags, "Failed to rename load balancer")?;
        }
        if state.metadata_map != prior_state.metadata_map {
            client
                .replace_metadata(&location, loadbalancer::KIND, &id, &expand_metadata(&state.metadata_map))
                .await
                .report(diags, "Failed to update load balancer metadata")?;
        }

        let lb = client
            .get_load_balancer(&location, &id)
            .await
            .report(diags, "Failed to read load balancer")?;
        state.apply(&lb);
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

        info!(id = %state.id, "Deleting load balancer");
        let result = client.delete_load_balancer(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete load balancer")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete load balancer")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = LoadBalancerState {
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

    #[test]
    fn flavor_is_only_tracked_when_configured() {
        let lb: LoadBalancer = serde_json::from_value(serde_json::json!({
            "id": "lb1",
            "name": "front",
            "flavor": {"flavor_name": "lb1-1-2"},
            "vip_address": "10.0.0.5",
            "vip_port_id": "p1",
            "provisioning_status": "ACTIVE",
            "operating_status": "ONLINE"
        }))
        .unwrap();

        let mut state = LoadBalancerState::default();
        state.apply(&lb);
        assert!(state.flavor.is_null());
        assert_eq!(state.vip_address, string("10.0.0.5"));
        assert_eq!(state.vip_port_id, string("p1"));

        let mut state = LoadBalancerState {
            flavor: "lb1-2-4".into(),
            ..Default::default()
        };
        state.apply(&lb);
        assert_eq!(state.flavor, string("lb1-1-2"));
    }
}

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
use edgecenter_client::cloud::network::{self, CreateNetwork, Network, UpdateNetwork};
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
use crate::metadata::{
    apply_metadata, expand_metadata, metadata_attributes, MetadataMap, MetadataReadOnly,
};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, default_to, now, report_deleted, requires_replace, string, ReportError,
    WithNormalize, WithSchema,
};
use crate::validate::one_of;

const TIMEOUT: Duration = Duration::from_secs(1200);
const NETWORK_TYPES: &[&str] = &["vlan", "vxlan"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NetworkState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    #[serde(rename = "type")]
    pub network_type: ValueString<'a>,
    pub mtu: ValueNumber,
    pub create_router: ValueBool,
    pub external: ValueBool,
    pub shared: ValueBool,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(NetworkState);

impl<'a> WithSchema for NetworkState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the network"),
            "type" => attribute(
                AttributeType::String,
                OptionalComputed,
                "Type of the network: `vlan` or `vxlan` (default)",
            ),
            "mtu" => attribute(AttributeType::Number, Computed, "MTU of the network"),
            "create_router" => attribute(
                AttributeType::Bool,
                OptionalComputed,
                "Create a router attached to the network (default: true)",
            ),
            "external" => attribute(AttributeType::Bool, Computed, "Whether the network is external"),
            "shared" => attribute(AttributeType::Bool, Computed, "Whether the network is shared"),
        };
        attributes.extend(resource_attributes("ID of the network"));
        attributes.extend(metadata_attributes());
        schema("EdgeCenter network", attributes, Default::default())
    }
}

impl<'a> WithNormalize for NetworkState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_to(&mut self.network_type, "vxlan".into());
        default_to(&mut self.create_router, true);
        computed(&mut self.mtu);
        computed(&mut self.external);
        computed(&mut self.shared);
        computed(&mut self.metadata_read_only);
    }
}

impl<'a> NetworkState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        one_of(diags, AttributePath::new("type"), &self.network_type, NETWORK_TYPES);
    }

    fn apply(&mut self, network: &Network) {
        self.id = string(network.id.as_str());
        self.name = string(network.name.as_str());
        if let Some(network_type) = &network.r#type {
            self.network_type = string(network_type.as_str());
        }
        self.mtu = network.mtu.into();
        self.external = Value::Value(network.external);
        self.shared = Value::Value(network.shared);
        apply_metadata(
            &mut self.metadata_map,
            &mut self.metadata_read_only,
            &network.metadata,
        );
    }
}

#[derive(Debug, Default, Clone)]
pub struct NetworkResource {
    client: ClientHandle,
}

impl NetworkResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for NetworkResource {
    type State<'a> = NetworkState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(NetworkState::schema())
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

        let Some(network) = client
            .get_network(&location, &state.id)
            .await
            .report_found(diags, "Failed to read network")?
        else {
            warn!(id = %state.id, "Network does not exist anymore");
            return None;
        };
        state.apply(&network);
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
            [project_id, project_name, region_id, region_name]
        );
        if prior_state.network_type != state.network_type {
            trigger_replace.push(AttributePath::new("type"));
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

        let opts = CreateNetwork {
            name: state.name.to_string(),
            r#type: state.network_type.as_ref_option().map(|t| t.to_string()),
            create_router: state.create_router.unwrap_or(true),
            metadata: expand_metadata(&state.metadata_map),
        };
        info!(
            project_id = location.project_id,
            region_id = location.region_id,
            name = %opts.name,
            "Creating network"
        );
        let tasks = client
            .create_network(&location, &opts)
            .await
            .report(diags, "Failed to create network")?;
        let id = client
            .wait_for_created(&tasks, network::KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create network")?;
        let network = client
            .get_network(&location, &id)
            .await
            .report(diags, "Failed to read created network")?;

        state.apply(&network);
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
            info!(%id, name = %state.name, "Renaming network");
            client
                .update_network(
                    &location,
                    &id,
                    &UpdateNetwork {
                        name: state.name.to_string(),
                    },
                )
                .await
                .report(diags, "Failed to rename network")?;
        }
        if state.metadata_map != prior_state.metadata_map {
            client
                .replace_metadata(&location, network::KIND, &id, &expand_metadata(&state.metadata_map))
                .await
                .report(diags, "Failed to update network metadata")?;
        }

        let network = client
            .get_network(&location, &id)
            .await
            .report(diags, "Failed to read network")?;
        state.apply(&network);
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

        info!(id = %state.id, "Deleting network");
        let result = client.delete_network(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete network")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete network")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = NetworkState {
            id: string(import.id),
            create_router: Value::Value(true),
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
    fn plan_fills_defaults() {
        let mut state = NetworkState {
            name: "net".into(),
            ..Default::default()
        };
        state.normalize(&mut Diagnostics::default());
        assert_eq!(state.network_type, string("vxlan"));
        assert_eq!(state.create_router, Value::Value(true));
        assert!(state.mtu.is_unknown());
    }

    #[test]
    fn network_type_is_validated() {
        let mut diags = Diagnostics::default();
        let state = NetworkState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            network_type: "flat".into(),
            ..Default::default()
        };
        state.validate(&mut diags);
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute, AttributePath::new("type"));
    }

    #[test]
    fn remote_network_is_applied() {
        let network: Network = serde_json::from_value(serde_json::json!({
            "id": "n1",
            "name": "net",
            "type": "vlan",
            "mtu": 1450,
            "metadata": [{"key": "env", "value": "prod", "read_only": false}]
        }))
        .unwrap();
        let mut state = NetworkState::default();
        state.apply(&network);
        assert_eq!(state.id, string("n1"));
        assert_eq!(state.network_type, string("vlan"));
        assert_eq!(state.mtu, Value::Value(1450));
        assert_eq!(state.external, Value::Value(false));
        assert!(state.metadata_map.is_value());
    }
}

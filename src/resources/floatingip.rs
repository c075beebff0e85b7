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
use edgecenter_client::cloud::floatingip::{self, AssignFloatingIp, CreateFloatingIp, FloatingIp};
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
use crate::validate::{self, required_if};

const TIMEOUT: Duration = Duration::from_secs(1200);

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FloatingIpState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub port_id: ValueString<'a>,
    pub fixed_ip_address: ValueString<'a>,
    pub floating_ip_address: ValueString<'a>,
    pub status: ValueString<'a>,
    pub router_id: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(FloatingIpState);

impl<'a> WithSchema for FloatingIpState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "port_id" => attribute(AttributeType::String, Optional, "ID of the port the floating IP is assigned to"),
            "fixed_ip_address" => attribute(
                AttributeType::String,
                Optional,
                "Fixed IP address of the port, required with `port_id`",
            ),
            "floating_ip_address" => attribute(AttributeType::String, Computed, "Public address of the floating IP"),
            "status" => attribute(AttributeType::String, Computed, "Status of the floating IP"),
            "router_id" => attribute(AttributeType::String, Computed, "ID of the router routing the floating IP"),
        };
        attributes.extend(resource_attributes("ID of the floating IP"));
        attributes.extend(metadata_attributes());
        schema("EdgeCenter floating IP", attributes, Default::default())
    }
}

impl<'a> WithNormalize for FloatingIpState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        computed(&mut self.floating_ip_address);
        computed(&mut self.status);
        computed(&mut self.router_id);
        computed(&mut self.metadata_read_only);
    }
}

impl<'a> FloatingIpState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        required_if(
            diags,
            AttributePath::new("fixed_ip_address"),
            &self.fixed_ip_address,
            self.port_id.is_value(),
            "when `port_id` is set",
        );
        validate::ip(diags, AttributePath::new("fixed_ip_address"), &self.fixed_ip_address);
    }

    fn apply(&mut self, floating_ip: &FloatingIp) {
        self.id = string(floating_ip.id.as_str());
        self.port_id = opt_string(floating_ip.port_id.clone());
        self.fixed_ip_address = opt_string(floating_ip.fixed_ip_address.clone());
        self.floating_ip_address = opt_string(floating_ip.floating_ip_address.clone());
        self.status = opt_string(floating_ip.status.clone());
        self.router_id = opt_string(floating_ip.router_id.clone());
        apply_metadata(
            &mut self.metadata_map,
            &mut self.metadata_read_only,
            &floating_ip.metadata,
        );
    }
}

#[derive(Debug, Default, Clone)]
pub struct FloatingIpResource {
    client: ClientHandle,
}

impl FloatingIpResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for FloatingIpResource {
    type State<'a> = FloatingIpState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(FloatingIpState::schema())
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

        let Some(floating_ip) = client
            .get_floating_ip(&location, &state.id)
            .await
            .report_found(diags, "Failed to read floating IP")?
        else {
            warn!(id = %state.id, "Floating IP does not exist anymore");
            return None;
        };
        state.apply(&floating_ip);
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
            [project_id, project_name, region_id, region_name]
        );
        if state.port_id != prior_state.port_id
            || state.fixed_ip_address != prior_state.fixed_ip_address
        {
            state.status = Value::Unknown;
            state.router_id = Value::Unknown;
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

        let opts = CreateFloatingIp {
            port_id: known(&state.port_id),
            fixed_ip_address: known(&state.fixed_ip_address),
            metadata: expand_metadata(&state.metadata_map),
        };
        info!(port_id = ?opts.port_id, "Creating floating IP");
        let tasks = client
            .create_floating_ip(&location, &opts)
            .await
            .report(diags, "Failed to create floating IP")?;
        let id = client
            .wait_for_created(&tasks, floatingip::KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create floating IP")?;
        let floating_ip = client
            .get_floating_ip(&location, &id)
            .await
            .report(diags, "Failed to read created floating IP")?;

        state.apply(&floating_ip);
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

        if state.port_id != prior_state.port_id
            || state.fixed_ip_address != prior_state.fixed_ip_address
        {
            if prior_state.port_id.is_value() {
                info!(%id, "Unassigning floating IP");
                client
                    .unassign_floating_ip(&location, &id)
                    .await
                    .report(diags, "Failed to unassign floating IP")?;
            }
            if let Some(port_id) = known(&state.port_id) {
                info!(%id, %port_id, "Assigning floating IP");
                client
                    .assign_floating_ip(
                        &location,
                        &id,
                        &AssignFloatingIp {
                            port_id,
                            fixed_ip_address: known(&state.fixed_ip_address),
                        },
                    )
                    .await
                    .report(diags, "Failed to assign floating IP")?;
            }
        }
        if state.metadata_map != prior_state.metadata_map {
            client
                .replace_metadata(&location, floatingip::KIND, &id, &expand_metadata(&state.metadata_map))
                .await
                .report(diags, "Failed to update floating IP metadata")?;
        }

        let floating_ip = client
            .get_floating_ip(&location, &id)
            .await
            .report(diags, "Failed to read floating IP")?;
        state.apply(&floating_ip);
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

        info!(id = %state.id, "Deleting floating IP");
        let result = client.delete_floating_ip(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete floating IP")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete floating IP")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = FloatingIpState {
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
    fn port_requires_fixed_address() {
        let mut diags = Diagnostics::default();
        let state = FloatingIpState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            port_id: "p1".into(),
            ..Default::default()
        };
        state.validate(&mut diags);
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute, AttributePath::new("fixed_ip_address"));
    }

    #[test]
    fn unassigned_floating_ip_is_applied() {
        let floating_ip: FloatingIp = serde_json::from_value(serde_json::json!({
            "id": "f1",
            "floating_ip_address": "203.0.113.5",
            "status": "DOWN"
        }))
        .unwrap();
        let mut state = FloatingIpState {
            port_id: "p1".into(),
            ..Default::default()
        };
        state.apply(&floating_ip);
        assert!(state.port_id.is_null());
        assert_eq!(state.floating_ip_address, string("203.0.113.5"));
        assert_eq!(state.status, string("DOWN"));
    }
}

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
use edgecenter_client::cloud::servergroup::{CreateServerGroup, ServerGroup};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use crate::attributes::{attribute, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, now, report_deleted, requires_replace, string, ReportError, WithNormalize,
    WithSchema,
};
use crate::validate::one_of;

const POLICIES: &[&str] = &["affinity", "anti-affinity"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstanceState<'a> {
    #[serde(borrow = "'a")]
    pub instance_id: ValueString<'a>,
    pub instance_name: ValueString<'a>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServerGroupState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub policy: ValueString<'a>,
    pub instances: ValueList<Value<InstanceState<'a>>>,
    pub last_updated: ValueString<'a>,
}

impl_location!(ServerGroupState);

/// `instances` attribute: servers of a group
pub(crate) fn instances_attribute() -> Attribute {
    attribute(
        AttributeType::List(
            AttributeType::AttributeSingle(map! {
                "instance_id" => attribute(AttributeType::String, Computed, "ID of the server"),
                "instance_name" => attribute(AttributeType::String, Computed, "Name of the server"),
            })
            .into(),
        ),
        Computed,
        "Servers of the group",
    )
}

pub(crate) fn flatten_instances<'a>(group: &ServerGroup) -> ValueList<Value<InstanceState<'a>>> {
    Value::Value(
        group
            .instances
            .iter()
            .map(|instance| {
                Value::Value(InstanceState {
                    instance_id: string(instance.instance_id.as_str()),
                    instance_name: string(instance.instance_name.as_str()),
                })
            })
            .collect(),
    )
}

impl<'a> WithSchema for ServerGroupState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the server group"),
            "policy" => attribute(
                AttributeType::String,
                Required,
                "Placement policy: `affinity` or `anti-affinity`",
            ),
            "instances" => instances_attribute(),
        };
        attributes.extend(resource_attributes("ID of the server group"));
        schema("EdgeCenter server group", attributes, Default::default())
    }
}

impl<'a> WithNormalize for ServerGroupState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        computed(&mut self.instances);
    }
}

impl<'a> ServerGroupState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        one_of(diags, AttributePath::new("policy"), &self.policy, POLICIES);
    }

    fn apply(&mut self, group: &ServerGroup) {
        self.id = string(group.servergroup_id.as_str());
        self.name = string(group.name.as_str());
        self.policy = string(group.policy.as_str());
        self.instances = flatten_instances(group);
    }
}

#[derive(Debug, Default, Clone)]
pub struct ServerGroupResource {
    client: ClientHandle,
}

impl ServerGroupResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for ServerGroupResource {
    type State<'a> = ServerGroupState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ServerGroupState::schema())
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

        let Some(group) = client
            .get_server_group(&location, &state.id)
            .await
            .report_found(diags, "Failed to read server group")?
        else {
            warn!(id = %state.id, "Server group does not exist anymore");
            return None;
        };
        state.apply(&group);
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
            [project_id, project_name, region_id, region_name, name, policy]
        );
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

        let opts = CreateServerGroup {
            name: state.name.to_string(),
            policy: state.policy.to_string(),
        };
        info!(name = %opts.name, policy = %opts.policy, "Creating server group");
        let group = client
            .create_server_group(&location, &opts)
            .await
            .report(diags, "Failed to create server group")?;

        state.apply(&group);
        state.last_updated = now();
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = planned_state;
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

        info!(id = %state.id, "Deleting server group");
        let result = client.delete_server_group(&location, &state.id).await;
        report_deleted(result, diags, "Failed to delete server group")?;
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = ServerGroupState {
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
    fn policy_is_validated() {
        let mut diags = Diagnostics::default();
        ServerGroupState {
            project_id: Value::Value(1),
            region_name: "Luxembourg".into(),
            policy: "soft-affinity".into(),
            ..Default::default()
        }
        .validate(&mut diags);
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute, AttributePath::new("policy"));
    }

    #[test]
    fn instances_are_flattened() {
        let group: ServerGroup = serde_json::from_value(serde_json::json!({
            "servergroup_id": "g1",
            "name": "web",
            "policy": "anti-affinity",
            "instances": [{"instance_id": "i1", "instance_name": "web-1"}]
        }))
        .unwrap();
        let mut state = ServerGroupState::default();
        state.apply(&group);
        assert_eq!(state.id, string("g1"));
        let instances = state.instances.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(
            instances[0].as_ref_option().map(|i| i.instance_name.clone()),
            Some(string("web-1"))
        );
    }
}

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
use edgecenter_client::cloud::pool::{Member, MemberOpts, MEMBER_CREATED_KIND};
use edgecenter_client::{Client, Location};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use super::loadbalancer::TIMEOUT;
use crate::attributes::{attribute, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, known, now, opt_string, report_deleted, requires_replace, string, ReportError,
    WithNormalize, WithSchema,
};
use crate::validate::{in_range, ip};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MemberState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub pool_id: ValueString<'a>,
    pub address: ValueString<'a>,
    pub protocol_port: ValueNumber,
    pub weight: ValueNumber,
    pub subnet_id: ValueString<'a>,
    pub instance_id: ValueString<'a>,
    pub operating_status: ValueString<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(MemberState);

impl<'a> WithSchema for MemberState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "pool_id" => attribute(AttributeType::String, Required, "ID of the pool"),
            "address" => attribute(AttributeType::String, Required, "IP address of the member"),
            "protocol_port" => attribute(AttributeType::Number, Required, "Port the member listens on"),
            "weight" => attribute(AttributeType::Number, OptionalComputed, "Weight of the member, between 0 and 256"),
            "subnet_id" => attribute(AttributeType::String, Optional, "Subnet of the member address"),
            "instance_id" => attribute(AttributeType::String, Optional, "Server hosting the member"),
            "operating_status" => attribute(AttributeType::String, Computed, "Operating status"),
        };
        attributes.extend(resource_attributes("ID of the member"));
        schema("EdgeCenter load balancer pool member", attributes, Default::default())
    }
}

impl<'a> WithNormalize for MemberState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        computed(&mut self.weight);
        computed(&mut self.operating_status);
    }
}

impl<'a> MemberState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        ip(diags, AttributePath::new("address"), &self.address);
        in_range(diags, AttributePath::new("protocol_port"), &self.protocol_port, 1, 65535);
        in_range(diags, AttributePath::new("weight"), &self.weight, 0, 256);
    }

    fn opts(&self) -> MemberOpts {
        MemberOpts {
            address: self.address.to_string(),
            protocol_port: self.protocol_port.unwrap_or_default(),
            weight: self.weight.as_option(),
            subnet_id: known(&self.subnet_id),
            instance_id: known(&self.instance_id),
        }
    }

    fn apply(&mut self, member: &Member) {
        self.id = string(member.id.as_str());
        self.address = string(member.address.as_str());
        self.protocol_port = Value::Value(member.protocol_port);
        self.weight = Value::Value(member.weight);
        if !self.subnet_id.is_null() {
            self.subnet_id = opt_string(member.subnet_id.clone());
        }
        if !self.instance_id.is_null() {
            self.instance_id = opt_string(member.instance_id.clone());
        }
        self.operating_status = opt_string(member.operating_status.clone());
    }
}

/// Members are only exposed through their pool
async fn find_member(
    client: &Client,
    location: &Location,
    pool_id: &str,
    member_id: &str,
) -> edgecenter_client::Result<Option<Member>> {
    let pool = client.get_pool(location, pool_id).await?;
    Ok(pool.members.into_iter().find(|member| member.id == member_id))
}

#[derive(Debug, Default, Clone)]
pub struct MemberResource {
    client: ClientHandle,
}

impl MemberResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for MemberResource {
    type State<'a> = MemberState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(MemberState::schema())
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

        let Some(Some(member)) = find_member(&client, &location, &state.pool_id, &state.id)
            .await
            .report_found(diags, "Failed to read pool member")?
        else {
            warn!(id = %state.id, pool_id = %state.pool_id, "Pool member does not exist anymore");
            return None;
        };
        state.apply(&member);
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
                pool_id,
                address,
                protocol_port,
                subnet_id,
                instance_id
            ]
        );
        if state != prior_state {
            state.operating_status = Value::Unknown;
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
        let pool_id = state.pool_id.to_string();

        let opts = state.opts();
        info!(%pool_id, address = %opts.address, port = opts.protocol_port, "Creating pool member");
        let tasks = client
            .create_member(&location, &pool_id, &opts)
            .await
            .report(diags, "Failed to create pool member")?;
        let id = client
            .wait_for_created(&tasks, MEMBER_CREATED_KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create pool member")?;
        let Some(member) = find_member(&client, &location, &pool_id, &id)
            .await
            .report(diags, "Failed to read created pool member")?
        else {
            diags.root_error(
                "Failed to read created pool member",
                format!("Member {id} is not listed in pool {pool_id}"),
            );
            return None;
        };

        state.apply(&member);
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
        let pool_id = prior_state.pool_id.to_string();
        let id = prior_state.id.to_string();

        if state.weight.is_value() && state.weight != prior_state.weight {
            info!(%id, %pool_id, weight = ?state.weight, "Updating pool member weight");
            let tasks = client
                .update_member(&location, &pool_id, &id, &state.opts())
                .await
                .report(diags, "Failed to update pool member")?;
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to update pool member")?;
        }

        if let Some(member) = find_member(&client, &location, &pool_id, &id)
            .await
            .report(diags, "Failed to read pool member")?
        {
            state.apply(&member);
        }
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

        info!(id = %state.id, pool_id = %state.pool_id, "Deleting pool member");
        let result = client
            .delete_member(&location, &state.pool_id, &state.id)
            .await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete pool member")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete pool member")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, true)?;
        let mut state = MemberState {
            id: string(import.id),
            pool_id: opt_string(import.parent_id),
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
    fn weight_and_address_are_validated() {
        let mut diags = Diagnostics::default();
        MemberState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            address: "10.0.0.300".into(),
            protocol_port: Value::Value(80),
            weight: Value::Value(300),
            ..Default::default()
        }
        .validate(&mut diags);
        let attributes = diags
            .errors
            .into_iter()
            .map(|diag| diag.attribute)
            .collect::<Vec<_>>();
        assert_eq!(
            attributes,
            vec![AttributePath::new("address"), AttributePath::new("weight")]
        );
    }

    #[test]
    fn unknown_weight_is_not_sent() {
        let state = MemberState {
            address: "10.0.0.3".into(),
            protocol_port: Value::Value(8080),
            weight: Value::Unknown,
            subnet_id: "s1".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(state.opts()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"address": "10.0.0.3", "protocol_port": 8080, "subnet_id": "s1"})
        );
    }

    #[tokio::test]
    async fn member_import_carries_the_pool() {
        let resource = MemberResource::default();
        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .import(&mut diags, "1:2:m1:p1".to_owned())
            .await
            .unwrap();
        assert_eq!(state.id, string("m1"));
        assert_eq!(state.pool_id, string("p1"));
        assert_eq!(state.region_id, Value::Value(2));
    }
}

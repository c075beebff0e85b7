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
use edgecenter_client::cloud::listener::{CreateListener, Listener, UpdateListener, CREATED_KIND};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use super::loadbalancer::TIMEOUT;
use crate::attributes::{attribute, list_of, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::provider::ClientHandle;
use crate::utils::{
    apply_list, check, computed, default_to, known, known_list, now, opt_string, report_deleted,
    requires_replace, string, string_list, ReportError, WithNormalize, WithSchema,
};
use crate::validate::{self, conflicts_if, in_range, one_of, required_if};

const PROTOCOLS: &[&str] = &["HTTP", "HTTPS", "TCP", "UDP", "TERMINATED_HTTPS", "PROMETHEUS"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ListenerState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub loadbalancer_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub protocol_port: ValueNumber,
    pub insert_x_forwarded: ValueBool,
    pub secret_id: ValueString<'a>,
    pub sni_secret_id: ValueList<ValueString<'a>>,
    pub allowed_cidrs: ValueList<ValueString<'a>>,
    pub pool_count: ValueNumber,
    pub provisioning_status: ValueString<'a>,
    pub operating_status: ValueString<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(ListenerState);

impl<'a> WithSchema for ListenerState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "loadbalancer_id" => attribute(AttributeType::String, Required, "ID of the load balancer"),
            "name" => attribute(AttributeType::String, Required, "Name of the listener"),
            "protocol" => attribute(
                AttributeType::String,
                Required,
                "Protocol: `HTTP`, `HTTPS`, `TCP`, `UDP`, `TERMINATED_HTTPS` or `PROMETHEUS`",
            ),
            "protocol_port" => attribute(AttributeType::Number, Required, "Port the listener listens on"),
            "insert_x_forwarded" => attribute(
                AttributeType::Bool,
                OptionalComputed,
                "Add X-Forwarded-For headers, HTTP only (default: false)",
            ),
            "secret_id" => attribute(AttributeType::String, Optional, "Certificate secret, TERMINATED_HTTPS only"),
            "sni_secret_id" => attribute(
                list_of(AttributeType::String),
                Optional,
                "SNI certificate secrets, TERMINATED_HTTPS only",
            ),
            "allowed_cidrs" => attribute(list_of(AttributeType::String), Optional, "CIDRs allowed to connect"),
            "pool_count" => attribute(AttributeType::Number, Computed, "Number of pools of the listener"),
            "provisioning_status" => attribute(AttributeType::String, Computed, "Provisioning status"),
            "operating_status" => attribute(AttributeType::String, Computed, "Operating status"),
        };
        attributes.extend(resource_attributes("ID of the listener"));
        schema("EdgeCenter load balancer listener", attributes, Default::default())
    }
}

impl<'a> WithNormalize for ListenerState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_to(&mut self.insert_x_forwarded, false);
        computed(&mut self.pool_count);
        computed(&mut self.provisioning_status);
        computed(&mut self.operating_status);
    }
}

impl<'a> ListenerState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        one_of(diags, AttributePath::new("protocol"), &self.protocol, PROTOCOLS);
        in_range(diags, AttributePath::new("protocol_port"), &self.protocol_port, 1, 65535);

        let protocol = self.protocol.as_deref_option();
        let terminated = protocol == Some("TERMINATED_HTTPS");
        conflicts_if(
            diags,
            AttributePath::new("insert_x_forwarded"),
            &self.insert_x_forwarded.filter(|insert| *insert),
            protocol.is_some() && protocol != Some("HTTP"),
            "for a protocol other than HTTP",
        );
        required_if(
            diags,
            AttributePath::new("secret_id"),
            &self.secret_id,
            terminated,
            "for a TERMINATED_HTTPS listener",
        );
        let not_terminated = protocol.is_some() && !terminated;
        let reason = "for a protocol other than TERMINATED_HTTPS";
        conflicts_if(diags, AttributePath::new("secret_id"), &self.secret_id, not_terminated, reason);
        conflicts_if(diags, AttributePath::new("sni_secret_id"), &self.sni_secret_id, not_terminated, reason);
        for (i, cidr) in self.allowed_cidrs.iter().flatten().enumerate() {
            validate::cidr(diags, AttributePath::new("allowed_cidrs").index(i as i64), cidr);
        }
    }

    fn allowed_cidrs(&self) -> Option<Vec<String>> {
        Some(known_list(&self.allowed_cidrs)).filter(|cidrs| !cidrs.is_empty())
    }

    fn apply(&mut self, listener: &Listener) {
        self.id = string(listener.id.as_str());
        self.name = string(listener.name.as_str());
        self.protocol = string(listener.protocol.as_str());
        self.protocol_port = Value::Value(listener.protocol_port);
        if let Some(loadbalancer_id) = &listener.loadbalancer_id {
            self.loadbalancer_id = string(loadbalancer_id.as_str());
        }
        self.insert_x_forwarded = Value::Value(listener.insert_x_forwarded);
        self.secret_id = opt_string(listener.secret_id.clone()).filter(|secret| !secret.is_empty());
        apply_list(&mut self.sni_secret_id, string_list(listener.sni_secret_id.clone()).unwrap_or_default());
        apply_list(
            &mut self.allowed_cidrs,
            string_list(listener.allowed_cidrs.clone().unwrap_or_default()).unwrap_or_default(),
        );
        self.pool_count = Value::Value(listener.pool_count);
        self.provisioning_status = opt_string(listener.provisioning_status.clone());
        self.operating_status = opt_string(listener.operating_status.clone());
    }
}

#[derive(Debug, Default, Clone)]
pub struct ListenerResource {
    client: ClientHandle,
}

impl ListenerResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for ListenerResource {
    type State<'a> = ListenerState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ListenerState::schema())
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

        let Some(listener) = client
            .get_listener(&location, &state.id)
            .await
            .report_found(diags, "Failed to read listener")?
        else {
            warn!(id = %state.id, "Listener does not exist anymore");
            return None;
        };
        state.apply(&listener);
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
                loadbalancer_id,
                protocol,
                protocol_port,
                insert_x_forwarded
            ]
        );
        if state != prior_state {
            state.provisioning_status = Value::Unknown;
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

        let opts = CreateListener {
            loadbalancer_id: state.loadbalancer_id.to_string(),
            name: state.name.to_string(),
            protocol: state.protocol.to_string(),
            protocol_port: state.protocol_port.unwrap_or_default(),
            insert_x_forwarded: state.insert_x_forwarded.unwrap_or(false),
            secret_id: known(&state.secret_id),
            sni_secret_id: known_list(&state.sni_secret_id),
            allowed_cidrs: state.allowed_cidrs(),
        };
        info!(
            loadbalancer_id = %opts.loadbalancer_id,
            protocol = %opts.protocol,
            port = opts.protocol_port,
            "Creating listener"
        );
        let tasks = client
            .create_listener(&location, &opts)
            .await
            .report(diags, "Failed to create listener")?;
        let id = client
            .wait_for_created(&tasks, CREATED_KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create listener")?;
        let listener = client
            .get_listener(&location, &id)
            .await
            .report(diags, "Failed to read created listener")?;

        state.apply(&listener);
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

        let opts = UpdateListener {
            name: state.name.to_string(),
            secret_id: known(&state.secret_id),
            sni_secret_id: known_list(&state.sni_secret_id),
            allowed_cidrs: state.allowed_cidrs(),
        };
        info!(%id, "Updating listener");
        client
            .update_listener(&location, &id, &opts)
            .await
            .report(diags, "Failed to update listener")?;

        let listener = client
            .get_listener(&location, &id)
            .await
            .report(diags, "Failed to read listener")?;
        state.apply(&listener);
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

        info!(id = %state.id, "Deleting listener");
        let result = client.delete_listener(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete listener")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete listener")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = ListenerState {
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

    fn listener(protocol: &str) -> ListenerState<'_> {
        ListenerState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            protocol: protocol.into(),
            protocol_port: Value::Value(443),
            ..Default::default()
        }
    }

    fn errors(state: &ListenerState) -> Vec<AttributePath> {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags);
        diags.errors.into_iter().map(|diag| diag.attribute).collect()
    }

    #[test]
    fn protocol_specific_attributes() {
        assert_eq!(
            errors(&listener("TERMINATED_HTTPS")),
            vec![AttributePath::new("secret_id")]
        );
        assert_eq!(
            errors(&ListenerState {
                insert_x_forwarded: Value::Value(true),
                secret_id: "s1".into(),
                ..listener("TCP")
            }),
            vec![
                AttributePath::new("insert_x_forwarded"),
                AttributePath::new("secret_id")
            ]
        );
        assert!(errors(&ListenerState {
            insert_x_forwarded: Value::Value(false),
            ..listener("TCP")
        })
        .is_empty());
        assert!(errors(&ListenerState {
            insert_x_forwarded: Value::Value(true),
            ..listener("HTTP")
        })
        .is_empty());
    }

    #[test]
    fn port_and_cidrs_are_validated() {
        assert_eq!(
            errors(&ListenerState {
                protocol_port: Value::Value(0),
                allowed_cidrs: Value::Value(vec!["10.0.0.0/8".into(), "10.0.0.1".into()]),
                ..listener("TCP")
            }),
            vec![
                AttributePath::new("protocol_port"),
                AttributePath::new("allowed_cidrs").index(1)
            ]
        );
    }
}

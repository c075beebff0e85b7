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
use edgecenter_client::cloud::reservedfixedip::{
    CreateReservedFixedIp, ReservedFixedIp, CREATED_KIND,
};
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
    check, computed, default_to, known, now, opt_string, report_deleted, requires_replace, string,
    ReportError, WithNormalize, WithSchema,
};
use crate::validate::{self, one_of, required_if};

const TIMEOUT: Duration = Duration::from_secs(1200);
const RESERVATION_TYPES: &[&str] = &["external", "subnet", "any_subnet", "ip_address", "port"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ReservedFixedIpState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    #[serde(rename = "type")]
    pub reservation_type: ValueString<'a>,
    pub network_id: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub fixed_ip_address: ValueString<'a>,
    pub port_id: ValueString<'a>,
    pub is_vip: ValueBool,
    pub name: ValueString<'a>,
    pub status: ValueString<'a>,
    pub is_external: ValueBool,
    pub last_updated: ValueString<'a>,
}

impl_location!(ReservedFixedIpState);

impl<'a> WithSchema for ReservedFixedIpState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "type" => attribute(
                AttributeType::String,
                Required,
                "Type of the reservation: `external`, `subnet`, `any_subnet`, `ip_address` or `port`",
            ),
            "network_id" => attribute(
                AttributeType::String,
                OptionalComputed,
                "ID of the network, required for `any_subnet` and `ip_address`",
            ),
            "subnet_id" => attribute(AttributeType::String, OptionalComputed, "ID of the subnet, required for `subnet`"),
            "fixed_ip_address" => attribute(
                AttributeType::String,
                OptionalComputed,
                "Reserved IP address, required for `ip_address`",
            ),
            "port_id" => attribute(
                AttributeType::String,
                OptionalComputed,
                "ID of the port: the reserved port, or the source port for `port`",
            ),
            "is_vip" => attribute(AttributeType::Bool, OptionalComputed, "Whether the address is a VIP (default: false)"),
            "name" => attribute(AttributeType::String, Computed, "Name of the reserved port"),
            "status" => attribute(AttributeType::String, Computed, "Status of the reserved port"),
            "is_external" => attribute(AttributeType::Bool, Computed, "Whether the address is external"),
        };
        attributes.extend(resource_attributes("ID of the reserved port"));
        schema("EdgeCenter reserved fixed IP", attributes, Default::default())
    }
}

impl<'a> WithNormalize for ReservedFixedIpState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_to(&mut self.is_vip, false);
        computed(&mut self.network_id);
        computed(&mut self.subnet_id);
        computed(&mut self.fixed_ip_address);
        computed(&mut self.port_id);
        computed(&mut self.name);
        computed(&mut self.status);
        computed(&mut self.is_external);
    }
}

impl<'a> ReservedFixedIpState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        one_of(diags, AttributePath::new("type"), &self.reservation_type, RESERVATION_TYPES);
        let reservation_type = self.reservation_type.as_deref_option();
        required_if(
            diags,
            AttributePath::new("subnet_id"),
            &self.subnet_id,
            reservation_type == Some("subnet"),
            "for a `subnet` reservation",
        );
        required_if(
            diags,
            AttributePath::new("network_id"),
            &self.network_id,
            matches!(reservation_type, Some("any_subnet" | "ip_address")),
            "for an `any_subnet` or `ip_address` reservation",
        );
        required_if(
            diags,
            AttributePath::new("fixed_ip_address"),
            &self.fixed_ip_address,
            reservation_type == Some("ip_address"),
            "for an `ip_address` reservation",
        );
        required_if(
            diags,
            AttributePath::new("port_id"),
            &self.port_id,
            reservation_type == Some("port"),
            "for a `port` reservation",
        );
        validate::ip(diags, AttributePath::new("fixed_ip_address"), &self.fixed_ip_address);
    }

    fn create_opts(&self) -> CreateReservedFixedIp {
        let reservation_type = self.reservation_type.to_string();
        let port_id = if reservation_type == "port" {
            known(&self.port_id)
        } else {
            None
        };
        CreateReservedFixedIp {
            is_vip: self.is_vip.unwrap_or(false),
            network_id: known(&self.network_id),
            subnet_id: known(&self.subnet_id),
            ip_address: known(&self.fixed_ip_address),
            port_id,
            r#type: reservation_type,
        }
    }

    fn apply(&mut self, reserved: &ReservedFixedIp) {
        self.id = string(reserved.port_id.as_str());
        // The source port of a `port` reservation is kept as configured
        if self.reservation_type.as_deref_option() != Some("port") {
            self.port_id = string(reserved.port_id.as_str());
        }
        self.name = opt_string(reserved.name.clone());
        self.fixed_ip_address = opt_string(reserved.fixed_ip_address.clone());
        self.subnet_id = opt_string(reserved.subnet_id.clone());
        self.network_id = opt_string(reserved.network_id.clone());
        self.is_vip = Value::Value(reserved.is_vip);
        self.is_external = Value::Value(reserved.is_external);
        self.status = opt_string(reserved.status.clone());
    }
}

#[derive(Debug, Default, Clone)]
pub struct ReservedFixedIpResource {
    client: ClientHandle,
}

impl ReservedFixedIpResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for ReservedFixedIpResource {
    type State<'a> = ReservedFixedIpState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ReservedFixedIpState::schema())
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

        let Some(reserved) = client
            .get_reserved_fixed_ip(&location, &state.id)
            .await
            .report_found(diags, "Failed to read reserved fixed IP")?
        else {
            warn!(id = %state.id, "Reserved fixed IP does not exist anymore");
            return None;
        };
        state.apply(&reserved);
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
            [project_id, project_name, region_id, region_name]
        );
        if state.reservation_type != prior_state.reservation_type {
            trigger_replace.push(AttributePath::new("type"));
        }
        // Computed values only trigger a replacement when they are configured
        let configured = [
            ("network_id", &config_state.network_id, &prior_state.network_id),
            ("subnet_id", &config_state.subnet_id, &prior_state.subnet_id),
            ("fixed_ip_address", &config_state.fixed_ip_address, &prior_state.fixed_ip_address),
            ("port_id", &config_state.port_id, &prior_state.port_id),
        ];
        for (name, config, prior) in configured {
            if config.is_value() && config != prior {
                trigger_replace.push(AttributePath::new(name));
            }
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

        let opts = state.create_opts();
        info!(reservation_type = %opts.r#type, "Creating reserved fixed IP");
        let tasks = client
            .create_reserved_fixed_ip(&location, &opts)
            .await
            .report(diags, "Failed to create reserved fixed IP")?;
        let port_id = client
            .wait_for_created(&tasks, CREATED_KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create reserved fixed IP")?;
        let reserved = client
            .get_reserved_fixed_ip(&location, &port_id)
            .await
            .report(diags, "Failed to read created reserved fixed IP")?;

        state.apply(&reserved);
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

        let reserved = if state.is_vip != prior_state.is_vip {
            let is_vip = state.is_vip.unwrap_or(false);
            info!(%id, is_vip, "Switching VIP status of reserved fixed IP");
            client
                .switch_reserved_fixed_ip_vip(&location, &id, is_vip)
                .await
                .report(diags, "Failed to update reserved fixed IP")?
        } else {
            client
                .get_reserved_fixed_ip(&location, &id)
                .await
                .report(diags, "Failed to read reserved fixed IP")?
        };
        state.apply(&reserved);
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

        info!(id = %state.id, "Deleting reserved fixed IP");
        let result = client.delete_reserved_fixed_ip(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete reserved fixed IP")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete reserved fixed IP")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = ReservedFixedIpState {
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

    fn reservation(reservation_type: &str) -> ReservedFixedIpState<'_> {
        ReservedFixedIpState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            reservation_type: reservation_type.into(),
            ..Default::default()
        }
    }

    fn errors(state: &ReservedFixedIpState) -> Vec<AttributePath> {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags);
        diags.errors.into_iter().map(|diag| diag.attribute).collect()
    }

    #[test]
    fn required_attributes_depend_on_type() {
        assert!(errors(&reservation("external")).is_empty());
        assert_eq!(errors(&reservation("subnet")), vec![AttributePath::new("subnet_id")]);
        assert_eq!(
            errors(&reservation("ip_address")),
            vec![
                AttributePath::new("network_id"),
                AttributePath::new("fixed_ip_address")
            ]
        );
        assert_eq!(errors(&reservation("port")), vec![AttributePath::new("port_id")]);
        assert_eq!(errors(&reservation("floating")), vec![AttributePath::new("type")]);
    }

    #[test]
    fn source_port_only_sent_for_port_reservations() {
        let state = ReservedFixedIpState {
            port_id: "p1".into(),
            ..reservation("external")
        };
        assert_eq!(state.create_opts().port_id, None);

        let state = ReservedFixedIpState {
            port_id: "p1".into(),
            ..reservation("port")
        };
        let opts = state.create_opts();
        assert_eq!(opts.port_id.as_deref(), Some("p1"));
        assert_eq!(opts.r#type, "port");
        assert!(!opts.is_vip);
    }
}

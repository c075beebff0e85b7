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
use edgecenter_client::cloud::subnet::{self, CreateSubnet, Subnet, UpdateSubnet};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, NestedBlock, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use super::host_route::{
    expand_host_routes, flatten_host_routes, host_routes_block, validate_host_routes, HostRoutes,
};
use crate::attributes::{attribute, list_of, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::metadata::{
    apply_metadata, expand_metadata, metadata_attributes, MetadataMap, MetadataReadOnly,
};
use crate::provider::ClientHandle;
use crate::utils::{
    apply_list, check, computed, default_to, known_list, now, report_deleted, requires_replace,
    string, string_list, ReportError, WithNormalize, WithSchema,
};
use crate::validate;

const TIMEOUT: Duration = Duration::from_secs(1200);
/// `gateway_ip` value of a subnet without gateway
const DISABLE_GATEWAY: &str = "disable";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SubnetState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub network_id: ValueString<'a>,
    pub enable_dhcp: ValueBool,
    pub connect_to_network_router: ValueBool,
    pub dns_nameservers: ValueList<ValueString<'a>>,
    pub host_routes: HostRoutes<'a>,
    pub gateway_ip: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(SubnetState);

impl<'a> WithSchema for SubnetState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the subnet"),
            "cidr" => attribute(AttributeType::String, Required, "CIDR of the subnet"),
            "network_id" => attribute(AttributeType::String, Required, "ID of the network of the subnet"),
            "enable_dhcp" => attribute(AttributeType::Bool, OptionalComputed, "Enable DHCP (default: true)"),
            "connect_to_network_router" => attribute(
                AttributeType::Bool,
                OptionalComputed,
                "Attach the subnet to the router of its network (default: true)",
            ),
            "dns_nameservers" => attribute(list_of(AttributeType::String), Optional, "DNS servers announced by DHCP"),
            "gateway_ip" => attribute(
                AttributeType::String,
                OptionalComputed,
                "IP address of the gateway, or `disable` for a subnet without gateway",
            ),
        };
        attributes.extend(resource_attributes("ID of the subnet"));
        attributes.extend(metadata_attributes());
        let blocks: HashMap<String, NestedBlock> = map! {
            "host_routes" => host_routes_block("Static routes announced by DHCP"),
        };
        schema("EdgeCenter subnet", attributes, blocks)
    }
}

impl<'a> WithNormalize for SubnetState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_to(&mut self.enable_dhcp, true);
        default_to(&mut self.connect_to_network_router, true);
        computed(&mut self.gateway_ip);
        computed(&mut self.metadata_read_only);
    }
}

impl<'a> SubnetState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        validate::cidr(diags, AttributePath::new("cidr"), &self.cidr);
        if let Value::Value(gateway_ip) = &self.gateway_ip {
            if gateway_ip != DISABLE_GATEWAY && !validate::is_ip(gateway_ip) {
                diags.error(
                    "Invalid gateway",
                    format!("`{gateway_ip}` must be an IP address or `{DISABLE_GATEWAY}`"),
                    AttributePath::new("gateway_ip"),
                );
            }
        }
        for (i, server) in self.dns_nameservers.iter().flatten().enumerate() {
            validate::ip(diags, AttributePath::new("dns_nameservers").index(i as i64), server);
        }
        validate_host_routes(diags, "host_routes", &self.host_routes);
    }

    /// Gateway as sent to the API: not sent when unknown, null when disabled
    fn gateway(&self) -> Option<Option<String>> {
        match &self.gateway_ip {
            Value::Value(gateway) if gateway == DISABLE_GATEWAY => Some(None),
            Value::Value(gateway) => Some(Some(gateway.to_string())),
            _ => None,
        }
    }

    fn apply(&mut self, subnet: &Subnet) {
        self.id = string(subnet.id.as_str());
        self.name = string(subnet.name.as_str());
        self.cidr = string(subnet.cidr.as_str());
        self.network_id = string(subnet.network_id.as_str());
        self.enable_dhcp = Value::Value(subnet.enable_dhcp);
        if let Some(connect) = subnet.connect_to_network_router {
            self.connect_to_network_router = Value::Value(connect);
        }
        self.gateway_ip = match &subnet.gateway_ip {
            Some(gateway) if !gateway.is_empty() => string(gateway.as_str()),
            _ => string(DISABLE_GATEWAY),
        };
        apply_list(
            &mut self.dns_nameservers,
            string_list(subnet.dns_nameservers.clone().unwrap_or_default()).unwrap_or_default(),
        );
        apply_list(
            &mut self.host_routes,
            flatten_host_routes(subnet.host_routes.as_deref().unwrap_or_default()),
        );
        apply_metadata(
            &mut self.metadata_map,
            &mut self.metadata_read_only,
            &subnet.metadata,
        );
    }
}

#[derive(Debug, Default, Clone)]
pub struct SubnetResource {
    client: ClientHandle,
}

impl SubnetResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for SubnetResource {
    type State<'a> = SubnetState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SubnetState::schema())
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

        let Some(subnet) = client
            .get_subnet(&location, &state.id)
            .await
            .report_found(diags, "Failed to read subnet")?
        else {
            warn!(id = %state.id, "Subnet does not exist anymore");
            return None;
        };
        state.apply(&subnet);
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
                cidr,
                network_id,
                connect_to_network_router
            ]
        );
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

        let opts = CreateSubnet {
            name: state.name.to_string(),
            cidr: state.cidr.to_string(),
            network_id: state.network_id.to_string(),
            enable_dhcp: state.enable_dhcp.unwrap_or(true),
            connect_to_network_router: state.connect_to_network_router.unwrap_or(true),
            gateway_ip: state.gateway(),
            dns_nameservers: known_list(&state.dns_nameservers),
            host_routes: expand_host_routes(&state.host_routes),
            metadata: expand_metadata(&state.metadata_map),
        };
        info!(
            network_id = %opts.network_id,
            cidr = %opts.cidr,
            "Creating subnet"
        );
        let tasks = client
            .create_subnet(&location, &opts)
            .await
            .report(diags, "Failed to create subnet")?;
        let id = client
            .wait_for_created(&tasks, subnet::KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create subnet")?;
        let subnet = client
            .get_subnet(&location, &id)
            .await
            .report(diags, "Failed to read created subnet")?;

        state.apply(&subnet);
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

        let opts = UpdateSubnet {
            name: state.name.to_string(),
            enable_dhcp: state.enable_dhcp.unwrap_or(true),
            gateway_ip: if state.gateway_ip != prior_state.gateway_ip {
                state.gateway()
            } else {
                None
            },
            dns_nameservers: known_list(&state.dns_nameservers),
            host_routes: expand_host_routes(&state.host_routes),
        };
        info!(%id, "Updating subnet");
        client
            .update_subnet(&location, &id, &opts)
            .await
            .report(diags, "Failed to update subnet")?;

        if state.metadata_map != prior_state.metadata_map {
            client
                .replace_metadata(&location, subnet::KIND, &id, &expand_metadata(&state.metadata_map))
                .await
                .report(diags, "Failed to update subnet metadata")?;
        }

        let subnet = client
            .get_subnet(&location, &id)
            .await
            .report(diags, "Failed to read subnet")?;
        state.apply(&subnet);
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

        info!(id = %state.id, "Deleting subnet");
        let result = client.delete_subnet(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete subnet")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete subnet")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = SubnetState {
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

    fn located() -> SubnetState<'static> {
        SubnetState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            cidr: "192.168.10.0/24".into(),
            ..Default::default()
        }
    }

    #[test]
    fn gateway_can_be_disabled() {
        let mut state = located();
        assert_eq!(state.gateway(), None);

        state.gateway_ip = "disable".into();
        assert_eq!(state.gateway(), Some(None));

        state.gateway_ip = "192.168.10.1".into();
        assert_eq!(state.gateway(), Some(Some("192.168.10.1".to_owned())));
    }

    #[test]
    fn invalid_addresses_are_reported() {
        let mut diags = Diagnostics::default();
        let state = SubnetState {
            cidr: "192.168.10.0".into(),
            gateway_ip: "none".into(),
            dns_nameservers: Value::Value(vec!["8.8.8.8".into(), "dns".into()]),
            ..located()
        };
        state.validate(&mut diags);
        let attributes = diags
            .errors
            .iter()
            .map(|diag| diag.attribute.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            attributes,
            vec![
                AttributePath::new("cidr"),
                AttributePath::new("gateway_ip"),
                AttributePath::new("dns_nameservers").index(1),
            ]
        );
    }

    #[test]
    fn missing_gateway_is_disabled() {
        let subnet: Subnet = serde_json::from_value(serde_json::json!({
            "id": "s1",
            "name": "subnet",
            "cidr": "192.168.10.0/24",
            "network_id": "n1",
            "enable_dhcp": true,
            "gateway_ip": null,
            "dns_nameservers": []
        }))
        .unwrap();
        let mut state = located();
        state.apply(&subnet);
        assert_eq!(state.gateway_ip, string("disable"));
        assert!(state.dns_nameservers.is_null());
        assert!(state.host_routes.is_null());
    }

    #[test]
    fn remote_dns_servers_are_applied() {
        let subnet: Subnet = serde_json::from_value(serde_json::json!({
            "id": "s1",
            "name": "subnet",
            "cidr": "192.168.10.0/24",
            "network_id": "n1",
            "enable_dhcp": true,
            "gateway_ip": "192.168.10.1",
            "dns_nameservers": ["8.8.8.8", "1.1.1.1"]
        }))
        .unwrap();
        let mut state = located();
        state.apply(&subnet);
        assert_eq!(state.gateway_ip, string("192.168.10.1"));
        assert_eq!(
            state.dns_nameservers,
            Value::Value(vec![string("8.8.8.8"), string("1.1.1.1")])
        );
    }
}

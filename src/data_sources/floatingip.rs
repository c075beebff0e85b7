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
use edgecenter_client::cloud::floatingip::FloatingIp;
use edgecenter_client::cloud::reservedfixedip::ReservedFixedIp;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use super::{computed_attribute, selector_attributes};
use crate::attributes::schema;
use crate::location::{impl_location, resolve_location, validate_location};
use crate::lookup::{find_by_name, validate_selector, Selector};
use crate::metadata::{apply_metadata, computed_metadata_attributes, MetadataMap, MetadataReadOnly};
use crate::provider::ClientHandle;
use crate::utils::{check, opt_string, string, ReportError, WithSchema};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FloatingIpDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub floating_ip_address: ValueString<'a>,
    pub fixed_ip_address: ValueString<'a>,
    pub port_id: ValueString<'a>,
    pub router_id: ValueString<'a>,
    pub status: ValueString<'a>,
    pub created_at: ValueString<'a>,
    pub updated_at: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
}

impl_location!(FloatingIpDataSourceState);

impl<'a> WithSchema for FloatingIpDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "fixed_ip_address" => computed_attribute(AttributeType::String, "Private address the floating IP is bound to"),
            "port_id" => computed_attribute(AttributeType::String, "Port the floating IP is bound to"),
            "router_id" => computed_attribute(AttributeType::String, "Router of the floating IP"),
            "status" => computed_attribute(AttributeType::String, "Status of the floating IP"),
            "created_at" => computed_attribute(AttributeType::String, "Creation date"),
            "updated_at" => computed_attribute(AttributeType::String, "Last update date"),
        };
        attributes.extend(selector_attributes("floating_ip_address", "floating IP"));
        attributes.extend(computed_metadata_attributes());
        schema("EdgeCenter floating IP", attributes, Default::default())
    }
}

impl<'a> FloatingIpDataSourceState<'a> {
    fn apply(&mut self, floating_ip: &FloatingIp) {
        self.id = string(floating_ip.id.as_str());
        self.floating_ip_address = opt_string(floating_ip.floating_ip_address.clone());
        self.fixed_ip_address = opt_string(floating_ip.fixed_ip_address.clone());
        self.port_id = opt_string(floating_ip.port_id.clone());
        self.router_id = opt_string(floating_ip.router_id.clone());
        self.status = opt_string(floating_ip.status.clone());
        self.created_at = opt_string(floating_ip.created_at.clone());
        self.updated_at = opt_string(floating_ip.updated_at.clone());
        apply_metadata(&mut self.metadata_map, &mut self.metadata_read_only, &floating_ip.metadata);
    }
}

#[derive(Debug, Default, Clone)]
pub struct FloatingIpDataSource {
    client: ClientHandle,
}

impl FloatingIpDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for FloatingIpDataSource {
    type State<'a> = FloatingIpDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(FloatingIpDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
        validate_selector(diags, &config.id, "floating_ip_address", &config.floating_ip_address);
        check(diags)
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let mut state = config;
        let location = resolve_location(diags, &client, &mut state).await?;

        let selector = Selector::from_config(
            diags,
            &state.id,
            "floating_ip_address",
            &state.floating_ip_address,
        )?;
        let floating_ip = match selector {
            Selector::Id(id) => client
                .get_floating_ip(&location, &id)
                .await
                .report(diags, "Failed to read floating IP")?,
            Selector::Name(address) => {
                let floating_ips = client
                    .list_floating_ips(&location)
                    .await
                    .report(diags, "Failed to list floating IPs")?;
                find_by_name(diags, "floating IP", &address, floating_ips, |f| {
                    f.floating_ip_address.as_deref().unwrap_or_default()
                })?
            }
        };
        state.apply(&floating_ip);
        Some(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ReservedFixedIpDataSourceState<'a> {
    /// Port of the reserved address
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub fixed_ip_address: ValueString<'a>,
    pub name: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub network_id: ValueString<'a>,
    pub is_vip: ValueBool,
    pub is_external: ValueBool,
    pub status: ValueString<'a>,
}

impl_location!(ReservedFixedIpDataSourceState);

impl<'a> WithSchema for ReservedFixedIpDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => computed_attribute(AttributeType::String, "Name of the port"),
            "subnet_id" => computed_attribute(AttributeType::String, "Subnet of the address"),
            "network_id" => computed_attribute(AttributeType::String, "Network of the address"),
            "is_vip" => computed_attribute(AttributeType::Bool, "Whether the address is a virtual IP"),
            "is_external" => computed_attribute(AttributeType::Bool, "Whether the address is public"),
            "status" => computed_attribute(AttributeType::String, "Status of the port"),
        };
        attributes.extend(selector_attributes("fixed_ip_address", "reserved fixed IP"));
        schema("EdgeCenter reserved fixed IP", attributes, Default::default())
    }
}

impl<'a> ReservedFixedIpDataSourceState<'a> {
    fn apply(&mut self, reserved: &ReservedFixedIp) {
        self.id = string(reserved.port_id.as_str());
        self.fixed_ip_address = opt_string(reserved.fixed_ip_address.clone());
        self.name = opt_string(reserved.name.clone());
        self.subnet_id = opt_string(reserved.subnet_id.clone());
        self.network_id = opt_string(reserved.network_id.clone());
        self.is_vip = Value::Value(reserved.is_vip);
        self.is_external = Value::Value(reserved.is_external);
        self.status = opt_string(reserved.status.clone());
    }
}

#[derive(Debug, Default, Clone)]
pub struct ReservedFixedIpDataSource {
    client: ClientHandle,
}

impl ReservedFixedIpDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ReservedFixedIpDataSource {
    type State<'a> = ReservedFixedIpDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ReservedFixedIpDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
        validate_selector(diags, &config.id, "fixed_ip_address", &config.fixed_ip_address);
        check(diags)
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let mut state = config;
        let location = resolve_location(diags, &client, &mut state).await?;

        let selector =
            Selector::from_config(diags, &state.id, "fixed_ip_address", &state.fixed_ip_address)?;
        let reserved = match selector {
            Selector::Id(port_id) => client
                .get_reserved_fixed_ip(&location, &port_id)
                .await
                .report(diags, "Failed to read reserved fixed IP")?,
            Selector::Name(address) => {
                let reserved = client
                    .list_reserved_fixed_ips(&location)
                    .await
                    .report(diags, "Failed to list reserved fixed IPs")?;
                find_by_name(diags, "reserved fixed IP", &address, reserved, |r| {
                    r.fixed_ip_address.as_deref().unwrap_or_default()
                })?
            }
        };
        state.apply(&reserved);
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_floating_ip_has_null_port() {
        let floating_ip: FloatingIp = serde_json::from_value(serde_json::json!({
            "id": "f1",
            "floating_ip_address": "203.0.113.10",
            "status": "DOWN",
            "metadata": [{"key": "env", "value": "prod"}]
        }))
        .unwrap();
        let mut state = FloatingIpDataSourceState::default();
        state.apply(&floating_ip);
        assert_eq!(state.floating_ip_address, string("203.0.113.10"));
        assert!(state.port_id.is_null());
        assert_eq!(state.metadata_map.unwrap().len(), 1);
    }

    #[test]
    fn reserved_fixed_ip_is_identified_by_port() {
        let reserved: ReservedFixedIp = serde_json::from_value(serde_json::json!({
            "port_id": "p1",
            "fixed_ip_address": "10.0.0.5",
            "network_id": "n1",
            "is_vip": true
        }))
        .unwrap();
        let mut state = ReservedFixedIpDataSourceState::default();
        state.apply(&reserved);
        assert_eq!(state.id, string("p1"));
        assert_eq!(state.is_vip, Value::Value(true));
        assert_eq!(state.is_external, Value::Value(false));
    }
}

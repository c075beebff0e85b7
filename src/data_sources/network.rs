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
use edgecenter_client::cloud::network::Network;
use edgecenter_client::cloud::router::Router;
use edgecenter_client::cloud::subnet::Subnet;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use super::{computed_attribute, computed_objects, selector_attributes};
use crate::attributes::{attribute, list_of, schema};
use crate::location::{impl_location, resolve_location, validate_location};
use crate::lookup::{find_by_name, validate_selector, Selector};
use crate::metadata::{apply_metadata, computed_metadata_attributes, MetadataMap, MetadataReadOnly};
use crate::provider::ClientHandle;
use crate::resources::host_route::{flatten_host_routes, HostRouteState};
use crate::utils::{check, known, opt_string, string, string_list, ReportError, WithSchema};

fn host_routes_attribute(description: &str) -> Attribute {
    computed_objects(
        map! {
            "destination" => computed_attribute(AttributeType::String, "CIDR of the destination"),
            "nexthop" => computed_attribute(AttributeType::String, "IP address of the next hop"),
        },
        description,
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NetworkDataSourceState<'a> {
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
    pub external: ValueBool,
    pub shared: ValueBool,
    pub segmentation_id: ValueNumber,
    pub subnets: ValueList<ValueString<'a>>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
}

impl_location!(NetworkDataSourceState);

impl<'a> WithSchema for NetworkDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "type" => computed_attribute(AttributeType::String, "Type of the network: `vlan` or `vxlan`"),
            "mtu" => computed_attribute(AttributeType::Number, "MTU of the network"),
            "external" => computed_attribute(AttributeType::Bool, "Whether the network is external"),
            "shared" => computed_attribute(AttributeType::Bool, "Whether the network is shared"),
            "segmentation_id" => computed_attribute(AttributeType::Number, "Segmentation ID of the network"),
            "subnets" => computed_attribute(list_of(AttributeType::String), "IDs of the subnets of the network"),
        };
        attributes.extend(selector_attributes("name", "network"));
        attributes.extend(computed_metadata_attributes());
        schema("EdgeCenter network", attributes, Default::default())
    }
}

impl<'a> NetworkDataSourceState<'a> {
    fn apply(&mut self, network: &Network) {
        self.id = string(network.id.as_str());
        self.name = string(network.name.as_str());
        self.network_type = opt_string(network.r#type.clone());
        self.mtu = network.mtu.into();
        self.external = Value::Value(network.external);
        self.shared = Value::Value(network.shared);
        self.segmentation_id = network.segmentation_id.into();
        self.subnets = string_list(network.subnets.clone());
        apply_metadata(&mut self.metadata_map, &mut self.metadata_read_only, &network.metadata);
    }
}

#[derive(Debug, Default, Clone)]
pub struct NetworkDataSource {
    client: ClientHandle,
}

impl NetworkDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for NetworkDataSource {
    type State<'a> = NetworkDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(NetworkDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
        validate_selector(diags, &config.id, "name", &config.name);
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

        let network = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_network(&location, &id)
                .await
                .report(diags, "Failed to read network")?,
            Selector::Name(name) => {
                let networks = client
                    .list_networks(&location)
                    .await
                    .report(diags, "Failed to list networks")?;
                find_by_name(diags, "network", &name, networks, |n| &n.name)?
            }
        };
        state.apply(&network);
        Some(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SubnetDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub network_id: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub enable_dhcp: ValueBool,
    pub gateway_ip: ValueString<'a>,
    pub dns_nameservers: ValueList<ValueString<'a>>,
    pub host_routes: ValueList<Value<HostRouteState<'a>>>,
    pub ip_version: ValueNumber,
    pub connect_to_network_router: ValueBool,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
}

impl_location!(SubnetDataSourceState);

impl<'a> WithSchema for SubnetDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "network_id" => attribute(
                AttributeType::String,
                OptionalComputed,
                "Network of the subnet, restricting the search by name",
            ),
            "cidr" => computed_attribute(AttributeType::String, "CIDR of the subnet"),
            "enable_dhcp" => computed_attribute(AttributeType::Bool, "Whether DHCP is enabled"),
            "gateway_ip" => computed_attribute(AttributeType::String, "Gateway IP, `disable` when there is none"),
            "dns_nameservers" => computed_attribute(list_of(AttributeType::String), "DNS servers of the subnet"),
            "host_routes" => host_routes_attribute("Static routes of the subnet"),
            "ip_version" => computed_attribute(AttributeType::Number, "IP version of the subnet"),
            "connect_to_network_router" => computed_attribute(AttributeType::Bool, "Whether the subnet is connected to the router of its network"),
        };
        attributes.extend(selector_attributes("name", "subnet"));
        attributes.extend(computed_metadata_attributes());
        schema("EdgeCenter subnet", attributes, Default::default())
    }
}

impl<'a> SubnetDataSourceState<'a> {
    fn apply(&mut self, subnet: &Subnet) {
        self.id = string(subnet.id.as_str());
        self.name = string(subnet.name.as_str());
        self.network_id = string(subnet.network_id.as_str());
        self.cidr = string(subnet.cidr.as_str());
        self.enable_dhcp = Value::Value(subnet.enable_dhcp);
        self.gateway_ip = string(subnet.gateway_ip.as_deref().unwrap_or("disable"));
        self.dns_nameservers = string_list(subnet.dns_nameservers.clone().unwrap_or_default());
        self.host_routes = Value::Value(flatten_host_routes(
            subnet.host_routes.as_deref().unwrap_or_default(),
        ));
        self.ip_version = subnet.ip_version.into();
        self.connect_to_network_router = subnet.connect_to_network_router.into();
        apply_metadata(&mut self.metadata_map, &mut self.metadata_read_only, &subnet.metadata);
    }
}

#[derive(Debug, Default, Clone)]
pub struct SubnetDataSource {
    client: ClientHandle,
}

impl SubnetDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SubnetDataSource {
    type State<'a> = SubnetDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SubnetDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
        validate_selector(diags, &config.id, "name", &config.name);
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

        let subnet = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_subnet(&location, &id)
                .await
                .report(diags, "Failed to read subnet")?,
            Selector::Name(name) => {
                let network_id = known(&state.network_id);
                let subnets = client
                    .list_subnets(&location, network_id.as_deref())
                    .await
                    .report(diags, "Failed to list subnets")?;
                find_by_name(diags, "subnet", &name, subnets, |s| &s.name)?
            }
        };
        state.apply(&subnet);
        Some(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct GatewayInfoState<'a> {
    #[serde(borrow = "'a")]
    #[serde(rename = "type")]
    pub gateway_type: ValueString<'a>,
    pub enable_snat: ValueBool,
    pub network_id: ValueString<'a>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RouterInterfaceState<'a> {
    #[serde(borrow = "'a")]
    pub port_id: ValueString<'a>,
    pub network_id: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub ip_address: ValueString<'a>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RouterDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub status: ValueString<'a>,
    pub external_gateway_info: ValueList<Value<GatewayInfoState<'a>>>,
    pub interfaces: ValueList<Value<RouterInterfaceState<'a>>>,
    pub routes: ValueList<Value<HostRouteState<'a>>>,
}

impl_location!(RouterDataSourceState);

impl<'a> WithSchema for RouterDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "status" => computed_attribute(AttributeType::String, "Status of the router"),
            "external_gateway_info" => computed_objects(
                map! {
                    "type" => computed_attribute(AttributeType::String, "`default` or `manual`"),
                    "enable_snat" => computed_attribute(AttributeType::Bool, "Whether SNAT is enabled"),
                    "network_id" => computed_attribute(AttributeType::String, "External network"),
                },
                "External gateway of the router",
            ),
            "interfaces" => computed_objects(
                map! {
                    "port_id" => computed_attribute(AttributeType::String, "Port of the interface"),
                    "network_id" => computed_attribute(AttributeType::String, "Network of the interface"),
                    "subnet_id" => computed_attribute(AttributeType::String, "Subnet of the interface"),
                    "ip_address" => computed_attribute(AttributeType::String, "IP address of the interface"),
                },
                "Subnets attached to the router",
            ),
            "routes" => host_routes_attribute("Static routes of the router"),
        };
        attributes.extend(selector_attributes("name", "router"));
        schema("EdgeCenter router", attributes, Default::default())
    }
}

impl<'a> RouterDataSourceState<'a> {
    fn apply(&mut self, router: &Router) {
        self.id = string(router.id.as_str());
        self.name = string(router.name.as_str());
        self.status = opt_string(router.status.clone());
        self.external_gateway_info = Value::Value(
            router
                .external_gateway_info
                .iter()
                .map(|gateway| {
                    Value::Value(GatewayInfoState {
                        gateway_type: opt_string(gateway.r#type.clone()),
                        enable_snat: Value::Value(gateway.enable_snat),
                        network_id: opt_string(gateway.network_id.clone()),
                    })
                })
                .collect(),
        );
        // One entry per IP assignment
        self.interfaces = Value::Value(
            router
                .interfaces
                .iter()
                .flat_map(|interface| {
                    interface.ip_assignments.iter().map(|assignment| {
                        Value::Value(RouterInterfaceState {
                            port_id: string(interface.port_id.as_str()),
                            network_id: opt_string(interface.network_id.clone()),
                            subnet_id: string(assignment.subnet_id.as_str()),
                            ip_address: string(assignment.ip_address.as_str()),
                        })
                    })
                })
                .collect(),
        );
        self.routes = Value::Value(flatten_host_routes(&router.routes));
    }
}

#[derive(Debug, Default, Clone)]
pub struct RouterDataSource {
    client: ClientHandle,
}

impl RouterDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for RouterDataSource {
    type State<'a> = RouterDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RouterDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
        validate_selector(diags, &config.id, "name", &config.name);
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

        let router = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_router(&location, &id)
                .await
                .report(diags, "Failed to read router")?,
            Selector::Name(name) => {
                let routers = client
                    .list_routers(&location)
                    .await
                    .report(diags, "Failed to list routers")?;
                find_by_name(diags, "router", &name, routers, |r| &r.name)?
            }
        };
        state.apply(&router);
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_interfaces_are_split_by_assignment() {
        let router: Router = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "name": "main",
            "external_gateway_info": {"type": "default", "enable_snat": true, "network_id": "ext"},
            "interfaces": [{
                "port_id": "port1",
                "network_id": "n1",
                "ip_assignments": [
                    {"subnet_id": "s1", "ip_address": "10.0.0.1"},
                    {"subnet_id": "s2", "ip_address": "10.0.1.1"}
                ]
            }]
        }))
        .unwrap();
        let mut state = RouterDataSourceState::default();
        state.apply(&router);
        let interfaces = state.interfaces.unwrap();
        assert_eq!(interfaces.len(), 2);
        assert_eq!(
            interfaces[1].as_ref_option().map(|i| i.subnet_id.clone()),
            Some(string("s2"))
        );
        assert_eq!(state.external_gateway_info.unwrap().len(), 1);
        assert_eq!(state.routes, Value::Value(vec![]));
    }

    #[test]
    fn subnet_without_gateway_is_disabled() {
        let subnet: Subnet = serde_json::from_value(serde_json::json!({
            "id": "s1",
            "name": "private",
            "cidr": "10.0.0.0/24",
            "network_id": "n1",
            "enable_dhcp": true
        }))
        .unwrap();
        let mut state = SubnetDataSourceState::default();
        state.apply(&subnet);
        assert_eq!(state.gateway_ip, string("disable"));
        assert_eq!(state.network_id, string("n1"));
        assert!(state.connect_to_network_router.is_null());
    }
}

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
use edgecenter_client::cloud::listener::Listener;
use edgecenter_client::cloud::loadbalancer::LoadBalancer;
use edgecenter_client::cloud::pool::Pool;
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
use crate::resources::{
    flatten_health_monitor, flatten_session_persistence, health_monitor_attributes,
    session_persistence_attributes, HealthMonitorState, SessionPersistenceState,
};
use crate::utils::{check, known, opt_string, string, string_list, ReportError, WithSchema};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoadBalancerDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub flavor: ValueString<'a>,
    pub vip_address: ValueString<'a>,
    pub vip_port_id: ValueString<'a>,
    pub vip_network_id: ValueString<'a>,
    pub vip_subnet_id: ValueString<'a>,
    pub provisioning_status: ValueString<'a>,
    pub operating_status: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
}

impl_location!(LoadBalancerDataSourceState);

impl<'a> WithSchema for LoadBalancerDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "flavor" => computed_attribute(AttributeType::String, "Flavor of the load balancer"),
            "vip_address" => computed_attribute(AttributeType::String, "Virtual IP address"),
            "vip_port_id" => computed_attribute(AttributeType::String, "Port of the virtual IP"),
            "vip_network_id" => computed_attribute(AttributeType::String, "Network of the virtual IP"),
            "vip_subnet_id" => computed_attribute(AttributeType::String, "Subnet of the virtual IP"),
            "provisioning_status" => computed_attribute(AttributeType::String, "Provisioning status"),
            "operating_status" => computed_attribute(AttributeType::String, "Operating status"),
        };
        attributes.extend(selector_attributes("name", "load balancer"));
        attributes.extend(computed_metadata_attributes());
        schema("EdgeCenter load balancer", attributes, Default::default())
    }
}

impl<'a> LoadBalancerDataSourceState<'a> {
    fn apply(&mut self, lb: &LoadBalancer) {
        self.id = string(lb.id.as_str());
        self.name = string(lb.name.as_str());
        self.flavor = opt_string(lb.flavor.as_ref().map(|flavor| flavor.flavor_name.clone()));
        self.vip_address = opt_string(lb.vip_address.clone());
        self.vip_port_id = opt_string(lb.vip_port_id.clone());
        self.vip_network_id = opt_string(lb.vip_network_id.clone());
        self.vip_subnet_id = opt_string(lb.vip_subnet_id.clone());
        self.provisioning_status = opt_string(lb.provisioning_status.clone());
        self.operating_status = opt_string(lb.operating_status.clone());
        apply_metadata(&mut self.metadata_map, &mut self.metadata_read_only, &lb.metadata);
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoadBalancerDataSource {
    client: ClientHandle,
}

impl LoadBalancerDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for LoadBalancerDataSource {
    type State<'a> = LoadBalancerDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(LoadBalancerDataSourceState::schema())
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

        let lb = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_load_balancer(&location, &id)
                .await
                .report(diags, "Failed to read load balancer")?,
            Selector::Name(name) => {
                let lbs = client
                    .list_load_balancers(&location)
                    .await
                    .report(diags, "Failed to list load balancers")?;
                find_by_name(diags, "load balancer", &name, lbs, |lb| &lb.name)?
            }
        };
        state.apply(&lb);
        Some(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ListenerDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub loadbalancer_id: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub protocol_port: ValueNumber,
    pub insert_x_forwarded: ValueBool,
    pub secret_id: ValueString<'a>,
    pub sni_secret_id: ValueList<ValueString<'a>>,
    pub allowed_cidrs: ValueList<ValueString<'a>>,
    pub pool_count: ValueNumber,
    pub provisioning_status: ValueString<'a>,
    pub operating_status: ValueString<'a>,
}

impl_location!(ListenerDataSourceState);

impl<'a> WithSchema for ListenerDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "loadbalancer_id" => attribute(
                AttributeType::String,
                OptionalComputed,
                "Load balancer of the listener, restricting the search by name",
            ),
            "protocol" => computed_attribute(AttributeType::String, "Protocol of the listener"),
            "protocol_port" => computed_attribute(AttributeType::Number, "Port of the listener"),
            "insert_x_forwarded" => computed_attribute(AttributeType::Bool, "Whether X-Forwarded headers are inserted"),
            "secret_id" => computed_attribute(AttributeType::String, "Secret holding the certificate"),
            "sni_secret_id" => computed_attribute(list_of(AttributeType::String), "Secrets used for SNI"),
            "allowed_cidrs" => computed_attribute(list_of(AttributeType::String), "CIDRs allowed to connect"),
            "pool_count" => computed_attribute(AttributeType::Number, "Number of pools of the listener"),
            "provisioning_status" => computed_attribute(AttributeType::String, "Provisioning status"),
            "operating_status" => computed_attribute(AttributeType::String, "Operating status"),
        };
        attributes.extend(selector_attributes("name", "listener"));
        schema("EdgeCenter load balancer listener", attributes, Default::default())
    }
}

impl<'a> ListenerDataSourceState<'a> {
    fn apply(&mut self, listener: &Listener) {
        self.id = string(listener.id.as_str());
        self.name = string(listener.name.as_str());
        if let Some(loadbalancer_id) = &listener.loadbalancer_id {
            self.loadbalancer_id = string(loadbalancer_id.as_str());
        }
        self.protocol = string(listener.protocol.as_str());
        self.protocol_port = Value::Value(listener.protocol_port);
        self.insert_x_forwarded = Value::Value(listener.insert_x_forwarded);
        self.secret_id = opt_string(listener.secret_id.clone());
        self.sni_secret_id = string_list(listener.sni_secret_id.clone());
        self.allowed_cidrs = match &listener.allowed_cidrs {
            Some(cidrs) => string_list(cidrs.clone()),
            None => Value::Null,
        };
        self.pool_count = Value::Value(listener.pool_count);
        self.provisioning_status = opt_string(listener.provisioning_status.clone());
        self.operating_status = opt_string(listener.operating_status.clone());
        if self.loadbalancer_id.is_unknown() {
            self.loadbalancer_id = Value::Null;
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ListenerDataSource {
    client: ClientHandle,
}

impl ListenerDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ListenerDataSource {
    type State<'a> = ListenerDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ListenerDataSourceState::schema())
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

        let listener = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_listener(&location, &id)
                .await
                .report(diags, "Failed to read listener")?,
            Selector::Name(name) => {
                let loadbalancer_id = known(&state.loadbalancer_id);
                let listeners = client
                    .list_listeners(&location, loadbalancer_id.as_deref())
                    .await
                    .report(diags, "Failed to list listeners")?;
                find_by_name(diags, "listener", &name, listeners, |l| &l.name)?
            }
        };
        state.apply(&listener);
        Some(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PoolMemberState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub address: ValueString<'a>,
    pub protocol_port: ValueNumber,
    pub weight: ValueNumber,
    pub subnet_id: ValueString<'a>,
    pub instance_id: ValueString<'a>,
    pub operating_status: ValueString<'a>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PoolDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub loadbalancer_id: ValueString<'a>,
    pub listener_id: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub lb_algorithm: ValueString<'a>,
    pub health_monitor: ValueList<Value<HealthMonitorState<'a>>>,
    pub session_persistence: ValueList<Value<SessionPersistenceState<'a>>>,
    pub members: ValueList<Value<PoolMemberState<'a>>>,
    pub provisioning_status: ValueString<'a>,
    pub operating_status: ValueString<'a>,
}

impl_location!(PoolDataSourceState);

impl<'a> WithSchema for PoolDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "loadbalancer_id" => attribute(
                AttributeType::String,
                OptionalComputed,
                "Load balancer of the pool, restricting the search by name",
            ),
            "listener_id" => attribute(
                AttributeType::String,
                OptionalComputed,
                "Listener of the pool, restricting the search by name",
            ),
            "protocol" => computed_attribute(AttributeType::String, "Protocol of the pool"),
            "lb_algorithm" => computed_attribute(AttributeType::String, "Balancing algorithm"),
            "health_monitor" => computed_objects(
                health_monitor_attributes(|_| Computed),
                "Health monitor of the pool",
            ),
            "session_persistence" => computed_objects(
                session_persistence_attributes(|_| Computed),
                "Session persistence of the pool",
            ),
            "members" => computed_objects(
                map! {
                    "id" => computed_attribute(AttributeType::String, "ID of the member"),
                    "address" => computed_attribute(AttributeType::String, "IP address of the member"),
                    "protocol_port" => computed_attribute(AttributeType::Number, "Port of the member"),
                    "weight" => computed_attribute(AttributeType::Number, "Weight of the member"),
                    "subnet_id" => computed_attribute(AttributeType::String, "Subnet of the member"),
                    "instance_id" => computed_attribute(AttributeType::String, "Server of the member"),
                    "operating_status" => computed_attribute(AttributeType::String, "Operating status of the member"),
                },
                "Members of the pool",
            ),
            "provisioning_status" => computed_attribute(AttributeType::String, "Provisioning status"),
            "operating_status" => computed_attribute(AttributeType::String, "Operating status"),
        };
        attributes.extend(selector_attributes("name", "pool"));
        schema("EdgeCenter load balancer pool", attributes, Default::default())
    }
}

impl<'a> PoolDataSourceState<'a> {
    fn apply(&mut self, pool: &Pool) {
        self.id = string(pool.id.as_str());
        self.name = string(pool.name.as_str());
        self.loadbalancer_id = opt_string(pool.loadbalancers.first().map(|lb| lb.id.clone()));
        self.listener_id = opt_string(pool.listeners.first().map(|listener| listener.id.clone()));
        self.protocol = string(pool.protocol.as_str());
        self.lb_algorithm = string(pool.lb_algorithm.as_str());
        self.health_monitor = Value::Value(
            pool.healthmonitor
                .iter()
                .map(|monitor| Value::Value(flatten_health_monitor(monitor)))
                .collect(),
        );
        self.session_persistence = Value::Value(
            pool.session_persistence
                .iter()
                .map(|persistence| Value::Value(flatten_session_persistence(persistence)))
                .collect(),
        );
        self.members = Value::Value(
            pool.members
                .iter()
                .map(|member| {
                    Value::Value(PoolMemberState {
                        id: string(member.id.as_str()),
                        address: string(member.address.as_str()),
                        protocol_port: Value::Value(member.protocol_port),
                        weight: Value::Value(member.weight),
                        subnet_id: opt_string(member.subnet_id.clone()),
                        instance_id: opt_string(member.instance_id.clone()),
                        operating_status: opt_string(member.operating_status.clone()),
                    })
                })
                .collect(),
        );
        self.provisioning_status = opt_string(pool.provisioning_status.clone());
        self.operating_status = opt_string(pool.operating_status.clone());
    }
}

#[derive(Debug, Default, Clone)]
pub struct PoolDataSource {
    client: ClientHandle,
}

impl PoolDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for PoolDataSource {
    type State<'a> = PoolDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(PoolDataSourceState::schema())
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

        let pool = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_pool(&location, &id)
                .await
                .report(diags, "Failed to read pool")?,
            Selector::Name(name) => {
                let loadbalancer_id = known(&state.loadbalancer_id);
                let listener_id = known(&state.listener_id);
                let pools = client
                    .list_pools(&location, loadbalancer_id.as_deref(), listener_id.as_deref())
                    .await
                    .report(diags, "Failed to list pools")?;
                find_by_name(diags, "pool", &name, pools, |p| &p.name)?
            }
        };
        state.apply(&pool);
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_nested_objects_are_lists() {
        let pool: Pool = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "web",
            "protocol": "HTTP",
            "lb_algorithm": "ROUND_ROBIN",
            "loadbalancers": [{"id": "lb1"}],
            "listeners": [],
            "healthmonitor": {"type": "PING", "delay": 10, "max_retries": 3, "timeout": 5},
            "members": [{"id": "m1", "address": "10.0.0.4", "protocol_port": 80, "weight": 1}]
        }))
        .unwrap();
        let mut state = PoolDataSourceState::default();
        state.apply(&pool);
        assert_eq!(state.loadbalancer_id, string("lb1"));
        assert!(state.listener_id.is_null());
        assert_eq!(state.health_monitor.unwrap().len(), 1);
        assert_eq!(state.session_persistence, Value::Value(vec![]));
        let members = state.members.unwrap();
        assert_eq!(
            members[0].as_ref_option().map(|m| m.protocol_port),
            Some(Value::Value(80))
        );
    }

    #[test]
    fn listener_without_cidrs_has_null_list() {
        let listener: Listener = serde_json::from_value(serde_json::json!({
            "id": "l1",
            "name": "http",
            "protocol": "HTTP",
            "protocol_port": 80,
            "loadbalancer_id": "lb1"
        }))
        .unwrap();
        let mut state = ListenerDataSourceState {
            loadbalancer_id: Value::Unknown,
            ..Default::default()
        };
        state.apply(&listener);
        assert_eq!(state.loadbalancer_id, string("lb1"));
        assert!(state.allowed_cidrs.is_null());
        assert_eq!(state.sni_secret_id, Value::Value(vec![]));
    }
}

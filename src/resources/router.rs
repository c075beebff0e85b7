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

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use edgecenter_client::cloud::router::{
    self, CreateRouter, ExternalGatewayInfo, InterfaceOpts, Router, UpdateRouter,
};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{
    Attribute, AttributeConstraint::*, AttributeType, NestedBlock, Schema,
};
use tf_provider::value::{self, Value, ValueBool, ValueEmpty, ValueNumber, ValueSet, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use super::host_route::{
    expand_host_routes, flatten_host_routes, host_routes_block, validate_host_routes, HostRoutes,
};
use crate::attributes::{attribute, block, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::provider::ClientHandle;
use crate::utils::{
    apply_list, check, computed, default_to, known, now, opt_string, report_deleted,
    requires_replace, string, ReportError, WithNormalize, WithSchema,
};
use crate::validate::{one_of, required_if};

const TIMEOUT: Duration = Duration::from_secs(1200);
const GATEWAY_TYPES: &[&str] = &["default", "manual"];
const INTERFACE_TYPES: &[&str] = &["subnet"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct GatewayState<'a> {
    #[serde(borrow = "'a")]
    #[serde(rename = "type")]
    pub gateway_type: ValueString<'a>,
    pub enable_snat: ValueBool,
    pub network_id: ValueString<'a>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct InterfaceState<'a> {
    #[serde(borrow = "'a")]
    #[serde(rename = "type")]
    pub interface_type: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub port_id: ValueString<'a>,
    pub ip_address: ValueString<'a>,
}

pub type Interfaces<'a> = ValueSet<Value<InterfaceState<'a>>>;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RouterState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub status: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub external_gateway_info: Value<GatewayState<'a>>,
    pub interfaces: Interfaces<'a>,
    pub routes: HostRoutes<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(RouterState);

impl<'a> WithSchema for RouterState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the router"),
            "status" => attribute(AttributeType::String, Computed, "Status of the router"),
        };
        attributes.extend(resource_attributes("ID of the router"));
        let blocks: HashMap<String, NestedBlock> = map! {
            "external_gateway_info" => NestedBlock::Optional(block(
                "External gateway of the router",
                map! {
                    "type" => attribute(
                        AttributeType::String,
                        OptionalComputed,
                        "Type of the gateway: `default` (default) or `manual`",
                    ),
                    "enable_snat" => attribute(AttributeType::Bool, OptionalComputed, "Enable source NAT"),
                    "network_id" => attribute(
                        AttributeType::String,
                        OptionalComputed,
                        "ID of the external network, required for a `manual` gateway",
                    ),
                },
            )),
            "interfaces" => NestedBlock::Set(block(
                "Subnets attached to the router",
                map! {
                    "type" => attribute(AttributeType::String, Required, "Type of the interface: `subnet`"),
                    "subnet_id" => attribute(AttributeType::String, Required, "ID of the attached subnet"),
                    "port_id" => attribute(AttributeType::String, Computed, "ID of the port of the interface"),
                    "ip_address" => attribute(AttributeType::String, Computed, "IP address of the interface"),
                },
            )),
            "routes" => host_routes_block("Static routes of the router"),
        };
        schema("EdgeCenter router", attributes, blocks)
    }
}

impl<'a> WithNormalize for RouterState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        computed(&mut self.status);
        if let Value::Value(gateway) = &mut self.external_gateway_info {
            default_to(&mut gateway.gateway_type, "default".into());
            computed(&mut gateway.enable_snat);
            computed(&mut gateway.network_id);
        }
    }
}

impl<'a> RouterState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        if let Value::Value(gateway) = &self.external_gateway_info {
            let path = AttributePath::new("external_gateway_info").index(0);
            one_of(diags, path.clone().attribute("type"), &gateway.gateway_type, GATEWAY_TYPES);
            required_if(
                diags,
                path.attribute("network_id"),
                &gateway.network_id,
                gateway.gateway_type.as_deref_option() == Some("manual"),
                "a manual gateway",
            );
        }
        for interface in self.interfaces.iter().flatten() {
            if let Value::Value(interface) = interface {
                one_of(
                    diags,
                    AttributePath::new("interfaces"),
                    &interface.interface_type,
                    INTERFACE_TYPES,
                );
            }
        }
        validate_host_routes(diags, "routes", &self.routes);
    }

    /// Known subnet IDs of the interfaces
    fn subnet_ids(&self) -> BTreeSet<String> {
        self.interfaces
            .iter()
            .flatten()
            .filter_map(|interface| interface.as_ref_option())
            .filter_map(|interface| known(&interface.subnet_id))
            .collect()
    }

    /// Keep the computed values of the interfaces that stay attached
    fn plan_interfaces(&mut self, prior: &RouterState<'a>) {
        let Value::Value(interfaces) = &self.interfaces else {
            return;
        };
        let planned = interfaces
            .iter()
            .map(|interface| {
                let Value::Value(interface) = interface else {
                    return interface.clone();
                };
                let previous = prior
                    .interfaces
                    .iter()
                    .flatten()
                    .filter_map(|previous| previous.as_ref_option())
                    .find(|previous| previous.subnet_id == interface.subnet_id);
                let mut interface = interface.clone();
                match previous {
                    Some(previous) => {
                        interface.port_id = previous.port_id.clone();
                        interface.ip_address = previous.ip_address.clone();
                    }
                    None => {
                        interface.port_id = Value::Unknown;
                        interface.ip_address = Value::Unknown;
                    }
                }
                Value::Value(interface)
            })
            .collect();
        self.interfaces = Value::Value(planned);
    }

    fn gateway(&self) -> Option<ExternalGatewayInfo> {
        let gateway = self.external_gateway_info.as_ref_option()?;
        Some(ExternalGatewayInfo {
            r#type: known(&gateway.gateway_type),
            enable_snat: gateway.enable_snat.unwrap_or(true),
            network_id: known(&gateway.network_id),
        })
    }

    fn apply(&mut self, router: &Router) {
        self.id = string(router.id.as_str());
        self.name = string(router.name.as_str());
        self.status = opt_string(router.status.clone());
        if let (Value::Value(gateway), Some(remote)) =
            (&mut self.external_gateway_info, &router.external_gateway_info)
        {
            if let Some(gateway_type) = &remote.r#type {
                gateway.gateway_type = string(gateway_type.as_str());
            }
            gateway.enable_snat = Value::Value(remote.enable_snat);
            gateway.network_id = opt_string(remote.network_id.clone());
        }

        let interfaces = router
            .interfaces
            .iter()
            .flat_map(|interface| {
                interface.ip_assignments.iter().map(|assignment| {
                    Value::Value(InterfaceState {
                        interface_type: string("subnet"),
                        subnet_id: string(assignment.subnet_id.as_str()),
                        port_id: string(interface.port_id.as_str()),
                        ip_address: string(assignment.ip_address.as_str()),
                    })
                })
            })
            .collect::<BTreeSet<_>>();
        if !(interfaces.is_empty() && self.interfaces.is_null()) {
            self.interfaces = Value::Value(interfaces);
        }
        apply_list(&mut self.routes, flatten_host_routes(&router.routes));
    }
}

#[derive(Debug, Default, Clone)]
pub struct RouterResource {
    client: ClientHandle,
}

impl RouterResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for RouterResource {
    type State<'a> = RouterState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RouterState::schema())
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

        let Some(router) = client
            .get_router(&location, &state.id)
            .await
            .report_found(diags, "Failed to read router")?
        else {
            warn!(id = %state.id, "Router does not exist anymore");
            return None;
        };
        state.apply(&router);
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
        state.plan_interfaces(&Default::default());
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
        state.plan_interfaces(&prior_state);

        let trigger_replace = requires_replace!(
            prior_state,
            state,
            [project_id, project_name, region_id, region_name]
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

        let opts = CreateRouter {
            name: state.name.to_string(),
            external_gateway_info: state.gateway(),
            interfaces: state
                .subnet_ids()
                .into_iter()
                .map(|subnet_id| InterfaceOpts {
                    r#type: "subnet".to_owned(),
                    subnet_id,
                })
                .collect(),
            routes: expand_host_routes(&state.routes),
        };
        info!(name = %opts.name, "Creating router");
        let tasks = client
            .create_router(&location, &opts)
            .await
            .report(diags, "Failed to create router")?;
        let id = client
            .wait_for_created(&tasks, router::KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create router")?;
        let router = client
            .get_router(&location, &id)
            .await
            .report(diags, "Failed to read created router")?;

        state.apply(&router);
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

        if state.name != prior_state.name
            || state.external_gateway_info != prior_state.external_gateway_info
            || state.routes != prior_state.routes
        {
            info!(%id, "Updating router");
            client
                .update_router(
                    &location,
                    &id,
                    &UpdateRouter {
                        name: state.name.to_string(),
                        external_gateway_info: state.gateway(),
                        routes: expand_host_routes(&state.routes),
                    },
                )
                .await
                .report(diags, "Failed to update router")?;
        }

        let prior_subnets = prior_state.subnet_ids();
        let subnets = state.subnet_ids();
        for subnet_id in prior_subnets.difference(&subnets) {
            info!(%id, %subnet_id, "Detaching subnet from router");
            client
                .detach_router_subnet(&location, &id, subnet_id)
                .await
                .report(diags, "Failed to detach subnet from router")?;
        }
        for subnet_id in subnets.difference(&prior_subnets) {
            info!(%id, %subnet_id, "Attaching subnet to router");
            client
                .attach_router_subnet(&location, &id, subnet_id)
                .await
                .report(diags, "Failed to attach subnet to router")?;
        }

        let router = client
            .get_router(&location, &id)
            .await
            .report(diags, "Failed to read router")?;
        state.apply(&router);
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

        info!(id = %state.id, "Deleting router");
        let result = client.delete_router(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete router")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete router")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = RouterState {
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

    fn interface<'a>(subnet_id: &'a str) -> Value<InterfaceState<'a>> {
        Value::Value(InterfaceState {
            interface_type: "subnet".into(),
            subnet_id: subnet_id.into(),
            ..Default::default()
        })
    }

    #[test]
    fn manual_gateway_requires_network() {
        let mut diags = Diagnostics::default();
        let state = RouterState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            external_gateway_info: Value::Value(GatewayState {
                gateway_type: "manual".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        state.validate(&mut diags);
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(
            diags.errors[0].attribute,
            AttributePath::new("external_gateway_info")
                .index(0)
                .attribute("network_id")
        );
    }

    #[test]
    fn kept_interfaces_keep_their_port() {
        let prior = RouterState {
            interfaces: Value::Value(
                [Value::Value(InterfaceState {
                    interface_type: "subnet".into(),
                    subnet_id: "s1".into(),
                    port_id: "p1".into(),
                    ip_address: "10.0.0.1".into(),
                })]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        };
        let mut state = RouterState {
            interfaces: Value::Value([interface("s1"), interface("s2")].into_iter().collect()),
            ..Default::default()
        };
        state.plan_interfaces(&prior);

        let interfaces = state.interfaces.clone().unwrap();
        let planned = interfaces
            .iter()
            .filter_map(|interface| interface.as_ref_option())
            .map(|interface| (interface.subnet_id.to_string(), interface.port_id.clone()))
            .collect::<Vec<_>>();
        assert!(planned.contains(&("s1".to_owned(), string("p1"))));
        assert!(planned.contains(&("s2".to_owned(), Value::Unknown)));
        assert_eq!(
            state.subnet_ids(),
            ["s1".to_owned(), "s2".to_owned()].into_iter().collect()
        );
    }

    #[test]
    fn remote_interfaces_are_flattened() {
        let router: Router = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "name": "router",
            "status": "ACTIVE",
            "interfaces": [{
                "port_id": "p1",
                "network_id": "n1",
                "ip_assignments": [{"subnet_id": "s1", "ip_address": "10.0.0.1"}]
            }]
        }))
        .unwrap();
        let mut state = RouterState::default();
        state.apply(&router);
        assert_eq!(state.status, string("ACTIVE"));
        assert_eq!(state.interfaces.unwrap().len(), 1);
        assert!(state.routes.is_null());
        assert!(state.external_gateway_info.is_null());
    }
}

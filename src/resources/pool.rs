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
use edgecenter_client::cloud::pool::{
    CreatePool, HealthMonitor, Pool, SessionPersistence, UpdatePool, CREATED_KIND,
};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeConstraint::*, AttributeType, NestedBlock, Schema,
};
use tf_provider::value::{self, Value, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use super::loadbalancer::TIMEOUT;
use crate::attributes::{attribute, block, resource_attributes, schema};
use crate::import::parse_import_id;
use crate::location::{
    impl_location, known_location, plan_location, resolve_location, validate_location, WithLocation,
};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, known, now, opt_string, report_deleted, requires_replace, string, ReportError,
    WithNormalize, WithSchema,
};
use crate::validate::{conflicts_if, in_range, one_of, required_if};

const LB_ALGORITHMS: &[&str] = &["ROUND_ROBIN", "LEAST_CONNECTIONS", "SOURCE_IP"];
const PROTOCOLS: &[&str] = &["HTTP", "HTTPS", "TCP", "UDP", "PROXY"];
const MONITOR_TYPES: &[&str] = &["HTTP", "HTTPS", "PING", "TCP", "TLS-HELLO", "UDP-CONNECT"];
const HTTP_METHODS: &[&str] = &["CONNECT", "DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT", "TRACE"];
const PERSISTENCE_TYPES: &[&str] = &["APP_COOKIE", "HTTP_COOKIE", "SOURCE_IP"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct HealthMonitorState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    #[serde(rename = "type")]
    pub monitor_type: ValueString<'a>,
    pub delay: ValueNumber,
    pub max_retries: ValueNumber,
    pub timeout: ValueNumber,
    pub max_retries_down: ValueNumber,
    pub http_method: ValueString<'a>,
    pub url_path: ValueString<'a>,
    pub expected_codes: ValueString<'a>,
}

impl<'a> HealthMonitorState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        let path = AttributePath::new("health_monitor").index(0);
        one_of(diags, path.clone().attribute("type"), &self.monitor_type, MONITOR_TYPES);
        in_range(diags, path.clone().attribute("delay"), &self.delay, 1, 86400);
        in_range(diags, path.clone().attribute("timeout"), &self.timeout, 1, 86400);
        in_range(diags, path.clone().attribute("max_retries"), &self.max_retries, 1, 10);
        in_range(diags, path.clone().attribute("max_retries_down"), &self.max_retries_down, 1, 10);
        if let (Value::Value(delay), Value::Value(timeout)) = (self.delay, self.timeout) {
            if timeout > delay {
                diags.error(
                    "Invalid health monitor timeout",
                    format!("timeout ({timeout}) must not be greater than delay ({delay})"),
                    path.clone().attribute("timeout"),
                );
            }
        }

        let http = matches!(self.monitor_type.as_deref_option(), Some("HTTP" | "HTTPS"));
        let not_http = self.monitor_type.is_value() && !http;
        let reason = "for a health monitor other than HTTP and HTTPS";
        one_of(diags, path.clone().attribute("http_method"), &self.http_method, HTTP_METHODS);
        conflicts_if(diags, path.clone().attribute("http_method"), &self.http_method, not_http, reason);
        conflicts_if(diags, path.clone().attribute("url_path"), &self.url_path, not_http, reason);
        conflicts_if(diags, path.attribute("expected_codes"), &self.expected_codes, not_http, reason);
    }

    fn normalize(&mut self) {
        computed(&mut self.id);
        computed(&mut self.max_retries_down);
        if matches!(self.monitor_type.as_deref_option(), Some("HTTP" | "HTTPS")) {
            computed(&mut self.http_method);
            computed(&mut self.url_path);
            computed(&mut self.expected_codes);
        }
    }
}

pub(crate) fn expand_health_monitor(monitor: &HealthMonitorState<'_>) -> HealthMonitor {
    HealthMonitor {
        id: None,
        r#type: monitor.monitor_type.to_string(),
        delay: monitor.delay.unwrap_or_default(),
        max_retries: monitor.max_retries.unwrap_or_default(),
        timeout: monitor.timeout.unwrap_or_default(),
        max_retries_down: monitor.max_retries_down.as_option(),
        http_method: known(&monitor.http_method),
        url_path: known(&monitor.url_path),
        expected_codes: known(&monitor.expected_codes),
    }
}

pub(crate) fn flatten_health_monitor<'a>(monitor: &HealthMonitor) -> HealthMonitorState<'a> {
    HealthMonitorState {
        id: opt_string(monitor.id.clone()),
        monitor_type: string(monitor.r#type.as_str()),
        delay: Value::Value(monitor.delay),
        max_retries: Value::Value(monitor.max_retries),
        timeout: Value::Value(monitor.timeout),
        max_retries_down: monitor.max_retries_down.into(),
        http_method: opt_string(monitor.http_method.clone()),
        url_path: opt_string(monitor.url_path.clone()),
        expected_codes: opt_string(monitor.expected_codes.clone()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionPersistenceState<'a> {
    #[serde(borrow = "'a")]
    #[serde(rename = "type")]
    pub persistence_type: ValueString<'a>,
    pub cookie_name: ValueString<'a>,
    pub persistence_granularity: ValueString<'a>,
    pub persistence_timeout: ValueNumber,
}

impl<'a> SessionPersistenceState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        let path = AttributePath::new("session_persistence").index(0);
        one_of(diags, path.clone().attribute("type"), &self.persistence_type, PERSISTENCE_TYPES);
        let app_cookie = self.persistence_type.as_deref_option() == Some("APP_COOKIE");
        required_if(
            diags,
            path.clone().attribute("cookie_name"),
            &self.cookie_name,
            app_cookie,
            "for an APP_COOKIE session persistence",
        );
        conflicts_if(
            diags,
            path.attribute("cookie_name"),
            &self.cookie_name,
            self.persistence_type.is_value() && !app_cookie,
            "for a session persistence other than APP_COOKIE",
        );
    }
}

pub(crate) fn expand_session_persistence(persistence: &SessionPersistenceState<'_>) -> SessionPersistence {
    SessionPersistence {
        r#type: persistence.persistence_type.to_string(),
        cookie_name: known(&persistence.cookie_name),
        persistence_granularity: known(&persistence.persistence_granularity),
        persistence_timeout: persistence.persistence_timeout.as_option(),
    }
}

pub(crate) fn flatten_session_persistence<'a>(persistence: &SessionPersistence) -> SessionPersistenceState<'a> {
    SessionPersistenceState {
        persistence_type: string(persistence.r#type.as_str()),
        cookie_name: opt_string(persistence.cookie_name.clone()),
        persistence_granularity: opt_string(persistence.persistence_granularity.clone()),
        persistence_timeout: persistence.persistence_timeout.into(),
    }
}

/// Attributes of a health monitor, `constraint` telling whether each one is required
pub(crate) fn health_monitor_attributes(constraint: fn(bool) -> AttributeConstraint) -> HashMap<String, Attribute> {
    map! {
        "id" => attribute(AttributeType::String, Computed, "ID of the health monitor"),
        "type" => attribute(
            AttributeType::String,
            constraint(true),
            "Type: `HTTP`, `HTTPS`, `PING`, `TCP`, `TLS-HELLO` or `UDP-CONNECT`",
        ),
        "delay" => attribute(AttributeType::Number, constraint(true), "Seconds between probes"),
        "max_retries" => attribute(AttributeType::Number, constraint(true), "Successful probes to mark a member up"),
        "timeout" => attribute(AttributeType::Number, constraint(true), "Seconds before a probe fails"),
        "max_retries_down" => attribute(AttributeType::Number, constraint(false), "Failed probes to mark a member down"),
        "http_method" => attribute(AttributeType::String, constraint(false), "HTTP method of the probes"),
        "url_path" => attribute(AttributeType::String, constraint(false), "URL path of the probes"),
        "expected_codes" => attribute(AttributeType::String, constraint(false), "Expected HTTP status codes"),
    }
}

/// Attributes of a session persistence, `constraint` telling whether each one is required
pub(crate) fn session_persistence_attributes(constraint: fn(bool) -> AttributeConstraint) -> HashMap<String, Attribute> {
    map! {
        "type" => attribute(
            AttributeType::String,
            constraint(true),
            "Type: `APP_COOKIE`, `HTTP_COOKIE` or `SOURCE_IP`",
        ),
        "cookie_name" => attribute(AttributeType::String, constraint(false), "Cookie name, for `APP_COOKIE`"),
        "persistence_granularity" => attribute(AttributeType::String, constraint(false), "Subnet mask of SOURCE_IP persistence"),
        "persistence_timeout" => attribute(AttributeType::Number, constraint(false), "Timeout of the persistence"),
    }
}

fn resource_constraint(required: bool) -> AttributeConstraint {
    if required {
        Required
    } else {
        OptionalComputed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PoolState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub lb_algorithm: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub loadbalancer_id: ValueString<'a>,
    pub listener_id: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub health_monitor: Value<HealthMonitorState<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub session_persistence: Value<SessionPersistenceState<'a>>,
    pub provisioning_status: ValueString<'a>,
    pub operating_status: ValueString<'a>,
    pub last_updated: ValueString<'a>,
}

impl_location!(PoolState);

impl<'a> WithSchema for PoolState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "name" => attribute(AttributeType::String, Required, "Name of the pool"),
            "lb_algorithm" => attribute(
                AttributeType::String,
                Required,
                "Balancing algorithm: `ROUND_ROBIN`, `LEAST_CONNECTIONS` or `SOURCE_IP`",
            ),
            "protocol" => attribute(
                AttributeType::String,
                Required,
                "Protocol: `HTTP`, `HTTPS`, `TCP`, `UDP` or `PROXY`",
            ),
            "loadbalancer_id" => attribute(AttributeType::String, Optional, "ID of the load balancer"),
            "listener_id" => attribute(AttributeType::String, Optional, "ID of the listener"),
            "provisioning_status" => attribute(AttributeType::String, Computed, "Provisioning status"),
            "operating_status" => attribute(AttributeType::String, Computed, "Operating status"),
        };
        attributes.extend(resource_attributes("ID of the pool"));
        schema(
            "EdgeCenter load balancer pool",
            attributes,
            map! {
                "health_monitor" => NestedBlock::Optional(block(
                    "Health monitor of the pool members",
                    health_monitor_attributes(resource_constraint),
                )),
                "session_persistence" => NestedBlock::Optional(block(
                    "Session persistence of the pool",
                    session_persistence_attributes(resource_constraint),
                )),
            },
        )
    }
}

impl<'a> WithNormalize for PoolState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if let Value::Value(monitor) = &mut self.health_monitor {
            monitor.normalize();
        }
        if let Value::Value(persistence) = &mut self.session_persistence {
            computed(&mut persistence.persistence_granularity);
            computed(&mut persistence.persistence_timeout);
        }
        computed(&mut self.provisioning_status);
        computed(&mut self.operating_status);
    }
}

impl<'a> PoolState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_location(diags, self);
        one_of(diags, AttributePath::new("lb_algorithm"), &self.lb_algorithm, LB_ALGORITHMS);
        one_of(diags, AttributePath::new("protocol"), &self.protocol, PROTOCOLS);
        if self.loadbalancer_id.is_null() && self.listener_id.is_null() {
            diags.error(
                "Missing parent",
                "At least one of `loadbalancer_id` or `listener_id` must be set",
                AttributePath::new("loadbalancer_id"),
            );
        }
        if let Value::Value(monitor) = &self.health_monitor {
            monitor.validate(diags);
        }
        if let Value::Value(persistence) = &self.session_persistence {
            persistence.validate(diags);
        }
    }

    fn apply(&mut self, pool: &Pool) {
        self.id = string(pool.id.as_str());
        self.name = string(pool.name.as_str());
        self.lb_algorithm = string(pool.lb_algorithm.as_str());
        self.protocol = string(pool.protocol.as_str());
        let loadbalancer_id = opt_string(pool.loadbalancers.first().map(|lb| lb.id.clone()));
        let listener_id = opt_string(pool.listeners.first().map(|l| l.id.clone()));
        if self.loadbalancer_id.is_unknown() && self.listener_id.is_unknown() {
            // Imported: track a single parent, the listener when attached to one
            if listener_id.is_value() {
                self.listener_id = listener_id;
                self.loadbalancer_id = Value::Null;
            } else {
                self.listener_id = Value::Null;
                self.loadbalancer_id = loadbalancer_id;
            }
        } else {
            if !self.loadbalancer_id.is_null() {
                self.loadbalancer_id = loadbalancer_id;
            }
            if !self.listener_id.is_null() {
                self.listener_id = listener_id;
            }
        }
        self.health_monitor = pool.healthmonitor.as_ref().map(flatten_health_monitor).into();
        self.session_persistence = pool
            .session_persistence
            .as_ref()
            .map(flatten_session_persistence)
            .into();
        self.provisioning_status = opt_string(pool.provisioning_status.clone());
        self.operating_status = opt_string(pool.operating_status.clone());
    }

    fn update_opts(&self) -> UpdatePool {
        UpdatePool {
            name: self.name.to_string(),
            lb_algorithm: self.lb_algorithm.to_string(),
            healthmonitor: self.health_monitor.as_ref_option().map(expand_health_monitor),
            session_persistence: self
                .session_persistence
                .as_ref_option()
                .map(expand_session_persistence),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PoolResource {
    client: ClientHandle,
}

impl PoolResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for PoolResource {
    type State<'a> = PoolState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(PoolState::schema())
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

        let Some(pool) = client
            .get_pool(&location, &state.id)
            .await
            .report_found(diags, "Failed to read pool")?
        else {
            warn!(id = %state.id, "Pool does not exist anymore");
            return None;
        };
        state.apply(&pool);
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
                protocol,
                loadbalancer_id,
                listener_id
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

        let opts = CreatePool {
            name: state.name.to_string(),
            protocol: state.protocol.to_string(),
            lb_algorithm: state.lb_algorithm.to_string(),
            loadbalancer_id: known(&state.loadbalancer_id),
            listener_id: known(&state.listener_id),
            healthmonitor: state.health_monitor.as_ref_option().map(expand_health_monitor),
            session_persistence: state
                .session_persistence
                .as_ref_option()
                .map(expand_session_persistence),
        };
        info!(name = %opts.name, protocol = %opts.protocol, "Creating pool");
        let tasks = client
            .create_pool(&location, &opts)
            .await
            .report(diags, "Failed to create pool")?;
        let id = client
            .wait_for_created(&tasks, CREATED_KIND, TIMEOUT)
            .await
            .report(diags, "Failed to create pool")?;
        let pool = client
            .get_pool(&location, &id)
            .await
            .report(diags, "Failed to read created pool")?;

        state.apply(&pool);
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

        if prior_state.health_monitor.is_value() && state.health_monitor.is_null() {
            info!(%id, "Deleting health monitor of pool");
            let result = client.delete_health_monitor(&location, &id).await;
            report_deleted(result, diags, "Failed to delete health monitor")?;
        }

        info!(%id, "Updating pool");
        let tasks = client
            .update_pool(&location, &id, &state.update_opts())
            .await
            .report(diags, "Failed to update pool")?;
        client
            .wait_for_tasks(&tasks, TIMEOUT)
            .await
            .report(diags, "Failed to update pool")?;

        let pool = client
            .get_pool(&location, &id)
            .await
            .report(diags, "Failed to read pool")?;
        state.apply(&pool);
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

        info!(id = %state.id, "Deleting pool");
        let result = client.delete_pool(&location, &state.id).await;
        if let Some(tasks) = report_deleted(result, diags, "Failed to delete pool")? {
            client
                .wait_for_tasks(&tasks, TIMEOUT)
                .await
                .report(diags, "Failed to delete pool")?;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let import = parse_import_id(diags, &id, false)?;
        let mut state = PoolState {
            id: string(import.id),
            // Parents are read back from the pool
            loadbalancer_id: Value::Unknown,
            listener_id: Value::Unknown,
            ..Default::default()
        };
        state.set_location(&import.location);
        Some((state, Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_monitor<'a>() -> HealthMonitorState<'a> {
        HealthMonitorState {
            monitor_type: "HTTP".into(),
            delay: Value::Value(10),
            max_retries: Value::Value(3),
            timeout: Value::Value(5),
            url_path: "/health".into(),
            ..Default::default()
        }
    }

    fn pool<'a>() -> PoolState<'a> {
        PoolState {
            project_id: Value::Value(1),
            region_id: Value::Value(1),
            lb_algorithm: "ROUND_ROBIN".into(),
            protocol: "HTTP".into(),
            listener_id: "l1".into(),
            ..Default::default()
        }
    }

    fn errors(state: &PoolState) -> Vec<AttributePath> {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags);
        diags.errors.into_iter().map(|diag| diag.attribute).collect()
    }

    #[test]
    fn pool_needs_a_parent() {
        assert!(errors(&pool()).is_empty());
        assert_eq!(
            errors(&PoolState {
                listener_id: Value::Null,
                ..pool()
            }),
            vec![AttributePath::new("loadbalancer_id")]
        );
    }

    #[test]
    fn http_fields_only_for_http_monitors() {
        let monitor = HealthMonitorState {
            monitor_type: "TCP".into(),
            ..http_monitor()
        };
        assert_eq!(
            errors(&PoolState {
                health_monitor: Value::Value(monitor),
                ..pool()
            }),
            vec![AttributePath::new("health_monitor")
                .index(0)
                .attribute("url_path")]
        );

        let monitor = HealthMonitorState {
            timeout: Value::Value(20),
            ..http_monitor()
        };
        assert_eq!(
            errors(&PoolState {
                health_monitor: Value::Value(monitor),
                ..pool()
            }),
            vec![AttributePath::new("health_monitor")
                .index(0)
                .attribute("timeout")]
        );
    }

    #[test]
    fn app_cookie_needs_a_name() {
        let persistence = SessionPersistenceState {
            persistence_type: "APP_COOKIE".into(),
            ..Default::default()
        };
        assert_eq!(
            errors(&PoolState {
                session_persistence: Value::Value(persistence),
                ..pool()
            }),
            vec![AttributePath::new("session_persistence")
                .index(0)
                .attribute("cookie_name")]
        );
    }

    #[test]
    fn health_monitor_conversion() {
        let mut monitor = http_monitor();
        monitor.normalize();
        assert!(monitor.id.is_unknown());
        assert!(monitor.http_method.is_unknown());

        let expanded = expand_health_monitor(&monitor);
        assert_eq!(expanded.r#type, "HTTP");
        assert_eq!(expanded.url_path.as_deref(), Some("/health"));
        assert_eq!(expanded.http_method, None);
        assert_eq!(expanded.max_retries_down, None);

        let json = serde_json::to_value(&expanded).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("http_method").is_none());

        let flattened = flatten_health_monitor(&HealthMonitor {
            id: Some("hm1".to_owned()),
            http_method: Some("GET".to_owned()),
            ..expanded
        });
        assert_eq!(flattened.id, string("hm1"));
        assert_eq!(flattened.http_method, string("GET"));
        assert_eq!(flattened.delay, Value::Value(10));
    }

    #[test]
    fn removed_blocks_are_sent_as_null() {
        let json = serde_json::to_value(pool().update_opts()).unwrap();
        assert!(json["healthmonitor"].is_null());
        assert!(json["session_persistence"].is_null());
        assert_eq!(json["lb_algorithm"], "ROUND_ROBIN");
    }

    #[test]
    fn imported_pool_tracks_one_parent() {
        let remote: Pool = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "web",
            "protocol": "HTTP",
            "lb_algorithm": "ROUND_ROBIN",
            "loadbalancers": [{"id": "lb1"}],
            "listeners": [{"id": "l1"}]
        }))
        .unwrap();
        let mut state = PoolState {
            loadbalancer_id: Value::Unknown,
            listener_id: Value::Unknown,
            ..Default::default()
        };
        state.apply(&remote);
        assert_eq!(state.listener_id, string("l1"));
        assert!(state.loadbalancer_id.is_null());

        let detached = Pool {
            listeners: Vec::new(),
            ..remote.clone()
        };
        let mut state = PoolState {
            loadbalancer_id: Value::Unknown,
            listener_id: Value::Unknown,
            ..Default::default()
        };
        state.apply(&detached);
        assert_eq!(state.loadbalancer_id, string("lb1"));
        assert!(state.listener_id.is_null());

        // Configured parents are kept as they are
        let mut state = pool();
        state.apply(&remote);
        assert_eq!(state.listener_id, string("l1"));
        assert!(state.loadbalancer_id.is_null());
    }
}

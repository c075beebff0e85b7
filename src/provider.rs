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
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use edgecenter_client::{Client, ClientConfig, Credentials, DEFAULT_CLOUD_API, DEFAULT_PLATFORM_API};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Block, Description, Schema};
use tf_provider::value::{ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, DynamicDataSource, DynamicResource, Provider};
use tracing::info;

use crate::data_sources::*;
use crate::resources::*;
use crate::utils::{check, known_non_empty, ReportError};

/// Shared slot for the API client, filled when the provider is configured
#[derive(Debug, Clone, Default)]
pub struct ClientHandle(Arc<RwLock<Option<Client>>>);

impl ClientHandle {
    pub fn get(&self, diags: &mut Diagnostics) -> Option<Client> {
        let client = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if client.is_none() {
            diags.root_error(
                "Provider is not configured",
                "The EdgeCenter provider must be configured before its resources are used",
            );
        }
        client
    }

    pub fn set(&self, client: Client) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(client);
    }
}

impl From<Client> for ClientHandle {
    fn from(client: Client) -> Self {
        Self(Arc::new(RwLock::new(Some(client))))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub permanent_api_token: ValueString<'a>,
    pub user_name: ValueString<'a>,
    pub password: ValueString<'a>,
    pub edgecenter_platform_api: ValueString<'a>,
    pub edgecenter_cloud_api: ValueString<'a>,
    pub poll_interval: ValueNumber,
}

impl<'a> ProviderConfig<'a> {
    /// Build the client configuration, falling back to `env` for unset attributes
    pub fn client_config<F>(&self, diags: &mut Diagnostics, env: F) -> Option<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |value: &ValueString<'_>, var: &str| {
            known_non_empty(value).or_else(|| env(var).filter(|v| !v.is_empty()))
        };

        let token = lookup(&self.permanent_api_token, "EC_PERMANENT_TOKEN");
        let user_name = lookup(&self.user_name, "EC_USERNAME");
        let password = lookup(&self.password, "EC_PASSWORD");

        let credentials = match (token, user_name, password) {
            (Some(token), None, None) => Credentials::ApiToken(token),
            (None, Some(user_name), Some(password)) => Credentials::Password {
                user_name,
                password,
            },
            (Some(_), _, _) => {
                diags.error(
                    "Conflicting credentials",
                    "`permanent_api_token` cannot be used together with `user_name` and `password`",
                    AttributePath::new("permanent_api_token"),
                );
                return None;
            }
            (None, Some(_), None) | (None, None, Some(_)) => {
                diags.error(
                    "Incomplete credentials",
                    "`user_name` and `password` must be set together",
                    AttributePath::new("password"),
                );
                return None;
            }
            (None, None, None) => {
                diags.root_error(
                    "Missing credentials",
                    "Either `permanent_api_token` or `user_name` and `password` must be set",
                );
                return None;
            }
        };

        let poll_interval = match self.poll_interval.as_ref_option() {
            Some(interval) => Some(*interval),
            None => match env("EC_POLL_INTERVAL").map(|v| v.parse::<i64>()) {
                Some(Ok(interval)) => Some(interval),
                Some(Err(_)) => {
                    diags.root_error_short("EC_POLL_INTERVAL must be a number of seconds");
                    return None;
                }
                None => None,
            },
        };

        let mut config = ClientConfig::new(credentials);
        config.cloud_api = lookup(&self.edgecenter_cloud_api, "EC_CLOUD_API")
            .unwrap_or_else(|| DEFAULT_CLOUD_API.to_owned());
        config.platform_api = lookup(&self.edgecenter_platform_api, "EC_PLATFORM_API")
            .unwrap_or_else(|| DEFAULT_PLATFORM_API.to_owned());
        config.user_agent = concat!("terraform-provider-edgecenter/", env!("CARGO_PKG_VERSION")).to_owned();
        if let Some(interval) = poll_interval {
            if interval <= 0 {
                diags.error_short(
                    "poll_interval must be a positive number of seconds",
                    AttributePath::new("poll_interval"),
                );
                return None;
            }
            config.poll_interval = Duration::from_secs(interval as u64);
        }
        Some(config)
    }
}

#[derive(Debug, Default, Clone)]
pub struct EdgecenterProvider {
    client: ClientHandle,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[async_trait]
impl Provider for EdgecenterProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        let string = |description: &str, sensitive: bool| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(description),
            constraint: AttributeConstraint::Optional,
            sensitive,
            ..Default::default()
        };
        Some(Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "permanent_api_token" => string("Permanent API token (env: EC_PERMANENT_TOKEN)", true),
                    "user_name" => string("User name (env: EC_USERNAME)", false),
                    "password" => string("Password (env: EC_PASSWORD)", true),
                    "edgecenter_platform_api" => string("Platform API endpoint (env: EC_PLATFORM_API)", false),
                    "edgecenter_cloud_api" => string("Cloud API endpoint (env: EC_CLOUD_API)", false),
                    "poll_interval" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Seconds between two polls of a task (env: EC_POLL_INTERVAL)"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                },
                description: Description::plain("EdgeCenter cloud provider"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        // Values may still be unknown during validation
        let unknown = [
            &config.permanent_api_token,
            &config.user_name,
            &config.password,
        ]
        .iter()
        .any(|value| value.is_unknown());
        if !unknown {
            _ = config.client_config(diags, env_var);
        }
        check(diags)
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let client_config = config.client_config(diags, env_var)?;
        info!(
            %terraform_version,
            cloud_api = %client_config.cloud_api,
            "Configuring EdgeCenter provider"
        );
        let client = Client::connect(client_config)
            .await
            .report(diags, "Failed to connect to EdgeCenter")?;
        self.client.set(client);
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        let client = &self.client;
        Some(map! {
            "network" => NetworkResource::new(client.clone()),
            "subnet" => SubnetResource::new(client.clone()),
            "router" => RouterResource::new(client.clone()),
            "floatingip" => FloatingIpResource::new(client.clone()),
            "reservedfixedip" => ReservedFixedIpResource::new(client.clone()),
            "securitygroup" => SecurityGroupResource::new(client.clone()),
            "volume" => VolumeResource::new(client.clone()),
            "snapshot" => SnapshotResource::new(client.clone()),
            "keypair" => KeypairResource::new(client.clone()),
            "servergroup" => ServerGroupResource::new(client.clone()),
            "loadbalancerv2" => LoadBalancerResource::new(client.clone()),
            "lblistener" => ListenerResource::new(client.clone()),
            "lbpool" => PoolResource::new(client.clone()),
            "lbmember" => MemberResource::new(client.clone()),
            "lb_l7policy" => L7PolicyResource::new(client.clone()),
            "lb_l7rule" => L7RuleResource::new(client.clone()),
            "k8s" => K8sResource::new(client.clone()),
            "k8s_pool" => K8sPoolResource::new(client.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        let client = &self.client;
        Some(map! {
            "project" => ProjectDataSource::new(client.clone()),
            "region" => RegionDataSource::new(client.clone()),
            "network" => NetworkDataSource::new(client.clone()),
            "subnet" => SubnetDataSource::new(client.clone()),
            "router" => RouterDataSource::new(client.clone()),
            "floatingip" => FloatingIpDataSource::new(client.clone()),
            "reservedfixedip" => ReservedFixedIpDataSource::new(client.clone()),
            "securitygroup" => SecurityGroupDataSource::new(client.clone()),
            "volume" => VolumeDataSource::new(client.clone()),
            "snapshot" => SnapshotDataSource::new(client.clone()),
            "keypair" => KeypairDataSource::new(client.clone()),
            "servergroup" => ServerGroupDataSource::new(client.clone()),
            "image" => ImageDataSource::new(client.clone()),
            "loadbalancerv2" => LoadBalancerDataSource::new(client.clone()),
            "lblistener" => ListenerDataSource::new(client.clone()),
            "lbpool" => PoolDataSource::new(client.clone()),
            "k8s" => K8sDataSource::new(client.clone()),
            "k8s_pool" => K8sPoolDataSource::new(client.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn token_credentials() {
        let mut diags = Diagnostics::default();
        let config = ProviderConfig {
            permanent_api_token: "secret".into(),
            ..Default::default()
        };
        let client_config = config.client_config(&mut diags, no_env).unwrap();
        assert_eq!(client_config.credentials, Credentials::ApiToken("secret".into()));
        assert_eq!(client_config.cloud_api, DEFAULT_CLOUD_API);
        assert_eq!(client_config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn environment_fallback() {
        let mut diags = Diagnostics::default();
        let env = |name: &str| match name {
            "EC_USERNAME" => Some("user".to_owned()),
            "EC_PASSWORD" => Some("pass".to_owned()),
            "EC_CLOUD_API" => Some("http://localhost:1234".to_owned()),
            "EC_POLL_INTERVAL" => Some("5".to_owned()),
            _ => None,
        };
        let client_config = ProviderConfig::default()
            .client_config(&mut diags, env)
            .unwrap();
        assert_eq!(
            client_config.credentials,
            Credentials::Password {
                user_name: "user".into(),
                password: "pass".into()
            }
        );
        assert_eq!(client_config.cloud_api, "http://localhost:1234");
        assert_eq!(client_config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn invalid_credentials() {
        let cases = [
            (ProviderConfig::default(), "Missing credentials"),
            (
                ProviderConfig {
                    permanent_api_token: "secret".into(),
                    user_name: "user".into(),
                    ..Default::default()
                },
                "Conflicting credentials",
            ),
            (
                ProviderConfig {
                    user_name: "user".into(),
                    ..Default::default()
                },
                "Incomplete credentials",
            ),
        ];
        for (config, summary) in cases {
            let mut diags = Diagnostics::default();
            assert!(config.client_config(&mut diags, no_env).is_none());
            assert_eq!(diags.errors[0].summary, summary);
        }
    }

    #[test]
    fn unconfigured_client_is_an_error() {
        let mut diags = Diagnostics::default();
        assert!(ClientHandle::default().get(&mut diags).is_none());
        assert_eq!(diags.errors[0].summary, "Provider is not configured");
    }

    #[test]
    fn every_type_is_registered() {
        let provider = EdgecenterProvider::default();
        let mut diags = Diagnostics::default();
        let resources = provider.get_resources(&mut diags).unwrap();
        let data_sources = provider.get_data_sources(&mut diags).unwrap();
        assert_eq!(resources.len(), 18);
        assert_eq!(data_sources.len(), 18);
        for (name, resource) in &resources {
            assert!(resource.schema(&mut diags).is_some(), "{name}");
        }
        for (name, data_source) in &data_sources {
            assert!(data_source.schema(&mut diags).is_some(), "{name}");
        }
        assert!(diags.errors.is_empty());
    }
}

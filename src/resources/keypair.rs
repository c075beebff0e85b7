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
use edgecenter_client::cloud::keypair::{CreateKeypair, Keypair};
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use crate::attributes::{attribute, schema};
use crate::import::parse_project_import_id;
use crate::location::{exactly_one_of, project_attributes, resolve_project};
use crate::provider::ClientHandle;
use crate::utils::{
    check, computed, default_to, now, opt_string, report_deleted, requires_replace, string,
    ReportError, WithNormalize, WithSchema,
};
use crate::validate::ssh_public_key;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KeypairState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub sshkey_name: ValueString<'a>,
    pub public_key: ValueString<'a>,
    pub sshkey_id: ValueString<'a>,
    pub fingerprint: ValueString<'a>,
    pub shared_in_project: ValueBool,
    pub last_updated: ValueString<'a>,
}

impl<'a> WithSchema for KeypairState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "id" => attribute(AttributeType::String, Computed, "ID of the keypair"),
            "sshkey_name" => attribute(AttributeType::String, Required, "Name of the keypair"),
            "public_key" => attribute(AttributeType::String, Required, "OpenSSH public key"),
            "sshkey_id" => attribute(AttributeType::String, Computed, "ID of the keypair"),
            "fingerprint" => attribute(AttributeType::String, Computed, "Fingerprint of the public key"),
            "shared_in_project" => attribute(
                AttributeType::Bool,
                OptionalComputed,
                "Share the keypair with every user of the project (default: false)",
            ),
            "last_updated" => attribute(
                AttributeType::String,
                Computed,
                "Timestamp of the last update of the resource by Terraform",
            ),
        };
        attributes.extend(project_attributes());
        schema("EdgeCenter SSH keypair, shared by the whole project", attributes, Default::default())
    }
}

impl<'a> WithNormalize for KeypairState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_to(&mut self.shared_in_project, false);
        computed(&mut self.sshkey_id);
        computed(&mut self.fingerprint);
    }
}

impl<'a> KeypairState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        exactly_one_of(
            diags,
            "project_id",
            &self.project_id,
            "project_name",
            &self.project_name,
        );
        ssh_public_key(diags, AttributePath::new("public_key"), &self.public_key);
    }

    fn known_project(&self, diags: &mut Diagnostics) -> Option<i64> {
        match self.project_id {
            Value::Value(project_id) => Some(project_id),
            _ => {
                diags.root_error_short("Project of the keypair is unknown");
                None
            }
        }
    }

    fn apply(&mut self, keypair: &Keypair) {
        self.id = string(keypair.sshkey_id.as_str());
        self.sshkey_id = string(keypair.sshkey_id.as_str());
        self.sshkey_name = string(keypair.sshkey_name.as_str());
        if !same_public_key(&self.public_key, &keypair.public_key) {
            self.public_key = string(keypair.public_key.trim());
        }
        self.fingerprint = opt_string(keypair.fingerprint.clone());
        self.shared_in_project = Value::Value(keypair.shared_in_project);
        if let Some(project_id) = keypair.project_id {
            self.project_id = Value::Value(project_id);
        }
    }
}

/// Keys are compared field by field, ignoring surrounding and repeated whitespace
fn same_public_key(known: &ValueString<'_>, other: &str) -> bool {
    match known {
        Value::Value(key) => key.split_whitespace().eq(other.split_whitespace()),
        _ => false,
    }
}

#[derive(Debug, Default, Clone)]
pub struct KeypairResource {
    client: ClientHandle,
}

impl KeypairResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for KeypairResource {
    type State<'a> = KeypairState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(KeypairState::schema())
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
        let project_id = state.known_project(diags)?;

        let Some(keypair) = client
            .get_keypair(project_id, &state.id)
            .await
            .report_found(diags, "Failed to read keypair")?
        else {
            warn!(id = %state.id, "Keypair does not exist anymore");
            return None;
        };
        state.apply(&keypair);
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
        computed(&mut state.project_id);
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

        // Every argument of a keypair forces a new one
        let mut trigger_replace = requires_replace!(
            prior_state,
            state,
            [project_id, project_name, sshkey_name, shared_in_project]
        );
        let key_changed = match &state.public_key {
            Value::Value(key) => !same_public_key(&prior_state.public_key, key),
            planned => *planned != prior_state.public_key,
        };
        if key_changed {
            trigger_replace.push(AttributePath::new("public_key"));
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
        let project_id =
            resolve_project(diags, &client, &state.project_id, &state.project_name).await?;
        state.project_id = Value::Value(project_id);

        let opts = CreateKeypair {
            sshkey_name: state.sshkey_name.to_string(),
            public_key: state.public_key.to_string(),
            project_id,
            shared_in_project: state.shared_in_project.unwrap_or(false),
        };
        info!(project_id, name = %opts.sshkey_name, "Creating keypair");
        let keypair = client
            .create_keypair(&opts)
            .await
            .report(diags, "Failed to create keypair")?;

        state.apply(&keypair);
        state.last_updated = now();
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = planned_state;
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
        let project_id = state.known_project(diags)?;

        info!(id = %state.id, project_id, "Deleting keypair");
        let result = client.delete_keypair(project_id, &state.id).await;
        report_deleted(result, diags, "Failed to delete keypair")?;
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let (project_id, id) = parse_project_import_id(diags, &id)?;
        let state = KeypairState {
            id: string(id),
            project_id: Value::Value(project_id),
            ..Default::default()
        };
        Some((state, Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIE5p5Ztml0gZy0RbOfLk9QcAYtmJHd8P/4uz9fGytzgu user@host";

    #[test]
    fn keypair_is_validated() {
        let mut diags = Diagnostics::default();
        KeypairState {
            project_id: Value::Value(1),
            public_key: PUBLIC_KEY.into(),
            ..Default::default()
        }
        .validate(&mut diags);
        assert!(diags.errors.is_empty());

        let mut diags = Diagnostics::default();
        KeypairState {
            public_key: "not a key".into(),
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
            vec![AttributePath::new("project_id"), AttributePath::new("public_key")]
        );
    }

    #[test]
    fn remote_keypair_is_applied() {
        let keypair: Keypair = serde_json::from_value(serde_json::json!({
            "sshkey_id": "k1",
            "sshkey_name": "deploy",
            "public_key": format!("{PUBLIC_KEY}\n"),
            "fingerprint": "aa:bb",
            "project_id": 3,
            "shared_in_project": true
        }))
        .unwrap();
        let mut state = KeypairState::default();
        state.apply(&keypair);
        assert_eq!(state.id, string("k1"));
        assert_eq!(state.public_key, string(PUBLIC_KEY));
        assert_eq!(state.project_id, Value::Value(3));
        assert_eq!(state.shared_in_project, Value::Value(true));
    }

    #[test]
    fn refresh_keeps_configured_key() {
        let keypair: Keypair = serde_json::from_value(serde_json::json!({
            "sshkey_id": "k1",
            "sshkey_name": "deploy",
            "public_key": PUBLIC_KEY,
        }))
        .unwrap();
        let configured = format!("{PUBLIC_KEY}\n");
        let mut state = KeypairState {
            public_key: string(configured.as_str()),
            ..Default::default()
        };
        state.apply(&keypair);
        assert_eq!(state.public_key, string(configured));

        // Changed outside of Terraform
        let mut state = KeypairState {
            public_key: "ssh-ed25519 AAAA other@host".into(),
            ..Default::default()
        };
        state.apply(&keypair);
        assert_eq!(state.public_key, string(PUBLIC_KEY));
    }
}

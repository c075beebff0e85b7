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
use edgecenter_client::cloud::keypair::Keypair;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use super::computed_attribute;
use crate::attributes::{attribute, schema};
use crate::location::{exactly_one_of, project_attributes, resolve_project};
use crate::lookup::{find_by_name, validate_selector, Selector};
use crate::provider::ClientHandle;
use crate::utils::{check, opt_string, string, ReportError, WithSchema};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KeypairDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub sshkey_name: ValueString<'a>,
    pub public_key: ValueString<'a>,
    pub fingerprint: ValueString<'a>,
    pub shared_in_project: ValueBool,
    pub state: ValueString<'a>,
    pub created_at: ValueString<'a>,
}

impl<'a> WithSchema for KeypairDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "id" => attribute(AttributeType::String, OptionalComputed, "ID of the keypair"),
            "sshkey_name" => attribute(AttributeType::String, OptionalComputed, "Name of the keypair, instead of its ID"),
            "public_key" => computed_attribute(AttributeType::String, "OpenSSH public key"),
            "fingerprint" => computed_attribute(AttributeType::String, "Fingerprint of the key"),
            "shared_in_project" => computed_attribute(AttributeType::Bool, "Whether the key is visible to the whole project"),
            "state" => computed_attribute(AttributeType::String, "State of the keypair"),
            "created_at" => computed_attribute(AttributeType::String, "Creation date"),
        };
        attributes.extend(project_attributes());
        schema("EdgeCenter SSH keypair", attributes, Default::default())
    }
}

impl<'a> KeypairDataSourceState<'a> {
    fn apply(&mut self, keypair: &Keypair) {
        self.id = string(keypair.sshkey_id.as_str());
        self.sshkey_name = string(keypair.sshkey_name.as_str());
        self.public_key = string(keypair.public_key.as_str());
        self.fingerprint = opt_string(keypair.fingerprint.clone());
        self.shared_in_project = Value::Value(keypair.shared_in_project);
        self.state = opt_string(keypair.state.clone());
        self.created_at = opt_string(keypair.created_at.clone());
    }
}

#[derive(Debug, Default, Clone)]
pub struct KeypairDataSource {
    client: ClientHandle,
}

impl KeypairDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for KeypairDataSource {
    type State<'a> = KeypairDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(KeypairDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        exactly_one_of(
            diags,
            "project_id",
            &config.project_id,
            "project_name",
            &config.project_name,
        );
        validate_selector(diags, &config.id, "sshkey_name", &config.sshkey_name);
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
        let project_id =
            resolve_project(diags, &client, &state.project_id, &state.project_name).await?;
        state.project_id = Value::Value(project_id);

        let keypair = match Selector::from_config(diags, &state.id, "sshkey_name", &state.sshkey_name)? {
            Selector::Id(id) => client
                .get_keypair(project_id, &id)
                .await
                .report(diags, "Failed to read keypair")?,
            Selector::Name(name) => {
                let keypairs = client
                    .list_keypairs(project_id)
                    .await
                    .report(diags, "Failed to list keypairs")?;
                find_by_name(diags, "keypair", &name, keypairs, |k| &k.sshkey_name)?
            }
        };
        state.apply(&keypair);
        Some(state)
    }
}

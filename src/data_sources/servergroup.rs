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
use edgecenter_client::cloud::servergroup::ServerGroup;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeType, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueNumber, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use super::{computed_attribute, selector_attributes};
use crate::attributes::schema;
use crate::location::{impl_location, resolve_location, validate_location};
use crate::lookup::{find_by_name, validate_selector, Selector};
use crate::provider::ClientHandle;
use crate::resources::{flatten_instances, instances_attribute, InstanceState};
use crate::utils::{check, string, ReportError, WithSchema};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServerGroupDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub policy: ValueString<'a>,
    pub instances: ValueList<Value<InstanceState<'a>>>,
}

impl_location!(ServerGroupDataSourceState);

impl<'a> WithSchema for ServerGroupDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "policy" => computed_attribute(AttributeType::String, "Placement policy of the group"),
            "instances" => instances_attribute(),
        };
        attributes.extend(selector_attributes("name", "server group"));
        schema("EdgeCenter server group", attributes, Default::default())
    }
}

impl<'a> ServerGroupDataSourceState<'a> {
    fn apply(&mut self, group: &ServerGroup) {
        self.id = string(group.servergroup_id.as_str());
        self.name = string(group.name.as_str());
        self.policy = string(group.policy.as_str());
        self.instances = flatten_instances(group);
    }
}

#[derive(Debug, Default, Clone)]
pub struct ServerGroupDataSource {
    client: ClientHandle,
}

impl ServerGroupDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ServerGroupDataSource {
    type State<'a> = ServerGroupDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ServerGroupDataSourceState::schema())
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

        let group = match Selector::from_config(diags, &state.id, "name", &state.name)? {
            Selector::Id(id) => client
                .get_server_group(&location, &id)
                .await
                .report(diags, "Failed to read server group")?,
            Selector::Name(name) => {
                let groups = client
                    .list_server_groups(&location)
                    .await
                    .report(diags, "Failed to list server groups")?;
                find_by_name(diags, "server group", &name, groups, |g| &g.name)?
            }
        };
        state.apply(&group);
        Some(state)
    }
}

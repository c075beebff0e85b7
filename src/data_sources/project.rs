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
use edgecenter_client::cloud::project::Project;
use edgecenter_client::cloud::region::Region;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use super::computed_attribute;
use crate::attributes::{attribute, schema};
use crate::lookup::find_by_name;
use crate::provider::ClientHandle;
use crate::utils::{opt_string, string, ReportError, WithSchema};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProjectDataSourceState<'a> {
    pub id: ValueNumber,
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub state: ValueString<'a>,
    pub client_id: ValueNumber,
    pub is_default: ValueBool,
    pub created_at: ValueString<'a>,
}

impl<'a> WithSchema for ProjectDataSourceState<'a> {
    fn schema() -> Schema {
        let attributes: HashMap<String, Attribute> = map! {
            "id" => computed_attribute(AttributeType::Number, "ID of the project"),
            "name" => attribute(AttributeType::String, Required, "Name of the project"),
            "description" => computed_attribute(AttributeType::String, "Description of the project"),
            "state" => computed_attribute(AttributeType::String, "State of the project"),
            "client_id" => computed_attribute(AttributeType::Number, "ID of the client owning the project"),
            "is_default" => computed_attribute(AttributeType::Bool, "Whether this is the default project of the client"),
            "created_at" => computed_attribute(AttributeType::String, "Creation date"),
        };
        schema("EdgeCenter project, found by name", attributes, Default::default())
    }
}

impl<'a> ProjectDataSourceState<'a> {
    fn apply(&mut self, project: &Project) {
        self.id = Value::Value(project.id);
        self.name = string(project.name.as_str());
        self.description = opt_string(project.description.clone());
        self.state = opt_string(project.state.clone());
        self.client_id = project.client_id.into();
        self.is_default = Value::Value(project.is_default);
        self.created_at = opt_string(project.created_at.clone());
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProjectDataSource {
    client: ClientHandle,
}

impl ProjectDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ProjectDataSource {
    type State<'a> = ProjectDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ProjectDataSourceState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let mut state = config;

        let projects = client
            .list_projects()
            .await
            .report(diags, "Failed to list projects")?;
        let project = find_by_name(diags, "project", &state.name, projects, |p| &p.name)?;
        state.apply(&project);
        Some(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RegionDataSourceState<'a> {
    pub id: ValueNumber,
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    pub keystone_name: ValueString<'a>,
    pub state: ValueString<'a>,
    pub endpoint_type: ValueString<'a>,
    pub external_network_id: ValueString<'a>,
}

impl<'a> WithSchema for RegionDataSourceState<'a> {
    fn schema() -> Schema {
        let attributes: HashMap<String, Attribute> = map! {
            "id" => computed_attribute(AttributeType::Number, "ID of the region"),
            "name" => attribute(AttributeType::String, Required, "Display name of the region"),
            "keystone_name" => computed_attribute(AttributeType::String, "Internal name of the region"),
            "state" => computed_attribute(AttributeType::String, "State of the region"),
            "endpoint_type" => computed_attribute(AttributeType::String, "Type of endpoint of the region"),
            "external_network_id" => computed_attribute(AttributeType::String, "ID of the external network of the region"),
        };
        schema("EdgeCenter region, found by name", attributes, Default::default())
    }
}

impl<'a> RegionDataSourceState<'a> {
    fn apply(&mut self, region: &Region) {
        self.id = Value::Value(region.id);
        self.name = string(region.display_name.as_str());
        self.keystone_name = opt_string(region.keystone_name.clone());
        self.state = opt_string(region.state.clone());
        self.endpoint_type = opt_string(region.endpoint_type.clone());
        self.external_network_id = opt_string(region.external_network_id.clone());
    }
}

#[derive(Debug, Default, Clone)]
pub struct RegionDataSource {
    client: ClientHandle,
}

impl RegionDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for RegionDataSource {
    type State<'a> = RegionDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RegionDataSourceState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags)?;
        let mut state = config;

        let regions = client
            .list_regions()
            .await
            .report(diags, "Failed to list regions")?;
        let region = find_by_name(diags, "region", &state.name, regions, |r| &r.display_name)?;
        state.apply(&region);
        Some(state)
    }
}

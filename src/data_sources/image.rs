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
use edgecenter_client::cloud::image::Image;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{Attribute, AttributeConstraint::*, AttributeType, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, DataSource, Diagnostics};
use tracing::debug;

use super::computed_attribute;
use crate::attributes::{attribute, schema};
use crate::location::{impl_location, location_attributes, resolve_location, validate_location};
use crate::lookup::find_by_name;
use crate::metadata::{apply_metadata, computed_metadata_attributes, MetadataMap, MetadataReadOnly};
use crate::provider::ClientHandle;
use crate::utils::{check, opt_string, string, ReportError, WithSchema};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ImageDataSourceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub project_name: ValueString<'a>,
    pub region_id: ValueNumber,
    pub region_name: ValueString<'a>,
    pub name: ValueString<'a>,
    pub is_baremetal: ValueBool,
    pub description: ValueString<'a>,
    pub min_disk: ValueNumber,
    pub min_ram: ValueNumber,
    pub os_distro: ValueString<'a>,
    pub os_version: ValueString<'a>,
    pub visibility: ValueString<'a>,
    pub status: ValueString<'a>,
    pub metadata_map: MetadataMap<'a>,
    pub metadata_read_only: MetadataReadOnly<'a>,
}

impl_location!(ImageDataSourceState);

impl<'a> WithSchema for ImageDataSourceState<'a> {
    fn schema() -> Schema {
        let mut attributes: HashMap<String, Attribute> = map! {
            "id" => computed_attribute(AttributeType::String, "ID of the image"),
            "name" => attribute(AttributeType::String, Required, "Name of the image"),
            "is_baremetal" => attribute(AttributeType::Bool, Optional, "Look among baremetal images, defaults to false"),
            "description" => computed_attribute(AttributeType::String, "Description of the image"),
            "min_disk" => computed_attribute(AttributeType::Number, "Minimal disk size in GiB"),
            "min_ram" => computed_attribute(AttributeType::Number, "Minimal RAM in MiB"),
            "os_distro" => computed_attribute(AttributeType::String, "OS distribution"),
            "os_version" => computed_attribute(AttributeType::String, "OS version"),
            "visibility" => computed_attribute(AttributeType::String, "Visibility of the image"),
            "status" => computed_attribute(AttributeType::String, "Status of the image"),
        };
        attributes.extend(location_attributes());
        attributes.extend(computed_metadata_attributes());
        schema("EdgeCenter image, found by name", attributes, Default::default())
    }
}

impl<'a> ImageDataSourceState<'a> {
    fn apply(&mut self, image: &Image) {
        self.id = string(image.id.as_str());
        self.name = string(image.name.as_str());
        self.description = opt_string(image.description.clone());
        self.min_disk = Value::Value(image.min_disk);
        self.min_ram = Value::Value(image.min_ram);
        self.os_distro = opt_string(image.os_distro.clone());
        self.os_version = opt_string(image.os_version.clone());
        self.visibility = opt_string(image.visibility.clone());
        self.status = opt_string(image.status.clone());
        apply_metadata(&mut self.metadata_map, &mut self.metadata_read_only, &image.metadata);
    }
}

#[derive(Debug, Default, Clone)]
pub struct ImageDataSource {
    client: ClientHandle,
}

impl ImageDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ImageDataSource {
    type State<'a> = ImageDataSourceState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ImageDataSourceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        validate_location(diags, &config);
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

        let baremetal = state.is_baremetal.unwrap_or(false);
        let images = client
            .list_images(&location, baremetal)
            .await
            .report(diags, "Failed to list images")?;
        debug!(count = images.len(), baremetal, "Listed images");
        let image = find_by_name(diags, "image", &state.name, images, |i| &i.name)?;
        state.apply(&image);
        Some(state)
    }
}

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

use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};

use crate::location::location_attributes;

pub(crate) fn attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    description: &str,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

pub(crate) fn list_of(attr_type: AttributeType) -> AttributeType {
    AttributeType::List(attr_type.into())
}

pub(crate) fn map_of(attr_type: AttributeType) -> AttributeType {
    AttributeType::Map(attr_type.into())
}

/// `id` and `last_updated` of a regional resource, with its location
pub(crate) fn resource_attributes(id_description: &str) -> HashMap<String, Attribute> {
    let mut attributes = location_attributes();
    attributes.insert(
        "id".to_owned(),
        attribute(AttributeType::String, AttributeConstraint::Computed, id_description),
    );
    attributes.insert(
        "last_updated".to_owned(),
        attribute(
            AttributeType::String,
            AttributeConstraint::Computed,
            "Timestamp of the last update of the resource by Terraform",
        ),
    );
    attributes
}

pub(crate) fn schema(
    description: &str,
    attributes: HashMap<String, Attribute>,
    blocks: HashMap<String, NestedBlock>,
) -> Schema {
    Schema {
        version: 1,
        block: Block {
            attributes,
            blocks,
            description: Description::plain(description),
            ..Default::default()
        },
    }
}

pub(crate) fn block(description: &str, attributes: HashMap<String, Attribute>) -> Block {
    Block {
        attributes,
        description: Description::plain(description),
        ..Default::default()
    }
}

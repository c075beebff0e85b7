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

//! Read-only lookups of existing objects
//!
//! Regional data sources designate their object either by `id` or by name,
//! the name being resolved by listing the objects of the location.

use std::collections::HashMap;

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType};

use crate::attributes::attribute;
use crate::location::location_attributes;

mod floatingip;
mod image;
mod k8s;
mod keypair;
mod loadbalancer;
mod network;
mod project;
mod securitygroup;
mod servergroup;
mod volume;

pub use floatingip::{FloatingIpDataSource, ReservedFixedIpDataSource};
pub use image::ImageDataSource;
pub use k8s::{K8sDataSource, K8sPoolDataSource};
pub use keypair::KeypairDataSource;
pub use loadbalancer::{ListenerDataSource, LoadBalancerDataSource, PoolDataSource};
pub use network::{NetworkDataSource, RouterDataSource, SubnetDataSource};
pub use project::{ProjectDataSource, RegionDataSource};
pub use securitygroup::SecurityGroupDataSource;
pub use servergroup::ServerGroupDataSource;
pub use volume::{SnapshotDataSource, VolumeDataSource};

/// Location attributes, with the `id` and `<name_attribute>` selectors
pub(crate) fn selector_attributes(name_attribute: &str, kind: &str) -> HashMap<String, Attribute> {
    let mut attributes = location_attributes();
    attributes.insert(
        "id".to_owned(),
        attribute(
            AttributeType::String,
            AttributeConstraint::OptionalComputed,
            &format!("ID of the {kind}"),
        ),
    );
    attributes.insert(
        name_attribute.to_owned(),
        attribute(
            AttributeType::String,
            AttributeConstraint::OptionalComputed,
            &format!("Name of the {kind}, instead of its ID"),
        ),
    );
    attributes
}

/// Computed attribute
pub(crate) fn computed_attribute(attr_type: AttributeType, description: &str) -> Attribute {
    attribute(attr_type, AttributeConstraint::Computed, description)
}

/// Computed list of objects
pub(crate) fn computed_objects(attributes: HashMap<String, Attribute>, description: &str) -> Attribute {
    computed_attribute(AttributeType::AttributeList(attributes), description)
}

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

//! Terraform provider for the EdgeCenter cloud
//!
//! The provider exposes networking, storage, load balancing and Kubernetes
//! objects of the EdgeCenter cloud as Terraform and OpenTofu resources and data sources.
//! Calls to the API go through the [`edgecenter_client`] crate.

mod attributes;
mod import;
mod location;
mod lookup;
mod metadata;
mod utils;
mod validate;

pub mod data_sources;
pub mod provider;
pub mod resources;

pub use provider::{ClientHandle, EdgecenterProvider, ProviderConfig};

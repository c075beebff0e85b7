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

//! Managed resources of the provider
//!
//! Every resource follows the same lifecycle: the location is resolved from
//! names at creation, asynchronous API tasks are awaited with a per-resource
//! timeout, and the remote object is read back into the state.

pub(crate) mod host_route;

mod floatingip;
mod k8s;
mod k8s_pool;
mod keypair;
mod l7policy;
mod l7rule;
mod listener;
mod loadbalancer;
mod member;
mod network;
mod pool;
mod reservedfixedip;
mod router;
mod securitygroup;
mod servergroup;
mod snapshot;
mod subnet;
mod volume;

pub use floatingip::FloatingIpResource;
pub use k8s::K8sResource;
pub use k8s_pool::K8sPoolResource;
pub use keypair::KeypairResource;
pub use l7policy::L7PolicyResource;
pub use l7rule::L7RuleResource;
pub use listener::ListenerResource;
pub use loadbalancer::LoadBalancerResource;
pub use member::MemberResource;
pub use network::NetworkResource;
pub use pool::PoolResource;
pub use reservedfixedip::ReservedFixedIpResource;
pub use router::RouterResource;
pub use securitygroup::SecurityGroupResource;
pub use servergroup::ServerGroupResource;
pub use snapshot::SnapshotResource;
pub use subnet::SubnetResource;
pub use volume::VolumeResource;

pub(crate) use k8s_pool::{node_pool_attributes, NodePoolState};
pub(crate) use pool::{
    flatten_health_monitor, flatten_session_persistence, health_monitor_attributes,
    session_persistence_attributes, HealthMonitorState, SessionPersistenceState,
};
pub(crate) use servergroup::{flatten_instances, instances_attribute, InstanceState};

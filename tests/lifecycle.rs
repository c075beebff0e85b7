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

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;

use edgecenter_client::{Client, ClientConfig, Credentials};
use serde_json::json;
use terraform_provider_edgecenter::data_sources::NetworkDataSource;
use terraform_provider_edgecenter::resources::NetworkResource;
use terraform_provider_edgecenter::ClientHandle;
use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{DataSource, Diagnostics, Resource};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type NetworkState = <NetworkResource as Resource>::State<'static>;
type NetworkLookup = <NetworkDataSource as DataSource>::State<'static>;

async fn handle(server: &MockServer) -> ClientHandle {
    let mut config = ClientConfig::new(Credentials::ApiToken("token".into()));
    config.cloud_api = server.uri();
    config.poll_interval = Duration::from_millis(10);
    Client::connect(config).await.unwrap().into()
}

fn network(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "type": "vxlan",
        "mtu": 1450,
        "external": false,
        "shared": false,
        "subnets": [],
        "metadata": [
            {"key": "env", "value": "prod", "read_only": false},
            {"key": "task_id", "value": "t1", "read_only": true}
        ]
    })
}

async fn mount_task(server: &MockServer, id: &str, created: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/tasks/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "state": "FINISHED",
            "created_resources": created,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn network_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/networks/1/2"))
        .and(body_json(json!({
            "name": "private",
            "type": "vxlan",
            "create_router": true,
            "metadata": {"env": "prod"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": ["t1"]})))
        .expect(1)
        .mount(&server)
        .await;
    mount_task(&server, "t1", json!({"networks": ["net-1"]})).await;
    Mock::given(method("GET"))
        .and(path("/v1/networks/1/2/net-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(network("net-1", "private")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/networks/1/2/net-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": ["t2"]})))
        .expect(1)
        .mount(&server)
        .await;
    mount_task(&server, "t2", json!({})).await;

    let resource = NetworkResource::new(handle(&server).await);
    let mut diags = Diagnostics::default();

    let mut config = NetworkState::default();
    config.name = Value::Value("private".into());
    config.project_id = Value::Value(1);
    config.region_id = Value::Value(2);
    config.metadata_map = Value::Value(BTreeMap::from([(
        Cow::Borrowed("env"),
        Value::Value(Cow::Borrowed("prod")),
    )]));

    let (planned, private) = resource
        .plan_create(&mut diags, config.clone(), config.clone(), ValueEmpty::default())
        .await
        .unwrap();
    assert!(planned.id.is_unknown());
    assert_eq!(planned.network_type, Value::Value("vxlan".into()));
    assert_eq!(planned.create_router, Value::Value(true));

    let (state, private) = resource
        .create(&mut diags, planned, config, private, ValueEmpty::default())
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert_eq!(state.id, Value::Value("net-1".into()));
    assert_eq!(state.mtu, Value::Value(1450));
    assert_eq!(state.metadata_map.as_ref().unwrap().len(), 1);
    assert_eq!(state.metadata_read_only.as_ref().unwrap().len(), 2);
    assert!(state.last_updated.is_value());

    resource
        .destroy(&mut diags, state.clone(), private, ValueEmpty::default())
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert!(diags.warnings.is_empty());

    // Gone from the API: the resource is dropped from the state
    let read = resource
        .read(&mut diags, state, private, ValueEmpty::default())
        .await;
    assert!(read.is_none());
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn deleting_missing_network_warns() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/networks/1/2/net-9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
        .mount(&server)
        .await;

    let resource = NetworkResource::new(handle(&server).await);
    let mut diags = Diagnostics::default();
    let mut state = NetworkState::default();
    state.id = Value::Value("net-9".into());
    state.project_id = Value::Value(1);
    state.region_id = Value::Value(2);

    resource
        .destroy(&mut diags, state, ValueEmpty::default(), ValueEmpty::default())
        .await
        .unwrap();
    assert!(diags.errors.is_empty());
    assert_eq!(diags.warnings.len(), 1);
}

#[tokio::test]
async fn network_is_found_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{"id": 1, "name": "default"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/networks/1/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "results": [network("net-1", "private"), network("net-2", "public")]
        })))
        .mount(&server)
        .await;

    let data_source = NetworkDataSource::new(handle(&server).await);
    let mut diags = Diagnostics::default();
    let mut config = NetworkLookup::default();
    config.project_name = Value::Value("default".into());
    config.region_id = Value::Value(2);
    config.name = Value::Value("public".into());

    let state = data_source
        .read(&mut diags, config, ValueEmpty::default())
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert_eq!(state.id, Value::Value("net-2".into()));
    assert_eq!(state.project_id, Value::Value(1));
    assert_eq!(state.mtu, Value::Value(1450));
}

#[tokio::test]
async fn ambiguous_or_missing_name_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/networks/1/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "results": [network("net-1", "twin"), network("net-2", "twin")]
        })))
        .mount(&server)
        .await;

    let data_source = NetworkDataSource::new(handle(&server).await);
    let lookup = |name: &str| {
        let mut config = NetworkLookup::default();
        config.project_id = Value::Value(1);
        config.region_id = Value::Value(2);
        config.name = Value::Value(name.to_owned().into());
        config
    };

    let mut diags = Diagnostics::default();
    let state = data_source
        .read(&mut diags, lookup("twin"), ValueEmpty::default())
        .await;
    assert!(state.is_none());
    assert_eq!(&*diags.errors[0].summary, "Multiple networks found");

    let mut diags = Diagnostics::default();
    let state = data_source
        .read(&mut diags, lookup("other"), ValueEmpty::default())
        .await;
    assert!(state.is_none());
    assert_eq!(&*diags.errors[0].summary, "network not found");
}

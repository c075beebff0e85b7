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

//! Import and refresh must not plan replacements of unchanged objects

use std::time::Duration;

use edgecenter_client::{Client, ClientConfig, Credentials};
use serde_json::json;
use terraform_provider_edgecenter::resources::{KeypairResource, PoolResource, VolumeResource};
use terraform_provider_edgecenter::ClientHandle;
use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{Diagnostics, Resource};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type KeypairState = <KeypairResource as Resource>::State<'static>;
type PoolState = <PoolResource as Resource>::State<'static>;
type VolumeState = <VolumeResource as Resource>::State<'static>;

const PUBLIC_KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIE5p5Ztml0gZy0RbOfLk9QcAYtmJHd8P/4uz9fGytzgu user@host";

async fn handle(server: &MockServer) -> ClientHandle {
    let mut config = ClientConfig::new(Credentials::ApiToken("token".into()));
    config.cloud_api = server.uri();
    config.poll_interval = Duration::from_millis(10);
    Client::connect(config).await.unwrap().into()
}

async fn mount_get(server: &MockServer, url: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(url))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn keypair_json() -> serde_json::Value {
    json!({
        "sshkey_id": "k1",
        "sshkey_name": "deploy",
        "public_key": PUBLIC_KEY,
        "fingerprint": "aa:bb",
        "project_id": 1,
        "shared_in_project": false
    })
}

#[tokio::test]
async fn imported_pool_keeps_its_listener() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/v1/lbpools/1/2/p1",
        json!({
            "id": "p1",
            "name": "web",
            "protocol": "HTTP",
            "lb_algorithm": "ROUND_ROBIN",
            "loadbalancers": [{"id": "lb1"}],
            "listeners": [{"id": "l1"}],
            "provisioning_status": "ACTIVE",
            "operating_status": "ONLINE"
        }),
    )
    .await;

    let resource = PoolResource::new(handle(&server).await);
    let mut diags = Diagnostics::default();

    let (imported, private) = resource.import(&mut diags, "1:2:p1".into()).await.unwrap();
    let (refreshed, private) = resource
        .read(&mut diags, imported, private, ValueEmpty::default())
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert_eq!(refreshed.listener_id, Value::Value("l1".into()));
    assert!(refreshed.loadbalancer_id.is_null());

    // Configuration only names the listener
    let config = PoolState {
        name: Value::Value("web".into()),
        protocol: Value::Value("HTTP".into()),
        lb_algorithm: Value::Value("ROUND_ROBIN".into()),
        listener_id: Value::Value("l1".into()),
        loadbalancer_id: Value::Null,
        ..refreshed.clone()
    };
    let (_, _, replace) = resource
        .plan_update(
            &mut diags,
            refreshed,
            config.clone(),
            config,
            private,
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(replace.is_empty(), "{replace:?}");
}

#[tokio::test]
async fn imported_volume_recovers_its_source() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/v1/volumes/1/2/v1",
        json!({
            "id": "v1",
            "name": "boot",
            "size": 20,
            "volume_type": "ssd_hiiops",
            "status": "available",
            "bootable": true,
            "volume_image_metadata": {"image_id": "img-1", "os_distro": "ubuntu"}
        }),
    )
    .await;

    let resource = VolumeResource::new(handle(&server).await);
    let mut diags = Diagnostics::default();

    let (imported, private) = resource.import(&mut diags, "1:2:v1".into()).await.unwrap();
    assert!(imported.source.is_null());
    let (refreshed, private) = resource
        .read(&mut diags, imported, private, ValueEmpty::default())
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert_eq!(refreshed.source, Value::Value("image".into()));
    assert_eq!(refreshed.image_id, Value::Value("img-1".into()));
    assert!(refreshed.snapshot_id.is_null());

    let config = VolumeState {
        name: Value::Value("boot".into()),
        source: Value::Value("image".into()),
        image_id: Value::Value("img-1".into()),
        ..refreshed.clone()
    };
    let (_, _, replace) = resource
        .plan_update(
            &mut diags,
            refreshed,
            config.clone(),
            config,
            private,
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(replace.is_empty(), "{replace:?}");
}

#[tokio::test]
async fn imported_keypair_accepts_trailing_newline() {
    let server = MockServer::start().await;
    mount_get(&server, "/v2/keypairs/1/k1", keypair_json()).await;

    let resource = KeypairResource::new(handle(&server).await);
    let mut diags = Diagnostics::default();

    let (imported, private) = resource.import(&mut diags, "1:k1".into()).await.unwrap();
    let (refreshed, private) = resource
        .read(&mut diags, imported, private, ValueEmpty::default())
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert_eq!(refreshed.public_key, Value::Value(PUBLIC_KEY.into()));

    // As read from a file by `file("id.pub")`
    let config = KeypairState {
        public_key: Value::Value(format!("{PUBLIC_KEY}\n").into()),
        ..refreshed.clone()
    };
    let (_, _, replace) = resource
        .plan_update(
            &mut diags,
            refreshed,
            config.clone(),
            config,
            private,
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(replace.is_empty(), "{replace:?}");
}

#[tokio::test]
async fn keypair_is_stable_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/keypairs/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(keypair_json()))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, "/v2/keypairs/1/k1", keypair_json()).await;

    let resource = KeypairResource::new(handle(&server).await);
    let mut diags = Diagnostics::default();

    let config = KeypairState {
        project_id: Value::Value(1),
        sshkey_name: Value::Value("deploy".into()),
        public_key: Value::Value(format!("{PUBLIC_KEY}\n").into()),
        ..Default::default()
    };
    let (planned, private) = resource
        .plan_create(&mut diags, config.clone(), config.clone(), ValueEmpty::default())
        .await
        .unwrap();
    let (created, private) = resource
        .create(&mut diags, planned, config, private, ValueEmpty::default())
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert_eq!(created.id, Value::Value("k1".into()));

    let (refreshed, private) = resource
        .read(&mut diags, created.clone(), private, ValueEmpty::default())
        .await
        .unwrap();
    assert_eq!(refreshed, created);

    let (planned, _, replace) = resource
        .plan_update(
            &mut diags,
            refreshed.clone(),
            refreshed.clone(),
            refreshed.clone(),
            private,
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(replace.is_empty(), "{replace:?}");
    assert_eq!(planned, refreshed);
}

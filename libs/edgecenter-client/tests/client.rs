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

use std::time::Duration;

use edgecenter_client::cloud::network::CreateNetwork;
use edgecenter_client::{
    Client, ClientConfig, Credentials, Error, Location, TaskResults, TaskState,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> Client {
    let mut config = ClientConfig::new(Credentials::ApiToken("token".into()));
    config.cloud_api = server.uri();
    config.poll_interval = Duration::from_millis(10);
    Client::connect(config).await.unwrap()
}

fn task(id: &str, state: &str) -> serde_json::Value {
    json!({
        "id": id,
        "state": state,
        "created_resources": {"networks": ["net-1"]},
        "error": if state == "ERROR" { json!("quota exceeded") } else { json!(null) },
    })
}

#[tokio::test]
async fn sends_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .and(header("authorization", "APIKey token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{"id": 1, "name": "default"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let projects = client(&server).await.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "default");
}

#[tokio::test]
async fn password_credentials_log_in_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/iam/auth/jwt/login"))
        .and(body_json(json!({"username": "user", "password": "pass"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "jwt", "refresh": "r"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cloud/v1/regions"))
        .and(header("authorization", "Bearer jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{"id": 8, "display_name": "Luxembourg"}]
        })))
        .mount(&server)
        .await;

    let mut config = ClientConfig::new(Credentials::Password {
        user_name: "user".into(),
        password: "pass".into(),
    });
    config.platform_api = format!("{}/iam", server.uri());
    config.cloud_api = format!("{}/cloud", server.uri());
    let client = Client::connect(config).await.unwrap();

    let regions = client.list_regions().await.unwrap();
    assert_eq!(regions[0].id, 8);
}

#[tokio::test]
async fn maps_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/networks/1/2/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such network"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/networks/1/2/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let location = Location::new(1, 2);

    let err = client.get_network(&location, "missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "not found: no such network");

    match client.get_network(&location, "broken").await.unwrap_err() {
        Error::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "internal");
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[tokio::test]
async fn waits_for_created_resource() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/networks/1/2"))
        .and(body_json(json!({"name": "net", "type": "vxlan", "create_router": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": ["t1"]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("t1", "RUNNING")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("t1", "FINISHED")))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let location = Location::new(1, 2);
    let results = client
        .create_network(
            &location,
            &CreateNetwork {
                name: "net".into(),
                r#type: Some("vxlan".into()),
                create_router: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let id = client
        .wait_for_created(&results, "networks", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(id, "net-1");
}

#[tokio::test]
async fn failed_task_reports_its_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("t2", "ERROR")))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .wait_for_task("t2", Duration::from_secs(5))
        .await
        .unwrap_err();
    match err {
        Error::Task { id, message } => {
            assert_eq!(id, "t2");
            assert_eq!(message, "quota exceeded");
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[tokio::test]
async fn task_poll_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/t3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task("t3", "RUNNING")))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .wait_for_task("t3", Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TaskTimeout { ref id, .. } if id == "t3"));
}

#[tokio::test]
async fn finished_task_without_resource_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/t4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "t4", "state": "FINISHED"})),
        )
        .mount(&server)
        .await;

    let client = client(&server).await;
    let task = client
        .wait_for_task("t4", Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(task.state, TaskState::Finished);

    let results: TaskResults = serde_json::from_value(json!({"tasks": ["t4"]})).unwrap();
    let err = client
        .wait_for_created(&results, "networks", Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingResource { .. }));
}

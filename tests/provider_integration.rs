//! Integration tests for the provider using wiremock
//!
//! Each test mounts the JSON:API endpoints of one or more services and checks
//! the exact requests the provider sends and the shapes it hands back.

use microservices_jsonapi::{
    CreateParams, DataProvider, DeleteManyParams, DeleteParams, Error, GetListParams,
    GetManyParams, GetManyReferenceParams, GetOneParams, Id, MicroServiceConfig,
    MicroServicesProvider, ReqwestClient, SortOrder, UpdateManyBody, UpdateManyParams,
    UpdateParams,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn provider_for(server: &MockServer) -> MicroServicesProvider {
    let config = MicroServiceConfig::new([
        ("posts", format!("{}/posts", server.uri())),
        ("comments", format!("{}/comments", server.uri())),
    ])
    .expect("valid config");
    MicroServicesProvider::with_default_client(config).expect("client should build")
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

fn query_pairs(request: &Request) -> BTreeMap<String, Vec<String>> {
    let mut pairs: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in request.url.query_pairs() {
        pairs.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    pairs
}

fn collection(items: Value, count: u64) -> Value {
    json!({"data": items, "meta": {"count": count}})
}

/// Test module for read operations
mod read_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_list_pagination_only() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("page[number]", "2"))
            .and(query_param("page[size]", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection(
                json!([
                    {"id": 1, "type": "posts", "attributes": {"title": "A"}},
                    {"id": 2, "type": "posts", "attributes": {"title": "B"}}
                ]),
                42,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .get_list("posts", GetListParams::new(2, 5))
            .await
            .expect("list should succeed");

        assert_eq!(result.total, 42);
        assert_eq!(result.data.len(), 2);
        assert_eq!(
            Value::Object(result.data[0].clone().into_inner()),
            json!({"id": 1, "title": "A"})
        );

        let requests = server.received_requests().await.unwrap();
        let pairs = query_pairs(&requests[0]);
        let keys: Vec<&str> = pairs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["page[number]", "page[size]"]);
    }

    #[tokio::test]
    async fn test_get_list_filters_and_sort() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection(json!([]), 0)))
            .mount(&server)
            .await;

        let params = GetListParams::new(1, 10)
            .filter("status", "published")
            .filter("authorId", 3)
            .sort("title", SortOrder::Desc);
        let result = provider_for(&server).get_list("posts", params).await.unwrap();
        assert_eq!(result.total, 0);
        assert!(result.data.is_empty());

        let requests = server.received_requests().await.unwrap();
        let pairs = query_pairs(&requests[0]);
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs["filter[status]"], vec!["published"]);
        assert_eq!(pairs["filter[authorId]"], vec!["3"]);
        assert_eq!(pairs["sort"], vec!["-title"]);
    }

    #[tokio::test]
    async fn test_get_list_ascending_sort_is_bare() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("sort", "title"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection(json!([]), 0)))
            .expect(1)
            .mount(&server)
            .await;

        provider_for(&server)
            .get_list("posts", GetListParams::new(1, 10).sort("title", SortOrder::Asc))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_one() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts/123"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": 123, "type": "posts", "attributes": {"title": "Hello", "views": 10}}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let first = provider.get_one("posts", GetOneParams::new(123)).await.unwrap();
        let second = provider.get_one("posts", GetOneParams::new(123)).await.unwrap();

        assert_eq!(first.data.id(), Some(Id::Int(123)));
        assert_eq!(first.data.get("title"), Some(&json!("Hello")));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_one_string_id_without_attributes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts/abc-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "abc-1"}})),
            )
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .get_one("posts", GetOneParams::new("abc-1"))
            .await
            .unwrap();
        assert_eq!(Value::Object(result.data.into_inner()), json!({"id": "abc-1"}));
    }

    #[tokio::test]
    async fn test_get_many_uses_in_filter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("filter[id]", "in:1,2,3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection(
                json!([
                    {"id": 1, "attributes": {"title": "A"}},
                    {"id": 2, "attributes": {"title": "B"}},
                    {"id": 3, "attributes": {"title": "C"}}
                ]),
                3,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .get_many("posts", GetManyParams::new([1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(result.total, 3);
        let ids: Vec<Option<Id>> = result.data.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![Some(Id::Int(1)), Some(Id::Int(2)), Some(Id::Int(3))]);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(query_pairs(&requests[0]).len(), 1);
    }

    #[tokio::test]
    async fn test_get_many_reference_adds_target_filter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/comments"))
            .and(query_param("filter[postId]", "7"))
            .and(query_param("filter[approved]", "true"))
            .and(query_param("page[number]", "1"))
            .and(query_param("page[size]", "20"))
            .and(query_param("sort", "-createdAt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection(
                json!([{"id": 11, "attributes": {"postId": 7, "body": "nice"}}]),
                1,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let params = GetManyReferenceParams::new("postId", 7)
            .paginate(1, 20)
            .filter("approved", true)
            .sort("createdAt", SortOrder::Desc);
        let result = provider_for(&server)
            .get_many_reference("comments", params)
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.data[0].get("body"), Some(&json!("nice")));
    }

    #[tokio::test]
    async fn test_resources_route_to_their_own_services() {
        let posts = MockServer::start().await;
        let comments = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/posts/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 1}})))
            .expect(1)
            .mount(&posts)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/comments/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 1}})))
            .expect(1)
            .mount(&comments)
            .await;

        let config = MicroServiceConfig::new([
            ("posts", format!("{}/v1/posts", posts.uri())),
            ("comments", format!("{}/v2/comments", comments.uri())),
        ])
        .unwrap();
        let provider = MicroServicesProvider::with_default_client(config).unwrap();

        provider.get_one("posts", GetOneParams::new(1)).await.unwrap();
        provider.get_one("comments", GetOneParams::new(1)).await.unwrap();
    }
}

/// Test module for write operations
mod write_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_wraps_in_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"data": {"type": "posts", "attributes": {"title": "A"}}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": 99, "type": "posts", "attributes": {"title": "A"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .create("posts", CreateParams::new(object(json!({"title": "A"}))))
            .await
            .unwrap();

        assert_eq!(
            Value::Object(result.data.into_inner()),
            json!({"id": 99, "title": "A"})
        );
    }

    #[tokio::test]
    async fn test_update_patches_with_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/posts/5"))
            .and(body_json(json!({
                "data": {"id": 5, "type": "posts", "attributes": {"title": "B"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": 5, "type": "posts", "attributes": {"title": "B", "views": 1}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .update("posts", UpdateParams::new(5, object(json!({"title": "B"}))))
            .await
            .unwrap();

        assert_eq!(result.data.get("views"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_update_many_envelope_by_default() {
        let server = MockServer::start().await;

        for id in [1, 2] {
            Mock::given(method("PATCH"))
                .and(path(format!("/posts/{}", id)))
                .and(body_json(json!({
                    "data": {"id": id, "type": "posts", "attributes": {"published": true}}
                })))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"data": {"id": id}})),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let result = provider_for(&server)
            .update_many(
                "posts",
                UpdateManyParams::new([1, 2], object(json!({"published": true}))),
            )
            .await
            .unwrap();

        assert_eq!(result.data, vec![Id::Int(1), Id::Int(2)]);
    }

    #[tokio::test]
    async fn test_update_many_raw_body() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/posts/3"))
            .and(body_json(json!({"published": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 3}})))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .with_update_many_body(UpdateManyBody::Raw)
            .update_many(
                "posts",
                UpdateManyParams::new([3], object(json!({"published": false}))),
            )
            .await
            .unwrap();

        assert_eq!(result.data, vec![Id::Int(3)]);
    }

    #[tokio::test]
    async fn test_delete_takes_id_from_response() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/posts/8"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "8"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .delete("posts", DeleteParams::new(8))
            .await
            .unwrap();

        assert_eq!(result.data.id, Id::from("8"));
        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_delete_many_issues_one_request_per_id() {
        let server = MockServer::start().await;

        for id in [4, 5, 6] {
            Mock::given(method("DELETE"))
                .and(path(format!("/posts/{}", id)))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"data": {"id": id}})),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let result = provider_for(&server)
            .delete_many("posts", DeleteManyParams::new([4, 5, 6]))
            .await
            .unwrap();

        assert_eq!(result.data, vec![Id::Int(4), Id::Int(5), Id::Int(6)]);
    }

    #[tokio::test]
    async fn test_delete_many_empty_ids_sends_nothing() {
        let server = MockServer::start().await;

        let result = provider_for(&server)
            .delete_many("posts", DeleteManyParams::default())
            .await
            .unwrap();

        assert!(result.data.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

/// Test module for failure propagation
mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_many_fails_when_one_request_fails() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/posts/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 1}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/posts/2"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .delete_many("posts", DeleteManyParams::new([1, 2]))
            .await;

        match result {
            Err(Error::Status { status, .. }) => assert_eq!(status, 500),
            other => panic!("expected status error, got {:?}", other),
        }
        // the successful sibling request still reached the server
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_many_fails_on_first_failure() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/posts/1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/posts/2"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .update_many("posts", UpdateManyParams::new([1, 2], Map::new()))
            .await;

        assert_eq!(result.err().and_then(|e| e.status()), Some(404));
    }

    #[tokio::test]
    async fn test_status_error_propagates_unchanged() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts/404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "errors": [{"status": "404", "title": "Not Found"}]
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .get_one("posts", GetOneParams::new(404))
            .await
            .unwrap_err();

        match err {
            Error::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_resource_sends_no_request() {
        let server = MockServer::start().await;

        let err = provider_for(&server)
            .get_list("tags", GetListParams::new(1, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnknownResource(ref name) if name == "tags"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_meta_count_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .get_list("posts", GetListParams::new(1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_empty_delete_body_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/posts/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .delete("posts", DeleteParams::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .get_one("posts", GetOneParams::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_default_headers_are_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts/1"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 1}})))
            .expect(1)
            .mount(&server)
            .await;

        let config =
            MicroServiceConfig::new([("posts", format!("{}/posts", server.uri()))]).unwrap();
        let client = ReqwestClient::builder()
            .default_header("X-Api-Key", "secret")
            .build()
            .unwrap();
        let provider = MicroServicesProvider::new(config, client);

        provider.get_one("posts", GetOneParams::new(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_default_headers_replace_json_headers() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/posts"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 9}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config =
            MicroServiceConfig::new([("posts", format!("{}/posts", server.uri()))]).unwrap();
        let client = ReqwestClient::builder()
            .default_header("Content-Type", "application/vnd.api+json")
            .default_header("Accept", "application/vnd.api+json")
            .build()
            .unwrap();
        let provider = MicroServicesProvider::new(config, client);

        provider
            .create("posts", CreateParams::new(object(json!({"title": "A"}))))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        for name in ["content-type", "accept"] {
            let values: Vec<_> = requests[0].headers.get_all(name).iter().collect();
            assert_eq!(values.len(), 1, "duplicate {} header", name);
            assert_eq!(values[0], "application/vnd.api+json");
        }
    }
}

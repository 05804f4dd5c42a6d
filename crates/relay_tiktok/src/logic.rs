// --- File: crates/relay_tiktok/src/logic.rs ---
//! The TikTok endpoint table, the client-side helpers around it, and the
//! one computed reshape in this integration (engagement arithmetic).

use http::Method;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use tracing::debug;

use relay_common::{
    validation_error, ApiClient, AuthScheme, BodyKind, CredentialSpec, EndpointSpec,
    IntegrationSpec, ParamLocation, ParamSpec, RelayError,
};

/// TikTok integration table. Routes mirror the upstream resource paths
/// under the `/api/tiktok` mount.
pub static TIKTOK: IntegrationSpec = IntegrationSpec {
    name: "tiktok",
    base_url: "https://open.tiktokapis.com/v2",
    auth: AuthScheme::Bearer {
        cred: "access_token",
    },
    credentials: &[CredentialSpec::required(
        "access_token",
        "x-tiktok-access-token",
        "TIKTOK_ACCESS_TOKEN",
    )],
    endpoints: &[
        EndpointSpec {
            name: "user_info",
            method: Method::GET,
            path: "/user/info/",
            params: &[ParamSpec::comma_list("fields", ParamLocation::Query, true)],
            body: BodyKind::Empty,
            response_key: "user",
            response_pick: Some("/data/user"),
        },
        EndpointSpec {
            name: "list_videos",
            method: Method::POST,
            path: "/video/list/",
            params: &[
                ParamSpec::optional("max_count", ParamLocation::Body),
                ParamSpec::optional("cursor", ParamLocation::Body),
            ],
            body: BodyKind::Json,
            response_key: "videos",
            response_pick: Some("/data"),
        },
        EndpointSpec {
            name: "query_videos",
            method: Method::POST,
            path: "/video/query/",
            params: &[
                ParamSpec::required("video_ids", ParamLocation::Body),
                ParamSpec::comma_list("fields", ParamLocation::Query, false),
            ],
            body: BodyKind::Json,
            response_key: "videos",
            response_pick: Some("/data/videos"),
        },
        EndpointSpec {
            name: "delete_video",
            method: Method::POST,
            path: "/video/delete/",
            params: &[ParamSpec::required("video_id", ParamLocation::Body)],
            body: BodyKind::Json,
            response_key: "result",
            response_pick: None,
        },
        EndpointSpec {
            name: "publish_post",
            method: Method::POST,
            path: "/post/publish/text/",
            params: &[
                ParamSpec::required("title", ParamLocation::Body),
                ParamSpec::required("text", ParamLocation::Body),
                ParamSpec::optional("privacy_level", ParamLocation::Body),
            ],
            body: BodyKind::Json,
            response_key: "publish",
            response_pick: Some("/data"),
        },
    ],
};

/// TikTok client: the generic dispatcher plus a lazily fetched, per-client
/// memoized `open_id`. A fresh client is built per request, so the
/// memoization only saves repeat lookups within one request.
pub struct TikTokClient {
    api: ApiClient,
    open_id: OnceCell<String>,
}

impl TikTokClient {
    pub fn new(api: ApiClient) -> Self {
        TikTokClient {
            api,
            open_id: OnceCell::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn endpoint(&self, name: &str) -> Result<&'static EndpointSpec, RelayError> {
        TIKTOK
            .endpoint(name)
            .ok_or_else(|| relay_common::internal_error(format!("unknown endpoint {}", name)))
    }

    /// The authenticated user's open id, fetched once per client.
    pub async fn open_id(&self) -> Result<&str, RelayError> {
        let id = self
            .open_id
            .get_or_try_init(|| async {
                let ep = self.endpoint("user_info")?;
                let user = self.api.call(ep, &args(json!({"fields": ["open_id"]}))).await?;
                user.get("open_id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        RelayError::Parse("user info response missing open_id".to_string())
                    })
            })
            .await?;
        Ok(id.as_str())
    }

    pub async fn delete_video(&self, video_id: &str) -> Result<Value, RelayError> {
        let ep = self.endpoint("delete_video")?;
        self.api.call(ep, &args(json!({"video_id": video_id}))).await
    }

    /// Deletes many videos concurrently, fail-fast: one failed deletion
    /// fails the whole batch and no partial results are returned.
    pub async fn batch_delete_videos(
        &self,
        video_ids: &[String],
    ) -> Result<Vec<Value>, RelayError> {
        let ep = self.endpoint("delete_video")?;
        let arg_sets = video_ids
            .iter()
            .map(|id| args(json!({"video_id": id})))
            .collect();
        self.api.call_batch(ep, arg_sets).await
    }

    /// Recent-video summary for the authenticated creator: identity plus
    /// aggregate engagement over the latest videos.
    pub async fn creator_summary(&self) -> Result<Value, RelayError> {
        let open_id = self.open_id().await?.to_string();
        let ep = self.endpoint("list_videos")?;
        let page = self.api.call(ep, &args(json!({"max_count": 20}))).await?;

        let videos = page
            .get("videos")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let count = |v: &Value, field: &str| v.get(field).and_then(Value::as_u64).unwrap_or(0);
        let (mut likes, mut comments, mut shares, mut views) = (0u64, 0u64, 0u64, 0u64);
        for video in &videos {
            likes += count(video, "like_count");
            comments += count(video, "comment_count");
            shares += count(video, "share_count");
            views += count(video, "view_count");
        }
        debug!(open_id = %open_id, videos = videos.len(), "computed creator summary");

        let engagement = match engagement_stats(likes, comments, shares, views) {
            Ok(stats) => serde_json::to_value(stats)?,
            // A creator with zero views has no rate, not an error.
            Err(_) => Value::Null,
        };
        Ok(json!({
            "open_id": open_id,
            "video_count": videos.len(),
            "engagement": engagement,
        }))
    }
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Engagement metrics computed from raw counters.
#[derive(Debug, Serialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EngagementStats {
    pub total_engagement: u64,
    pub views: u64,
    /// Percentage with two decimals, e.g. `"16.67%"`.
    pub engagement_rate: String,
}

/// The one computed reshape: likes + comments + shares over views.
pub fn engagement_stats(
    likes: u64,
    comments: u64,
    shares: u64,
    views: u64,
) -> Result<EngagementStats, RelayError> {
    if views == 0 {
        return Err(validation_error("views must be greater than zero"));
    }
    let total_engagement = likes + comments + shares;
    let rate = (total_engagement as f64 / views as f64) * 100.0;
    Ok(EngagementStats {
        total_engagement,
        views,
        engagement_rate: format!("{:.2}%", rate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_common::CredentialBundle;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TikTokClient {
        TikTokClient::new(ApiClient::new(
            &TIKTOK,
            reqwest::Client::new(),
            server.uri(),
            CredentialBundle::from_values([("access_token", "tok".to_string())]),
        ))
    }

    #[test]
    fn engagement_rate_has_two_decimals() {
        let stats = engagement_stats(50, 30, 20, 600).unwrap();
        assert_eq!(
            stats,
            EngagementStats {
                total_engagement: 100,
                views: 600,
                engagement_rate: "16.67%".to_string(),
            }
        );
    }

    #[test]
    fn zero_views_is_rejected_not_a_nan() {
        let err = engagement_stats(1, 1, 1, 0).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[tokio::test]
    async fn open_id_is_fetched_once_per_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/info/"))
            .and(query_param("fields", "open_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"user": {"open_id": "user-123"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.open_id().await.unwrap(), "user-123");
        // Second lookup is served from the instance memo, not the wire.
        assert_eq!(client.open_id().await.unwrap(), "user-123");
    }

    #[tokio::test]
    async fn batch_delete_is_fail_fast() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/video/delete/"))
            .and(body_json(serde_json::json!({"video_id": "v1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {}, "error": {"code": "ok"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/video/delete/"))
            .and(body_json(serde_json::json!({"video_id": "v2"})))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"message": "video not owned by user"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .batch_delete_videos(&["v1".to_string(), "v2".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Upstream { status: 403, .. }));
    }

    #[tokio::test]
    async fn creator_summary_aggregates_recent_videos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/info/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"user": {"open_id": "user-123"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/video/list/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"videos": [
                    {"like_count": 50, "comment_count": 30, "share_count": 20, "view_count": 400},
                    {"like_count": 0, "comment_count": 0, "share_count": 0, "view_count": 200}
                ], "cursor": 2, "has_more": false}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let summary = client.creator_summary().await.unwrap();
        assert_eq!(summary["open_id"], serde_json::json!("user-123"));
        assert_eq!(summary["video_count"], serde_json::json!(2));
        assert_eq!(
            summary["engagement"]["engagement_rate"],
            serde_json::json!("16.67%")
        );
    }
}

//! Blocking HTTPS implementation of the [`Gateway`] trait.
//!
//! Every request is a GraphQL POST with the bearer token injected in the
//! `Authorization` header. The client carries one outer timeout; expiry maps
//! to [`GatewayError::Timeout`] and follows the applier's cancellation path.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use hnsync_core::{PostId, PublicationId};

use crate::error::GatewayError;
use crate::types::{
    CreateSeriesInput, CreatedPost, PublicationPage, PublicationSummary, PublishPostInput,
    RemotePost, RemoteSeries, UpdatePostInput, UserIdentity,
};
use crate::{Gateway, MAX_PAGE_SIZE};

/// Production GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://gql.hashnode.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated blocking client for the publishing API.
pub struct HttpGateway {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: String,
}

impl HttpGateway {
    pub fn new(token: String) -> Result<Self, GatewayError> {
        Self::with_endpoint(token, DEFAULT_ENDPOINT.to_owned())
    }

    /// Point the gateway at a non-default endpoint (tests, staging).
    pub fn with_endpoint(token: String, endpoint: String) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, GatewayError> {
        tracing::debug!("graphql request: {operation}");
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()?;

        let envelope: GraphQlResponse<T> = response.json()?;
        if let Some(errors) = envelope.errors {
            if let Some(first) = errors.into_iter().next() {
                return Err(GatewayError::Api {
                    message: first.message,
                });
            }
        }
        envelope
            .data
            .ok_or(GatewayError::MissingData { operation })
    }
}

impl Gateway for HttpGateway {
    fn me(&self) -> Result<UserIdentity, GatewayError> {
        let data: MeData = self.execute("Me", ME_QUERY, json!({}))?;
        Ok(UserIdentity {
            username: data.me.username,
            publications: data
                .me
                .publications
                .edges
                .into_iter()
                .map(|edge| PublicationSummary {
                    id: edge.node.id,
                    slug: edge.node.url,
                    title: edge.node.title,
                })
                .collect(),
        })
    }

    fn publication_page(
        &self,
        publication: &PublicationId,
        first: usize,
        after: Option<&str>,
    ) -> Result<PublicationPage, GatewayError> {
        let first = first.min(MAX_PAGE_SIZE);
        let data: PublicationData = self.execute(
            "Publication",
            PUBLICATION_QUERY,
            json!({ "id": publication.0, "first": first, "after": after }),
        )?;
        let body = data
            .publication
            .ok_or(GatewayError::MissingData { operation: "Publication" })?;

        Ok(PublicationPage {
            posts: body
                .posts
                .edges
                .into_iter()
                .map(|edge| RemotePost {
                    id: edge.node.id,
                    slug: edge.node.slug,
                    title: edge.node.title,
                    markdown: edge.node.content.markdown,
                    published_at: edge.node.published_at,
                })
                .collect(),
            series: body
                .series_list
                .edges
                .into_iter()
                .map(|edge| RemoteSeries {
                    id: edge.node.id,
                    name: edge.node.name,
                    slug: edge.node.slug,
                })
                .collect(),
            has_next_page: body.posts.page_info.has_next_page.unwrap_or(false),
            end_cursor: body.posts.page_info.end_cursor,
        })
    }

    fn publish_post(&self, input: &PublishPostInput) -> Result<CreatedPost, GatewayError> {
        let data: PublishData = self.execute(
            "PublishPost",
            PUBLISH_POST_MUTATION,
            json!({ "input": input }),
        )?;
        Ok(data.publish_post.post)
    }

    fn update_post(&self, input: &UpdatePostInput) -> Result<(), GatewayError> {
        let _: UpdateData = self.execute(
            "UpdatePost",
            UPDATE_POST_MUTATION,
            json!({ "input": input }),
        )?;
        Ok(())
    }

    fn remove_post(&self, id: &PostId) -> Result<(), GatewayError> {
        let _: RemoveData = self.execute(
            "RemovePost",
            REMOVE_POST_MUTATION,
            json!({ "input": { "id": id.0 } }),
        )?;
        Ok(())
    }

    fn create_series(&self, input: &CreateSeriesInput) -> Result<RemoteSeries, GatewayError> {
        let data: CreateSeriesData = self.execute(
            "CreateSeries",
            CREATE_SERIES_MUTATION,
            json!({ "input": input }),
        )?;
        Ok(RemoteSeries {
            id: data.create_series.series.id,
            name: data.create_series.series.name,
            slug: data.create_series.series.slug,
        })
    }
}

// ---------------------------------------------------------------------------
// GraphQL documents
// ---------------------------------------------------------------------------

const ME_QUERY: &str = r#"
query Me {
  me {
    id
    username
    publications(first: 10) {
      edges { node { id title url } }
    }
  }
}"#;

const PUBLICATION_QUERY: &str = r#"
query Publication($id: ObjectId!, $first: Int!, $after: String) {
  publication(id: $id) {
    posts(first: $first, after: $after) {
      edges {
        node {
          id
          slug
          title
          publishedAt
          content { markdown }
        }
      }
      pageInfo { hasNextPage endCursor }
    }
    seriesList(first: 20) {
      edges { node { id name slug } }
    }
  }
}"#;

const PUBLISH_POST_MUTATION: &str = r#"
mutation PublishPost($input: PublishPostInput!) {
  publishPost(input: $input) {
    post { id slug }
  }
}"#;

const UPDATE_POST_MUTATION: &str = r#"
mutation UpdatePost($input: UpdatePostInput!) {
  updatePost(input: $input) {
    post { id }
  }
}"#;

const REMOVE_POST_MUTATION: &str = r#"
mutation RemovePost($input: RemovePostInput!) {
  removePost(input: $input) {
    post { id }
  }
}"#;

const CREATE_SERIES_MUTATION: &str = r#"
mutation CreateSeries($input: CreateSeriesInput!) {
  createSeries(input: $input) {
    series { id name slug }
  }
}"#;

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MeData {
    me: MeNode,
}

#[derive(Debug, Deserialize)]
struct MeNode {
    username: String,
    publications: Edges<PublicationNode>,
}

#[derive(Debug, Default, Deserialize)]
struct PublicationNode {
    id: PublicationId,
    title: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Edges<T> {
    #[serde(default)]
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct PublicationData {
    publication: Option<PublicationBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicationBody {
    posts: PostConnection,
    series_list: Edges<SeriesNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostConnection {
    #[serde(default)]
    edges: Vec<Edge<PostNode>>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostNode {
    id: PostId,
    slug: String,
    title: String,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    content: PostContent,
}

#[derive(Debug, Deserialize)]
struct PostContent {
    markdown: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: Option<bool>,
    end_cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SeriesNode {
    id: hnsync_core::SeriesId,
    name: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishData {
    publish_post: PublishPostPayload,
}

#[derive(Debug, Deserialize)]
struct PublishPostPayload {
    post: CreatedPost,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateData {
    #[allow(dead_code)]
    update_post: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveData {
    #[allow(dead_code)]
    remove_post: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSeriesData {
    create_series: CreateSeriesPayload,
}

#[derive(Debug, Deserialize)]
struct CreateSeriesPayload {
    series: SeriesNode,
}

// ---------------------------------------------------------------------------
// Tests (wire decoding; no network)
// ---------------------------------------------------------------------------

//! Typed inputs and outputs for the GraphQL operations.
//!
//! Input structs serialize directly into GraphQL variables (camelCase,
//! `None` fields omitted), mirroring the service's input object types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hnsync_core::{PostId, PublicationId, SeriesId};

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// A publication the authenticated user can publish to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicationSummary {
    pub id: PublicationId,
    pub slug: String,
    pub title: String,
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub username: String,
    pub publications: Vec<PublicationSummary>,
}

/// A post as returned by the publication query (bootstrap/import path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePost {
    pub id: PostId,
    pub slug: String,
    pub title: String,
    pub markdown: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// A series as returned by the publication query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSeries {
    pub id: SeriesId,
    pub name: String,
    pub slug: String,
}

/// One page of a publication's posts, with cursor continuation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationPage {
    pub posts: Vec<RemotePost>,
    pub series: Vec<RemoteSeries>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// The identity of a freshly published post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPost {
    pub id: PostId,
    pub slug: String,
}

// ---------------------------------------------------------------------------
// Mutation inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPostTagInput {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImageOptionsInput {
    #[serde(rename = "coverImageURL", skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerImageOptionsInput {
    #[serde(rename = "bannerImageURL")]
    pub banner_image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTagsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Settings accepted by the publish mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPostSettingsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_table_of_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_newsletter_activated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delisted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug_overridden: Option<bool>,
}

/// Settings accepted by the update mutation (a different input type remotely).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostSettingsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_table_of_content_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delisted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_comments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_to_blog: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPostInput {
    pub publication_id: PublicationId,
    pub title: String,
    pub content_markdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(rename = "originalArticleURL", skip_serializing_if = "Option::is_none")]
    pub original_article_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<PublishPostTagInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_options: Option<CoverImageOptionsInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image_options: Option<BannerImageOptionsInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_tags: Option<MetaTagsInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_comments: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub co_authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<PublishPostSettingsInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    pub id: PostId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(rename = "originalArticleURL", skip_serializing_if = "Option::is_none")]
    pub original_article_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<PublishPostTagInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_options: Option<CoverImageOptionsInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image_options: Option<BannerImageOptionsInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_tags: Option<MetaTagsInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub co_authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<UpdatePostSettingsInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeriesInput {
    pub publication_id: PublicationId,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_markdown: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

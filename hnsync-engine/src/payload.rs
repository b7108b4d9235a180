//! Mapping from parsed front matter to remote mutation inputs.
//!
//! A `slug` in front matter implies the slug-overridden setting unless the
//! author set `slug_overridden` explicitly. Series names resolve against the
//! ledger series table; an unknown name leaves the series untouched rather
//! than guessing.

use hnsync_core::frontmatter::FrontMatter;
use hnsync_core::slug::tag_slug;
use hnsync_core::{Ledger, PostId, PublicationId};
use hnsync_gateway::types::{
    BannerImageOptionsInput, CoverImageOptionsInput, MetaTagsInput, PublishPostInput,
    PublishPostSettingsInput, PublishPostTagInput, UpdatePostInput, UpdatePostSettingsInput,
};

/// Build the publish mutation input for a create action.
pub fn publish_input(
    publication_id: &PublicationId,
    title: String,
    body: String,
    fm: Option<&FrontMatter>,
    ledger: &Ledger,
) -> PublishPostInput {
    let mut input = PublishPostInput {
        publication_id: publication_id.clone(),
        title,
        content_markdown: body,
        ..Default::default()
    };
    let Some(fm) = fm else {
        return input;
    };

    input.subtitle = fm.subtitle.clone();
    input.slug = fm.slug.clone();
    input.original_article_url = fm.canonical.clone();
    input.published_at = fm.published_at;
    input.disable_comments = fm.disable_comments;
    input.tags = tag_inputs(&fm.tags);
    input.co_authors = fm.co_authors.clone();
    input.cover_image_options = cover_options(fm);
    input.banner_image_options = banner_options(fm);
    input.meta_tags = meta_tags(fm);
    input.series_id = fm
        .series
        .as_deref()
        .and_then(|name| ledger.resolve_series(name))
        .map(|series| series.id.clone());

    let slug_overridden = fm.slug_overridden.or(fm.slug.as_ref().map(|_| true));
    if fm.toc.is_some()
        || fm.newsletter.is_some()
        || fm.delisted.is_some()
        || fm.scheduled.is_some()
        || slug_overridden.is_some()
    {
        input.settings = Some(PublishPostSettingsInput {
            enable_table_of_content: fm.toc,
            is_newsletter_activated: fm.newsletter,
            delisted: fm.delisted,
            scheduled: fm.scheduled,
            slug_overridden,
        });
    }

    input
}

/// Build the update mutation input for an update action.
pub fn update_input(
    id: &PostId,
    title: Option<String>,
    body: String,
    fm: Option<&FrontMatter>,
    ledger: &Ledger,
) -> UpdatePostInput {
    let mut input = UpdatePostInput {
        id: id.clone(),
        title,
        content_markdown: Some(body),
        ..Default::default()
    };
    let Some(fm) = fm else {
        return input;
    };

    input.subtitle = fm.subtitle.clone();
    input.slug = fm.slug.clone();
    input.original_article_url = fm.canonical.clone();
    input.published_at = fm.published_at;
    input.tags = tag_inputs(&fm.tags);
    input.co_authors = fm.co_authors.clone();
    input.cover_image_options = cover_options(fm);
    input.banner_image_options = banner_options(fm);
    input.meta_tags = meta_tags(fm);
    input.series_id = fm
        .series
        .as_deref()
        .and_then(|name| ledger.resolve_series(name))
        .map(|series| series.id.clone());

    if fm.toc.is_some()
        || fm.delisted.is_some()
        || fm.disable_comments.is_some()
        || fm.pin_to_blog.is_some()
    {
        input.settings = Some(UpdatePostSettingsInput {
            is_table_of_content_enabled: fm.toc,
            delisted: fm.delisted,
            disable_comments: fm.disable_comments,
            pin_to_blog: fm.pin_to_blog,
        });
    }

    input
}

fn tag_inputs(tags: &[String]) -> Vec<PublishPostTagInput> {
    tags.iter()
        .filter_map(|tag| {
            let name = tag.trim();
            if name.is_empty() {
                return None;
            }
            Some(PublishPostTagInput {
                name: name.to_owned(),
                slug: tag_slug(name),
            })
        })
        .collect()
}

fn cover_options(fm: &FrontMatter) -> Option<CoverImageOptionsInput> {
    fm.cover_image_url.as_ref().map(|url| CoverImageOptionsInput {
        cover_image_url: Some(url.clone()),
    })
}

fn banner_options(fm: &FrontMatter) -> Option<BannerImageOptionsInput> {
    fm.banner_image_url.as_ref().map(|url| BannerImageOptionsInput {
        banner_image_url: url.clone(),
    })
}

fn meta_tags(fm: &FrontMatter) -> Option<MetaTagsInput> {
    if fm.meta_title.is_none() && fm.meta_description.is_none() && fm.meta_image.is_none() {
        return None;
    }
    Some(MetaTagsInput {
        title: fm.meta_title.clone(),
        description: fm.meta_description.clone(),
        image: fm.meta_image.clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

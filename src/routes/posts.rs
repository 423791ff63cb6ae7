//! Post Endpoints
//!
//! `visibleToTiers`가 비어 있지 않은 게시물은 잠긴 상태로 내려간다.
//! 크리에이터 본인, 또는 해당 티어의 유효한 구독자만 내용을 볼 수 있다.

use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{NewPost, Post, SubscriptionStatus},
    error::ApiError,
    routes::extract::{AppJson, AuthUser},
    types::{normalize_address, Success},
    AppState,
};

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub visible_to_tiers: Option<Vec<Uuid>>,
    pub attachments: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub post: Post,
}

/// 조회용 게시물 (잠긴 경우 content / attachments 비움)
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub locked: bool,
}

// ============ Handlers ============

/// POST /creator/post
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreatePostRequest>,
) -> Result<Json<Success<CreatePostResponse>>, ApiError> {
    let (Some(title), Some(content)) = (req.title, req.content) else {
        return Err(ApiError::ValidationError("title and content are required".to_string()));
    };
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(ApiError::ValidationError("title and content are required".to_string()));
    }

    let profile = state
        .db
        .find_profile_by_address(&user.address)
        .await?
        .ok_or_else(|| ApiError::NotFound("Creator profile".to_string()))?;

    let visible_to_tiers = req.visible_to_tiers.unwrap_or_default();
    if !visible_to_tiers.is_empty() {
        let own: HashSet<Uuid> = state
            .db
            .find_tiers_by_creator(profile.id)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        if let Some(unknown) = visible_to_tiers.iter().find(|id| !own.contains(id)) {
            return Err(ApiError::ValidationError(format!(
                "visibleToTiers contains unknown tier {}",
                unknown
            )));
        }
    }

    let post = state
        .db
        .insert_post(NewPost {
            creator: profile.id,
            title: title.trim().to_string(),
            content,
            visible_to_tiers,
            attachments: req.attachments.unwrap_or_default(),
        })
        .await?;

    tracing::info!(creator = %user.address, post = %post.id, "post created");
    Ok(Json(Success::new(CreatePostResponse { post })))
}

/// GET /creator/posts/:address
///
/// 토큰은 선택. 없거나 유효하지 않으면 익명 조회로 처리한다.
pub async fn get_creator_posts(
    State(state): State<AppState>,
    Path(address): Path<String>,
    viewer: Option<AuthUser>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let Some(address) = normalize_address(&address) else {
        return Ok(Json(vec![]));
    };
    let Some(profile) = state.db.find_profile_by_address(&address).await? else {
        return Ok(Json(vec![]));
    };

    let is_owner = viewer.as_ref().map_or(false, |v| v.owns(&profile.address));

    let unlocked_tiers: HashSet<Uuid> = match &viewer {
        Some(viewer) if !is_owner => {
            let now = Utc::now();
            state
                .db
                .find_subscriptions_by_subscriber(&viewer.address)
                .await?
                .into_iter()
                .filter(|s| s.creator == profile.id && s.status == SubscriptionStatus::Active)
                .filter(|s| s.end_date.map_or(true, |end| end > now))
                .map(|s| s.tier)
                .collect()
        }
        _ => HashSet::new(),
    };

    let posts = state.db.find_posts_by_creator(profile.id).await?;
    let views = posts
        .into_iter()
        .map(|post| {
            let locked = !is_visible(&post, is_owner, &unlocked_tiers);
            PostView {
                post: if locked { redact(post) } else { post },
                locked,
            }
        })
        .collect();

    Ok(Json(views))
}

// ============ Helpers ============

fn is_visible(post: &Post, is_owner: bool, unlocked_tiers: &HashSet<Uuid>) -> bool {
    is_owner
        || post.visible_to_tiers.is_empty()
        || post.visible_to_tiers.iter().any(|t| unlocked_tiers.contains(t))
}

fn redact(mut post: Post) -> Post {
    post.content.clear();
    post.attachments.clear();
    post
}

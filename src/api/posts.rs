//! Blog post admin endpoints
//!
//! - GET /api/admin/posts - paginated list, optionally filtered by status
//! - POST /api/admin/posts - save a new post from the full editor form
//! - GET /api/admin/posts/{id} - stored post and its editor form
//! - PUT /api/admin/posts/{id} - save an existing post from the editor form
//! - DELETE /api/admin/posts/{id} - delete (admins only)
//! - POST /api/admin/posts/{id}/publish | unpublish | archive | feature
//! - PUT /api/admin/posts/{id}/faqs - replace the FAQ list
//! - PUT /api/admin/posts/{id}/related - replace the related posts
//! - POST /api/admin/posts/editor - apply one editor action to a form
//! - GET /api/admin/posts/slug?title= - slug suggestion

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{AdminActor, ApiError, AppState};
use crate::models::{BlogFaq, BlogPost, FaqInput, ListParams, Locale, PagedResult, PostStatus};
use crate::services::editor::{FaqField, FormErrors};
use crate::services::{generate_slug, PostForm, SavedPost};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/editor", post(apply_editor_action))
        .route("/slug", get(suggest_slug))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/{id}/publish", post(publish_post))
        .route("/{id}/unpublish", post(unpublish_post))
        .route("/{id}/archive", post(archive_post))
        .route("/{id}/feature", post(toggle_featured))
        .route("/{id}/faqs", put(save_faqs))
        .route("/{id}/related", put(save_related))
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 { 1 }
fn default_per_page() -> u32 { 20 }

/// A stored post together with the form the editor opens with
#[derive(Debug, Serialize)]
pub struct PostEditorResponse {
    pub post: BlogPost,
    pub form: PostForm,
}

/// GET /api/admin/posts
async fn list_posts(
    State(state): State<AppState>,
    _admin: AdminActor,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PagedResult<BlogPost>>, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(s) => Some(
            PostStatus::from_str(s)
                .ok_or_else(|| ApiError::validation_error(format!("Unknown status: {}", s)))?,
        ),
    };

    let params = ListParams::new(query.page, query.per_page);
    let posts = state.blog_service.list_admin(status, &params).await?;
    Ok(Json(posts))
}

/// POST /api/admin/posts
async fn create_post(
    State(state): State<AppState>,
    admin: AdminActor,
    Json(form): Json<PostForm>,
) -> Result<(StatusCode, Json<SavedPost>), ApiError> {
    let saved = state.blog_service.save_post_with_faqs(None, form, &admin.actor).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/admin/posts/{id}
async fn get_post(
    State(state): State<AppState>,
    _admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<PostEditorResponse>, ApiError> {
    let post = state.blog_service.get_by_id(id).await?;
    let form = state.blog_service.editor_form(id).await?;
    Ok(Json(PostEditorResponse { post, form }))
}

/// PUT /api/admin/posts/{id}
async fn update_post(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
    Json(form): Json<PostForm>,
) -> Result<Json<SavedPost>, ApiError> {
    let saved = state.blog_service.save_post_with_faqs(Some(id), form, &admin.actor).await?;
    Ok(Json(saved))
}

/// DELETE /api/admin/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    admin.require_delete()?;
    state.blog_service.delete_post(id, &admin.actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn publish_post(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.publish(id, &admin.actor).await?))
}

async fn unpublish_post(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.unpublish(id, &admin.actor).await?))
}

async fn archive_post(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.archive(id, &admin.actor).await?))
}

async fn toggle_featured(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.toggle_featured(id, &admin.actor).await?))
}

/// PUT /api/admin/posts/{id}/faqs
async fn save_faqs(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
    Json(faqs): Json<Vec<FaqInput>>,
) -> Result<Json<Vec<BlogFaq>>, ApiError> {
    state.blog_service.get_by_id(id).await?;
    Ok(Json(state.blog_service.save_faqs(id, &faqs, &admin.actor).await?))
}

#[derive(Debug, Deserialize)]
pub struct RelatedPostsRequest {
    pub related_post_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct RelatedPostsResponse {
    pub related_post_ids: Vec<i64>,
}

/// PUT /api/admin/posts/{id}/related
///
/// The post itself and duplicates are dropped, and at most three ids are
/// kept.
async fn save_related(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
    Json(body): Json<RelatedPostsRequest>,
) -> Result<Json<RelatedPostsResponse>, ApiError> {
    state.blog_service.get_by_id(id).await?;
    let related_post_ids = state
        .blog_service
        .save_related(id, &body.related_post_ids, &admin.actor)
        .await?;
    Ok(Json(RelatedPostsResponse { related_post_ids }))
}

/// One edit made in the post editor
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorAction {
    GenerateSlug,
    AddTag { locale: Locale, value: String },
    RemoveTag { locale: Locale, value: String },
    AddKeyword { locale: Locale, value: String },
    RemoveKeyword { locale: Locale, value: String },
    AddFaq,
    UpdateFaq { index: usize, field: FaqField, value: String },
    RemoveFaq { index: usize },
    Validate,
}

impl EditorAction {
    pub fn apply(self, form: &mut PostForm) {
        match self {
            EditorAction::GenerateSlug => form.generate_slug(),
            EditorAction::AddTag { locale, value } => form.add_tag(locale, &value),
            EditorAction::RemoveTag { locale, value } => form.remove_tag(locale, &value),
            EditorAction::AddKeyword { locale, value } => form.add_keyword(locale, &value),
            EditorAction::RemoveKeyword { locale, value } => form.remove_keyword(locale, &value),
            EditorAction::AddFaq => form.add_faq(),
            EditorAction::UpdateFaq { index, field, value } => form.update_faq(index, field, &value),
            EditorAction::RemoveFaq { index } => form.remove_faq(index),
            EditorAction::Validate => {}
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EditorRequest {
    #[serde(default)]
    pub form: PostForm,
    pub action: EditorAction,
}

#[derive(Debug, Serialize)]
pub struct EditorResponse {
    pub form: PostForm,
    pub errors: FormErrors,
    pub valid: bool,
}

/// POST /api/admin/posts/editor
///
/// Stateless: the dashboard sends its current form and gets the edited
/// form back with the validation messages for it.
async fn apply_editor_action(
    _admin: AdminActor,
    Json(request): Json<EditorRequest>,
) -> Json<EditorResponse> {
    let mut form = request.form;
    request.action.apply(&mut form);

    let errors = form.validate().err().unwrap_or_default();
    Json(EditorResponse {
        valid: errors.is_empty(),
        form,
        errors,
    })
}

#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct SlugResponse {
    pub slug: String,
}

/// GET /api/admin/posts/slug
async fn suggest_slug(_admin: AdminActor, Query(query): Query<SlugQuery>) -> Json<SlugResponse> {
    Json(SlugResponse {
        slug: generate_slug(&query.title),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action(value: serde_json::Value) -> EditorAction {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_editor_actions_deserialize_and_apply() {
        let mut form = PostForm::new();
        form.post.title_en = "Marble & Light: A Guide".to_string();

        action(json!({"type": "generate_slug"})).apply(&mut form);
        assert_eq!(form.post.slug, "marble-light-a-guide");

        action(json!({"type": "add_tag", "locale": "it", "value": "marmo"})).apply(&mut form);
        action(json!({"type": "add_tag", "locale": "it", "value": "marmo"})).apply(&mut form);
        assert_eq!(form.post.tags_it, vec!["marmo".to_string()]);

        action(json!({"type": "add_keyword", "locale": "en", "value": "luxury"})).apply(&mut form);
        action(json!({"type": "remove_keyword", "locale": "en", "value": "luxury"})).apply(&mut form);
        assert!(form.post.seo_keywords_en.is_empty());

        action(json!({"type": "add_faq"})).apply(&mut form);
        action(json!({"type": "update_faq", "index": 0, "field": "question_en", "value": "Why marble?"}))
            .apply(&mut form);
        assert_eq!(form.faqs[0].question_en, "Why marble?");

        action(json!({"type": "remove_faq", "index": 3})).apply(&mut form);
        assert_eq!(form.faqs.len(), 1);
        action(json!({"type": "remove_faq", "index": 0})).apply(&mut form);
        assert!(form.faqs.is_empty());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<EditorAction, _> = serde_json::from_value(json!({"type": "explode"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ListPostsQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 20);
        assert!(query.status.is_none());
    }
}

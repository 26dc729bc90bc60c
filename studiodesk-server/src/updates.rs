//! Patch-notes feed

use chrono::{DateTime, Utc};
use serde::Deserialize;
use studiodesk_core::CurrentUser;

use crate::error::DeskError;
use crate::store::{NewUpdate, Update, UpdateId, UpdatePatch, UpdateStore};

pub const DEFAULT_RECENT_LIMIT: usize = 5;
pub const MAX_RECENT_LIMIT: usize = 50;

/// Input for `createUpdate`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUpdateInput {
    #[serde(default)]
    pub title: String,
    pub version: Option<String>,
    #[serde(default)]
    pub content: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// Published updates, newest first
pub fn list_updates<P: UpdateStore>(updates: &P) -> Result<Vec<Update>, DeskError> {
    updates.list_published(None)
}

/// The latest published updates; `limit` defaults to 5 and is clamped to 1..=50
pub fn recent_updates<P: UpdateStore>(
    updates: &P,
    limit: Option<usize>,
) -> Result<Vec<Update>, DeskError> {
    let limit = limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    updates.list_published(Some(limit))
}

/// One update. Drafts are only visible to admins.
pub fn get_update<P: UpdateStore>(
    updates: &P,
    id: UpdateId,
    current: &CurrentUser,
) -> Result<Option<Update>, DeskError> {
    Ok(updates
        .get_update(id)?
        .filter(|u| u.is_published || current.is_admin()))
}

pub fn create_update<P: UpdateStore>(
    updates: &P,
    input: CreateUpdateInput,
    current: &CurrentUser,
    now: DateTime<Utc>,
) -> Result<Update, DeskError> {
    let admin = current.require_admin()?;

    let title = input.title.trim();
    if title.is_empty() {
        return Err(DeskError::validation("Title is required"));
    }
    if input.content.trim().is_empty() {
        return Err(DeskError::validation("Content is required"));
    }

    let update = updates.create_update(NewUpdate {
        title: title.to_string(),
        version: input.version,
        content: input.content,
        summary: input.summary,
        is_published: input.is_published,
        created_at: now,
    })?;

    tracing::info!(update_id = update.id.0, admin_id = %admin.id, "Update created");
    Ok(update)
}

pub fn edit_update<P: UpdateStore>(
    updates: &P,
    id: UpdateId,
    patch: UpdatePatch,
    current: &CurrentUser,
    now: DateTime<Utc>,
) -> Result<Update, DeskError> {
    let admin = current.require_admin()?;

    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(DeskError::validation("Title cannot be empty"));
    }

    let update = updates
        .edit_update(id, &patch, now)?
        .ok_or(DeskError::NotFound("Update"))?;

    tracing::info!(update_id = id.0, admin_id = %admin.id, "Update edited");
    Ok(update)
}

pub fn delete_update<P: UpdateStore>(
    updates: &P,
    id: UpdateId,
    current: &CurrentUser,
) -> Result<Update, DeskError> {
    let admin = current.require_admin()?;

    let update = updates
        .delete_update(id)?
        .ok_or(DeskError::NotFound("Update"))?;

    tracing::info!(update_id = id.0, admin_id = %admin.id, "Update deleted");
    Ok(update)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use studiodesk_core::{Identity, Role, UserId};

    use super::*;
    use crate::store::InMemoryUpdateStore;

    fn admin() -> CurrentUser {
        CurrentUser::User(Identity {
            id: UserId(1),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
        })
    }

    fn draft(title: &str, published: bool) -> CreateUpdateInput {
        CreateUpdateInput {
            title: title.to_string(),
            content: "Patch notes".to_string(),
            is_published: published,
            ..CreateUpdateInput::default()
        }
    }

    #[test]
    fn test_recent_limit_clamped() {
        let store = InMemoryUpdateStore::new();
        let now = Utc::now();
        for i in 0..8 {
            create_update(
                &store,
                draft(&format!("v{i}"), true),
                &admin(),
                now + Duration::seconds(i),
            )
            .unwrap();
        }

        assert_eq!(recent_updates(&store, None).unwrap().len(), 5);
        assert_eq!(recent_updates(&store, Some(0)).unwrap().len(), 1);
        assert_eq!(recent_updates(&store, Some(500)).unwrap().len(), 8);
        assert_eq!(recent_updates(&store, Some(2)).unwrap()[0].title, "v7");
    }

    #[test]
    fn test_drafts_hidden_from_public() {
        let store = InMemoryUpdateStore::new();
        let now = Utc::now();
        let hidden = create_update(&store, draft("draft", false), &admin(), now).unwrap();
        create_update(&store, draft("live", true), &admin(), now).unwrap();

        let listed = list_updates(&store).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "live");

        assert!(get_update(&store, hidden.id, &CurrentUser::Anonymous)
            .unwrap()
            .is_none());
        assert!(get_update(&store, hidden.id, &admin()).unwrap().is_some());
    }

    #[test]
    fn test_mutations_require_admin() {
        let store = InMemoryUpdateStore::new();
        let now = Utc::now();
        let anon = CurrentUser::Anonymous;

        let result = create_update(&store, draft("x", true), &anon, now);
        assert!(matches!(result, Err(DeskError::NotAuthenticated)));

        let update = create_update(&store, draft("x", false), &admin(), now).unwrap();
        let result = edit_update(&store, update.id, UpdatePatch::default(), &anon, now);
        assert!(matches!(result, Err(DeskError::NotAuthenticated)));
        let result = delete_update(&store, update.id, &anon);
        assert!(matches!(result, Err(DeskError::NotAuthenticated)));
    }

    #[test]
    fn test_edit_and_delete() {
        let store = InMemoryUpdateStore::new();
        let now = Utc::now();
        let update = create_update(&store, draft("x", false), &admin(), now).unwrap();

        let patch = UpdatePatch {
            is_published: Some(true),
            summary: Some("Short".to_string()),
            ..UpdatePatch::default()
        };
        let edited = edit_update(&store, update.id, patch, &admin(), now).unwrap();
        assert!(edited.is_published);
        assert_eq!(edited.summary.as_deref(), Some("Short"));

        delete_update(&store, update.id, &admin()).unwrap();
        let result = delete_update(&store, update.id, &admin());
        assert!(matches!(result, Err(DeskError::NotFound(_))));
    }
}

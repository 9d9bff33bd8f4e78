use super::{RepoError, Result, new_id, require_min, trim_opt};
use crate::models::{CommunityPost, CommunityUser};
use crate::store::Store;
use crate::utils::now_iso;

pub const POSTS_KEY: &str = "cityscape_community_posts";
pub const USER_KEY: &str = "cityscape_community_user";

pub const MAX_IMAGES: usize = 4;

/// The seeded discussion topics; posts may also carry ad hoc ones
pub const TOPICS: [&str; 5] = ["General", "Safety", "Events", "Lost & Found", "Help"];

#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub author: Option<String>,
    pub topic: String,
    pub content: String,
    pub images: Vec<String>,
}

pub struct CommunityRepo<'a> {
    store: &'a Store,
}

impl<'a> CommunityRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        CommunityRepo { store }
    }

    pub fn list(&self) -> Vec<CommunityPost> {
        self.store.load(POSTS_KEY)
    }

    /// This user's like markers
    pub fn user(&self) -> CommunityUser {
        self.store.load_object(USER_KEY)
    }

    /// Validate and append a new post. A blank author becomes "Anonymous".
    pub fn add(&self, draft: PostDraft) -> Result<String> {
        let content = require_min(&draft.content, 3, "Write at least 3 characters.")?;
        let author = trim_opt(draft.author.as_deref()).unwrap_or_else(|| "Anonymous".to_string());

        let mut images = draft.images;
        images.truncate(MAX_IMAGES);

        let post = CommunityPost {
            id: new_id(),
            author: Some(author),
            topic: draft.topic,
            content,
            images,
            created_at: now_iso(),
            likes: 0,
            comments: 0,
            pinned: None,
        };
        let id = post.id.clone();

        let mut posts = self.list();
        posts.push(post);
        self.store.save(POSTS_KEY, &posts)?;
        Ok(id)
    }

    pub fn update(&self, id: &str, patch: impl FnOnce(&mut CommunityPost)) -> Result<()> {
        let mut posts = self.list();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RepoError::NotFound("Post", id.to_string()))?;
        patch(post);
        self.store.save(POSTS_KEY, &posts)?;
        Ok(())
    }

    /// Flip this user's like marker and the post's counter in one
    /// read-modify-write cycle. Returns the new liked state.
    pub fn toggle_like(&self, id: &str) -> Result<bool> {
        let mut posts = self.list();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RepoError::NotFound("Post", id.to_string()))?;

        let mut user = self.user();
        let liked = user.likes.get(id).copied().unwrap_or(false);
        let next = !liked;
        user.likes.insert(id.to_string(), next);
        post.likes += if next { 1 } else { -1 };

        self.store.save(POSTS_KEY, &posts)?;
        self.store.save_object(USER_KEY, &user)?;
        Ok(next)
    }

    /// Pin or unpin a post; pinned posts lead every community view
    pub fn toggle_pin(&self, id: &str) -> Result<bool> {
        let mut pinned = false;
        self.update(id, |p| {
            pinned = !p.is_pinned();
            p.pinned = Some(pinned);
        })?;
        Ok(pinned)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let mut posts = self.list();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound("Post", id.to_string()));
        }
        self.store.save(POSTS_KEY, &posts)?;
        Ok(())
    }
}

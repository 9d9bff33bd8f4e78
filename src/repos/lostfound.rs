use super::{RepoError, Result, build_contact, new_id, require_min, trim_opt, truncate_photos};
use crate::models::{Coords, LostFoundItem, LostFoundKind, LostFoundStatus};
use crate::store::Store;
use crate::utils::now_iso;

pub const LOSTFOUND_KEY: &str = "cityscape_lostfound";

pub const MAX_PHOTOS: usize = 5;

/// A lost/found posting draft
#[derive(Debug, Clone)]
pub struct LostFoundDraft {
    pub kind: LostFoundKind,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: Option<String>,
    pub coords: Option<Coords>,
    pub photos: Vec<String>,
    pub allow_contact: bool,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

pub struct LostFoundRepo<'a> {
    store: &'a Store,
}

impl<'a> LostFoundRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        LostFoundRepo { store }
    }

    pub fn list(&self) -> Vec<LostFoundItem> {
        self.store.load(LOSTFOUND_KEY)
    }

    /// Validate and append a new posting. Returns the generated id.
    pub fn add(&self, draft: LostFoundDraft) -> Result<String> {
        let title = require_min(&draft.title, 3, "Provide a descriptive title (min 3 chars).")?;
        let description = require_min(&draft.description, 10, "Add at least 10 characters.")?;
        let contact = build_contact(
            draft.allow_contact,
            draft.contact_name.as_deref(),
            draft.contact_email.as_deref(),
            draft.contact_phone.as_deref(),
        )?;

        let item = LostFoundItem {
            id: new_id(),
            kind: draft.kind,
            title,
            description,
            category: draft.category,
            location: trim_opt(draft.location.as_deref()),
            coords: draft.coords,
            date_iso: now_iso(),
            photos: truncate_photos(draft.photos, MAX_PHOTOS),
            status: LostFoundStatus::Open,
            contact: Some(contact),
        };
        let id = item.id.clone();

        let mut items = self.list();
        items.push(item);
        self.store.save(LOSTFOUND_KEY, &items)?;
        Ok(id)
    }

    pub fn update(&self, id: &str, patch: impl FnOnce(&mut LostFoundItem)) -> Result<()> {
        let mut items = self.list();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| RepoError::NotFound("Item", id.to_string()))?;
        patch(item);
        self.store.save(LOSTFOUND_KEY, &items)?;
        Ok(())
    }

    /// Move an item through open -> claimed -> returned (stored, user-set)
    pub fn set_status(&self, id: &str, status: LostFoundStatus) -> Result<()> {
        self.update(id, |i| i.status = status)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let mut items = self.list();
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Err(RepoError::NotFound("Item", id.to_string()));
        }
        self.store.save(LOSTFOUND_KEY, &items)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::lostfound_list_view;

    fn draft(kind: LostFoundKind, title: &str) -> LostFoundDraft {
        LostFoundDraft {
            kind,
            title: title.into(),
            description: "Black wallet with a red zipper".into(),
            category: "Accessories".into(),
            location: Some("Central Station".into()),
            coords: None,
            photos: vec![],
            allow_contact: false,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
        }
    }

    #[test]
    fn add_defaults_to_open() {
        let store = Store::in_memory();
        let repo = LostFoundRepo::new(&store);
        let id = repo.add(draft(LostFoundKind::Lost, "Wallet")).unwrap();
        let items = repo.list();
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].status, LostFoundStatus::Open);
        assert_eq!(items[0].kind, LostFoundKind::Lost);
    }

    #[test]
    fn kind_tabs_partition_the_view() {
        let store = Store::in_memory();
        let repo = LostFoundRepo::new(&store);
        repo.add(draft(LostFoundKind::Lost, "Wallet")).unwrap();
        repo.add(draft(LostFoundKind::Found, "Umbrella")).unwrap();

        let lost = lostfound_list_view(&repo.list(), LostFoundKind::Lost, "all", "all", "");
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].title, "Wallet");
    }

    #[test]
    fn status_moves_and_survives_reload() {
        let store = Store::in_memory();
        let repo = LostFoundRepo::new(&store);
        let id = repo.add(draft(LostFoundKind::Found, "Umbrella")).unwrap();
        repo.set_status(&id, LostFoundStatus::Claimed).unwrap();
        assert_eq!(repo.list()[0].status, LostFoundStatus::Claimed);
        repo.set_status(&id, LostFoundStatus::Returned).unwrap();
        assert_eq!(repo.list()[0].status, LostFoundStatus::Returned);
    }

    #[test]
    fn contact_rule_applies_to_postings_too() {
        let store = Store::in_memory();
        let repo = LostFoundRepo::new(&store);
        let mut d = draft(LostFoundKind::Lost, "Wallet");
        d.allow_contact = true;
        assert!(matches!(repo.add(d), Err(RepoError::Validation(_))));
    }
}

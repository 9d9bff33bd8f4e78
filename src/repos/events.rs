use std::collections::HashMap;

use super::{RepoError, Result, new_id, require_min, truncate_photos};
use crate::models::{Event, EventStatus, UserEventStatus};
use crate::store::Store;
use crate::utils::parse_instant;

pub const EVENTS_KEY: &str = "cityscape_events";
pub const USER_STATUS_KEY: &str = "cityscape_events_user_status";

/// Most photos an event keeps
pub const MAX_PHOTOS: usize = 5;

/// A validated-on-submit event draft from the presentation layer
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: String,
    pub category: String,
    pub description: String,
    pub location: String,
    /// Start datetime, ISO 8601
    pub date_iso: String,
    /// Optional end datetime, ISO 8601
    pub end_iso: Option<String>,
    pub photos: Vec<String>,
}

pub struct EventsRepo<'a> {
    store: &'a Store,
}

impl<'a> EventsRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        EventsRepo { store }
    }

    pub fn list(&self) -> Vec<Event> {
        self.store.load(EVENTS_KEY)
    }

    /// Per-user going markers, keyed by event id
    pub fn user_status(&self) -> HashMap<String, UserEventStatus> {
        self.store.load_object(USER_STATUS_KEY)
    }

    /// Validate the draft and append a new event. Returns the generated id.
    pub fn add(&self, draft: EventDraft) -> Result<String> {
        let title = require_min(&draft.title, 3, "Add a descriptive title (min 3 chars).")?;
        let description = require_min(&draft.description, 10, "Add at least 10 characters.")?;
        let location = require_min(&draft.location, 2, "Provide a clear location or venue.")?;
        if parse_instant(&draft.date_iso).is_none() {
            return Err(RepoError::Validation(
                "Pick a valid date and time for the event.".to_string(),
            ));
        }

        let event = Event {
            id: new_id(),
            title,
            category: draft.category,
            description,
            location,
            date_iso: draft.date_iso,
            end_iso: draft.end_iso,
            photos: truncate_photos(draft.photos, MAX_PHOTOS),
            status: EventStatus::Upcoming,
            attendees: 0,
        };
        let id = event.id.clone();

        let mut events = self.list();
        events.push(event);
        self.store.save(EVENTS_KEY, &events)?;
        Ok(id)
    }

    /// Read-modify-write a single event in place
    pub fn update(&self, id: &str, patch: impl FnOnce(&mut Event)) -> Result<()> {
        let mut events = self.list();
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RepoError::NotFound("Event", id.to_string()))?;
        patch(event);
        self.store.save(EVENTS_KEY, &events)?;
        Ok(())
    }

    /// Mark an event cancelled; the only status ever stored explicitly
    pub fn cancel(&self, id: &str) -> Result<()> {
        self.update(id, |e| e.status = EventStatus::Cancelled)
    }

    /// Delete the event and its per-user going marker
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut events = self.list();
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(RepoError::NotFound("Event", id.to_string()));
        }
        self.store.save(EVENTS_KEY, &events)?;

        let mut status = self.user_status();
        if status.remove(id).is_some() {
            self.store.save_object(USER_STATUS_KEY, &status)?;
        }
        Ok(())
    }

    /// Flip this user's going marker and move the shared attendee count in
    /// the same read-modify-write cycle, so the pair can't diverge.
    /// Returns the new going state.
    pub fn toggle_going(&self, id: &str) -> Result<bool> {
        let mut events = self.list();
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RepoError::NotFound("Event", id.to_string()))?;

        let mut status = self.user_status();
        let going = status.get(id).map(|s| s.going).unwrap_or(false);
        let next = !going;
        status.insert(id.to_string(), UserEventStatus { going: next });
        event.attendees += if next { 1 } else { -1 };

        self.store.save(EVENTS_KEY, &events)?;
        self.store.save_object(USER_STATUS_KEY, &status)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::now_iso;
    use crate::views::{EventTab, event_list_view};
    use chrono::{Duration, Utc};

    fn draft(title: &str, start: &str) -> EventDraft {
        EventDraft {
            title: title.into(),
            category: "Community".into(),
            description: "Bring your gloves and bags".into(),
            location: "Main Square".into(),
            date_iso: start.into(),
            end_iso: None,
            photos: vec![],
        }
    }

    #[test]
    fn add_then_list_contains_exactly_the_new_record() {
        let store = Store::in_memory();
        let repo = EventsRepo::new(&store);
        let id = repo.add(draft("Cleanup Drive", &now_iso())).unwrap();

        let events = repo.list();
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.id, id);
        assert_eq!(e.title, "Cleanup Drive");
        assert_eq!(e.status, EventStatus::Upcoming);
        assert_eq!(e.attendees, 0);
    }

    #[test]
    fn short_title_is_rejected_without_writing() {
        let store = Store::in_memory();
        let repo = EventsRepo::new(&store);
        let err = repo.add(draft("Hi", &now_iso())).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert!(repo.list().is_empty());
    }

    #[test]
    fn unparseable_start_is_rejected() {
        let store = Store::in_memory();
        let repo = EventsRepo::new(&store);
        let err = repo.add(draft("Cleanup Drive", "next tuesday")).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn photos_are_truncated_at_the_write_boundary() {
        let store = Store::in_memory();
        let repo = EventsRepo::new(&store);
        let mut d = draft("Cleanup Drive", &now_iso());
        d.photos = (0..8).map(|i| format!("data:image/png;base64,p{i}")).collect();
        repo.add(d).unwrap();
        assert_eq!(repo.list()[0].photos.len(), MAX_PHOTOS);
    }

    #[test]
    fn remove_deletes_only_that_record() {
        let store = Store::in_memory();
        let repo = EventsRepo::new(&store);
        let keep = repo.add(draft("Garage Sale", &now_iso())).unwrap();
        let drop = repo.add(draft("Cleanup Drive", &now_iso())).unwrap();

        repo.toggle_going(&drop).unwrap();
        repo.remove(&drop).unwrap();

        let events = repo.list();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, keep);
        assert!(!repo.user_status().contains_key(&drop));
    }

    #[test]
    fn toggle_going_keeps_marker_and_counter_together() {
        let store = Store::in_memory();
        let repo = EventsRepo::new(&store);
        let id = repo.add(draft("Cleanup Drive", &now_iso())).unwrap();

        assert!(repo.toggle_going(&id).unwrap());
        assert_eq!(repo.list()[0].attendees, 1);
        assert!(repo.user_status()[&id].going);

        assert!(!repo.toggle_going(&id).unwrap());
        assert_eq!(repo.list()[0].attendees, 0);
        assert!(!repo.user_status()[&id].going);
    }

    #[test]
    fn cancel_sticks_through_status_computation() {
        let store = Store::in_memory();
        let repo = EventsRepo::new(&store);
        let now = Utc::now();
        let start = (now + Duration::days(1)).to_rfc3339();
        let id = repo.add(draft("Cleanup Drive", &start)).unwrap();
        repo.cancel(&id).unwrap();

        let view = event_list_view(&repo.list(), now, EventTab::All, "all", None, "");
        assert_eq!(view[0].status, EventStatus::Cancelled);
    }

    #[test]
    fn tomorrow_event_is_upcoming_and_first_in_the_upcoming_view() {
        let store = Store::in_memory();
        let repo = EventsRepo::new(&store);
        let now = Utc::now();

        let mut d = draft("Cleanup Drive", &(now + Duration::days(1)).to_rfc3339());
        d.description = "12 characters".into();
        repo.add(d).unwrap();
        repo.add(draft("Book Fair", &(now + Duration::days(2)).to_rfc3339()))
            .unwrap();
        repo.add(draft("Old Fair", &(now - Duration::days(30)).to_rfc3339()))
            .unwrap();

        let view = event_list_view(&repo.list(), now, EventTab::Upcoming, "all", None, "");
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].title, "Cleanup Drive");
        assert_eq!(view[0].status, EventStatus::Upcoming);
        assert_eq!(view[0].attendees, 0);
    }
}

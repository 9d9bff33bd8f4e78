use super::{RepoError, Result, build_contact, new_id, require_min, trim_opt, truncate_photos};
use crate::models::{Coords, Report, ReportStatus};
use crate::store::Store;
use crate::utils::now_iso;

pub const REPORTS_KEY: &str = "cityscape_reports";

pub const MAX_PHOTOS: usize = 5;

/// An issue-report draft as submitted from the report form
#[derive(Debug, Clone, Default)]
pub struct ReportDraft {
    pub title: String,
    pub category: String,
    pub description: String,
    pub address: Option<String>,
    pub coords: Option<Coords>,
    pub photos: Vec<String>,
    pub allow_contact: bool,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

pub struct ReportsRepo<'a> {
    store: &'a Store,
}

impl<'a> ReportsRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        ReportsRepo { store }
    }

    pub fn list(&self) -> Vec<Report> {
        self.store.load(REPORTS_KEY)
    }

    /// Validate and append a new report. Returns the generated id.
    pub fn add(&self, draft: ReportDraft) -> Result<String> {
        let title = require_min(
            &draft.title,
            5,
            "Please provide a descriptive title (min 5 characters).",
        )?;
        let description = require_min(
            &draft.description,
            15,
            "Please describe the issue with at least 15 characters.",
        )?;
        let contact = build_contact(
            draft.allow_contact,
            draft.contact_name.as_deref(),
            draft.contact_email.as_deref(),
            draft.contact_phone.as_deref(),
        )?;

        let report = Report {
            id: new_id(),
            title,
            category: draft.category,
            description,
            address: trim_opt(draft.address.as_deref()),
            coords: draft.coords,
            photos: truncate_photos(draft.photos, MAX_PHOTOS),
            status: ReportStatus::Submitted,
            created_at: now_iso(),
            contact: Some(contact),
        };
        let id = report.id.clone();

        let mut reports = self.list();
        reports.push(report);
        self.store.save(REPORTS_KEY, &reports)?;
        Ok(id)
    }

    pub fn update(&self, id: &str, patch: impl FnOnce(&mut Report)) -> Result<()> {
        let mut reports = self.list();
        let report = reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RepoError::NotFound("Report", id.to_string()))?;
        patch(report);
        self.store.save(REPORTS_KEY, &reports)?;
        Ok(())
    }

    /// Report status is stored, not computed; the user moves it along
    pub fn set_status(&self, id: &str, status: ReportStatus) -> Result<()> {
        self.update(id, |r| r.status = status)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let mut reports = self.list();
        let before = reports.len();
        reports.retain(|r| r.id != id);
        if reports.len() == before {
            return Err(RepoError::NotFound("Report", id.to_string()));
        }
        self.store.save(REPORTS_KEY, &reports)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ReportDraft {
        ReportDraft {
            title: "Pothole on Elm Street".into(),
            category: "Road Damage".into(),
            description: "Deep pothole near the crosswalk, growing weekly.".into(),
            ..Default::default()
        }
    }

    #[test]
    fn add_stamps_defaults() {
        let store = Store::in_memory();
        let repo = ReportsRepo::new(&store);
        let id = repo.add(draft()).unwrap();

        let reports = repo.list();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, id);
        assert_eq!(reports[0].status, ReportStatus::Submitted);
        assert!(crate::utils::parse_instant(&reports[0].created_at).is_some());
        assert_eq!(reports[0].contact.as_ref().unwrap().allow_contact, false);
    }

    #[test]
    fn contact_sharing_requires_email_or_phone() {
        let store = Store::in_memory();
        let repo = ReportsRepo::new(&store);

        let mut d = draft();
        d.allow_contact = true;
        d.contact_name = Some("Sam".into());
        let err = repo.add(d).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert!(repo.list().is_empty());

        let mut d = draft();
        d.allow_contact = true;
        d.contact_phone = Some(" 555-0100 ".into());
        repo.add(d).unwrap();
        let contact = repo.list()[0].contact.clone().unwrap();
        assert!(contact.allow_contact);
        assert_eq!(contact.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn short_description_is_rejected() {
        let store = Store::in_memory();
        let repo = ReportsRepo::new(&store);
        let mut d = draft();
        d.description = "Too short".into();
        assert!(matches!(repo.add(d), Err(RepoError::Validation(_))));
    }

    #[test]
    fn set_status_touches_only_that_record() {
        let store = Store::in_memory();
        let repo = ReportsRepo::new(&store);
        let first = repo.add(draft()).unwrap();
        let mut d = draft();
        d.title = "Broken streetlight at 5th".into();
        let second = repo.add(d).unwrap();

        repo.set_status(&second, ReportStatus::InProgress).unwrap();
        let reports = repo.list();
        let get = |id: &str| reports.iter().find(|r| r.id == id).unwrap();
        assert_eq!(get(&first).status, ReportStatus::Submitted);
        assert_eq!(get(&second).status, ReportStatus::InProgress);
    }

    #[test]
    fn unknown_id_errors() {
        let store = Store::in_memory();
        let repo = ReportsRepo::new(&store);
        assert!(matches!(
            repo.set_status("missing", ReportStatus::Resolved),
            Err(RepoError::NotFound(_, _))
        ));
        assert!(matches!(repo.remove("missing"), Err(RepoError::NotFound(_, _))));
    }
}

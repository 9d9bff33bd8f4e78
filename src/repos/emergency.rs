use super::{RepoError, Result, new_id};
use crate::models::{Coords, EmergencyAction, EmergencyContact, EmergencySettings};
use crate::store::Store;

pub const CONTACTS_KEY: &str = "cityscape_emergency_contacts";
pub const SETTINGS_KEY: &str = "cityscape_emergency_settings";

#[derive(Debug, Clone, Default)]
pub struct ContactDraft {
    pub name: String,
    pub phone: String,
    pub relation: String,
}

pub struct EmergencyRepo<'a> {
    store: &'a Store,
}

impl<'a> EmergencyRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        EmergencyRepo { store }
    }

    pub fn list(&self) -> Vec<EmergencyContact> {
        self.store.load(CONTACTS_KEY)
    }

    pub fn settings(&self) -> EmergencySettings {
        self.store.load_object(SETTINGS_KEY)
    }

    pub fn save_settings(&self, settings: &EmergencySettings) -> Result<()> {
        self.store.save_object(SETTINGS_KEY, settings)?;
        Ok(())
    }

    /// Add a contact. The first contact ever added becomes the primary.
    pub fn add(&self, draft: ContactDraft) -> Result<String> {
        let name = draft.name.trim();
        let phone = draft.phone.trim();
        if name.is_empty() || phone.is_empty() {
            return Err(RepoError::Validation(
                "Name and phone are required.".to_string(),
            ));
        }

        let contact = EmergencyContact {
            id: new_id(),
            name: name.to_string(),
            phone: phone.to_string(),
            relation: draft.relation,
            primary: None,
        };
        let id = contact.id.clone();

        let mut contacts = self.list();
        contacts.insert(0, contact);
        self.store.save(CONTACTS_KEY, &contacts)?;

        let mut settings = self.settings();
        if settings.primary_contact_id.is_none() {
            settings.primary_contact_id = Some(id.clone());
            self.save_settings(&settings)?;
        }
        Ok(id)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let mut contacts = self.list();
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        if contacts.len() == before {
            return Err(RepoError::NotFound("Contact", id.to_string()));
        }
        self.store.save(CONTACTS_KEY, &contacts)?;
        Ok(())
    }

    pub fn set_primary(&self, id: &str) -> Result<()> {
        if !self.list().iter().any(|c| c.id == id) {
            return Err(RepoError::NotFound("Contact", id.to_string()));
        }
        let mut settings = self.settings();
        settings.primary_contact_id = Some(id.to_string());
        self.save_settings(&settings)
    }

    /// The contact an SOS goes to: the designated one, else any contact
    /// flagged primary, else the first in the list
    pub fn primary_contact(&self) -> Option<EmergencyContact> {
        let contacts = self.list();
        let settings = self.settings();
        settings
            .primary_contact_id
            .and_then(|id| contacts.iter().find(|c| c.id == id).cloned())
            .or_else(|| {
                contacts
                    .iter()
                    .find(|c| c.primary.unwrap_or(false))
                    .cloned()
            })
            .or_else(|| contacts.first().cloned())
    }

    /// The link the SOS action opens, per the configured default action
    pub fn sos_link(&self, coords: Option<Coords>) -> Option<String> {
        let primary = self.primary_contact()?;
        let settings = self.settings();
        Some(match settings.default_action {
            EmergencyAction::Call => tel_href(&primary.phone),
            EmergencyAction::Sms => sms_href(&primary.phone, &sms_text(&settings, coords)),
        })
    }
}

// Outbound link construction: pure string building over contact and
// coordinate data. The presentation layer decides what to do with them.

fn sanitize_phone(phone: &str) -> String {
    phone.chars().filter(|c| *c == '+' || c.is_ascii_digit()).collect()
}

pub fn tel_href(phone: &str) -> String {
    format!("tel:{}", sanitize_phone(phone))
}

pub fn sms_text(settings: &EmergencySettings, coords: Option<Coords>) -> String {
    let base = "I need help. Please contact me ASAP.";
    match coords {
        Some(c) if settings.include_location_in_sms => {
            format!("{} My location: https://maps.google.com/?q={},{}", base, c.lat, c.lng)
        }
        _ => base.to_string(),
    }
}

pub fn sms_href(phone: &str, text: &str) -> String {
    format!("sms:{}?&body={}", sanitize_phone(phone), urlencode(text))
}

pub fn maps_search_url(query: &str, coords: Option<Coords>) -> String {
    match coords {
        Some(c) => format!(
            "https://www.google.com/maps/search/{}/@{},{},15z",
            urlencode(query),
            c.lat,
            c.lng
        ),
        None => format!("https://www.google.com/maps/search/{}", urlencode(query)),
    }
}

/// Minimal percent-encoding for the URL path/query fragments above
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

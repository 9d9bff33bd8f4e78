use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Geographic coordinates captured from the location capability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

/// Optional reporter/finder contact details. When `allow_contact` is set the
/// repository requires at least one of email/phone at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub allow_contact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// A community event. The stored `status` only distinguishes cancelled from
/// not-cancelled; everything else is computed from the clock at view time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub location: String,
    /// Start datetime, ISO 8601
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    /// Optional end datetime, ISO 8601
    #[serde(rename = "endISO", default, skip_serializing_if = "Option::is_none")]
    pub end_iso: Option<String>,
    pub photos: Vec<String>,
    pub status: EventStatus,
    pub attendees: i64,
}

/// Per-user marker for one event, kept apart from the shared attendee count
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEventStatus {
    pub going: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Submitted,
    InProgress,
    Resolved,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStatus::Submitted => "submitted",
            ReportStatus::InProgress => "in-progress",
            ReportStatus::Resolved => "resolved",
        };
        write!(f, "{}", s)
    }
}

/// A city infrastructure issue report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coords>,
    pub photos: Vec<String>,
    pub status: ReportStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LostFoundKind {
    Lost,
    Found,
}

impl fmt::Display for LostFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LostFoundKind::Lost => write!(f, "lost"),
            LostFoundKind::Found => write!(f, "found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LostFoundStatus {
    Open,
    Claimed,
    Returned,
}

impl fmt::Display for LostFoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LostFoundStatus::Open => "open",
            LostFoundStatus::Claimed => "claimed",
            LostFoundStatus::Returned => "returned",
        };
        write!(f, "{}", s)
    }
}

/// A lost or found item posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostFoundItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LostFoundKind,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coords>,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    pub photos: Vec<String>,
    pub status: LostFoundStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,
}

/// A community feed post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub topic: String,
    pub content: String,
    pub images: Vec<String>,
    pub created_at: String,
    pub likes: i64,
    pub comments: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

impl CommunityPost {
    pub fn is_pinned(&self) -> bool {
        self.pinned.unwrap_or(false)
    }
}

/// Per-user community state: which posts this user has liked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityUser {
    #[serde(default)]
    pub likes: HashMap<String, bool>,
}

/// An emergency contact entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyAction {
    Call,
    Sms,
}

impl fmt::Display for EmergencyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmergencyAction::Call => write!(f, "call"),
            EmergencyAction::Sms => write!(f, "sms"),
        }
    }
}

/// Emergency page settings, including which contact is designated primary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencySettings {
    #[serde(default = "default_action")]
    pub default_action: EmergencyAction,
    #[serde(rename = "includeLocationInSMS", default = "default_include_location")]
    pub include_location_in_sms: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_contact_id: Option<String>,
}

fn default_action() -> EmergencyAction {
    EmergencyAction::Call
}

fn default_include_location() -> bool {
    true
}

impl Default for EmergencySettings {
    fn default() -> Self {
        Self {
            default_action: default_action(),
            include_location_in_sms: default_include_location(),
            primary_contact_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Bus,
    Train,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Bus => write!(f, "bus"),
            TransportKind::Train => write!(f, "train"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportStatus {
    OnTime,
    Delayed,
    Cancelled,
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportStatus::OnTime => "on-time",
            TransportStatus::Delayed => "delayed",
            TransportStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// A live transport route as shown on the tracker page (mock data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRoute {
    pub id: String,
    pub number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransportKind,
    pub status: TransportStatus,
    pub estimated_arrival: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<i64>,
    /// Percentage, 0-100
    pub capacity: i64,
    pub next_stops: Vec<String>,
    pub distance: String,
}

/// The slice of a route the snapshot persists for other pages to consume.
/// `delay` stays in the payload as an explicit null when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRouteSummary {
    pub id: String,
    pub number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransportKind,
    pub status: TransportStatus,
    pub estimated_arrival: String,
    pub delay: Option<i64>,
    pub capacity: i64,
    pub distance: String,
}

/// Periodically re-serialized transport state for cross-page consumption
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportSnapshot {
    #[serde(rename = "lastUpdatedISO", default)]
    pub last_updated_iso: String,
    #[serde(default)]
    pub routes: Vec<TransportRouteSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_wire_field_names() {
        let event = Event {
            id: "e1".into(),
            title: "Cleanup Drive".into(),
            category: "Community".into(),
            description: "Bring gloves".into(),
            location: "Main Square".into(),
            date_iso: "2026-08-26T10:00:00.000Z".into(),
            end_iso: None,
            photos: vec![],
            status: EventStatus::Upcoming,
            attendees: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["dateISO"], "2026-08-26T10:00:00.000Z");
        assert_eq!(json["status"], "upcoming");
        assert!(json.get("endISO").is_none());
    }

    #[test]
    fn report_status_uses_kebab_case() {
        let json = serde_json::to_string(&ReportStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn lostfound_kind_round_trips_through_type_field() {
        let raw = r#"{"id":"x","type":"found","title":"Keys","description":"Set of keys","category":"Accessories","dateISO":"2026-08-25T09:00:00.000Z","photos":[],"status":"open"}"#;
        let item: LostFoundItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.kind, LostFoundKind::Found);
        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["type"], "found");
    }

    #[test]
    fn settings_default_to_call_with_location() {
        let s = EmergencySettings::default();
        assert_eq!(s.default_action, EmergencyAction::Call);
        assert!(s.include_location_in_sms);
        assert!(s.primary_contact_id.is_none());
    }

    #[test]
    fn settings_tolerate_partial_payloads() {
        let s: EmergencySettings = serde_json::from_str(r#"{"defaultAction":"sms"}"#).unwrap();
        assert_eq!(s.default_action, EmergencyAction::Sms);
        assert!(s.include_location_in_sms);
    }

    #[test]
    fn snapshot_summary_keeps_explicit_null_delay() {
        let summary = TransportRouteSummary {
            id: "2".into(),
            number: "A1".into(),
            name: "Metro Line A".into(),
            kind: TransportKind::Train,
            status: TransportStatus::OnTime,
            estimated_arrival: "7 min".into(),
            delay: None,
            capacity: 45,
            distance: "0.5 km".into(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["delay"].is_null());
        assert_eq!(json["type"], "train");
    }
}

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::time::Duration;
use thiserror::Error;

use crate::activity;
use crate::capability::{self, CapabilityError, EnvProvider, LocationTracker};
use crate::models::{Coords, EventStatus, LostFoundKind, LostFoundStatus, ReportStatus};
use crate::repos::{
    RepoError,
    community::{CommunityRepo, MAX_IMAGES, PostDraft},
    emergency::{ContactDraft, EmergencyRepo},
    events::{EventDraft, EventsRepo},
    lostfound::{LostFoundDraft, LostFoundRepo},
    reports::{ReportDraft, ReportsRepo},
    transport::{TransportFilter, TransportRepo, mock_routes},
};
use crate::store::Store;
use crate::utils::{combine_date_time, parse_date};
use crate::views::{EventTab, event_list_view, event_status};

#[derive(Parser)]
#[command(name = "cityscape")]
#[command(about = "Cityscape - a local-first city services companion")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Quickly add a community event
    AddEvent {
        /// Event title
        title: String,
        /// What is happening
        #[arg(long)]
        description: String,
        /// Where it happens
        #[arg(long)]
        location: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Start time (HH:MM)
        #[arg(long, default_value = "12:00")]
        time: String,
        /// Category
        #[arg(long, default_value = "Community")]
        category: String,
        /// Photo file to attach (repeatable)
        #[arg(long)]
        photo: Vec<String>,
    },
    /// Report a city issue
    AddReport {
        /// Report title
        title: String,
        /// What is wrong
        #[arg(long)]
        description: String,
        /// Category
        #[arg(long, default_value = "Other")]
        category: String,
        /// Street address
        #[arg(long)]
        address: Option<String>,
        /// Attach the device position to the report
        #[arg(long)]
        locate: bool,
        /// Photo file to attach (repeatable)
        #[arg(long)]
        photo: Vec<String>,
        /// Contact name, shown to city staff
        #[arg(long)]
        contact_name: Option<String>,
        /// Contact email
        #[arg(long)]
        contact_email: Option<String>,
        /// Contact phone
        #[arg(long)]
        contact_phone: Option<String>,
    },
    /// Post a lost or found item
    AddItem {
        /// "lost" or "found"
        kind: String,
        /// Item title
        title: String,
        /// Item description
        #[arg(long)]
        description: String,
        /// Category
        #[arg(long, default_value = "Other")]
        category: String,
        /// Where it was lost or found
        #[arg(long)]
        location: Option<String>,
        /// Photo file to attach (repeatable)
        #[arg(long)]
        photo: Vec<String>,
        /// Contact email
        #[arg(long)]
        contact_email: Option<String>,
        /// Contact phone
        #[arg(long)]
        contact_phone: Option<String>,
    },
    /// Post to the community feed
    AddPost {
        /// Post content
        content: String,
        /// Author name (omit to post anonymously)
        #[arg(long)]
        author: Option<String>,
        /// Discussion topic
        #[arg(long, default_value = "General")]
        topic: String,
        /// Image file to attach (repeatable)
        #[arg(long)]
        image: Vec<String>,
    },
    /// Add an emergency contact
    AddContact {
        /// Contact name
        name: String,
        /// Contact phone
        phone: String,
        /// Relationship
        #[arg(long, default_value = "")]
        relation: String,
    },
    /// Toggle attendance on an event
    Going {
        /// Event id
        id: String,
    },
    /// Toggle a like on a community post
    Like {
        /// Post id
        id: String,
    },
    /// Pin or unpin a community post
    Pin {
        /// Post id
        id: String,
    },
    /// Move a report or item to a new status
    SetStatus {
        /// "report" or "item"
        kind: String,
        /// Record id
        id: String,
        /// The new status
        status: String,
    },
    /// Show the recent activity feed
    Feed {
        /// Override the configured entry limit
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List events
    Events {
        /// "upcoming", "past" or "all"
        #[arg(long, default_value = "upcoming")]
        tab: String,
        /// Category filter
        #[arg(long, default_value = "all")]
        category: String,
        /// Free-text search
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Show the live transport board
    Transport {
        /// Persisted route filter: "all", "bus" or "train"
        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    RepoError(#[from] RepoError),
    #[error("Capability error: {0}")]
    CapabilityError(#[from] CapabilityError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

fn resolve_coords(timeout: Duration) -> Option<Coords> {
    let tracker = LocationTracker::new();
    match tracker.locate_with(&EnvProvider, timeout) {
        Ok(coords) => Some(coords),
        Err(e) => {
            // location is optional everywhere it is used
            eprintln!("Location unavailable ({}), continuing without it", e);
            None
        }
    }
}

/// Handle the add-event command
#[allow(clippy::too_many_arguments)]
pub fn handle_add_event(
    title: String,
    description: String,
    location: String,
    date: String,
    time: String,
    category: String,
    photo: Vec<String>,
    store: &Store,
) -> Result<(), CliError> {
    let day = parse_date(&date)
        .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", date, e)))?;
    let date_iso = combine_date_time(day, &time)
        .ok_or_else(|| CliError::DateParseError(format!("Invalid time '{}'", time)))?;

    let photos = capability::read_photos(&photo, crate::repos::events::MAX_PHOTOS)?;
    let repo = EventsRepo::new(store);
    let id = repo.add(EventDraft {
        title,
        category,
        description,
        location,
        date_iso,
        end_iso: None,
        photos,
    })?;
    println!("Event created successfully (ID: {})", id);
    Ok(())
}

/// Handle the add-report command
#[allow(clippy::too_many_arguments)]
pub fn handle_add_report(
    title: String,
    description: String,
    category: String,
    address: Option<String>,
    locate: bool,
    photo: Vec<String>,
    contact_name: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    location_timeout: Duration,
    store: &Store,
) -> Result<(), CliError> {
    let coords = if locate {
        resolve_coords(location_timeout)
    } else {
        None
    };
    let photos = capability::read_photos(&photo, crate::repos::reports::MAX_PHOTOS)?;
    let allow_contact = contact_email.is_some() || contact_phone.is_some();

    let repo = ReportsRepo::new(store);
    let id = repo.add(ReportDraft {
        title,
        category,
        description,
        address,
        coords,
        photos,
        allow_contact,
        contact_name,
        contact_email,
        contact_phone,
    })?;
    println!("Report created successfully (ID: {})", id);
    Ok(())
}

/// Handle the add-item command
#[allow(clippy::too_many_arguments)]
pub fn handle_add_item(
    kind: String,
    title: String,
    description: String,
    category: String,
    location: Option<String>,
    photo: Vec<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    store: &Store,
) -> Result<(), CliError> {
    let kind = match kind.as_str() {
        "lost" => LostFoundKind::Lost,
        "found" => LostFoundKind::Found,
        other => {
            return Err(CliError::InvalidValue(format!(
                "'{}' is not a kind; use 'lost' or 'found'",
                other
            )));
        }
    };
    let photos = capability::read_photos(&photo, crate::repos::lostfound::MAX_PHOTOS)?;
    let allow_contact = contact_email.is_some() || contact_phone.is_some();

    let repo = LostFoundRepo::new(store);
    let id = repo.add(LostFoundDraft {
        kind,
        title,
        description,
        category,
        location,
        coords: None,
        photos,
        allow_contact,
        contact_name: None,
        contact_email,
        contact_phone,
    })?;
    println!("Item posted successfully (ID: {})", id);
    Ok(())
}

/// Handle the add-post command
pub fn handle_add_post(
    content: String,
    author: Option<String>,
    topic: String,
    image: Vec<String>,
    store: &Store,
) -> Result<(), CliError> {
    let images = capability::read_photos(&image, MAX_IMAGES)?;
    let repo = CommunityRepo::new(store);
    let id = repo.add(PostDraft {
        author,
        topic,
        content,
        images,
    })?;
    println!("Post created successfully (ID: {})", id);
    Ok(())
}

/// Handle the add-contact command
pub fn handle_add_contact(
    name: String,
    phone: String,
    relation: String,
    store: &Store,
) -> Result<(), CliError> {
    let repo = EmergencyRepo::new(store);
    let id = repo.add(ContactDraft {
        name,
        phone,
        relation,
    })?;
    println!("Contact created successfully (ID: {})", id);
    Ok(())
}

/// Handle the going command
pub fn handle_going(id: String, store: &Store) -> Result<(), CliError> {
    let repo = EventsRepo::new(store);
    let going = repo.toggle_going(&id)?;
    if going {
        println!("You're going");
    } else {
        println!("Attendance withdrawn");
    }
    Ok(())
}

/// Handle the like command
pub fn handle_like(id: String, store: &Store) -> Result<(), CliError> {
    let repo = CommunityRepo::new(store);
    let liked = repo.toggle_like(&id)?;
    if liked {
        println!("Liked");
    } else {
        println!("Like removed");
    }
    Ok(())
}

/// Handle the pin command
pub fn handle_pin(id: String, store: &Store) -> Result<(), CliError> {
    let repo = CommunityRepo::new(store);
    let pinned = repo.toggle_pin(&id)?;
    if pinned {
        println!("Pinned");
    } else {
        println!("Unpinned");
    }
    Ok(())
}

/// Handle the set-status command
pub fn handle_set_status(
    kind: String,
    id: String,
    status: String,
    store: &Store,
) -> Result<(), CliError> {
    match kind.as_str() {
        "report" => {
            let status = match status.as_str() {
                "submitted" => ReportStatus::Submitted,
                "in-progress" => ReportStatus::InProgress,
                "resolved" => ReportStatus::Resolved,
                other => {
                    return Err(CliError::InvalidValue(format!(
                        "'{}' is not a report status",
                        other
                    )));
                }
            };
            ReportsRepo::new(store).set_status(&id, status)?;
        }
        "item" => {
            let status = match status.as_str() {
                "open" => LostFoundStatus::Open,
                "claimed" => LostFoundStatus::Claimed,
                "returned" => LostFoundStatus::Returned,
                other => {
                    return Err(CliError::InvalidValue(format!(
                        "'{}' is not an item status",
                        other
                    )));
                }
            };
            LostFoundRepo::new(store).set_status(&id, status)?;
        }
        other => {
            return Err(CliError::InvalidValue(format!(
                "'{}' is not a record kind; use 'report' or 'item'",
                other
            )));
        }
    }
    println!("Status updated");
    Ok(())
}

/// Handle the feed command
pub fn handle_feed(limit: usize, store: &Store) -> Result<(), CliError> {
    let now = Utc::now();
    let feed = activity::build_feed(store, limit);
    if feed.is_empty() {
        println!("No recent activity");
        return Ok(());
    }
    for item in feed {
        let when = activity::time_ago(now, &item.when_iso);
        let tags = item.tags.join(", ");
        match item.description {
            Some(desc) => println!("[{}] {} - {} ({}) [{}]", item.kind, item.title, desc, when, tags),
            None => println!("[{}] {} ({}) [{}]", item.kind, item.title, when, tags),
        }
    }
    Ok(())
}

/// Handle the events command
pub fn handle_events(
    tab: String,
    category: String,
    query: String,
    store: &Store,
) -> Result<(), CliError> {
    let tab = match tab.as_str() {
        "upcoming" => EventTab::Upcoming,
        "past" => EventTab::Past,
        "all" => EventTab::All,
        other => {
            return Err(CliError::InvalidValue(format!(
                "'{}' is not a tab; use 'upcoming', 'past' or 'all'",
                other
            )));
        }
    };

    let now = Utc::now();
    let repo = EventsRepo::new(store);
    let events = event_list_view(&repo.list(), now, tab, &category, None, &query);
    if events.is_empty() {
        println!("No events");
        return Ok(());
    }
    for event in events {
        let status = event_status(now, &event);
        let going = repo
            .user_status()
            .get(&event.id)
            .map(|s| s.going)
            .unwrap_or(false);
        let marker = if going { " *going*" } else { "" };
        println!(
            "{}  {} [{}] {} @ {} ({} attending){}",
            event.id, event.title, status, event.date_iso, event.location, event.attendees, marker
        );
        if status == EventStatus::Cancelled {
            println!("    cancelled");
        }
    }
    Ok(())
}

/// Handle the transport command
pub fn handle_transport(filter: Option<String>, store: &Store) -> Result<(), CliError> {
    let repo = TransportRepo::new(store);
    if let Some(filter) = filter {
        let filter = match filter.as_str() {
            "all" => TransportFilter::All,
            "bus" => TransportFilter::Bus,
            "train" => TransportFilter::Train,
            other => {
                return Err(CliError::InvalidValue(format!(
                    "'{}' is not a route filter; use 'all', 'bus' or 'train'",
                    other
                )));
            }
        };
        repo.set_filter(filter)?;
    }

    let routes = mock_routes();
    let snapshot = repo.refresh(&routes)?;
    println!("Routes as of {}", snapshot.last_updated_iso);
    for route in repo.filtered_routes(&routes) {
        let delay = match route.delay {
            Some(min) => format!(" (+{} min)", min),
            None => String::new(),
        };
        println!(
            "{:>4} {:<18} {:<5} {:<8} arrives {}{}  {}% full  next: {}",
            route.number,
            route.name,
            route.kind,
            route.status,
            route.estimated_arrival,
            delay,
            route.capacity,
            route.next_stops.join(" > "),
        );
    }
    Ok(())
}

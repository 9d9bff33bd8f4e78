//! Pure projection functions over loaded collections: filtering, search,
//! sorting, and computed status. Nothing here reads a clock or touches the
//! store; callers pass `now` explicitly so every view is deterministic.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{CommunityPost, Event, EventStatus, LostFoundItem, LostFoundKind, Report};
use crate::utils::parse_instant;

/// Ongoing window when an event has no explicit end
const DEFAULT_EVENT_WINDOW_HOURS: i64 = 2;

/// Compute an event's lifecycle status from explicit time inputs.
///
/// Cancelled wins unconditionally. Otherwise the event is ongoing while
/// `start <= now <= end` (end defaulting to start + 2h), completed once the
/// window has passed, and upcoming before it opens.
pub fn compute_event_status(
    now: DateTime<Utc>,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    cancelled: bool,
) -> EventStatus {
    if cancelled {
        return EventStatus::Cancelled;
    }
    let end = end.unwrap_or(start + Duration::hours(DEFAULT_EVENT_WINDOW_HOURS));
    if start <= now && now <= end {
        EventStatus::Ongoing
    } else if now > end {
        EventStatus::Completed
    } else {
        EventStatus::Upcoming
    }
}

/// Status of a stored event at `now`. An unparseable start leaves the event
/// upcoming rather than failing the whole view.
pub fn event_status(now: DateTime<Utc>, event: &Event) -> EventStatus {
    let cancelled = event.status == EventStatus::Cancelled;
    match parse_instant(&event.date_iso) {
        Some(start) => {
            let end = event.end_iso.as_deref().and_then(parse_instant);
            compute_event_status(now, start, end, cancelled)
        }
        None => {
            if cancelled {
                EventStatus::Cancelled
            } else {
                EventStatus::Upcoming
            }
        }
    }
}

/// Equality filter where "all" is the identity
pub fn matches_filter(value: &str, filter: &str) -> bool {
    filter == "all" || value == filter
}

/// Supplies the joined text fields a free-text search runs over
pub trait Searchable {
    fn haystack(&self) -> String;
}

impl Searchable for Event {
    fn haystack(&self) -> String {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.location.as_str(),
            self.category.as_str(),
        ]
        .join(" ")
    }
}

impl Searchable for LostFoundItem {
    fn haystack(&self) -> String {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.location.as_deref().unwrap_or(""),
            self.category.as_str(),
        ]
        .join(" ")
    }
}

impl Searchable for CommunityPost {
    fn haystack(&self) -> String {
        [
            self.author.as_deref().unwrap_or(""),
            self.content.as_str(),
            self.topic.as_str(),
        ]
        .join(" ")
    }
}

/// Case-insensitive substring match; a blank query matches everything
pub fn matches_query<T: Searchable>(item: &T, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    item.haystack().to_lowercase().contains(&q)
}

/// Sort newest-first by a per-item instant; records without a parseable
/// instant sink to the end
pub fn sort_by_instant_desc<T>(items: &mut [T], instant: impl Fn(&T) -> Option<DateTime<Utc>>) {
    items.sort_by(|a, b| match (instant(a), instant(b)) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Stable partition keeping pinned posts ahead of the rest, preserving each
/// partition's relative order
pub fn pinned_first(posts: Vec<CommunityPost>) -> Vec<CommunityPost> {
    let (pinned, rest): (Vec<_>, Vec<_>) = posts.into_iter().partition(|p| p.is_pinned());
    pinned.into_iter().chain(rest).collect()
}

/// Does the event start on the given calendar day (UTC)?
pub fn occurs_on(event: &Event, day: NaiveDate) -> bool {
    parse_instant(&event.date_iso).is_some_and(|start| start.date_naive() == day)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTab {
    Upcoming,
    Past,
    All,
}

/// The events page projection: computed statuses, category/day/tab/query
/// filters, date-ascending order (reversed for the past tab).
pub fn event_list_view(
    events: &[Event],
    now: DateTime<Utc>,
    tab: EventTab,
    category: &str,
    day: Option<NaiveDate>,
    query: &str,
) -> Vec<Event> {
    let mut list: Vec<Event> = events
        .iter()
        .map(|e| {
            let mut e = e.clone();
            e.status = event_status(now, &e);
            e
        })
        .filter(|e| matches_filter(&e.category, category))
        .filter(|e| day.is_none_or(|d| occurs_on(e, d)))
        .filter(|e| match tab {
            EventTab::All => true,
            EventTab::Upcoming => {
                e.status == EventStatus::Upcoming || e.status == EventStatus::Ongoing
            }
            EventTab::Past => e.status == EventStatus::Completed,
        })
        .filter(|e| matches_query(e, query))
        .collect();

    list.sort_by(|a, b| match (parse_instant(&a.date_iso), parse_instant(&b.date_iso)) {
        (Some(ta), Some(tb)) => ta.cmp(&tb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    if tab == EventTab::Past {
        list.reverse();
    }
    list
}

/// The report page projection: status and category equality filters,
/// newest first
pub fn report_list_view(reports: &[Report], status: &str, category: &str) -> Vec<Report> {
    let mut list: Vec<Report> = reports
        .iter()
        .filter(|r| matches_filter(&r.status.to_string(), status))
        .filter(|r| matches_filter(&r.category, category))
        .cloned()
        .collect();
    sort_by_instant_desc(&mut list, |r| parse_instant(&r.created_at));
    list
}

/// The lost & found projection: kind tab, category/status filters, free-text
/// search, newest first
pub fn lostfound_list_view(
    items: &[LostFoundItem],
    kind: LostFoundKind,
    category: &str,
    status: &str,
    query: &str,
) -> Vec<LostFoundItem> {
    let mut list: Vec<LostFoundItem> = items
        .iter()
        .filter(|i| i.kind == kind)
        .filter(|i| matches_filter(&i.category, category))
        .filter(|i| matches_filter(&i.status.to_string(), status))
        .filter(|i| matches_query(*i, query))
        .cloned()
        .collect();
    sort_by_instant_desc(&mut list, |i| parse_instant(&i.date_iso));
    list
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunityTab {
    New,
    Top,
}

/// The community feed projection: topic filter, search, newest or
/// most-liked ordering, pinned posts first
pub fn community_list_view(
    posts: &[CommunityPost],
    topic: &str,
    tab: CommunityTab,
    query: &str,
) -> Vec<CommunityPost> {
    let mut list: Vec<CommunityPost> = posts
        .iter()
        .filter(|p| matches_filter(&p.topic, topic))
        .filter(|p| matches_query(*p, query))
        .cloned()
        .collect();
    match tab {
        CommunityTab::New => sort_by_instant_desc(&mut list, |p| parse_instant(&p.created_at)),
        CommunityTab::Top => {
            // Likes descending, creation time as the tie-break
            sort_by_instant_desc(&mut list, |p| parse_instant(&p.created_at));
            list.sort_by(|a, b| b.likes.cmp(&a.likes));
        }
    }
    pinned_first(list)
}

/// Post counts per topic, busiest first. Seeded topics appear even at zero.
pub fn trending_topics(posts: &[CommunityPost], topics: &[&str]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = topics
        .iter()
        .map(|t| (t.to_string(), posts.iter().filter(|p| p.topic == *t).count()))
        .collect();
    for post in posts {
        if !counts.iter().any(|(t, _)| *t == post.topic) {
            let n = posts.iter().filter(|p| p.topic == post.topic).count();
            counts.push((post.topic.clone(), n));
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

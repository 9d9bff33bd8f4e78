//! The cross-entity activity feed: every repository's records mapped into a
//! common shape, merged, and listed newest first on the landing page.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::models::{CommunityPost, Event, LostFoundItem, LostFoundKind, Report};
use crate::repos::{community, events, lostfound, reports};
use crate::store::Store;
use crate::utils::parse_instant;

/// How many entries the landing feed shows
pub const FEED_LIMIT: usize = 8;
/// How many entries each per-kind lane shows
pub const LANE_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Event,
    Report,
    LostFound,
    Community,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityKind::Event => "event",
            ActivityKind::Report => "report",
            ActivityKind::LostFound => "lostfound",
            ActivityKind::Community => "community",
        };
        write!(f, "{}", s)
    }
}

/// One feed entry, whatever collection it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityItem {
    pub id: String,
    pub kind: ActivityKind,
    pub title: String,
    pub description: Option<String>,
    pub when_iso: String,
    pub href: String,
    pub tags: Vec<String>,
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

fn map_event(e: &Event) -> ActivityItem {
    ActivityItem {
        id: e.id.clone(),
        kind: ActivityKind::Event,
        title: e.title.clone(),
        description: non_empty(&e.location).or_else(|| non_empty(&e.description)),
        when_iso: e.date_iso.clone(),
        href: "/events".to_string(),
        tags: vec![e.category.clone()],
    }
}

fn map_report(r: &Report) -> ActivityItem {
    ActivityItem {
        id: r.id.clone(),
        kind: ActivityKind::Report,
        title: r.title.clone(),
        description: r
            .address
            .as_deref()
            .and_then(non_empty)
            .or_else(|| non_empty(&r.description)),
        when_iso: r.created_at.clone(),
        href: "/report".to_string(),
        tags: vec![r.category.clone(), r.status.to_string()],
    }
}

fn map_lostfound(i: &LostFoundItem) -> ActivityItem {
    let prefix = match i.kind {
        LostFoundKind::Lost => "Lost",
        LostFoundKind::Found => "Found",
    };
    ActivityItem {
        id: i.id.clone(),
        kind: ActivityKind::LostFound,
        title: format!("{}: {}", prefix, i.title),
        description: i
            .location
            .as_deref()
            .and_then(non_empty)
            .or_else(|| non_empty(&i.description)),
        when_iso: i.date_iso.clone(),
        href: "/lost-found".to_string(),
        tags: vec![i.category.clone(), i.status.to_string()],
    }
}

fn map_post(p: &CommunityPost) -> ActivityItem {
    let title = match p.author.as_deref().and_then(non_empty) {
        Some(author) => format!("{} posted", author),
        None => "New post".to_string(),
    };
    ActivityItem {
        id: p.id.clone(),
        kind: ActivityKind::Community,
        title,
        description: non_empty(&p.content),
        when_iso: p.created_at.clone(),
        href: "/community".to_string(),
        tags: vec![p.topic.clone()],
    }
}

fn collect_all(store: &Store) -> Vec<ActivityItem> {
    let events: Vec<Event> = store.load(events::EVENTS_KEY);
    let reports: Vec<Report> = store.load(reports::REPORTS_KEY);
    let items: Vec<LostFoundItem> = store.load(lostfound::LOSTFOUND_KEY);
    let posts: Vec<CommunityPost> = store.load(community::POSTS_KEY);

    events
        .iter()
        .map(map_event)
        .chain(reports.iter().map(map_report))
        .chain(items.iter().map(map_lostfound))
        .chain(posts.iter().map(map_post))
        .collect()
}

/// Merge all four collections into one reverse-chronological feed, dropping
/// entries whose timestamp won't parse, truncated to `limit`
pub fn build_feed(store: &Store, limit: usize) -> Vec<ActivityItem> {
    let mut merged: Vec<(DateTime<Utc>, ActivityItem)> = collect_all(store)
        .into_iter()
        .filter_map(|item| parse_instant(&item.when_iso).map(|ts| (ts, item)))
        .collect();
    merged.sort_by(|a, b| b.0.cmp(&a.0));
    merged.into_iter().take(limit).map(|(_, item)| item).collect()
}

/// Per-kind lanes, each independently sorted and truncated
pub fn build_lanes(store: &Store, per_lane: usize) -> Vec<(ActivityKind, Vec<ActivityItem>)> {
    let all = build_feed(store, usize::MAX);
    [
        ActivityKind::Event,
        ActivityKind::Report,
        ActivityKind::LostFound,
        ActivityKind::Community,
    ]
    .into_iter()
    .map(|kind| {
        let lane: Vec<ActivityItem> = all
            .iter()
            .filter(|i| i.kind == kind)
            .take(per_lane)
            .cloned()
            .collect();
        (kind, lane)
    })
    .collect()
}

/// Relative-time label for a feed entry. Pure: same (now, timestamp) pair,
/// same string.
pub fn time_ago(now: DateTime<Utc>, iso: &str) -> String {
    let Some(ts) = parse_instant(iso) else {
        return String::new();
    };
    let secs = (now - ts).num_seconds().max(0);
    if secs < 60 {
        return format!("{}s ago", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }
    ts.format("%b %-d, %Y").to_string()
}

/// Keeps the landing feed fresh: change notifications from the store mark it
/// dirty, a poll interval catches anything the notifications missed, and an
/// external signal (the focus-regained analog) can force a refresh.
pub struct FeedWatcher {
    dirty: Rc<Cell<bool>>,
    poll_interval: Duration,
    last_refresh: Cell<Option<DateTime<Utc>>>,
    limit: usize,
}

impl FeedWatcher {
    /// Subscribe to the four source collections on `store`
    pub fn new(store: &Store, poll_interval: Duration, limit: usize) -> Self {
        let dirty = Rc::new(Cell::new(false));
        for key in [
            events::EVENTS_KEY,
            reports::REPORTS_KEY,
            lostfound::LOSTFOUND_KEY,
            community::POSTS_KEY,
        ] {
            let flag = Rc::clone(&dirty);
            store.on_change(key, move |_| flag.set(true));
        }
        FeedWatcher {
            dirty,
            poll_interval,
            last_refresh: Cell::new(None),
            limit,
        }
    }

    /// External refresh trigger, e.g. the window regaining focus
    pub fn mark_stale(&self) {
        self.dirty.set(true);
    }

    /// Re-derive the feed when something changed, the poll interval elapsed,
    /// or nothing has been derived yet. Returns None when still fresh.
    pub fn tick(&self, store: &Store, now: DateTime<Utc>) -> Option<Vec<ActivityItem>> {
        let due = match self.last_refresh.get() {
            None => true,
            Some(last) => self.dirty.get() || now - last >= self.poll_interval,
        };
        if !due {
            return None;
        }
        self.dirty.set(false);
        self.last_refresh.set(Some(now));
        Some(build_feed(store, self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventStatus, ReportStatus};
    use chrono::SecondsFormat;

    fn iso(ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn seed_event(store: &Store, id: &str, when: DateTime<Utc>) {
        let mut events: Vec<Event> = store.load(events::EVENTS_KEY);
        events.push(Event {
            id: id.into(),
            title: format!("Event {id}"),
            category: "Community".into(),
            description: "desc".into(),
            location: "Main Square".into(),
            date_iso: iso(when),
            end_iso: None,
            photos: vec![],
            status: EventStatus::Upcoming,
            attendees: 0,
        });
        store.save(events::EVENTS_KEY, &events).unwrap();
    }

    fn seed_report(store: &Store, id: &str, when: DateTime<Utc>) {
        let mut reports: Vec<Report> = store.load(reports::REPORTS_KEY);
        reports.push(Report {
            id: id.into(),
            title: format!("Report {id}"),
            category: "Road Damage".into(),
            description: "desc".into(),
            address: None,
            coords: None,
            photos: vec![],
            status: ReportStatus::Submitted,
            created_at: iso(when),
            contact: None,
        });
        store.save(reports::REPORTS_KEY, &reports).unwrap();
    }

    fn seed_post(store: &Store, id: &str, when: DateTime<Utc>, author: Option<&str>) {
        let mut posts: Vec<CommunityPost> = store.load(community::POSTS_KEY);
        posts.push(CommunityPost {
            id: id.into(),
            author: author.map(Into::into),
            topic: "General".into(),
            content: "hello neighbors".into(),
            images: vec![],
            created_at: iso(when),
            likes: 0,
            comments: 0,
            pinned: None,
        });
        store.save(community::POSTS_KEY, &posts).unwrap();
    }

    #[test]
    fn feed_orders_mixed_kinds_newest_first_and_truncates() {
        let store = Store::in_memory();
        let now = Utc::now();
        seed_event(&store, "e", now - Duration::hours(2));
        seed_report(&store, "r", now - Duration::seconds(10));
        seed_post(&store, "p", now - Duration::minutes(5), Some("Riley"));
        seed_event(&store, "old", now - Duration::days(3));

        let feed = build_feed(&store, 8);
        let ids: Vec<&str> = feed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["r", "p", "e", "old"]);

        let top2 = build_feed(&store, 2);
        assert_eq!(top2.len(), 2);
        assert_eq!(top2[0].id, "r");
    }

    #[test]
    fn unparseable_timestamps_are_dropped() {
        let store = Store::in_memory();
        seed_post(&store, "bad", Utc::now(), Some("Riley"));
        let mut posts: Vec<CommunityPost> = store.load(community::POSTS_KEY);
        posts[0].created_at = "yesterday-ish".into();
        store.save(community::POSTS_KEY, &posts).unwrap();
        seed_post(&store, "ok", Utc::now(), None);

        let feed = build_feed(&store, 8);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, "ok");
        assert_eq!(feed[0].title, "New post");
    }

    #[test]
    fn lostfound_titles_carry_their_prefix() {
        let item = LostFoundItem {
            id: "x".into(),
            kind: LostFoundKind::Found,
            title: "Umbrella".into(),
            description: "Blue umbrella".into(),
            category: "Other".into(),
            location: Some("Bus stop".into()),
            coords: None,
            date_iso: iso(Utc::now()),
            photos: vec![],
            status: crate::models::LostFoundStatus::Open,
            contact: None,
        };
        let mapped = map_lostfound(&item);
        assert_eq!(mapped.title, "Found: Umbrella");
        assert_eq!(mapped.description.as_deref(), Some("Bus stop"));
        assert_eq!(mapped.tags, vec!["Other".to_string(), "open".to_string()]);
    }

    #[test]
    fn lanes_truncate_per_kind() {
        let store = Store::in_memory();
        let now = Utc::now();
        for i in 0..6 {
            seed_event(&store, &format!("e{i}"), now - Duration::minutes(i));
        }
        seed_report(&store, "r0", now);

        let lanes = build_lanes(&store, LANE_LIMIT);
        let events_lane = &lanes.iter().find(|(k, _)| *k == ActivityKind::Event).unwrap().1;
        assert_eq!(events_lane.len(), 4);
        assert_eq!(events_lane[0].id, "e0");
    }

    #[test]
    fn time_ago_buckets() {
        let now = parse_instant("2026-08-25T12:00:00.000Z").unwrap();
        let at = |d: Duration| iso(now - d);
        assert_eq!(time_ago(now, &at(Duration::seconds(10))), "10s ago");
        assert_eq!(time_ago(now, &at(Duration::minutes(5))), "5m ago");
        assert_eq!(time_ago(now, &at(Duration::hours(2))), "2h ago");
        assert_eq!(time_ago(now, &at(Duration::days(3))), "3d ago");
        assert_eq!(time_ago(now, &at(Duration::days(30))), "Jul 26, 2026");
        assert_eq!(time_ago(now, "garbage"), "");
    }

    #[test]
    fn watcher_refreshes_on_change_and_interval() {
        let store = Store::in_memory();
        let now = Utc::now();
        let watcher = FeedWatcher::new(&store, Duration::seconds(2), 8);

        // first tick always derives
        assert!(watcher.tick(&store, now).is_some());
        // nothing changed, interval not elapsed
        assert!(watcher.tick(&store, now + Duration::seconds(1)).is_none());

        // a write to a watched key marks the feed dirty
        seed_post(&store, "p", now, Some("Riley"));
        let feed = watcher.tick(&store, now + Duration::seconds(1)).unwrap();
        assert_eq!(feed.len(), 1);

        // interval fallback fires even without notifications
        assert!(watcher.tick(&store, now + Duration::seconds(4)).is_some());

        // external focus signal forces a refresh
        watcher.mark_stale();
        assert!(watcher.tick(&store, now + Duration::seconds(5)).is_some());
    }
}

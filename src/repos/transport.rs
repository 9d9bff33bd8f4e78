use serde::{Deserialize, Serialize};

use super::Result;
use crate::models::{
    TransportKind, TransportRoute, TransportRouteSummary, TransportSnapshot, TransportStatus,
};
use crate::store::Store;
use crate::utils::now_iso;

pub const SNAPSHOT_KEY: &str = "cityscape_transport_snapshot";
pub const FILTER_KEY: &str = "cityscape_transport_filter";

/// The persisted route-type filter for the tracker page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportFilter {
    #[default]
    All,
    Bus,
    Train,
}

impl TransportFilter {
    pub fn matches(self, kind: TransportKind) -> bool {
        match self {
            TransportFilter::All => true,
            TransportFilter::Bus => kind == TransportKind::Bus,
            TransportFilter::Train => kind == TransportKind::Train,
        }
    }
}

/// The tracker's demo feed; there is no live upstream
pub fn mock_routes() -> Vec<TransportRoute> {
    vec![
        TransportRoute {
            id: "1".into(),
            number: "24".into(),
            name: "Downtown Express".into(),
            kind: TransportKind::Bus,
            status: TransportStatus::Delayed,
            estimated_arrival: "3 min".into(),
            delay: Some(5),
            capacity: 78,
            next_stops: vec!["Central Station".into(), "City Hall".into(), "University".into()],
            distance: "0.2 km".into(),
        },
        TransportRoute {
            id: "2".into(),
            number: "A1".into(),
            name: "Metro Line A".into(),
            kind: TransportKind::Train,
            status: TransportStatus::OnTime,
            estimated_arrival: "7 min".into(),
            delay: None,
            capacity: 45,
            next_stops: vec!["North Terminal".into(), "Commerce Center".into(), "Airport".into()],
            distance: "0.5 km".into(),
        },
        TransportRoute {
            id: "3".into(),
            number: "42".into(),
            name: "Circular Route".into(),
            kind: TransportKind::Bus,
            status: TransportStatus::OnTime,
            estimated_arrival: "12 min".into(),
            delay: None,
            capacity: 23,
            next_stops: vec!["Shopping Mall".into(), "Hospital".into(), "Sports Complex".into()],
            distance: "0.8 km".into(),
        },
        TransportRoute {
            id: "4".into(),
            number: "B2".into(),
            name: "East Line".into(),
            kind: TransportKind::Train,
            status: TransportStatus::OnTime,
            estimated_arrival: "15 min".into(),
            delay: None,
            capacity: 67,
            next_stops: vec!["Tech Park".into(), "University".into(), "Residential Zone".into()],
            distance: "1.2 km".into(),
        },
    ]
}

fn summarize(route: &TransportRoute) -> TransportRouteSummary {
    TransportRouteSummary {
        id: route.id.clone(),
        number: route.number.clone(),
        name: route.name.clone(),
        kind: route.kind,
        status: route.status,
        estimated_arrival: route.estimated_arrival.clone(),
        delay: route.delay,
        capacity: route.capacity,
        distance: route.distance.clone(),
    }
}

pub struct TransportRepo<'a> {
    store: &'a Store,
}

impl<'a> TransportRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        TransportRepo { store }
    }

    /// Re-stamp and re-serialize the snapshot other pages read
    pub fn refresh(&self, routes: &[TransportRoute]) -> Result<TransportSnapshot> {
        let snapshot = TransportSnapshot {
            last_updated_iso: now_iso(),
            routes: routes.iter().map(summarize).collect(),
        };
        self.store.save_object(SNAPSHOT_KEY, &snapshot)?;
        Ok(snapshot)
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        self.store.load_object(SNAPSHOT_KEY)
    }

    pub fn filter(&self) -> TransportFilter {
        self.store.load_object(FILTER_KEY)
    }

    pub fn set_filter(&self, filter: TransportFilter) -> Result<()> {
        self.store.save_object(FILTER_KEY, &filter)?;
        Ok(())
    }

    /// The tracker view: routes narrowed by the persisted type filter
    pub fn filtered_routes(&self, routes: &[TransportRoute]) -> Vec<TransportRoute> {
        let filter = self.filter();
        routes
            .iter()
            .filter(|r| filter.matches(r.kind))
            .cloned()
            .collect()
    }
}

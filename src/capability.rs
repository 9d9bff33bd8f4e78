//! Device-capability boundaries: reading photo files into data URLs and
//! resolving the device position. Everything here degrades gracefully; the
//! calling surface turns errors into notices and falls back to manual entry.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coords;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("capability unavailable: {0}")]
    Unavailable(String),
    #[error("permission denied")]
    Denied,
    #[error("timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, CapabilityError>;

fn media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Read a photo file and encode it as a data URL, the shape the persisted
/// photo lists store
pub fn read_photo(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| CapabilityError::Unavailable(format!("{}: {}", path.display(), e)))?;
    Ok(format!("data:{};base64,{}", media_type(path), STANDARD.encode(bytes)))
}

/// Read up to `max` photo files. The first failure aborts the batch so a typo
/// never silently drops an attachment.
pub fn read_photos<P: AsRef<Path>>(paths: &[P], max: usize) -> Result<Vec<String>> {
    paths.iter().take(max).map(read_photo).collect()
}

/// Where a position comes from. The CLI wires in the environment provider;
/// tests use `StaticProvider`.
pub trait LocationProvider {
    fn locate(&self, timeout: Duration) -> Result<Coords>;
}

/// A fixed outcome, for tests and scripted runs
pub struct StaticProvider(pub Result<Coords>);

impl LocationProvider for StaticProvider {
    fn locate(&self, _timeout: Duration) -> Result<Coords> {
        self.0.clone()
    }
}

/// Reads `CITYSCAPE_LOCATION` as "lat,lng". Unset means the device has no
/// position source; a malformed value reads as a denial rather than a crash.
pub struct EnvProvider;

pub const LOCATION_ENV: &str = "CITYSCAPE_LOCATION";

impl LocationProvider for EnvProvider {
    fn locate(&self, _timeout: Duration) -> Result<Coords> {
        let raw = std::env::var(LOCATION_ENV)
            .map_err(|_| CapabilityError::Unavailable("no location source configured".into()))?;
        let mut parts = raw.splitn(2, ',');
        let lat = parts.next().and_then(|s| s.trim().parse::<f64>().ok());
        let lng = parts.next().and_then(|s| s.trim().parse::<f64>().ok());
        match (lat, lng) {
            (Some(lat), Some(lng)) => Ok(Coords { lat, lng }),
            _ => Err(CapabilityError::Denied),
        }
    }
}

/// Tracks in-flight locate requests so a completion that arrives after a
/// newer request began is discarded instead of overwriting fresher state.
#[derive(Default)]
pub struct LocationTracker {
    generation: Cell<u64>,
    current: RefCell<Option<Coords>>,
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request; the returned token must accompany its completion
    pub fn begin(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    /// Apply a completed request. Returns false when the token is stale,
    /// in which case the result is dropped.
    pub fn complete(&self, token: u64, coords: Coords) -> bool {
        if token != self.generation.get() {
            return false;
        }
        *self.current.borrow_mut() = Some(coords);
        true
    }

    pub fn current(&self) -> Option<Coords> {
        *self.current.borrow()
    }

    /// Resolve a position through `provider`, guarded against interleaving
    pub fn locate_with(
        &self,
        provider: &dyn LocationProvider,
        timeout: Duration,
    ) -> Result<Coords> {
        let token = self.begin();
        let coords = provider.locate(timeout)?;
        self.complete(token, coords);
        Ok(coords)
    }
}

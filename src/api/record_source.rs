use tracing::{debug, warn};

use crate::core::{TimelineRecord, YearGroup, aggregate_with_fallback};
use crate::error::RevealResult;

/// Backend that lists the two record collections a chronology is built from.
pub trait RecordSource {
    type Record: TimelineRecord;

    fn list_clients(&self) -> RevealResult<Vec<Self::Record>>;
    fn list_partners(&self) -> RevealResult<Vec<Self::Record>>;
}

/// In-memory source, mostly for tests and static sites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticRecordSource<R> {
    pub clients: Vec<R>,
    pub partners: Vec<R>,
}

impl<R> StaticRecordSource<R> {
    #[must_use]
    pub fn new(clients: Vec<R>, partners: Vec<R>) -> Self {
        Self { clients, partners }
    }
}

impl<R: TimelineRecord + Clone> RecordSource for StaticRecordSource<R> {
    type Record = R;

    fn list_clients(&self) -> RevealResult<Vec<R>> {
        Ok(self.clients.clone())
    }

    fn list_partners(&self) -> RevealResult<Vec<R>> {
        Ok(self.partners.clone())
    }
}

/// Fetches both collections and aggregates them into year groups.
///
/// A failing collection is treated as empty; a source that fails on both
/// yields an empty chronology rather than an error.
pub fn load_chronology<S>(source: &S, fallback_year: i32) -> Vec<YearGroup<S::Record>>
where
    S: RecordSource + ?Sized,
{
    let partners = source.list_partners().unwrap_or_else(|err| {
        warn!(error = %err, "partner records unavailable, continuing without them");
        Vec::new()
    });
    let clients = source.list_clients().unwrap_or_else(|err| {
        warn!(error = %err, "client records unavailable, continuing without them");
        Vec::new()
    });
    debug!(
        clients = clients.len(),
        partners = partners.len(),
        "chronology records loaded"
    );
    aggregate_with_fallback(clients, partners, fallback_year)
}

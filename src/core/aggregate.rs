use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Year assigned to records that do not carry one.
pub const FALLBACK_YEAR: i32 = 2023;

/// Narrow view shared by every record kind that can appear on the chronology.
///
/// Clients and partners satisfy it independently; nothing else about the
/// records is inspected.
pub trait TimelineRecord {
    fn id(&self) -> &str;
    fn year(&self) -> Option<i32>;
}

impl<T: TimelineRecord + ?Sized> TimelineRecord for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn year(&self) -> Option<i32> {
        (**self).year()
    }
}

impl<T: TimelineRecord + ?Sized> TimelineRecord for &T {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn year(&self) -> Option<i32> {
        (**self).year()
    }
}

/// Plain record as returned by the record store.
///
/// Display fields other than `name` are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronicleRecord {
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: Option<i32>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChronicleRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            id: id.into(),
            year,
            name: String::new(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl TimelineRecord for ChronicleRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn year(&self) -> Option<i32> {
        self.year
    }
}

// Record stores hand back `0`, `null` or a numeric string for an unset year.
fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let year = match value {
        Some(Value::Number(number)) => number.as_i64().and_then(|y| i32::try_from(y).ok()),
        Some(Value::String(text)) => text.trim().parse::<i32>().ok(),
        _ => None,
    };
    Ok(year.filter(|y| *y != 0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        if index % 2 == 0 { Self::Left } else { Self::Right }
    }

    /// Horizontal direction content slides in from.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordOrigin {
    Client,
    Partner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry<R> {
    pub id: String,
    pub year: i32,
    pub side: Side,
    pub visible: bool,
    pub origin: RecordOrigin,
    pub source: R,
}

impl<R> TimelineEntry<R> {
    /// Flips the entry visible. Returns `true` only on the first call.
    pub fn mark_visible(&mut self) -> bool {
        if self.visible {
            return false;
        }
        self.visible = true;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearGroup<R> {
    pub year: i32,
    pub items: Vec<TimelineEntry<R>>,
}

/// Merges clients and partners into year groups, newest year first.
///
/// Sides alternate over the whole sorted sequence, not per year, so a year
/// with an odd number of entries shifts the next year's first side.
#[must_use]
pub fn aggregate<R, A, B>(clients: A, partners: B) -> Vec<YearGroup<R>>
where
    R: TimelineRecord,
    A: IntoIterator<Item = R>,
    B: IntoIterator<Item = R>,
{
    aggregate_with_fallback(clients, partners, FALLBACK_YEAR)
}

#[must_use]
pub fn aggregate_with_fallback<R, A, B>(
    clients: A,
    partners: B,
    fallback_year: i32,
) -> Vec<YearGroup<R>>
where
    R: TimelineRecord,
    A: IntoIterator<Item = R>,
    B: IntoIterator<Item = R>,
{
    let mut combined: Vec<(i32, RecordOrigin, R)> = clients
        .into_iter()
        .map(|record| (RecordOrigin::Client, record))
        .chain(
            partners
                .into_iter()
                .map(|record| (RecordOrigin::Partner, record)),
        )
        .map(|(origin, record)| (record.year().unwrap_or(fallback_year), origin, record))
        .collect();

    // `sort_by` is stable, ties keep concatenation order.
    combined.sort_by(|a, b| b.0.cmp(&a.0));

    let mut groups: IndexMap<i32, Vec<TimelineEntry<R>>> = IndexMap::new();
    for (index, (year, origin, record)) in combined.into_iter().enumerate() {
        let entry = TimelineEntry {
            id: record.id().to_owned(),
            year,
            side: Side::from_index(index),
            visible: false,
            origin,
            source: record,
        };
        groups.entry(year).or_default().push(entry);
    }

    let mut groups: Vec<YearGroup<R>> = groups
        .into_iter()
        .map(|(year, items)| YearGroup { year, items })
        .collect();
    groups.sort_by(|a, b| b.year.cmp(&a.year));
    groups
}

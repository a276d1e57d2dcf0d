use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// =============================================================================
// Intents
// =============================================================================

/// Canonical operation tags the interpreter resolves text to.
///
/// Declaration order is significant: the regex cascade evaluates intents in
/// this order, so compound intents (cancel/modify) come before the plain
/// reservation intent they contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CancelReservation,
    ModifyReservation,
    Reservation,
    CheckAvailability,
    ShowCalendar,
    RoomProblem,
    CreateInvoice,
    ShowInvoices,
    AddStock,
    SellProduct,
    ShowStock,
    OpenPos,
    ShowReports,
    Help,
    Greeting,
    /// Explicit "not understood" tag.
    Unknown,
}

impl Intent {
    /// Every intent, in declaration order.
    pub const ALL: [Intent; 16] = [
        Intent::CancelReservation,
        Intent::ModifyReservation,
        Intent::Reservation,
        Intent::CheckAvailability,
        Intent::ShowCalendar,
        Intent::RoomProblem,
        Intent::CreateInvoice,
        Intent::ShowInvoices,
        Intent::AddStock,
        Intent::SellProduct,
        Intent::ShowStock,
        Intent::OpenPos,
        Intent::ShowReports,
        Intent::Help,
        Intent::Greeting,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CancelReservation => "cancel_reservation",
            Intent::ModifyReservation => "modify_reservation",
            Intent::Reservation => "reservation",
            Intent::CheckAvailability => "check_availability",
            Intent::ShowCalendar => "show_calendar",
            Intent::RoomProblem => "room_problem",
            Intent::CreateInvoice => "create_invoice",
            Intent::ShowInvoices => "show_invoices",
            Intent::AddStock => "add_stock",
            Intent::SellProduct => "sell_product",
            Intent::ShowStock => "show_stock",
            Intent::OpenPos => "open_pos",
            Intent::ShowReports => "show_reports",
            Intent::Help => "help",
            Intent::Greeting => "greeting",
            Intent::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Intent::Unknown)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| format!("Unknown intent tag: {}", s))
    }
}

/// Which resolution stage decided an intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Cache,
    QuickRoute,
    Pattern,
    Shortcut,
    Classifier,
    /// Cheap keyword fallback used under critical memory pressure.
    Degraded,
    /// Nothing matched.
    Default,
}

/// An intent decision together with its confidence and origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub intent: Intent,
    pub confidence: f32,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn new(intent: Intent, confidence: f32, source: ResolutionSource) -> Self {
        Self {
            intent,
            confidence,
            source,
        }
    }

    pub fn unknown() -> Self {
        Self::new(Intent::Unknown, 0.0, ResolutionSource::Default)
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A stay or a single day. `end` is `None` when the text named one date only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date: Some(end_date),
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start_date: date,
            end_date: None,
        }
    }

    /// Checkout date, defaulting to one night after the start.
    pub fn end_or_next_day(&self) -> NaiveDate {
        self.end_date
            .unwrap_or_else(|| self.start_date + Duration::days(1))
    }

    pub fn nights(&self) -> i64 {
        (self.end_or_next_day() - self.start_date).num_days()
    }
}

/// A requested product quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    pub name: String,
    pub quantity: u32,
}

/// Extractor that produced an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    Date,
    Room,
    Contact,
    Product,
    StockCatalog,
}

/// Names of the entities the extractors can fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKey {
    Dates,
    RoomNumber,
    RoomType,
    Preferences,
    ProblemDescription,
    Phone,
    Name,
    Products,
    StockItems,
}

/// Payload of an extracted entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityData {
    Text(String),
    Dates(Vec<DateRange>),
    Products(Vec<ProductLine>),
    List(Vec<String>),
}

/// The single shape every extractor emits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityValue {
    pub value: EntityData,
    pub confidence: f32,
    pub source: ExtractorKind,
}

impl EntityValue {
    pub fn new(value: EntityData, confidence: f32, source: ExtractorKind) -> Self {
        Self {
            value,
            confidence,
            source,
        }
    }

    pub fn text(value: impl Into<String>, confidence: f32, source: ExtractorKind) -> Self {
        Self::new(EntityData::Text(value.into()), confidence, source)
    }
}

/// Entities extracted from one message, keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityBag {
    entries: BTreeMap<EntityKey, EntityValue>,
}

impl EntityBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: EntityKey, value: EntityValue) {
        self.entries.insert(key, value);
    }

    /// Merge another bag; entries already present are kept.
    pub fn merge(&mut self, other: EntityBag) {
        for (key, value) in other.entries {
            self.entries.entry(key).or_insert(value);
        }
    }

    pub fn get(&self, key: EntityKey) -> Option<&EntityValue> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn text(&self, key: EntityKey) -> Option<&str> {
        match self.get(key).map(|v| &v.value) {
            Some(EntityData::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn dates(&self) -> &[DateRange] {
        match self.get(EntityKey::Dates).map(|v| &v.value) {
            Some(EntityData::Dates(dates)) => dates,
            _ => &[],
        }
    }

    pub fn products(&self) -> &[ProductLine] {
        match self.get(EntityKey::Products).map(|v| &v.value) {
            Some(EntityData::Products(products)) => products,
            _ => &[],
        }
    }

    pub fn list(&self, key: EntityKey) -> &[String] {
        match self.get(key).map(|v| &v.value) {
            Some(EntityData::List(items)) => items,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.entries.keys().copied()
    }
}

// =============================================================================
// Directives
// =============================================================================

/// How the UI should treat a directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveType {
    Action,
    Overlay,
    Confirm,
    Error,
    Chat,
}

/// Typed response to one handled message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub intent: Intent,
    #[serde(rename = "type")]
    pub kind: DirectiveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Directive {
    pub fn is_error(&self) -> bool {
        self.kind == DirectiveType::Error
    }
}

// =============================================================================
// Interpretation
// =============================================================================

/// Full outcome of interpreting one message, before handler dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub text: String,
    pub normalized: String,
    pub intent: Intent,
    pub confidence: f32,
    pub source: ResolutionSource,
    pub entities: EntityBag,
    pub extra_intents: Vec<Intent>,
    /// True when produced by the critical-memory fallback.
    pub degraded: bool,
}

//! Line types.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{Location, Product, Style};

/// Notable properties of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineAttr {
    CircleClockwise,
    CircleAnticlockwise,
    ServiceReplacement,
    LineAirport,
    WheelChairAccess,
    BicycleCarriage,
}

/// A public transport line, e.g. "S5" or "ICE 123".
///
/// Lines are identified by `(network, product, label)`: the backend's own
/// `id` and the descriptive fields do not take part in equality or ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Line {
    /// Backend line id
    pub id: Option<String>,
    /// Sub-network the line belongs to
    pub network: Option<String>,
    /// Kind of transport
    pub product: Option<Product>,
    /// Short label as shown on vehicles, e.g. "S5"
    pub label: Option<String>,
    /// Long name
    pub name: Option<String>,
    /// Notable properties
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub attributes: BTreeSet<LineAttr>,
    /// Free-text message attached to the line
    pub message: Option<String>,
    /// Badge style, if the provider knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

impl Line {
    /// Create a line from its identifying fields.
    pub fn new(
        network: Option<String>,
        product: Option<Product>,
        label: Option<String>,
    ) -> Self {
        Self {
            network,
            product,
            label,
            ..Self::default()
        }
    }

    /// Returns a copy with the given attribute set.
    pub fn with_attr(mut self, attr: LineAttr) -> Self {
        self.attributes.insert(attr);
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    pub fn has_attr(&self, attr: LineAttr) -> bool {
        self.attributes.contains(&attr)
    }

    /// Product code, or `'?'` if the product is unknown.
    pub fn product_code(&self) -> char {
        self.product.map_or('?', |p| p.code())
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.network == other.network && self.product == other.product && self.label == other.label
    }
}

impl Eq for Line {}

impl Hash for Line {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.network.hash(state);
        self.product.hash(state);
        self.label.hash(state);
    }
}

/// Absent values sort last.
fn cmp_nullable<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

impl Ord for Line {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_nullable(&self.network, &other.network)
            .then_with(|| cmp_nullable(&self.product, &other.product))
            .then_with(|| cmp_nullable(&self.label, &other.label))
    }
}

impl PartialOrd for Line {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A line together with the destination it runs to.
///
/// Destinations compare by their short display name, because backends
/// occasionally report destinations under the id of another location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineDestination {
    pub line: Line,
    pub destination: Option<Location>,
}

impl LineDestination {
    pub fn new(line: Line, destination: Option<Location>) -> Self {
        Self { line, destination }
    }

    fn destination_name(&self) -> Option<String> {
        self.destination.as_ref().and_then(Location::unique_short_name)
    }
}

impl PartialEq for LineDestination {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.destination_name() == other.destination_name()
    }
}

impl Eq for LineDestination {}

impl Hash for LineDestination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.line.hash(state);
        self.destination_name().hash(state);
    }
}

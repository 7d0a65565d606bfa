//! Trip query parameters.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Location, Product};

/// What a trip search should minimise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Optimize {
    LeastDuration,
    LeastChanges,
    LeastWalking,
}

/// How fast the traveller walks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalkSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl WalkSpeed {
    /// Walking speed in metres per minute.
    pub fn meters_per_minute(self) -> u32 {
        match self {
            WalkSpeed::Slow => 60,
            WalkSpeed::Normal => 80,
            WalkSpeed::Fast => 100,
        }
    }

    /// Time to walk `meters`, rounded up to whole minutes.
    pub fn walk_time(self, meters: u32) -> Duration {
        let per_minute = self.meters_per_minute();
        Duration::minutes(i64::from(meters.div_ceil(per_minute)))
    }
}

/// Step-free access requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Accessibility {
    #[default]
    Neutral,
    Limited,
    BarrierFree,
}

/// Extra trip requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripFlag {
    /// Bicycle carriage
    Bike,
}

/// Optional trip search preferences. Unset fields use backend defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripOptions {
    /// Allowed products; `None` means all
    pub products: Option<BTreeSet<Product>>,
    pub optimize: Option<Optimize>,
    pub walk_speed: Option<WalkSpeed>,
    pub accessibility: Option<Accessibility>,
    #[serde(default)]
    pub flags: BTreeSet<TripFlag>,
}

impl TripOptions {
    pub fn with_products(mut self, products: BTreeSet<Product>) -> Self {
        self.products = Some(products);
        self
    }

    pub fn with_optimize(mut self, optimize: Optimize) -> Self {
        self.optimize = Some(optimize);
        self
    }

    pub fn with_walk_speed(mut self, walk_speed: WalkSpeed) -> Self {
        self.walk_speed = Some(walk_speed);
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = Some(accessibility);
        self
    }

    pub fn with_flag(mut self, flag: TripFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// True if a line of the given product may be used.
    pub fn allows(&self, product: Option<Product>) -> bool {
        match (&self.products, product) {
            (None, _) => true,
            (Some(allowed), Some(product)) => allowed.contains(&product),
            (Some(_), None) => false,
        }
    }
}

/// A trip search.
///
/// `time` is a departure time when `dep` is true and an arrival time
/// otherwise.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use transit_provider::domain::Location;
/// use transit_provider::provider::TripQuery;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
/// let query = TripQuery::departing(
///     Location::station("A").unwrap(),
///     Location::station("B").unwrap(),
///     at,
/// );
/// assert!(query.dep);
/// assert!(query.via.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripQuery {
    pub from: Location,
    pub via: Option<Location>,
    pub to: Location,
    pub time: DateTime<Utc>,
    pub dep: bool,
    #[serde(default)]
    pub options: TripOptions,
}

impl TripQuery {
    /// Trips departing at or after `time`.
    pub fn departing(from: Location, to: Location, time: DateTime<Utc>) -> Self {
        Self {
            from,
            via: None,
            to,
            time,
            dep: true,
            options: TripOptions::default(),
        }
    }

    /// Trips arriving at or before `time`.
    pub fn arriving(from: Location, to: Location, time: DateTime<Utc>) -> Self {
        Self {
            dep: false,
            ..Self::departing(from, to, time)
        }
    }

    pub fn via(mut self, via: Location) -> Self {
        self.via = Some(via);
        self
    }

    pub fn with_options(mut self, options: TripOptions) -> Self {
        self.options = options;
        self
    }
}

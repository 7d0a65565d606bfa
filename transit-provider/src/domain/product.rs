//! Transport products.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::InvalidProductCode;

/// Kind of public transport a line belongs to.
///
/// Each product has a single-character code used in compact encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Product {
    HighSpeedTrain,
    RegionalTrain,
    SuburbanTrain,
    Subway,
    Tram,
    Bus,
    Ferry,
    Cablecar,
    OnDemand,
}

impl Product {
    /// All products, in declaration order.
    pub const ALL: [Product; 9] = [
        Product::HighSpeedTrain,
        Product::RegionalTrain,
        Product::SuburbanTrain,
        Product::Subway,
        Product::Tram,
        Product::Bus,
        Product::Ferry,
        Product::Cablecar,
        Product::OnDemand,
    ];

    /// Single-character code of this product.
    pub fn code(&self) -> char {
        match self {
            Product::HighSpeedTrain => 'I',
            Product::RegionalTrain => 'R',
            Product::SuburbanTrain => 'S',
            Product::Subway => 'U',
            Product::Tram => 'T',
            Product::Bus => 'B',
            Product::Ferry => 'F',
            Product::Cablecar => 'C',
            Product::OnDemand => 'P',
        }
    }

    /// Parse a product from its code.
    pub fn from_code(c: char) -> Result<Self, InvalidProductCode> {
        Self::ALL
            .into_iter()
            .find(|p| p.code() == c)
            .ok_or(InvalidProductCode(c))
    }

    /// Parse a set of products from a string of codes.
    pub fn from_codes(codes: &str) -> Result<BTreeSet<Self>, InvalidProductCode> {
        codes.chars().map(Self::from_code).collect()
    }

    /// Encode a set of products as a string of codes.
    pub fn codes<'a>(products: impl IntoIterator<Item = &'a Product>) -> String {
        products.into_iter().map(Product::code).collect()
    }

    /// Every product except high-speed trains, the usual network default.
    pub fn all_except_high_speed() -> BTreeSet<Self> {
        Self::ALL
            .into_iter()
            .filter(|p| *p != Product::HighSpeedTrain)
            .collect()
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

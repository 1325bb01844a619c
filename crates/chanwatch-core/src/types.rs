//! Shared types used across the Chanwatch crates.
//!
//! This module defines the domain newtypes that flow between the catalog
//! fetcher, the cursor store, the scan engine and the notifier.

use crate::error::ChanwatchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a catalog product.
///
/// Upstream global ids such as `gid://shopify/Product/42` are reduced to
/// their trailing segment (`42`) by [`ProductId::from_upstream`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new `ProductId` from a string.
    ///
    /// # Errors
    /// Returns error if the id is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ChanwatchError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ChanwatchError::Validation(
                "product id must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Build a `ProductId` from an upstream identifier, stripping a
    /// `gid://<app>/<Type>/` prefix when present.
    pub fn from_upstream(raw: &str) -> Result<Self, ChanwatchError> {
        let id = if raw.starts_with("gid://") {
            raw.rsplit('/').next().unwrap_or_default()
        } else {
            raw
        };
        Self::new(id)
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier under which a scan's resume cursor is stored.
///
/// Scan keys are 1-128 characters of ASCII alphanumerics, `-`, `_`, `.` or `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScanKey(String);

impl ScanKey {
    /// Create a new `ScanKey`.
    ///
    /// # Errors
    /// Returns error if the key is empty, too long, or contains other characters.
    pub fn new(key: impl Into<String>) -> Result<Self, ChanwatchError> {
        let key = key.into();
        if key.is_empty() || key.len() > 128 {
            return Err(ChanwatchError::Validation(format!(
                "invalid scan key: must be 1-128 characters, got {}",
                key.len()
            )));
        }
        let valid = key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
        if !valid {
            return Err(ChanwatchError::Validation(format!(
                "invalid scan key: only ASCII alphanumerics and -_.: are allowed, got '{key}'"
            )));
        }
        Ok(Self(key))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ScanKey {
    fn default() -> Self {
        Self("channel-audit".to_string())
    }
}

impl TryFrom<String> for ScanKey {
    type Error = ChanwatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScanKey> for String {
    fn from(key: ScanKey) -> Self {
        key.0
    }
}

impl FromStr for ScanKey {
    type Err = ChanwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ScanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque continuation token for the upstream paginated sequence.
///
/// Nothing outside the catalog fetcher interprets the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanCursor(String);

impl ScanCursor {
    /// Wrap an upstream token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bundle of sales-channel names that together form one valid
/// publication profile.
///
/// Names are kept in declaration order with duplicates removed and are
/// compared case-sensitively. A group is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ChannelGroup(Vec<String>);

impl ChannelGroup {
    /// Create a group from channel names.
    ///
    /// # Errors
    /// Returns error if no names are given or a name is blank.
    pub fn new<I, S>(names: I) -> Result<Self, ChanwatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut channels: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(ChanwatchError::Validation(
                    "channel group contains a blank channel name".to_string(),
                ));
            }
            if !channels.contains(&name) {
                channels.push(name);
            }
        }

        if channels.is_empty() {
            return Err(ChanwatchError::Validation(
                "channel group must name at least one channel".to_string(),
            ));
        }
        Ok(Self(channels))
    }

    /// Required channel names in declaration order.
    #[must_use]
    pub fn channels(&self) -> &[String] {
        &self.0
    }

    /// Number of required channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for ChannelGroup {
    type Error = ChanwatchError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChannelGroup> for Vec<String> {
    fn from(group: ChannelGroup) -> Self {
        group.0
    }
}

/// Inclusive, case-insensitive range over the first letter of a vendor name.
///
/// Written as `"A-M"` in configuration. Vendors that are empty (after
/// trimming leading whitespace) never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VendorFilter {
    from: char,
    to: char,
}

impl VendorFilter {
    /// Create a filter covering `from..=to`.
    ///
    /// # Errors
    /// Returns error if either bound is not an ASCII letter or the range is inverted.
    pub fn new(from: char, to: char) -> Result<Self, ChanwatchError> {
        if !from.is_ascii_alphabetic() || !to.is_ascii_alphabetic() {
            return Err(ChanwatchError::Validation(format!(
                "vendor range bounds must be ASCII letters, got '{from}'-'{to}'"
            )));
        }
        let (from, to) = (from.to_ascii_uppercase(), to.to_ascii_uppercase());
        if from > to {
            return Err(ChanwatchError::Validation(format!(
                "vendor range is inverted: '{from}' comes after '{to}'"
            )));
        }
        Ok(Self { from, to })
    }

    /// Lower bound (uppercase).
    #[must_use]
    pub fn from_letter(&self) -> char {
        self.from
    }

    /// Upper bound (uppercase).
    #[must_use]
    pub fn to_letter(&self) -> char {
        self.to
    }

    /// Whether the vendor's first letter falls inside the range.
    #[must_use]
    pub fn matches(&self, vendor: &str) -> bool {
        let Some(first) = vendor.trim_start().chars().next() else {
            return false;
        };
        (self.from..=self.to).contains(&first.to_ascii_uppercase())
    }
}

impl FromStr for VendorFilter {
    type Err = ChanwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bounds = s.split('-').map(str::trim);
        let (Some(from), Some(to), None) = (bounds.next(), bounds.next(), bounds.next()) else {
            return Err(ChanwatchError::Validation(format!(
                "vendor range must look like \"A-M\", got '{s}'"
            )));
        };

        let single = |bound: &str| {
            let mut chars = bound.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(ChanwatchError::Validation(format!(
                    "vendor range bound must be a single letter, got '{bound}'"
                ))),
            }
        };

        Self::new(single(from)?, single(to)?)
    }
}

impl TryFrom<String> for VendorFilter {
    type Error = ChanwatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VendorFilter> for String {
    fn from(filter: VendorFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for VendorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// The projection of a catalog product the audit needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable product identifier
    pub id: ProductId,
    /// Owner/brand name, may be empty
    pub vendor: String,
    /// Channels the product currently publishes to
    pub channel_names: BTreeSet<String>,
}

impl Product {
    /// Create a product from its parts.
    pub fn new<I, S>(id: ProductId, vendor: impl Into<String>, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            vendor: vendor.into(),
            channel_names: channels.into_iter().map(Into::into).collect(),
        }
    }
}

/// Why a scan run stopped paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The upstream reported no further pages
    Exhausted,
    /// The configured page bound was reached
    PageBound,
    /// The configured checked-product bound was reached
    CheckedBound,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "catalog exhausted"),
            Self::PageBound => write!(f, "page limit reached"),
            Self::CheckedBound => write!(f, "checked-product limit reached"),
        }
    }
}

/// Outcome of one completed scan run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Scan key the cursor is stored under
    pub scan_key: ScanKey,
    /// Products that passed the vendor filter and were validated
    pub checked_count: u64,
    /// Products excluded by the vendor filter
    pub skipped_count: u64,
    /// Pages fetched from the upstream
    pub pages_fetched: u32,
    /// Non-compliant products in page order, each listed once
    pub invalid_product_ids: Vec<ProductId>,
    /// Why paging stopped
    pub stop_reason: StopReason,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the cursor was committed
    pub finished_at: DateTime<Utc>,
}

impl ScanResult {
    /// True when the upstream sequence was fully consumed in this run.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.stop_reason == StopReason::Exhausted
    }

    /// True when no violations were found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.invalid_product_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_strips_gid_prefix() {
        let id = ProductId::from_upstream("gid://shopify/Product/8123456789").expect("valid gid");
        assert_eq!(id.as_str(), "8123456789");

        let plain = ProductId::from_upstream("42").expect("valid id");
        assert_eq!(plain.as_str(), "42");

        assert!(ProductId::from_upstream("gid://shopify/Product/").is_err());
        assert!(ProductId::new("  ").is_err());
    }

    #[test]
    fn test_scan_key_validation() {
        assert!(ScanKey::new("channel-audit:a-m").is_ok());
        assert!(ScanKey::new("").is_err());
        assert!(ScanKey::new("has space").is_err());
        assert!(ScanKey::new("x".repeat(129)).is_err());
    }

    #[test]
    fn test_channel_group_rejects_empty() {
        let empty: Vec<String> = Vec::new();
        assert!(ChannelGroup::new(empty).is_err());
        assert!(ChannelGroup::new(["Online Store", " "]).is_err());
    }

    #[test]
    fn test_channel_group_dedupes_in_order() {
        let group = ChannelGroup::new(["Online Store", "Carro", "Online Store"]).expect("valid");
        assert_eq!(group.channels(), ["Online Store", "Carro"]);
    }

    #[test]
    fn test_channel_group_deserialize() {
        let group: ChannelGroup =
            serde_json::from_str(r#"["Online Store","Carro"]"#).expect("parse group");
        assert_eq!(group.len(), 2);

        let empty: Result<ChannelGroup, _> = serde_json::from_str("[]");
        assert!(empty.is_err());
    }

    #[test]
    fn test_vendor_filter_bounds_inclusive() {
        let filter = VendorFilter::new('a', 'm').expect("valid range");
        assert!(filter.matches("Acme"));
        assert!(filter.matches("mojo"));
        assert!(filter.matches("  Kettle Co"));
        assert!(!filter.matches("Nordic"));
        assert!(!filter.matches(""));
        assert!(!filter.matches("   "));
        assert!(!filter.matches("3M"));
    }

    #[test]
    fn test_vendor_filter_parse() {
        let filter: VendorFilter = "n - z".parse().expect("parse range");
        assert_eq!(filter.from_letter(), 'N');
        assert_eq!(filter.to_letter(), 'Z');
        assert_eq!(filter.to_string(), "N-Z");

        assert!("M-A".parse::<VendorFilter>().is_err());
        assert!("AB-M".parse::<VendorFilter>().is_err());
        assert!("A".parse::<VendorFilter>().is_err());
        assert!("1-9".parse::<VendorFilter>().is_err());
    }

    #[test]
    fn test_scan_result_exhausted_follows_stop_reason() {
        let now = Utc::now();
        let mut result = ScanResult {
            run_id: Uuid::new_v4(),
            scan_key: ScanKey::new("test").expect("valid key"),
            checked_count: 0,
            skipped_count: 0,
            pages_fetched: 0,
            invalid_product_ids: Vec::new(),
            stop_reason: StopReason::Exhausted,
            started_at: now,
            finished_at: now,
        };
        assert!(result.exhausted());
        assert!(result.is_clean());

        result.stop_reason = StopReason::PageBound;
        assert!(!result.exhausted());
    }
}

//! Product selection and channel-group validation.

use chanwatch_core::{ChannelGroup, VendorFilter};
use std::collections::BTreeSet;

/// Whether a product's channels satisfy at least one valid group.
///
/// Ignored channels are removed first. A group is satisfied when every
/// channel it names is present; extra channels are allowed. A product with
/// no channels is never compliant.
#[must_use]
pub fn is_compliant(
    channel_names: &BTreeSet<String>,
    groups: &[ChannelGroup],
    ignored: &[String],
) -> bool {
    if channel_names.is_empty() {
        return false;
    }

    let effective: BTreeSet<&str> = channel_names
        .iter()
        .map(String::as_str)
        .filter(|name| !ignored.iter().any(|ignored| ignored == name))
        .collect();

    groups.iter().any(|group| {
        group
            .channels()
            .iter()
            .all(|required| effective.contains(required.as_str()))
    })
}

/// Whether a vendor is selected for validation. Without a filter every
/// vendor is, including an empty one.
#[must_use]
pub fn in_vendor_scope(filter: Option<&VendorFilter>, vendor: &str) -> bool {
    filter.map_or(true, |filter| filter.matches(vendor))
}

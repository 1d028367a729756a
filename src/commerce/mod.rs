//! Storefront commerce layer
//!
//! The persistence boundary ([`StorefrontBackend`]), its HTTP implementation,
//! and [`CommerceActions`], the single implementation of every business
//! operation. The local regex executor, the structured intent executor, and
//! the streaming tool registry all resolve to calls against `CommerceActions`,
//! differing only in how they parse their trigger into a method call.

mod actions;
mod backend;
mod http;

pub use actions::{ActionOutcome, CommerceActions, ProductRef};
pub use backend::{CityRegion, OrderLine, OrderRecord, Product, Review, StorefrontBackend};
pub use http::HttpBackend;

/// Format a cent amount as US dollars, e.g. `4500` → `"$45.00"`
#[must_use]
pub fn format_usd(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_dollars_and_cents() {
        assert_eq!(format_usd(0), "$0.00");
        assert_eq!(format_usd(5), "$0.05");
        assert_eq!(format_usd(1000), "$10.00");
        assert_eq!(format_usd(123_456), "$1234.56");
    }
}

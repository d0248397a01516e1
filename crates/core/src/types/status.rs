//! Status enums for marketplace entities.

use serde::{Deserialize, Serialize};

/// Payment status of a checkout transaction.
///
/// Checkout creates transactions in `Pending`; the payment backend moves them
/// onward. The storefront never transitions a transaction past `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_wire_format() {
        let json = serde_json::to_string(&PaymentStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
    }
}

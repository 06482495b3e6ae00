//! Invariant checks for incoming order aggregates.

use rust_decimal::Decimal;

use super::order::Order;

/// Errors that can occur when validating an [`Order`].
///
/// Validation stops at the first violated invariant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// The payment amount is below zero.
    #[error("payment amount cannot be negative")]
    NegativeAmount,
    /// An item has a zero catalog id.
    #[error("item[{index}]: chrt_id is required")]
    MissingChrtId {
        /// Position of the offending item.
        index: usize,
    },
    /// An item has an empty name.
    #[error("item[{index}]: name is required")]
    MissingItemName {
        /// Position of the offending item.
        index: usize,
    },
    /// An item has a negative price or total price.
    #[error("item[{index}]: price/total_price cannot be negative")]
    NegativeItemPrice {
        /// Position of the offending item.
        index: usize,
    },
}

impl Order {
    /// Check the aggregate invariants.
    ///
    /// ## Constraints
    ///
    /// - `order_uid`, `track_number`, `customer_id` are non-empty
    /// - `delivery.name` and `delivery.address` are non-empty
    /// - `payment.transaction` is non-empty and `payment.amount >= 0`
    /// - every item has a non-zero `chrt_id`, a non-empty `name`, and
    ///   non-negative `price` and `total_price`
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order_uid.is_empty() {
            return Err(ValidationError::MissingField("order_uid"));
        }
        if self.track_number.is_empty() {
            return Err(ValidationError::MissingField("track_number"));
        }
        if self.customer_id.is_empty() {
            return Err(ValidationError::MissingField("customer_id"));
        }
        if self.delivery.name.is_empty() {
            return Err(ValidationError::MissingField("delivery.name"));
        }
        if self.delivery.address.is_empty() {
            return Err(ValidationError::MissingField("delivery.address"));
        }
        if self.payment.transaction.is_empty() {
            return Err(ValidationError::MissingField("payment.transaction"));
        }
        if self.payment.amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount);
        }

        for (index, item) in self.items.iter().enumerate() {
            if item.chrt_id == 0 {
                return Err(ValidationError::MissingChrtId { index });
            }
            if item.name.is_empty() {
                return Err(ValidationError::MissingItemName { index });
            }
            if item.price < Decimal::ZERO || item.total_price < Decimal::ZERO {
                return Err(ValidationError::NegativeItemPrice { index });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::OrderUid;
    use crate::fixtures::sample_order;

    #[test]
    fn test_sample_order_is_valid() {
        assert_eq!(sample_order("A1").validate(), Ok(()));
    }

    #[test]
    fn test_missing_root_fields() {
        let mut order = sample_order("A1");
        order.order_uid = OrderUid::new("");
        assert_eq!(
            order.validate(),
            Err(ValidationError::MissingField("order_uid"))
        );

        let mut order = sample_order("A1");
        order.track_number.clear();
        assert_eq!(
            order.validate(),
            Err(ValidationError::MissingField("track_number"))
        );

        let mut order = sample_order("A1");
        order.customer_id.clear();
        assert_eq!(
            order.validate(),
            Err(ValidationError::MissingField("customer_id"))
        );
    }

    #[test]
    fn test_missing_delivery_fields() {
        let mut order = sample_order("A1");
        order.delivery.name.clear();
        assert_eq!(
            order.validate(),
            Err(ValidationError::MissingField("delivery.name"))
        );

        let mut order = sample_order("A1");
        order.delivery.address.clear();
        assert_eq!(
            order.validate(),
            Err(ValidationError::MissingField("delivery.address"))
        );
    }

    #[test]
    fn test_payment_rules() {
        let mut order = sample_order("A1");
        order.payment.transaction.clear();
        assert_eq!(
            order.validate(),
            Err(ValidationError::MissingField("payment.transaction"))
        );

        let mut order = sample_order("A1");
        order.payment.amount = Decimal::new(-1, 0);
        assert_eq!(order.validate(), Err(ValidationError::NegativeAmount));

        let mut order = sample_order("A1");
        order.payment.amount = Decimal::ZERO;
        assert_eq!(order.validate(), Ok(()));
    }

    #[test]
    fn test_item_rules_report_index() {
        let mut order = sample_order("A1");
        order.items.push(order.items[0].clone());
        order.items[1].chrt_id = 0;
        assert_eq!(
            order.validate(),
            Err(ValidationError::MissingChrtId { index: 1 })
        );

        let mut order = sample_order("A1");
        order.items[0].name.clear();
        assert_eq!(
            order.validate(),
            Err(ValidationError::MissingItemName { index: 0 })
        );

        let mut order = sample_order("A1");
        order.items[0].total_price = Decimal::new(-5, 1);
        assert_eq!(
            order.validate(),
            Err(ValidationError::NegativeItemPrice { index: 0 })
        );
    }

    #[test]
    fn test_order_without_items_is_valid() {
        let mut order = sample_order("A1");
        order.items.clear();
        assert_eq!(order.validate(), Ok(()));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::MissingField("customer_id").to_string(),
            "customer_id is required"
        );
        assert_eq!(
            ValidationError::NegativeItemPrice { index: 2 }.to_string(),
            "item[2]: price/total_price cannot be negative"
        );
    }
}

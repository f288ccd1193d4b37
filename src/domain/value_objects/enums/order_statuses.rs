use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::payment_statuses::PaymentStatus;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        };
        write!(f, "{}", status)
    }
}

impl OrderStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "out_for_delivery" => Some(OrderStatus::OutForDelivery),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    /// Position on the delivery track. Cancel/refund side branches have no
    /// rank.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::OutForDelivery => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled | OrderStatus::Refunded => None,
        }
    }

    /// Activated but not yet delivered, cancelled, or refunded. At most one
    /// order per subscription may be in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed | OrderStatus::Preparing | OrderStatus::OutForDelivery
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    /// Transition rules of the order lifecycle:
    /// - forward only along the delivery track; operator updates may jump
    ///   several steps at once, never backwards,
    /// - `cancelled` from anything except `delivered` and the terminal pair,
    /// - `refunded` only once paid, and only from `delivered` or `cancelled`,
    /// - nothing leaves `refunded`.
    pub fn can_transition_to(&self, target: OrderStatus, payment: PaymentStatus) -> bool {
        if *self == target {
            return false;
        }

        match target {
            OrderStatus::Cancelled => !matches!(
                self,
                OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
            ),
            OrderStatus::Refunded => {
                payment == PaymentStatus::Paid
                    && matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
            }
            _ => match (self.rank(), target.rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_steps_and_jumps_are_allowed() {
        let paid = PaymentStatus::Paid;
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed, paid));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Preparing, paid));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::OutForDelivery, paid));
        assert!(OrderStatus::OutForDelivery.can_transition_to(OrderStatus::Delivered, paid));
        // Operator corrections may skip steps.
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Delivered, paid));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::OutForDelivery, paid));
    }

    #[test]
    fn backward_moves_are_rejected() {
        let paid = PaymentStatus::Paid;
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Preparing, paid));
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Confirmed, paid));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Pending, paid));
    }

    #[test]
    fn cancel_is_reachable_from_everything_but_delivered_and_terminal() {
        let pending_payment = PaymentStatus::Pending;
        for from in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
        ] {
            assert!(from.can_transition_to(OrderStatus::Cancelled, pending_payment));
        }
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled, pending_payment));
        assert!(!OrderStatus::Refunded.can_transition_to(OrderStatus::Cancelled, pending_payment));
    }

    #[test]
    fn refund_requires_payment_and_a_settled_order() {
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Refunded, PaymentStatus::Paid));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Refunded, PaymentStatus::Paid));
        assert!(
            !OrderStatus::Delivered.can_transition_to(OrderStatus::Refunded, PaymentStatus::Pending)
        );
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Refunded, PaymentStatus::Paid));
    }

    #[test]
    fn terminal_states_accept_nothing_else() {
        for target in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            assert!(!OrderStatus::Refunded.can_transition_to(target, PaymentStatus::Paid));
            assert!(!OrderStatus::Cancelled.can_transition_to(target, PaymentStatus::Paid));
        }
    }

    #[test]
    fn in_flight_matches_the_activated_band() {
        assert!(!OrderStatus::Pending.is_in_flight());
        assert!(OrderStatus::Confirmed.is_in_flight());
        assert!(OrderStatus::Preparing.is_in_flight());
        assert!(OrderStatus::OutForDelivery.is_in_flight());
        assert!(!OrderStatus::Delivered.is_in_flight());
        assert!(!OrderStatus::Cancelled.is_in_flight());
        assert!(!OrderStatus::Refunded.is_in_flight());
    }
}

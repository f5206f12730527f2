use crate::models::earnings::{CommissionBreakdown, EarningsRecord};
use crate::models::offer::Offer;

/// Default payout policy: the net earning was negotiated upstream and is taken
/// as-is; subtotal and fee are carried for record keeping.
pub fn compute_earnings(offer: &Offer) -> EarningsRecord {
    EarningsRecord {
        order_subtotal: offer.order_value,
        delivery_fee: offer.delivery_fee,
        driver_net_earning: offer.driver_net_earning,
        commission: commission(offer.delivery_fee, offer.driver_net_earning),
    }
}

fn commission(delivery_fee: u64, driver_net_earning: u64) -> Option<CommissionBreakdown> {
    match delivery_fee.checked_sub(driver_net_earning) {
        Some(platform_fee) if platform_fee > 0 => Some(CommissionBreakdown { platform_fee }),
        _ => None,
    }
}

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::PaymentMethod;

pub const DEFAULT_CARRIER: &str = "Storefront Express";
const DELIVERY_DAYS: i64 = 5;

/// A tracking number of the form `SF` followed by 12 digits.
pub fn new_tracking_number() -> String {
    let mut rng = rand::thread_rng();
    let digits: String = (0..12).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect();
    format!("SF{digits}")
}

/// A reference for a simulated payment, e.g. `CARD-7G2K9Q4M1XZB`.
pub fn new_transaction_ref(method: PaymentMethod) -> String {
    let prefix = match method {
        PaymentMethod::Card => "CARD",
        PaymentMethod::Paypal => "PP",
        PaymentMethod::CashOnDelivery => "COD",
    };
    let code: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(12).map(|c| char::from(c).to_ascii_uppercase()).collect();
    format!("{prefix}-{code}")
}

pub fn estimated_delivery(from: DateTime<Utc>) -> DateTime<Utc> {
    from + Duration::days(DELIVERY_DAYS)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tracking_numbers() {
        let n = new_tracking_number();
        assert_eq!(n.len(), 14);
        assert!(n.starts_with("SF"));
        assert!(n[2..].chars().all(|c| c.is_ascii_digit()));
        assert_ne!(n, new_tracking_number());
    }

    #[test]
    fn transaction_refs() {
        let r = new_transaction_ref(PaymentMethod::CashOnDelivery);
        assert!(r.starts_with("COD-"));
        assert_eq!(r.len(), 16);
        assert!(new_transaction_ref(PaymentMethod::Paypal).starts_with("PP-"));
    }
}

use serde::{Deserialize, Serialize};

/// Fare frozen onto a booking at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareQuote {
    pub fare_per_passenger: i64,
    pub passengers: u32,
    pub total_fare: i64,
}

impl FareQuote {
    /// `fare_per_passenger × passengers`, refusing negative fares and overflow.
    pub fn new(fare_per_passenger: i64, passengers: usize) -> Result<Self, PricingError> {
        if fare_per_passenger < 0 {
            return Err(PricingError::NegativeFare(fare_per_passenger));
        }

        let passengers = u32::try_from(passengers).map_err(|_| PricingError::Overflow)?;
        let total_fare = fare_per_passenger
            .checked_mul(i64::from(passengers))
            .ok_or(PricingError::Overflow)?;

        Ok(Self {
            fare_per_passenger,
            passengers,
            total_fare,
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Fare per passenger cannot be negative: {0}")]
    NegativeFare(i64),

    #[error("Total fare overflows")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_fare_is_fare_times_passengers() {
        let quote = FareQuote::new(485, 70).unwrap();
        assert_eq!(quote.total_fare, 33950);
        assert_eq!(quote.passengers, 70);
    }

    #[test]
    fn test_rejects_negative_and_overflowing_fares() {
        assert_eq!(FareQuote::new(-5, 1), Err(PricingError::NegativeFare(-5)));
        assert_eq!(FareQuote::new(i64::MAX, 2), Err(PricingError::Overflow));
    }
}

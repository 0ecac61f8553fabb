//! Pure data structures shared across the simulation.

use serde::{Deserialize, Serialize};

/// A simulated driver or customer identity, as returned by the backend on
/// login.
///
/// Owned exclusively by its actor and immutable after creation: one login,
/// one identity, one actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub access_token: String,
}

/// Samples a star rating uniformly in `[0, 5)`.
pub fn sample_rating() -> f64 {
    use rand::Rng;
    rand::thread_rng().gen::<f64>() * 5.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_stay_in_range() {
        for _ in 0..1000 {
            let rating = sample_rating();
            assert!((0.0..5.0).contains(&rating));
        }
    }
}

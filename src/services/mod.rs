pub mod bard;
pub mod extractor;
pub mod rate_limit;
pub mod spotify;

pub use bard::BardClient;
pub use rate_limit::{RateDecision, RateLimiter};
pub use spotify::{ReconcileOutcome, SpotifyClient};

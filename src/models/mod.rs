pub mod bard;
pub mod playlist;
pub mod song;

pub use bard::{BardData, BardRequest, BardResponse};
pub use playlist::{PlaylistRequest, PlaylistResult, TokenExchangeRequest, TokenExchangeResponse};
pub use song::SongEntry;

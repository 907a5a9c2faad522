/// A single extracted song recommendation.
///
/// Both fields are trimmed at construction; the wire rendering is the
/// `"artist - title"` form the Spotify search step consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongEntry {
    pub artist: String,
    pub title: String,
}

impl SongEntry {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into().trim().to_string(),
            title: title.into().trim().to_string(),
        }
    }

    pub fn render(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

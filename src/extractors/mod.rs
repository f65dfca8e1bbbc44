pub mod videostr;

use crate::models::{StreamDescriptor, Subtitle};

/// What one server link resolved to. `subtitles` are attached by the caller,
/// they are not tied to a particular entry of `streams`.
#[derive(Debug, Default)]
pub struct LinkStreams {
    pub streams: Vec<StreamDescriptor>,
    pub subtitles: Vec<Subtitle>,
}

impl LinkStreams {
    pub fn single(stream: StreamDescriptor) -> Self {
        Self {
            streams: vec![stream],
            subtitles: vec![],
        }
    }
}

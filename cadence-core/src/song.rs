use std::{io::Read, rc::Rc, time::Duration};

use serde::Deserialize;

use crate::{context::Context, error::Error, value::Value};

/// One playable track. Rows and the player hold it as `Rc<Song>` and compare
/// by pointer, two songs with equal fields are still different items.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Length in whole seconds.
    pub duration: u32,
}

impl Song {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration.into())
    }

    pub fn duration_label(&self) -> String {
        let secs = self.duration;
        format!("{}:{:02}", secs / 60, secs % 60)
    }

    /// Reads a JSON array of songs.
    pub fn load_library(reader: impl Read) -> Result<Vec<Rc<Song>>, Error> {
        let songs: Vec<Song> = serde_json::from_reader(reader)?;
        Ok(songs.into_iter().map(Rc::new).collect())
    }
}

impl Context for Song {
    fn get(&self, key: &str) -> Option<Value> {
        let value = match key {
            "id" => self.id.as_str().into(),
            "title" => self.title.as_str().into(),
            "artist" => self.artist.as_str().into(),
            "album" => self.album.as_str().into(),
            "duration" => self.duration.into(),
            "durationLabel" => self.duration_label().into(),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_loads_from_json_array() {
        let json = r#"[
            { "id": "a", "title": "Song A", "artist": "Someone", "duration": 187 },
            { "title": "Song B" }
        ]"#;
        let songs = Song::load_library(json.as_bytes()).unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].duration_label(), "3:07");
        assert_eq!(songs[1].artist, "");
        assert_eq!(songs[1].get("title").unwrap().as_str(), Some("Song B"));
        assert!(songs[1].get("lyrics").is_none());
    }

    #[test]
    fn malformed_library_is_a_json_error() {
        let err = Song::load_library("{".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::JsonError(_)));
    }
}

use std::{cell::RefCell, rc::Rc};

use crate::{
    context::Context,
    observe::{Signal, Subscription},
    player::Player,
    song::Song,
    value::Value,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowAction {
    Play,
    Pause,
}

/// View-model of one song in a list, bound to the shared player.
pub struct SongRow {
    song: RefCell<Option<Rc<Song>>>,
    player: Rc<Player>,
    changes: Signal,
    _player_changes: Subscription,
}

impl SongRow {
    pub fn new(song: Option<Rc<Song>>, player: Rc<Player>) -> Self {
        let changes = Signal::new();
        let player_changes = player.changes().subscribe({
            let changes = changes.clone();
            move || changes.notify()
        });
        Self {
            song: RefCell::new(song),
            player,
            changes,
            _player_changes: player_changes,
        }
    }

    pub fn song(&self) -> Option<Rc<Song>> {
        self.song.borrow().clone()
    }

    pub fn set_song(&self, song: Option<Rc<Song>>) {
        self.song.replace(song);
        self.changes.notify();
    }

    pub fn player(&self) -> &Rc<Player> {
        &self.player
    }

    pub fn is_current_item(&self) -> bool {
        self.song
            .borrow()
            .as_ref()
            .is_some_and(|song| self.player.is_current(song))
    }

    pub fn is_playing(&self) -> bool {
        self.is_current_item() && self.player.is_playing()
    }

    pub fn play(&self) {
        match self.song() {
            Some(song) => self.player.play(song),
            None => log::warn!("play requested on a row without a song"),
        }
    }

    pub fn pause(&self) {
        self.player.pause();
    }

    pub fn handle(&self, action: RowAction) {
        match action {
            RowAction::Play => self.play(),
            RowAction::Pause => self.pause(),
        }
    }

    /// Plays this row's song, or pauses it if it is the one playing.
    pub fn toggle(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }
}

impl Context for SongRow {
    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "song" => Some(self.song().into()),
            "player" => Some(Value::Object(self.player.clone())),
            "isCurrentItem" | "isCurrentSong" => Some(self.is_current_item().into()),
            "isPlaying" => Some(self.is_playing().into()),
            _ => None,
        }
    }

    fn changes(&self) -> Option<&Signal> {
        Some(&self.changes)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn setup() -> (Rc<Player>, Rc<Song>, SongRow) {
        let player = Rc::new(Player::new());
        let song = Rc::new(Song::new("Song A"));
        let row = SongRow::new(Some(song.clone()), player.clone());
        (player, song, row)
    }

    #[test]
    fn current_item_is_identity_of_song() {
        let (player, _song, row) = setup();
        assert!(!row.is_current_item());
        player.play(Rc::new(Song::new("Song A")));
        assert!(!row.is_current_item());
        row.play();
        assert!(row.is_current_item());
    }

    #[test]
    fn is_playing_needs_current_and_playing() {
        let (player, song, row) = setup();
        let other = Rc::new(Song::new("Song B"));

        // not current, not playing
        assert!(!row.is_playing());
        // not current, playing
        player.play(other);
        assert!(!row.is_playing());
        // current, playing
        player.play(song);
        assert!(row.is_playing());
        // current, not playing
        player.pause();
        assert!(row.is_current_item());
        assert!(!row.is_playing());
    }

    #[test]
    fn play_overrides_prior_state() {
        let (player, song, row) = setup();
        player.play(Rc::new(Song::new("Song B")));
        player.pause();
        row.handle(RowAction::Play);
        assert!(player.is_current(&song));
        assert!(player.is_playing());
    }

    #[test]
    fn pause_leaves_current_item() {
        let (player, song, row) = setup();
        row.play();
        row.handle(RowAction::Pause);
        assert!(!player.is_playing());
        assert!(player.is_current(&song));
    }

    #[test]
    fn toggle_flips_between_play_and_pause() {
        let (player, _song, row) = setup();
        row.toggle();
        assert!(row.is_playing());
        row.toggle();
        assert!(!player.is_playing());
    }

    #[test]
    fn player_and_song_changes_reach_row_listeners() {
        let (player, _song, row) = setup();
        let calls = Rc::new(Cell::new(0));
        let _sub = Context::changes(&row).unwrap().subscribe({
            let calls = calls.clone();
            move || calls.set(calls.get() + 1)
        });
        row.play();
        player.pause();
        row.set_song(Some(Rc::new(Song::new("Song B"))));
        assert_eq!(calls.get(), 3);
        assert!(!row.is_current_item());
    }

    #[test]
    fn dropping_row_releases_player_observer() {
        let (player, _song, row) = setup();
        assert_eq!(player.changes().observer_count(), 1);
        drop(row);
        assert_eq!(player.changes().observer_count(), 0);
    }

    #[test]
    fn row_without_song_is_never_current() {
        let player = Rc::new(Player::new());
        let row = SongRow::new(None, player.clone());
        row.play();
        assert!(!row.is_current_item());
        assert!(player.current_item().is_none());
        assert!(row.get("song").unwrap().is_nullish());
    }
}

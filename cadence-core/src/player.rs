use std::{cell::RefCell, rc::Rc};

use crate::{context::Context, observe::Signal, song::Song, value::Value};

#[derive(Clone, Debug, Default)]
pub struct PlayerState {
    current_item: Option<Rc<Song>>,
    is_playing: bool,
}

impl PlayerState {
    pub fn current_item(&self) -> Option<&Rc<Song>> {
        self.current_item.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }
}

/// The shared playback service. Its state can only be changed through
/// [`Player::play`] and [`Player::pause`], every effective change is
/// announced on [`Player::changes`].
#[derive(Debug, Default)]
pub struct Player {
    state: RefCell<PlayerState>,
    changes: Signal,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&self, item: Rc<Song>) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let same_item = state
                .current_item
                .as_ref()
                .is_some_and(|current| Rc::ptr_eq(current, &item));
            if same_item && state.is_playing {
                false
            } else {
                log::info!("playing {:?}", item.title);
                state.current_item = Some(item);
                state.is_playing = true;
                true
            }
        };
        if changed {
            self.changes.notify();
        }
    }

    pub fn pause(&self) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let was_playing = state.is_playing;
            state.is_playing = false;
            was_playing
        };
        if changed {
            log::info!("paused");
            self.changes.notify();
        }
    }

    pub fn current_item(&self) -> Option<Rc<Song>> {
        self.state.borrow().current_item.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().is_playing
    }

    pub fn is_current(&self, item: &Rc<Song>) -> bool {
        self.state
            .borrow()
            .current_item
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, item))
    }

    pub fn state(&self) -> PlayerState {
        self.state.borrow().clone()
    }

    pub fn changes(&self) -> &Signal {
        &self.changes
    }
}

impl Context for Player {
    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "currentItem" | "song" => Some(self.current_item().into()),
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

    fn counter(player: &Player) -> (Rc<Cell<usize>>, crate::observe::Subscription) {
        let calls = Rc::new(Cell::new(0));
        let sub = player.changes().subscribe({
            let calls = calls.clone();
            move || calls.set(calls.get() + 1)
        });
        (calls, sub)
    }

    #[test]
    fn play_sets_item_and_flag() {
        let player = Player::new();
        let song = Rc::new(Song::new("Song A"));
        player.play(song.clone());
        assert!(player.is_current(&song));
        assert!(player.is_playing());
    }

    #[test]
    fn pause_keeps_current_item() {
        let player = Player::new();
        let song = Rc::new(Song::new("Song A"));
        player.play(song.clone());
        player.pause();
        assert!(!player.is_playing());
        assert!(player.is_current(&song));
    }

    #[test]
    fn only_effective_changes_notify() {
        let player = Player::new();
        let (calls, _sub) = counter(&player);
        let song = Rc::new(Song::new("Song A"));
        player.pause();
        player.play(song.clone());
        player.play(song.clone());
        player.pause();
        player.play(song);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn current_item_is_compared_by_identity() {
        let player = Player::new();
        let a = Rc::new(Song::new("Same"));
        let b = Rc::new(Song::new("Same"));
        player.play(a);
        assert!(!player.is_current(&b));
    }

    #[test]
    fn context_exposes_state() {
        let player = Player::new();
        assert!(player.get("currentItem").unwrap().is_nullish());
        player.play(Rc::new(Song::new("Song A")));
        let title = player.get("song").and_then(|song| song.get("title"));
        assert_eq!(title.unwrap().as_str(), Some("Song A"));
        assert!(player.get("isPlaying").unwrap().is_truthy());
    }
}

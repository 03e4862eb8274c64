mod config;

use std::{
    env,
    fs::File,
    io::{self, BufRead},
    path::{Path, PathBuf},
    process,
    rc::Rc,
    str::FromStr,
    thread,
};

use cadence_core::{
    dom::Document,
    error::Error,
    player::Player,
    row::RowAction,
    scheduler::RenderQueue,
    song::Song,
    view::SongList,
};
use crossbeam_channel::unbounded;
use env_logger::{Builder, Env};

use crate::config::Config;

const ENV_LOG: &str = "CADENCE_LOG";
const ENV_LOG_STYLE: &str = "CADENCE_LOG_STYLE";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Command {
    /// Row indices are zero-based here, one-based on the command line.
    Row(usize, RowAction),
    PauseAll,
    Remove(usize),
    Show,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let index = match words.next() {
            Some(word) => match word.parse::<usize>() {
                Ok(n) if n > 0 => Some(n - 1),
                _ => return Err(format!("invalid row number: {word}")),
            },
            None => None,
        };
        match (verb, index) {
            ("play" | "p", Some(i)) => Ok(Command::Row(i, RowAction::Play)),
            ("pause" | "s", Some(i)) => Ok(Command::Row(i, RowAction::Pause)),
            ("pause" | "s", None) => Ok(Command::PauseAll),
            ("remove" | "rm", Some(i)) => Ok(Command::Remove(i)),
            ("show", None) => Ok(Command::Show),
            ("quit" | "q", None) => Ok(Command::Quit),
            ("play" | "p" | "remove" | "rm", None) => Err(format!("{verb} needs a row number")),
            _ => Err(format!("unknown command: {s}")),
        }
    }
}

fn main() {
    // Setup logging from the env variables, with defaults.
    Builder::from_env(
        Env::new()
            .filter_or(ENV_LOG, "info")
            .write_style(ENV_LOG_STYLE),
    )
    .init();

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            log::error!("failed to load config: {}", err);
            Config::default()
        }
    };
    let library = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.library.clone());

    if let Err(err) = run(library, &config) {
        log::error!("{}", err);
        process::exit(1);
    }
}

fn load_songs(library: Option<&Path>) -> Result<Vec<Rc<Song>>, Error> {
    match library {
        Some(path) => {
            log::info!("loading library: {:?}", path);
            Song::load_library(File::open(path)?)
        }
        None => Ok(demo_library()),
    }
}

fn run(library: Option<PathBuf>, config: &Config) -> Result<(), Error> {
    let songs = load_songs(library.as_deref())?;

    let player = Rc::new(Player::new());
    let queue = RenderQueue::new();
    let mut doc = Document::new();
    let mut list = SongList::mount(&mut doc, &queue, player.clone(), songs, config.row_classes())?;
    doc.take_mutations();
    println!("{}", doc.outer_html(list.element()));

    let (sender, receiver) = unbounded();
    let _input_thread = thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if sender.send(command).is_err() {
                        break;
                    }
                }
                Err(err) => log::warn!("{}", err),
            }
        }
    });

    // Every command is one turn, the queue is flushed once after it.
    for command in receiver {
        match command {
            Command::Quit => break,
            Command::Show => {
                println!("{}", doc.outer_html(list.element()));
                continue;
            }
            Command::Row(index, action) => match list.get(index) {
                Some(view) => view.handle(action),
                None => log::warn!("no row {}", index + 1),
            },
            Command::PauseAll => player.pause(),
            Command::Remove(index) => match list.remove(&mut doc, index) {
                Some(song) => log::info!("removed {:?}", song.title),
                None => log::warn!("no row {}", index + 1),
            },
        }
        if let Err(err) = queue.flush(&mut doc) {
            log::error!("render failed: {}", err);
        }
        for mutation in doc.take_mutations() {
            println!("{}", mutation);
        }
    }

    list.unmount(&mut doc);
    Ok(())
}

fn demo_library() -> Vec<Rc<Song>> {
    [("Blue", 180), ("River", 240), ("A Case of You", 262)]
        .into_iter()
        .enumerate()
        .map(|(i, (title, duration))| {
            Rc::new(Song {
                id: format!("demo-{i}"),
                title: title.to_owned(),
                artist: "Joni Mitchell".to_owned(),
                album: "Blue".to_owned(),
                duration,
            })
        })
        .collect()
}

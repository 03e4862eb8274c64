pub mod binding;
pub mod context;
pub mod dom;
pub mod error;
pub mod observe;
pub mod path;
pub mod player;
pub mod row;
pub mod scheduler;
pub mod song;
pub mod value;
pub mod view;

pub mod web;

pub use web::{SlackChannel, SlackClient, SlackError, SlackUser};

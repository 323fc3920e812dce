//! CLI process lifecycle
//!
//! Spawning, line streaming, turn-completion detection and shutdown of the
//! external agent CLI.

mod streamer;
mod terminator;
mod turn;
mod wrapped_child;

pub use streamer::{LineStream, spawn_lines};
pub use terminator::{ExitOutcome, reap, request_termination, terminate_after_grace};
pub use turn::{TURN_COMPLETED, is_turn_completed};
pub use wrapped_child::WrappedChild;

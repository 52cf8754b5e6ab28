#![warn(clippy::pedantic)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod arc_consistency;
pub mod backtracking_search;
pub mod consistency;
pub mod domain;
pub mod puzzle;
pub mod render;
pub mod types;
pub mod util;
pub mod word_list;

pub const LOG_FILL_PROCESS: bool = cfg!(feature = "log_fill_process");
pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

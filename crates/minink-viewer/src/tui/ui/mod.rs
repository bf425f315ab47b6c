/*
[INPUT]:  TUI app state for UI components
[OUTPUT]: Panel render functions and module exports
[POS]:    TUI UI module root
[UPDATE]: When adding or removing panels
*/

mod entries;
mod filter;
mod hosts;
mod logs;

pub(in crate::tui) use entries::{draw_entries, entries_viewport_height};
pub(in crate::tui) use filter::draw_filter_bar;
pub(in crate::tui) use hosts::draw_hosts;
pub(in crate::tui) use logs::draw_logs;

//! Tower middleware layers.
//!
//! [`cors`] attaches the cross-origin contract to every response,
//! success or failure, so browser callers can always read status and body.

pub mod cors;

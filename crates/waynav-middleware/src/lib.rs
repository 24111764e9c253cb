//! `waynav-middleware` – in-process messaging between navigation components.
//!
//! - [`bus`] – [`EventBus`][bus::EventBus]: topic-partitioned broadcast of
//!   [`Event`][waynav_types::Event]s (poses, commands, status, faults).

pub mod bus;

pub use bus::{EventBus, Topic, TopicReceiver};

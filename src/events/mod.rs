//! # Events Module
//!
//! One-way event stream from the clustering worker to whatever drives it.
//!
//! ## Design
//! The core never touches caller state. It emits events through a channel
//! and the receiving side (CLI, GUI, tests) applies them on its own thread.
//!
//! ## Example
//! ```rust,ignore
//! let (mut runner, receiver) = ClusterRunner::new();
//! runner.start("/data/images", 5, true, HashAlgorithmKind::Average)?;
//!
//! for event in receiver.iter() {
//!     match event {
//!         Event::Cluster(ClusterEvent::Progress(p)) => println!("{}% {}", p.percent, p.message),
//!         Event::Cluster(ClusterEvent::ClusterFound(c)) => println!("{} images", c.len()),
//!         Event::Cluster(ClusterEvent::Finished(_)) => break,
//!         _ => {}
//!     }
//! }
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;

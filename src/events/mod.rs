//! # Events Module
//!
//! Notifications from the pipeline worker to whoever drives it.
//!
//! ## Design
//! The worker never calls back into the caller. It reports item state
//! changes, progress and errors through a channel, so a CLI, a GUI or a
//! test can all listen the same way.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//! let controller = Pipeline::builder().events(sender).spawn()?;
//! controller.add_dir(Path::new("/traps"))?;
//!
//! for event in receiver.iter() {
//!     match event {
//!         Event::Progress(p) => println!("{} {}: {}%", p.phase, p.id, p.percent),
//!         Event::Pipeline(PipelineEvent::Idle) => break,
//!         _ => {}
//!     }
//! }
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;

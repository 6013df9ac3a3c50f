//! sourcepane: the source list of a feed reader, as a state container.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐ records ┌────────────┐ Transition ┌─────────────┐
//! │  channel/  │ ──────► │  actions   │ ─────────► │    state    │
//! │ (backing)  │         │ (routines) │            │ (snapshot)  │
//! └────────────┘         └────────────┘            └─────────────┘
//!                                                         │ + Mode
//!                                                         ▼
//!                                                   ┌───────────┐
//!                                                   │   view    │
//!                                                   └───────────┘
//! ```
//!
//! * **`source`**: the `Source` entity and the `Selection` type.
//! * **`mode`**: `Mode` (All / Starred / Unread) and the counter type it
//!   implies.
//! * **`state`**: the `SourceState` snapshot, its pure transitions, and the
//!   `SourceStore` that publishes each new snapshot.
//! * **`channel`**: the `SourceChannel` trait plus an RSS-backed
//!   implementation.
//! * **`actions`**: async routines that call the channel and dispatch
//!   transitions in a fixed order.
//! * **`view`**: the filtered, aggregated projection the UI renders.

pub mod actions;
pub mod channel;
pub mod mode;
pub mod source;
pub mod state;
pub mod view;

pub use channel::{ChannelError, SourceChannel};
pub use mode::{CountType, Mode};
pub use source::{Preset, Selection, Source, SourceId, SourceRecord};
pub use state::{SourceState, SourceStore, Transition};
pub use view::{select_source, SourceView};

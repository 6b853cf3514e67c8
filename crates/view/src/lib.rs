//! Pure rendering from client state to panel updates.
//!
//! Nothing here touches the network or a DOM. Controllers hand borrowed state to
//! these functions and pass the resulting [`PanelUpdate`]s to a [`RenderTarget`].

pub mod browser;
pub mod html;
pub mod panel;
pub mod target;
pub mod verification;

pub use panel::{Content, PanelId, PanelUpdate};
pub use target::{MemoryTarget, RenderTarget};

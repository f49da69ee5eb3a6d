//! IEEE 802.11b DSSS/CCK physical layer: PLCP framing, chip mapping and
//! chip-level synchronization.

pub mod error;
pub mod phy;
pub mod rates;
pub mod stats;
pub mod utils;

pub use error::{PhyError, PhyResult};

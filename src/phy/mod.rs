// 802.11b DSSS/CCK physical layer
// Framer -> chip mapper on transmit, chip synchronizer on receive

pub mod barker;
pub mod cck;
pub mod crc;
pub mod frame;
pub mod framer;
pub mod mapper;
pub mod power;
pub mod rate;
pub mod scrambler;
pub mod symbol;
pub mod sync;

pub use frame::PlcpHeader;
pub use framer::{PpduBits, PpduFramer};
pub use mapper::{ChipBurst, ChipMapper, LengthTag};
pub use rate::{DsssMode, Modulation, Preamble, Rate};
pub use sync::{ChipSync, DecodedPsdu, SyncConfig, SyncState};

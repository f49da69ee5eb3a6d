use num_complex::Complex32;
use serde::{Deserialize, Serialize};

use crate::utils::consts::CHIP_RATE_HZ;

/// Chip stream as written to / read from disk
#[derive(Serialize, Deserialize)]
pub struct ChipDump {
    pub chip_rate: f64,
    pub chips: Vec<[f32; 2]>,
}

impl ChipDump {
    pub fn from_chips(chips: &[Complex32]) -> Self {
        Self {
            chip_rate: CHIP_RATE_HZ,
            chips: chips.iter().map(|c| [c.re, c.im]).collect(),
        }
    }

    pub fn to_chips(&self) -> Vec<Complex32> {
        self.chips
            .iter()
            .map(|&[re, im]| Complex32::new(re, im))
            .collect()
    }
}

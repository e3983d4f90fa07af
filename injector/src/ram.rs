//! Memory-like load: random block fills and checksum sweeps over a buffer
//! allocated once at setup.

use std::hint::black_box;
use std::ops::Range;

use rand::RngCore;

use crate::config::InjectorSettings;
use crate::error::{WorkloadError, WorkloadResult};
use crate::injector::{Injector, InjectorConfig};
use crate::workload::Workload;

pub type RamLoadInjector = Injector<RamWorkload>;

impl Injector<RamWorkload> {
    pub fn new(config: InjectorConfig, settings: InjectorSettings) -> Self {
        let workload = RamWorkload::new(&settings);
        Injector::with_workload(config, settings, workload)
    }
}

pub struct RamWorkload {
    block_size: usize,
    blocks: usize,
    buffer: Vec<u8>,
    read_cursor: usize,
    write_cursor: usize,
    checksum: u64,
}

impl RamWorkload {
    pub fn new(settings: &InjectorSettings) -> Self {
        Self {
            block_size: settings.block_size.max(1),
            blocks: settings.scratch_blocks.max(1),
            buffer: Vec::new(),
            read_cursor: 0,
            write_cursor: 0,
            checksum: 0,
        }
    }

    fn block_range(&self, cursor: usize) -> WorkloadResult<Range<usize>> {
        if self.buffer.is_empty() {
            return Err(WorkloadError::NotPrepared);
        }
        let start = cursor * self.block_size;
        Ok(start..start + self.block_size)
    }
}

impl Workload for RamWorkload {
    fn variant_name(&self) -> &'static str {
        "RAMLoadInjector"
    }

    fn setup(&mut self) -> WorkloadResult<()> {
        let size = self
            .block_size
            .checked_mul(self.blocks)
            .ok_or(WorkloadError::AllocationFailed { size: usize::MAX })?;

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|_| WorkloadError::AllocationFailed { size })?;
        buffer.resize(size, 0);

        self.buffer = buffer;
        Ok(())
    }

    fn read_burst(&mut self, _rng: &mut dyn RngCore) -> WorkloadResult<()> {
        let range = self.block_range(self.read_cursor)?;
        self.checksum = self.buffer[range]
            .iter()
            .fold(self.checksum, |acc, byte| acc.wrapping_mul(31).wrapping_add(u64::from(*byte)));
        black_box(self.checksum);

        self.read_cursor = (self.read_cursor + 1) % self.blocks;
        Ok(())
    }

    fn write_burst(&mut self, rng: &mut dyn RngCore) -> WorkloadResult<()> {
        let range = self.block_range(self.write_cursor)?;
        rng.fill_bytes(&mut self.buffer[range]);

        self.write_cursor = (self.write_cursor + 1) % self.blocks;
        Ok(())
    }
}

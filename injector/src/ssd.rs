//! Disk-like load: alternating block reads and synced block writes against a
//! bounded scratch file.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use rand::RngCore;
use tempfile::NamedTempFile;

use crate::config::InjectorSettings;
use crate::error::{WorkloadError, WorkloadResult};
use crate::injector::{Injector, InjectorConfig};
use crate::workload::Workload;

pub type SsdLoadInjector = Injector<SsdWorkload>;

impl Injector<SsdWorkload> {
    pub fn new(config: InjectorConfig, settings: InjectorSettings) -> Self {
        let workload = SsdWorkload::new(&settings);
        Injector::with_workload(config, settings, workload)
    }
}

pub struct SsdWorkload {
    scratch_dir: Option<PathBuf>,
    block_size: usize,
    blocks: usize,
    file: Option<NamedTempFile>,
    block: Vec<u8>,
    read_cursor: usize,
    write_cursor: usize,
}

impl SsdWorkload {
    pub fn new(settings: &InjectorSettings) -> Self {
        Self {
            scratch_dir: settings.scratch_dir.clone(),
            block_size: settings.block_size.max(1),
            blocks: settings.scratch_blocks.max(1),
            file: None,
            block: Vec::new(),
            read_cursor: 0,
            write_cursor: 0,
        }
    }

    fn offset(&self, cursor: usize) -> u64 {
        (cursor * self.block_size) as u64
    }
}

impl Workload for SsdWorkload {
    fn variant_name(&self) -> &'static str {
        "SSDLoadInjector"
    }

    fn setup(&mut self) -> WorkloadResult<()> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("loadinject-ssd-");
        let file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| WorkloadError::ScratchFileFailed { reason: e.to_string() })?;

        let size = (self.block_size as u64).saturating_mul(self.blocks as u64);
        file.as_file()
            .set_len(size)
            .map_err(|e| WorkloadError::ScratchFileFailed { reason: e.to_string() })?;

        tracing::debug!("Scratch file {} ({} bytes)", file.path().display(), size);
        self.block = vec![0; self.block_size];
        self.file = Some(file);
        Ok(())
    }

    fn read_burst(&mut self, _rng: &mut dyn RngCore) -> WorkloadResult<()> {
        let offset = self.offset(self.read_cursor);
        let file = self.file.as_mut().ok_or(WorkloadError::NotPrepared)?;

        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(&mut self.block))
            .map_err(|e| WorkloadError::ReadFailed { reason: e.to_string() })?;

        self.read_cursor = (self.read_cursor + 1) % self.blocks;
        Ok(())
    }

    fn write_burst(&mut self, rng: &mut dyn RngCore) -> WorkloadResult<()> {
        let offset = self.offset(self.write_cursor);
        let file = self.file.as_mut().ok_or(WorkloadError::NotPrepared)?;
        rng.fill_bytes(&mut self.block);

        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.write_all(&self.block))
            .and_then(|_| file.as_file().sync_data())
            .map_err(|e| WorkloadError::WriteFailed { reason: e.to_string() })?;

        self.write_cursor = (self.write_cursor + 1) % self.blocks;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::LoadInjector;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn small_settings(dir: &TempDir) -> InjectorSettings {
        InjectorSettings {
            max_pause_ms: 1,
            block_size: 64,
            scratch_blocks: 4,
            scratch_dir: Some(dir.path().to_path_buf()),
            seed: Some(5),
        }
    }

    #[test]
    fn test_setup_creates_bounded_scratch_file() {
        let dir = TempDir::new().unwrap();
        let mut workload = SsdWorkload::new(&small_settings(&dir));
        workload.setup().unwrap();

        let path = workload.file.as_ref().unwrap().path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 256);

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            workload.write_burst(&mut rng).unwrap();
            workload.read_burst(&mut rng).unwrap();
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 256);

        drop(workload);
        assert!(!path.exists());
    }

    #[test]
    fn test_burst_before_setup() {
        let dir = TempDir::new().unwrap();
        let mut workload = SsdWorkload::new(&small_settings(&dir));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(workload.read_burst(&mut rng), Err(WorkloadError::NotPrepared)));
    }

    #[test]
    fn test_missing_scratch_dir_marks_invalid() {
        let dir = TempDir::new().unwrap();
        let settings = InjectorSettings {
            scratch_dir: Some(dir.path().join("does").join("not").join("exist")),
            ..small_settings(&dir)
        };

        let injector = SsdLoadInjector::new(InjectorConfig::new("x", 10), settings);
        assert!(!injector.is_valid());
        injector.inject();
        assert!(!injector.is_running());
        assert!(injector.injections().is_empty());
    }

    #[test]
    fn test_name_format() {
        let dir = TempDir::new().unwrap();
        let injector = SsdLoadInjector::new(InjectorConfig::new("x", 500), small_settings(&dir));
        assert_eq!(injector.name(), "[x]SSDLoadInjector(d500)");
    }

    #[test]
    fn test_short_run() {
        let dir = TempDir::new().unwrap();
        let injector = SsdLoadInjector::new(InjectorConfig::new("disk", 50), small_settings(&dir));
        injector.inject();
        injector.wait();

        let intervals = injector.injections();
        assert_eq!(intervals.len(), 1);
        assert!(intervals[0].duration_ms() >= 50);
        assert!(injector.last_failure().is_none());
    }
}

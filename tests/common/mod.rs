//! Helpers shared by the integration tests.

#![allow(dead_code)]

use mempool::{Block, FreeList, Pool, PoolConfig};

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            let mod_path = record
                .module_path_static()
                .or_else(|| record.module_path())
                .unwrap_or("<n/a>");

            eprintln!("[ {:>5} ] [{}] {}", record.level(), mod_path, record.args());
        }
    }

    fn flush(&self) {}
}

/// Route pool logs to stderr. Only the first call in a test binary has an effect.
pub fn init_logging() {
    if log::set_logger(&Logger).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
}

/// Owned storage for a pool, sized from a [`PoolConfig`] at runtime.
pub struct Storage {
    pub config: PoolConfig,
    pub buffer: Vec<u8>,
    pub blocks: Vec<Block>,
    pub lists: Vec<FreeList>,
}

impl Storage {
    pub fn new(total_bytes: u32, min_class_exponent: u8, max_class_exponent: u8) -> Self {
        let config = PoolConfig::new(total_bytes, min_class_exponent, max_class_exponent);

        Self {
            config,
            buffer: vec![0; total_bytes as usize],
            blocks: vec![Block::EMPTY; config.descriptor_count()],
            lists: vec![FreeList::EMPTY; config.class_count()],
        }
    }

    pub fn pool(&mut self) -> Pool<'_> {
        init_logging();
        Pool::new(
            self.config,
            &mut self.buffer,
            &mut self.blocks,
            &mut self.lists,
        )
        .expect("valid pool configuration")
    }
}

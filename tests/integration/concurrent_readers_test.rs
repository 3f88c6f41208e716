//! Integration tests for many readers over shared block bytes.

use std::sync::Arc;
use std::thread;

use diskstore::constants::BLOCK_SIZE;
use diskstore::error::Result;
use diskstore::{Block, Slice};

// Helper to generate test data of a specific size
fn create_test_data(index: usize, size: usize) -> Slice {
    let data = (0..size).map(|i| ((i + index) % 256) as u8).collect::<Vec<u8>>();
    Slice::from(data)
}

fn frozen_block(slices: &[Slice]) -> Result<Vec<u8>> {
    let mut block = Block::for_write(vec![0u8; BLOCK_SIZE], 0)?;
    for slice in slices {
        assert!(block.write(slice)?);
    }
    block.froze();
    Ok(block.into_inner())
}

#[test]
fn test_threads_each_read_every_slice() -> Result<()> {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();

    let slices: Vec<Slice> = (0..500).map(|i| create_test_data(i, 1 + i * 3)).collect();
    let region = Arc::new(frozen_block(&slices)?);
    let expected = Arc::new(slices);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let region = Arc::clone(&region);
            let expected = Arc::clone(&expected);
            thread::spawn(move || -> Result<()> {
                let mut block = Block::for_read(&region[..], 0)?;
                let checksum = block.checksum();

                let mut count = 0;
                while let Some(slice) = block.fetch() {
                    assert_eq!(slice, expected[count]);
                    count += 1;
                }
                assert_eq!(count, expected.len());
                assert_eq!(block.checksum(), checksum);
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("reader thread panicked")?;
    }
    Ok(())
}

#[test]
fn test_scoped_readers_share_one_block() -> Result<()> {
    let slices: Vec<Slice> = (0..64).map(|i| create_test_data(i, 100)).collect();
    let region = frozen_block(&slices)?;
    let block = Block::for_read(&region[..], 0)?;

    thread::scope(|scope| {
        for skip in 0..4 {
            let block = &block;
            let slices = &slices;
            scope.spawn(move || {
                let mut reader = block.reader();
                for _ in 0..skip {
                    reader.fetch();
                }
                let rest: Vec<Slice> = reader.collect();
                assert_eq!(&rest[..], &slices[skip..]);
            });
        }
    });
    Ok(())
}

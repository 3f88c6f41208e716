//! Integration tests for the producer/consumer lifecycle through a block pool.
//!
//! A producer fills pooled blocks and hands frozen leases to consumers over a
//! channel; buffers must only be reused after every consumer is done.

use std::sync::mpsc;
use std::thread;

use diskstore::error::Result;
use diskstore::{BlockLease, BlockPool, BlockPoolConfig, RefCount, Slice};

fn produce(pool: &BlockPool, slices: &[Slice], out: mpsc::Sender<BlockLease>) -> Result<()> {
    let mut remaining = slices;
    while !remaining.is_empty() {
        let lease = pool.acquire()?;
        {
            let mut block = lease.open_for_write()?;
            while let Some((slice, rest)) = remaining.split_first() {
                if !block.write(slice)? {
                    break;
                }
                remaining = rest;
            }
            block.froze();
        }
        out.send(lease)
            .map_err(|e| diskstore::DiskStoreError::Other(e.to_string()))?;
    }
    Ok(())
}

#[test]
fn test_pipeline_recycles_buffers() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let pool = BlockPool::with_config(BlockPoolConfig::with_capacity(2)?)?;
    let slices: Vec<Slice> = (0..20_000)
        .map(|i| Slice::from(format!("{:08}:{}", i, "x".repeat(i % 700)).into_bytes()))
        .collect();

    let (tx, rx) = mpsc::channel::<BlockLease>();
    let received = thread::scope(|scope| -> Result<Vec<Slice>> {
        let producer = scope.spawn(|| produce(&pool, &slices, tx));

        let mut received = Vec::new();
        for lease in rx {
            // A second consumer shares the lease while the first one reads.
            let audit = lease.clone();
            assert_eq!(lease.ref_count(), 2);
            let audit_count = scope.spawn(move || -> Result<usize> {
                let block = audit.open_for_read()?;
                Ok(block.reader().count())
            });

            let mut block = lease.open_for_read()?;
            assert!(block.is_frozen());
            let before = received.len();
            while let Some(slice) = block.fetch() {
                received.push(slice);
            }
            let count = audit_count.join().expect("audit thread panicked")?;
            assert_eq!(count, received.len() - before);
            assert_eq!(block.header().slice_count() as usize, count);
        }

        producer.join().expect("producer panicked")?;
        Ok(received)
    })?;

    assert_eq!(received, slices);
    assert_eq!(pool.available()?, 2);
    Ok(())
}

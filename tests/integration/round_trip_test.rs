// Copyright 2024
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for persisting blocks and reading them back.
//!
//! These tests play the role of the durability collaborator: frozen blocks are
//! written to a file, loaded into fresh buffers, and scanned again.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::NamedTempFile;

use diskstore::constants::BLOCK_SIZE;
use diskstore::error::Result;
use diskstore::{Block, Slice};

/// Helper that fills blocks with the given slices, rolling over when a block is full.
fn fill_blocks(slices: &[Slice]) -> Result<Vec<Vec<u8>>> {
    let mut regions = Vec::new();
    let mut block = Block::for_write(vec![0u8; BLOCK_SIZE], 0)?;

    for slice in slices {
        if !block.write(slice)? {
            block.froze();
            regions.push(block.into_inner());
            block = Block::for_write(vec![0u8; BLOCK_SIZE], 0)?;
            assert!(block.write(slice)?, "slice larger than an empty block");
        }
    }

    block.froze();
    regions.push(block.into_inner());
    Ok(regions)
}

/// Helper that writes every region back to back into a temp file.
fn persist(regions: &[Vec<u8>]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    for region in regions {
        file.write_all(region)?;
    }
    file.flush()?;
    Ok(file)
}

/// Helper that loads block `index` from a file into a fresh buffer.
fn load_block(file: &mut File, index: usize) -> Result<Vec<u8>> {
    let mut region = vec![0u8; BLOCK_SIZE];
    file.seek(SeekFrom::Start((index * BLOCK_SIZE) as u64))?;
    file.read_exact(&mut region)?;
    Ok(region)
}

#[test]
fn test_single_block_survives_persistence() -> Result<()> {
    let slices = vec![Slice::from("a"), Slice::from("bb"), Slice::from("ccc")];
    let regions = fill_blocks(&slices)?;
    assert_eq!(regions.len(), 1);

    let checksum = Block::for_read(&regions[0][..], 0)?.checksum();
    let temp = persist(&regions)?;

    let mut file = temp.reopen()?;
    let mut block = Block::for_read(load_block(&mut file, 0)?, 0)?;
    assert!(block.is_frozen());
    assert_eq!(block.checksum(), checksum);

    let read: Vec<Slice> = std::iter::from_fn(|| block.fetch()).collect();
    assert_eq!(read, slices);
    Ok(())
}

#[test]
fn test_many_blocks_replay_in_order() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(2024);
    let slices: Vec<Slice> = (0..3000)
        .map(|i| {
            let len = rng.gen_range(1..=4096);
            let mut body = format!("{:06}|", i).into_bytes();
            body.resize(len.max(body.len()), (i % 251) as u8);
            Slice::from(body)
        })
        .collect();

    let regions = fill_blocks(&slices)?;
    assert!(regions.len() > 1, "expected the data to span several blocks");

    let temp = persist(&regions)?;
    let mut file = temp.reopen()?;

    let mut replayed = Vec::new();
    let mut last_number = 0;
    let mut total_slices = 0;
    for index in 0..regions.len() {
        let mut block = Block::for_read(load_block(&mut file, index)?, 0)?;
        assert!(block.header().block_number() > last_number);
        last_number = block.header().block_number();
        total_slices += block.header().slice_count() as usize;

        while let Some(slice) = block.fetch() {
            replayed.push(slice);
        }
    }

    assert_eq!(total_slices, slices.len());
    assert_eq!(replayed, slices);
    Ok(())
}

#[test]
fn test_corruption_on_disk_changes_checksum() -> Result<()> {
    let regions = fill_blocks(&[Slice::from("durable"), Slice::from("bytes")])?;
    let expected = Block::for_read(&regions[0][..], 0)?.checksum();
    let temp = persist(&regions)?;

    // Flip one bit in the middle of the payload on disk.
    let mut file = temp.reopen()?;
    let at = (BLOCK_SIZE / 2) as u64;
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(at))?;
    file.read_exact(&mut byte)?;
    byte[0] ^= 0x10;
    file.seek(SeekFrom::Start(at))?;
    file.write_all(&byte)?;

    let block = Block::for_read(load_block(&mut file, 0)?, 0)?;
    assert_ne!(block.checksum(), expected);
    Ok(())
}

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

//! Constants describing the storage block layout.

/// Size of a block in bytes (4 MiB), header included.
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Size of a block header in bytes.
pub const BLOCK_HEADER_SIZE: usize = 24;

/// Size of the payload region of a block (block size minus block header size).
pub const USABLE_BLOCK_SIZE: usize = BLOCK_SIZE - BLOCK_HEADER_SIZE;

/// Size of the length prefix stored in front of every slice body.
pub const SLICE_LENGTH_SIZE: usize = 4;

/// Magic number at the start of every block header ("DSBK" in little-endian).
pub const BLOCK_MAGIC: u32 = u32::from_le_bytes(*b"DSBK");

/// Header flag value of a block that still accepts writes.
pub const BLOCK_OPEN: u8 = 0;

/// Header flag value of a block that has been frozen.
pub const BLOCK_FROZEN: u8 = 1;

/// Default number of buffers held by a block pool.
pub const DEFAULT_POOL_CAPACITY: usize = 8;

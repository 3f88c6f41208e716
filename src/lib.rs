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

//! Diskstore provides the fixed-size storage block of a disk-backed queue/log engine.
//!
//! A block is a 4 MiB region holding a small header and a packed sequence of
//! length-prefixed slices. Producers append slices until the block is full and
//! then freeze it; consumers scan the slices back in write order. Block buffers
//! can be recycled through a reference-counted pool.

pub mod blocks;
pub mod checksum;
pub mod constants;
pub mod error;
pub mod pool;
pub mod slice;

pub use blocks::block::Block;
pub use blocks::header::BlockHeader;
pub use blocks::reader::SliceReader;
pub use error::{DiskStoreError, Result};
pub use pool::block_pool::{BlockLease, BlockPool, BlockPoolConfig};
pub use pool::refcount::{RefCount, RefCounter};
pub use slice::Slice;

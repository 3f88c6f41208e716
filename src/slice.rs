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

//! The unit of data stored in a block.

use bytes::Bytes;

use crate::constants::SLICE_LENGTH_SIZE;

/// An immutable byte payload stored in, or returned from, a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Slice {
    body: Bytes,
}

impl Slice {
    /// Creates a new slice owning the given body.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// Creates a slice by copying the given bytes.
    pub fn copy_from(data: &[u8]) -> Self {
        Self {
            body: Bytes::copy_from_slice(data),
        }
    }

    /// Size of the body in bytes.
    pub fn size(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Bytes this slice occupies in a block: length prefix plus body.
    pub fn record_size(&self) -> usize {
        self.body.len() + SLICE_LENGTH_SIZE
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }
}

impl AsRef<[u8]> for Slice {
    fn as_ref(&self) -> &[u8] {
        &self.body
    }
}

impl From<Bytes> for Slice {
    fn from(body: Bytes) -> Self {
        Self::new(body)
    }
}

impl From<Vec<u8>> for Slice {
    fn from(body: Vec<u8>) -> Self {
        Self::new(body)
    }
}

impl From<&'static [u8]> for Slice {
    fn from(body: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(body))
    }
}

impl From<&'static str> for Slice {
    fn from(body: &'static str) -> Self {
        Self::new(Bytes::from_static(body.as_bytes()))
    }
}

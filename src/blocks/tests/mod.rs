
// Helper re-exports for tests
#[doc(hidden)]
pub(crate) mod helpers {
    use crate::blocks::block::Block;
    use crate::constants::BLOCK_SIZE;
    use crate::slice::Slice;

    /// A zeroed region holding exactly one block.
    pub fn fresh_region() -> Vec<u8> {
        vec![0u8; BLOCK_SIZE]
    }

    /// Writes every slice, asserting that each one fits.
    pub fn write_slices<B: AsRef<[u8]> + AsMut<[u8]>>(block: &mut Block<B>, slices: &[Slice]) {
        for slice in slices {
            assert!(block.write(slice).unwrap(), "slice of {} bytes did not fit", slice.size());
        }
    }

    /// Fetches until the block reports no further slice.
    pub fn read_all<B: AsRef<[u8]>>(block: &mut Block<B>) -> Vec<Slice> {
        std::iter::from_fn(|| block.fetch()).collect()
    }

    /// Writes the slices into a fresh block, freezes it and returns its bytes.
    pub fn frozen_region(slices: &[Slice]) -> Vec<u8> {
        let mut block = Block::for_write(fresh_region(), 0).unwrap();
        write_slices(&mut block, slices);
        block.froze();
        block.into_inner()
    }
}

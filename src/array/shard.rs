//! Shard writing and reading.
//!
//! A shard is a single store value holding concatenated chunk payloads and a [`ShardIndex`].
//! The index is at the [start or end](ShardIndexLocation) of the shard, and its size depends only on the number of chunks per shard.
//!
//! A [`ShardWriter`] assembles a complete shard in memory so that it can be written with a single store `set`.
//! A [`ShardReader`] retrieves the index and chunk payloads of a shard with ranged gets.

mod shard_reader;
mod shard_writer;

pub use shard_reader::ShardReader;
pub use shard_writer::ShardWriter;

use thiserror::Error;

use crate::storage::StorageError;

use super::shard_index::{ShardIndex, ShardIndexError, ShardIndexLocation};

/// A shard error.
#[derive(Debug, Error)]
pub enum ShardError {
    /// The shard index is invalid.
    #[error(transparent)]
    IndexError(#[from] ShardIndexError),
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A chunk slot was written more than once in one generation.
    #[error("chunk {0} has already been written to this shard")]
    ChunkAlreadyWritten(u64),
    /// A local chunk index is not a slot of the shard.
    #[error("local chunk index {0} is out of range for a shard with {1} chunks")]
    LocalIndexOutOfRange(u64, u64),
}

/// Return the byte offset of the chunk data region in a shard with `num_chunks` chunks.
const fn data_offset(location: ShardIndexLocation, num_chunks: u64) -> u64 {
    match location {
        ShardIndexLocation::Start => ShardIndex::encoded_size(num_chunks),
        ShardIndexLocation::End => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::storage::{store::MemoryStore, ReadableStorageTraits, StoreKey, WritableStorageTraits};

    use super::*;

    fn write_and_read(location: ShardIndexLocation) {
        let mut writer = ShardWriter::new(4, location);
        writer.store_chunk(2, &[1, 2, 3]).unwrap();
        writer.store_chunk(0, &[4, 5]).unwrap();
        writer.store_chunk(3, &[]).unwrap();
        let (shard, index) = writer.finalize();
        assert_eq!(shard.len() as u64, 5 + ShardIndex::encoded_size(4));
        assert_eq!(index.entry(1), None);

        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::new("c/0").unwrap();
        store.set(&key, shard).unwrap();

        let reader = ShardReader::open(&*store, &key, 4, location).unwrap();
        assert_eq!(reader.index().map(AsRef::as_ref), Some(&index));
        assert_eq!(reader.retrieve_chunk(0).unwrap(), Some(vec![4, 5]));
        assert_eq!(reader.retrieve_chunk(1).unwrap(), None);
        assert_eq!(reader.retrieve_chunk(2).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(reader.retrieve_chunk(3).unwrap(), Some(vec![]));
        assert_eq!(
            reader.retrieve_chunks(&[3, 1, 0]).unwrap(),
            vec![Some(vec![]), None, Some(vec![4, 5])]
        );
        assert!(matches!(
            reader.retrieve_chunk(4),
            Err(ShardError::LocalIndexOutOfRange(4, 4))
        ));
    }

    #[test]
    fn shard_write_read_index_end() {
        write_and_read(ShardIndexLocation::End);
    }

    #[test]
    fn shard_write_read_index_start() {
        write_and_read(ShardIndexLocation::Start);
    }

    #[test]
    fn shard_layout() {
        let mut writer = ShardWriter::new(2, ShardIndexLocation::End);
        writer.store_chunk(1, &[7; 3]).unwrap();
        let (shard, _) = writer.finalize();
        assert_eq!(&shard[..3], &[7; 3]);
        assert_eq!(&shard[3..19], &[u8::MAX; 16]);
        assert_eq!(&shard[19..27], &0u64.to_le_bytes());
        assert_eq!(&shard[27..35], &3u64.to_le_bytes());

        let mut writer = ShardWriter::new(2, ShardIndexLocation::Start);
        writer.store_chunk(1, &[7; 3]).unwrap();
        let (shard, index) = writer.finalize();
        assert_eq!(index.entry(1).unwrap().offset, 36);
        assert_eq!(&shard[36..], &[7; 3]);
    }

    #[test]
    fn shard_writer_generation() {
        let mut writer = ShardWriter::new(2, ShardIndexLocation::End);
        writer.store_chunk(0, &[1]).unwrap();
        assert!(matches!(
            writer.store_chunk(0, &[2]),
            Err(ShardError::ChunkAlreadyWritten(0))
        ));
        assert!(matches!(
            writer.erase_chunk(0),
            Err(ShardError::ChunkAlreadyWritten(0))
        ));
        assert!(matches!(
            writer.store_chunk(2, &[2]),
            Err(ShardError::LocalIndexOutOfRange(2, 2))
        ));
        let (shard, _) = writer.finalize();

        // A new generation may rewrite the chunk, the old payload is retained
        let mut writer =
            ShardWriter::from_existing(shard.clone(), 2, ShardIndexLocation::End).unwrap();
        writer.store_chunk(0, &[3, 3]).unwrap();
        let (appended, index) = writer.finalize();
        assert_eq!(appended.len(), shard.len() + 2);
        assert_eq!(index.entry(0).unwrap().offset, 1);
        assert_eq!(&appended[1..3], &[3, 3]);
    }

    #[test]
    fn shard_writer_from_existing_start() {
        let mut writer = ShardWriter::new(3, ShardIndexLocation::Start);
        writer.store_chunk(1, &[1, 1]).unwrap();
        let (shard, _) = writer.finalize();

        let mut writer =
            ShardWriter::from_existing(shard, 3, ShardIndexLocation::Start).unwrap();
        writer.store_chunk(2, &[2]).unwrap();
        writer.erase_chunk(1).unwrap();
        let (shard, index) = writer.finalize();
        let offset = ShardIndex::encoded_size(3);
        assert_eq!(index.entry(1), None);
        assert_eq!(index.entry(2).unwrap().offset, offset + 2);
        assert_eq!(shard[usize::try_from(offset).unwrap() + 2], 2);

        let mut writer = ShardWriter::from_existing(shard, 3, ShardIndexLocation::Start).unwrap();
        writer.erase_chunk(2).unwrap();
        let (_, index) = writer.finalize();
        assert!(index.is_empty());
    }

    #[test]
    fn shard_writer_from_existing_invalid() {
        assert!(matches!(
            ShardWriter::from_existing(vec![0; 10], 1, ShardIndexLocation::End),
            Err(ShardError::IndexError(ShardIndexError::ShardTooShort(10, 20)))
        ));

        // An entry pointing into the index region
        let mut index = ShardIndex::new_empty(1);
        index
            .set_entry(
                0,
                Some(crate::array::shard_index::ShardIndexEntry {
                    offset: 0,
                    length: 4,
                }),
            )
            .unwrap();
        assert!(matches!(
            ShardWriter::from_existing(index.encode(), 1, ShardIndexLocation::Start),
            Err(ShardError::IndexError(ShardIndexError::EntryOutOfBounds(0)))
        ));
    }

    #[test]
    fn shard_reader_absent_and_corrupt() {
        let store = MemoryStore::new();
        let key = StoreKey::new("c/1").unwrap();
        let reader = ShardReader::open(&store, &key, 2, ShardIndexLocation::End).unwrap();
        assert!(reader.index().is_none());
        assert_eq!(reader.retrieve_chunk(0).unwrap(), None);

        let mut writer = ShardWriter::new(2, ShardIndexLocation::End);
        writer.store_chunk(0, &[1, 2, 3, 4]).unwrap();
        let (mut shard, _) = writer.finalize();
        let last = shard.len() - 1;
        shard[last] ^= 0xff;
        store.set(&key, shard).unwrap();
        assert!(matches!(
            ShardReader::open(&store, &key, 2, ShardIndexLocation::End),
            Err(ShardError::IndexError(ShardIndexError::InvalidChecksum))
        ));

        store.set(&key, vec![0; 3]).unwrap();
        assert!(matches!(
            ShardReader::open(&store, &key, 2, ShardIndexLocation::End),
            Err(ShardError::IndexError(ShardIndexError::ShardTooShort(3, 36)))
        ));
        assert_eq!(store.size_key(&key).unwrap(), Some(3));
    }

    fn single_entry_index(num_chunks: u64, offset: u64, length: u64) -> ShardIndex {
        let mut index = ShardIndex::new_empty(num_chunks);
        index
            .set_entry(
                0,
                Some(crate::array::shard_index::ShardIndexEntry { offset, length }),
            )
            .unwrap();
        index
    }

    #[test]
    fn shard_reader_entry_beyond_shard() {
        let store = MemoryStore::new();
        let key = StoreKey::new("c/0").unwrap();
        let index = single_entry_index(1, ShardIndex::encoded_size(1), 100);
        store.set(&key, index.encode()).unwrap();
        let reader = ShardReader::open(&store, &key, 1, ShardIndexLocation::Start).unwrap();
        assert!(matches!(
            reader.retrieve_chunk(0),
            Err(ShardError::IndexError(ShardIndexError::EntryOutOfBounds(0)))
        ));

        let index = single_entry_index(1, 0, 100);
        store.set(&key, index.encode()).unwrap();
        assert!(matches!(
            ShardReader::open(&store, &key, 1, ShardIndexLocation::End),
            Err(ShardError::IndexError(ShardIndexError::EntryOutOfBounds(0)))
        ));
    }

    #[test]
    fn shard_reader_entry_into_index() {
        let store = MemoryStore::new();
        let key = StoreKey::new("c/0").unwrap();

        // The entry covers exactly the trailing index
        let index = single_entry_index(2, 0, ShardIndex::encoded_size(2));
        store.set(&key, index.encode()).unwrap();
        assert!(matches!(
            ShardReader::open(&store, &key, 2, ShardIndexLocation::End),
            Err(ShardError::IndexError(ShardIndexError::EntryOutOfBounds(0)))
        ));

        // The entry starts inside the leading index
        let index = single_entry_index(2, 4, 8);
        let mut shard = index.encode();
        shard.extend([1u8; 8]);
        store.set(&key, shard).unwrap();
        assert!(matches!(
            ShardReader::open(&store, &key, 2, ShardIndexLocation::Start),
            Err(ShardError::IndexError(ShardIndexError::EntryOutOfBounds(0)))
        ));

        // Entries in the chunk data are accepted for both placements
        let index = single_entry_index(2, 0, 8);
        let mut shard = vec![1u8; 8];
        shard.extend(index.encode());
        store.set(&key, shard).unwrap();
        let reader = ShardReader::open(&store, &key, 2, ShardIndexLocation::End).unwrap();
        assert_eq!(reader.retrieve_chunk(0).unwrap(), Some(vec![1; 8]));

        let index = single_entry_index(2, ShardIndex::encoded_size(2), 8);
        let mut shard = index.encode();
        shard.extend([2u8; 8]);
        store.set(&key, shard).unwrap();
        let reader = ShardReader::open(&store, &key, 2, ShardIndexLocation::Start).unwrap();
        assert_eq!(reader.retrieve_chunk(0).unwrap(), Some(vec![2; 8]));
    }
}

use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

use super::{shard_index::ShardIndexLocation, ArrayShape, ChunkShape, DataType};

/// The persisted configuration of an [`ArrayStore`](crate::array::ArrayStore).
///
/// It is stored as JSON under `array.json` in the array prefix by [`store_metadata`](crate::array::ArrayStore::store_metadata).
///
/// ### Example
/// ```json
/// {
///     "volume_shape": [8, 8],
///     "chunk_shape": [4, 4],
///     "shard_shape": [8, 4],
///     "data_type": "uint16",
///     "fill_value": 0,
///     "index_location": "end",
///     "codecs": [
///         {"name": "bytes", "configuration": {"endian": "little"}},
///         {"name": "gzip", "configuration": {"level": 5}}
///     ]
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArrayConfig {
    /// The shape of the array.
    pub volume_shape: ArrayShape,
    /// The shape of a chunk.
    pub chunk_shape: ChunkShape,
    /// The shape of a shard. Each dimension is a multiple of the chunk shape.
    pub shard_shape: ChunkShape,
    /// The data type.
    pub data_type: DataType,
    /// The fill value as a JSON scalar.
    pub fill_value: serde_json::Value,
    /// The location of the index in each shard.
    #[serde(default)]
    pub index_location: ShardIndexLocation,
    /// The chunk codecs. Empty is the `bytes` codec with little endian.
    #[serde(default)]
    pub codecs: Vec<Metadata>,
}

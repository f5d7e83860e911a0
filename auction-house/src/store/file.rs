use std::{
    fmt::Debug,
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use bincode::config;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot file")]
    File(#[from] io::Error),

    #[error("failed to encode snapshot")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode snapshot")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("snapshot file not found")]
    NotFound,

    #[error("snapshot writer stopped")]
    Writer(#[from] tokio::task::JoinError),
}

pub trait SnapshotStorage: Debug + Send + Sync {
    fn load<TData>(&self) -> Result<TData, SnapshotError>
    where
        TData: DeserializeOwned;

    fn store<TData>(&self, data: &TData) -> Result<(), SnapshotError>
    where
        TData: Serialize;
}

#[derive(Debug, Clone)]
pub struct InFileStorage {
    storage_location: PathBuf,
}

impl InFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            storage_location: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_location
    }
}

impl SnapshotStorage for InFileStorage {
    fn load<TData>(&self) -> Result<TData, SnapshotError>
    where
        TData: DeserializeOwned,
    {
        if !self.storage_location.exists() {
            return Err(SnapshotError::NotFound);
        }

        let bin_file_data = File::open(&self.storage_location)?;
        let mut buf_reader = BufReader::new(bin_file_data);
        let mut bin_data = vec![];

        buf_reader.read_to_end(&mut bin_data)?;
        let config = config::standard();

        let (data, _) = bincode::serde::decode_from_slice::<TData, _>(&bin_data, config)?;
        Ok(data)
    }

    fn store<TData>(&self, data: &TData) -> Result<(), SnapshotError>
    where
        TData: Serialize,
    {
        let config = config::standard();
        let bin_data = bincode::serde::encode_to_vec(data, config)?;

        // readers only ever see the previous or the new snapshot
        let staging = self.storage_location.with_extension("tmp");
        {
            let bin_file_data = File::create(&staging)?;
            let mut buff_writer = BufWriter::new(bin_file_data);
            buff_writer.write_all(&bin_data)?;
            buff_writer.flush()?;
        }

        fs::rename(&staging, &self.storage_location)?;
        Ok(())
    }
}

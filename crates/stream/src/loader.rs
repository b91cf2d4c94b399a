//! Host capabilities the streamer is composed against, and a file-backed loader.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, unbounded};
use tilechunk_common::ChunkId;
use tilechunk_map::{Chunk, ChunkStore, MapError};

/// Why a chunk load did not produce data.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("load request dropped before completion")]
    Abandoned,
    #[error("{0}")]
    Other(String),
}

pub type LoadResult = Result<Chunk, LoadError>;

/// A finished load as delivered back to the streamer.
#[derive(Debug)]
pub(crate) struct Completion {
    pub id: ChunkId,
    pub result: LoadResult,
}

/// One outstanding load request.
///
/// The loader resolves it exactly once with [`LoadTicket::complete`], from any
/// thread and at any later time. Dropping an unresolved ticket resolves it as
/// [`LoadError::Abandoned`].
#[derive(Debug)]
pub struct LoadTicket {
    id: ChunkId,
    sender: Option<Sender<Completion>>,
}

impl LoadTicket {
    pub(crate) fn new(id: ChunkId, sender: Sender<Completion>) -> Self {
        Self {
            id,
            sender: Some(sender),
        }
    }

    /// Chunk this ticket asks for.
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// Deliver the result of the load.
    pub fn complete(mut self, result: LoadResult) {
        self.send(result);
    }

    fn send(&mut self, result: LoadResult) {
        if let Some(sender) = self.sender.take() {
            // The streamer may be gone; nobody is left to care.
            let _ = sender.send(Completion {
                id: self.id,
                result,
            });
        }
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        self.send(Err(LoadError::Abandoned));
    }
}

/// Starts chunk loads. Results come back through the ticket.
pub trait Loader {
    fn request_load(&mut self, ticket: LoadTicket);
}

/// Receives chunks that became resident and notices of chunks to drop.
pub trait Renderer {
    fn on_chunk_ready(&mut self, id: ChunkId, chunk: Chunk);
    fn dispose_chunk(&mut self, id: ChunkId);
}

/// Loads chunk files from a [`ChunkStore`] on a background thread.
pub struct FsChunkLoader {
    requests: Option<Sender<LoadTicket>>,
    worker: Option<JoinHandle<()>>,
}

impl FsChunkLoader {
    pub fn new(store: ChunkStore) -> std::io::Result<Self> {
        let (requests, incoming) = unbounded::<LoadTicket>();
        let worker = thread::Builder::new()
            .name("chunk-loader".into())
            .spawn(move || {
                while let Ok(ticket) = incoming.recv() {
                    let id = ticket.id();
                    tracing::trace!(chunk = %id, "reading chunk file");
                    ticket.complete(store.load_chunk(id).map_err(LoadError::from));
                }
            })?;
        Ok(Self {
            requests: Some(requests),
            worker: Some(worker),
        })
    }
}

impl Loader for FsChunkLoader {
    fn request_load(&mut self, ticket: LoadTicket) {
        if let Some(requests) = &self.requests {
            // A dead worker hands the ticket back; dropping it reports Abandoned.
            let _ = requests.send(ticket);
        }
    }
}

impl Drop for FsChunkLoader {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

//! Decoding off the caller's thread.
//!
//! A [`DecodeTask`] runs the format parser on a worker thread while the caller polls for
//! the outcome on its own schedule. The result, success or failure, is delivered exactly
//! once; a worker that dies without sending anything surfaces as a resource error rather
//! than a poll that never resolves.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::document::Document;
use crate::error::{GifError, GifResult, ResourceErrorKind};

/// A single in-flight background decode. There is no cancellation; drop the task to
/// disown the worker.
pub struct DecodeTask {
    rx: Receiver<GifResult<Document>>,
    handle: Option<thread::JoinHandle<()>>,
    delivered: bool,
}

impl DecodeTask {
    /// Starts decoding `bytes` on a worker thread.
    pub fn spawn(bytes: Vec<u8>) -> GifResult<DecodeTask> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("gifplay-decode".into())
            .spawn(move || {
                // The receiver may already be gone; nothing to do about it here.
                let _ = tx.send(Document::from_bytes(&bytes));
            })
            .map_err(|_| GifError::resource(ResourceErrorKind::WorkerSpawn))?;
        Ok(DecodeTask {
            rx,
            handle: Some(handle),
            delivered: false,
        })
    }

    /// Checks for the decode outcome without blocking.
    ///
    /// Returns `None` while the worker is still running and after the result has been
    /// delivered; the first `Some` is the only delivery.
    pub fn poll(&mut self) -> Option<GifResult<Document>> {
        if self.delivered {
            return None;
        }
        let outcome = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                Err(GifError::resource(ResourceErrorKind::WorkerLost))
            }
        };
        self.delivered = true;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Some(outcome)
    }

    /// Whether a result has already been delivered through [`poll`](Self::poll).
    pub fn is_finished(&self) -> bool {
        self.delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn poll_until_done(task: &mut DecodeTask) -> GifResult<Document> {
        for _ in 0..1000 {
            if let Some(result) = task.poll() {
                return result;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("decode task never delivered a result");
    }

    #[test]
    fn failure_is_delivered_exactly_once() {
        let mut task = DecodeTask::spawn(b"not a gif".to_vec()).unwrap();
        assert!(poll_until_done(&mut task).is_err());
        assert!(task.is_finished());
        assert!(task.poll().is_none());
    }
}

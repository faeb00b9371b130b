use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};

use crate::resolver::AssetResolver;
use crate::texture::DecodedTexture;
use crate::AssetError;

/// One texture to fetch, tagged with the slide it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRequest {
    pub slide: usize,
    pub source: String,
}

impl TextureRequest {
    /// One request per slide, in slide order.
    pub fn for_slides<S: AsRef<str>>(sources: &[S]) -> Vec<Self> {
        sources
            .iter()
            .enumerate()
            .map(|(slide, source)| Self {
                slide,
                source: source.as_ref().to_string(),
            })
            .collect()
    }
}

#[derive(Debug)]
pub enum TextureEvent {
    Loaded {
        slide: usize,
        texture: DecodedTexture,
    },
    Failed {
        slide: usize,
        source: String,
        error: AssetError,
    },
}

impl TextureEvent {
    pub fn slide(&self) -> usize {
        match self {
            Self::Loaded { slide, .. } | Self::Failed { slide, .. } => *slide,
        }
    }
}

/// Reads and decodes textures on a background thread.
///
/// Dropping the loader closes the channel; the worker stops at its next send.
pub struct TextureLoader {
    events: Receiver<TextureEvent>,
    outstanding: usize,
}

impl TextureLoader {
    pub fn spawn(
        resolver: AssetResolver,
        requests: Vec<TextureRequest>,
    ) -> Result<Self, AssetError> {
        let (tx, rx) = unbounded();
        let outstanding = requests.len();
        thread::Builder::new()
            .name("texture-loader".into())
            .spawn(move || {
                for request in requests {
                    let event = match load(&resolver, &request.source) {
                        Ok(texture) => TextureEvent::Loaded {
                            slide: request.slide,
                            texture,
                        },
                        Err(error) => TextureEvent::Failed {
                            slide: request.slide,
                            source: request.source,
                            error,
                        },
                    };
                    if tx.send(event).is_err() {
                        tracing::debug!("texture loader dropped, stopping worker");
                        break;
                    }
                }
            })
            .map_err(AssetError::Spawn)?;
        tracing::debug!(count = outstanding, "texture loader started");
        Ok(Self {
            events: rx,
            outstanding,
        })
    }

    /// Drain every finished texture without blocking.
    pub fn poll(&mut self) -> Vec<TextureEvent> {
        let events: Vec<TextureEvent> = self.events.try_iter().collect();
        self.outstanding = self.outstanding.saturating_sub(events.len());
        events
    }

    /// Block until every request has reported or `timeout` elapses.
    pub fn wait_all(&mut self, timeout: Duration) -> Vec<TextureEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::with_capacity(self.outstanding);
        while self.outstanding > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(event) => {
                    self.outstanding -= 1;
                    events.push(event);
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(outstanding = self.outstanding, "texture wait timed out");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        events
    }

    /// Requests that have not reported yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn is_done(&self) -> bool {
        self.outstanding == 0
    }
}

/// Read and decode one texture on the calling thread.
pub(crate) fn load(resolver: &AssetResolver, id: &str) -> Result<DecodedTexture, AssetError> {
    let path = resolver.resolve(id)?;
    let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let texture = DecodedTexture::decode(id, &bytes)?;
    tracing::debug!(id, width = texture.width, height = texture.height, "texture decoded");
    Ok(texture)
}

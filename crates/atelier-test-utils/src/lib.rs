//! Shared test doubles for atelier tests.
//!
//! Each fake records what it was asked to do so tests can assert on the
//! outgoing prompts and uploads:
//! - [`ScriptedTextModel`]: replays scripted replies in order.
//! - [`FakeImageModel`]: returns placeholder PNG bytes, or fails on demand.
//! - [`MemoryStore`]: keeps uploads in a map and mints deterministic URLs.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use atelier_core::Studio;
use atelier_core::upstream::{
    AspectRatio, GenerationError, ImageModel, ObjectStore, StorageError, TextModel,
};

/// PNG file signature used as the body of every fake image.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

// ---------------------------------------------------------------------------
// Text model
// ---------------------------------------------------------------------------

/// One scripted text-model reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail { status: u16, message: String },
}

/// Text model that replays [`Reply`] values in order.
///
/// Once the script runs out the last reply is repeated. An empty script
/// answers every call with an upstream failure.
#[derive(Debug, Default)]
pub struct ScriptedTextModel {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedTextModel {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new([Reply::Text(text.into())])
    }

    /// Always fail with a 503 carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new([Reply::Fail {
            status: 503,
            message: message.into(),
        }])
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn next_reply(&self) -> Option<Reply> {
        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = next {
            *last = Some(reply);
        }
        last.clone()
    }
}

#[async_trait]
impl TextModel for ScriptedTextModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        match self.next_reply() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail { status, message }) => {
                Err(GenerationError::Upstream { status, message })
            }
            None => Err(GenerationError::Upstream {
                status: 500,
                message: "no scripted reply".to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Image model
// ---------------------------------------------------------------------------

/// A recorded image-model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub count: usize,
    pub aspect_ratio: AspectRatio,
}

/// Image model returning `count` placeholder PNGs per call.
#[derive(Debug, Default)]
pub struct FakeImageModel {
    fail_with: Option<String>,
    requests: Mutex<Vec<ImageRequest>>,
}

impl FakeImageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with a 429 carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageModel for FakeImageModel {
    fn name(&self) -> &str {
        "fake-images"
    }

    async fn generate_images(
        &self,
        prompt: &str,
        count: usize,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<Vec<u8>>, GenerationError> {
        self.requests.lock().unwrap().push(ImageRequest {
            prompt: prompt.to_owned(),
            count,
            aspect_ratio,
        });
        if let Some(message) = &self.fail_with {
            return Err(GenerationError::Upstream {
                status: 429,
                message: message.clone(),
            });
        }
        Ok((0..count)
            .map(|i| {
                let mut bytes = PNG_SIGNATURE.to_vec();
                bytes.push(i as u8);
                bytes
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store.
///
/// Signed URLs look like
/// `https://storage.test/<bucket>/<key>?expires_in=<secs>`.
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    /// Number of uploads allowed before `put` starts failing.
    fail_after: Option<usize>,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    uploads: Mutex<usize>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            fail_after: None,
            objects: Mutex::new(BTreeMap::new()),
            uploads: Mutex::new(0),
        }
    }

    /// Accept `n` uploads, then fail every later one.
    pub fn failing_after(bucket: impl Into<String>, n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new(bucket)
        }
    }

    pub fn objects(&self) -> BTreeMap<String, StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut uploads = self.uploads.lock().unwrap();
        if self.fail_after.is_some_and(|n| *uploads >= n) {
            return Err(StorageError::Upload {
                key: key.to_owned(),
                message: "quota exceeded".to_owned(),
            });
        }
        *uploads += 1;
        self.objects.lock().unwrap().insert(
            key.to_owned(),
            StoredObject {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        Ok(format!(
            "https://storage.test/{}/{key}?expires_in={}",
            self.bucket,
            ttl.as_secs()
        ))
    }
}

// ---------------------------------------------------------------------------
// Studio wiring
// ---------------------------------------------------------------------------

/// A studio over fakes, with handles to each fake for assertions.
pub struct TestStudio {
    pub studio: Studio,
    pub text: Arc<ScriptedTextModel>,
    pub images: Arc<FakeImageModel>,
    pub store: Arc<MemoryStore>,
}

impl TestStudio {
    pub fn new(text: ScriptedTextModel, images: FakeImageModel, store: MemoryStore) -> Self {
        let text = Arc::new(text);
        let images = Arc::new(images);
        let store = Arc::new(store);
        let studio = Studio::new(text.clone(), images.clone(), store.clone());
        Self {
            studio,
            text,
            images,
            store,
        }
    }

    /// Studio whose text model always answers with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(
            ScriptedTextModel::replying(text),
            FakeImageModel::new(),
            MemoryStore::new("test-bucket"),
        )
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use omnivibe::{ImageFormat, ImageUpload, Result, VibeClient, VibeError, VibeResponse};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// JPEG signature followed by padding; the service is never asked to decode it.
pub const JPEG_BYTES: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0, 1];

pub const SCENARIO_PROMPT: &str =
    "Analyze the uploaded file. Target Vibe: Industrial Luxury. Action Triggered: Analyze Vibe";

pub fn jpeg() -> ImageUpload {
    ImageUpload::new(JPEG_BYTES.to_vec(), ImageFormat::Jpeg)
}

/// Replays queued replies and records every prompt it is sent.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn replying(text: &str) -> Self {
        let client = Self::default();
        client.push_ok(text);
        client
    }

    pub fn push_ok(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    /// Queues a quota failure carrying `message`.
    pub fn push_err(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VibeClient for ScriptedClient {
    async fn generate(&self, prompt: &str, _image: &ImageUpload) -> Result<VibeResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted reply".to_string()));
        match reply {
            Ok(text) => Ok(VibeResponse::new(text)),
            Err(message) => Err(VibeError::RateLimited {
                message,
                retry_after: None,
            }),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

//! Test helpers: in-memory storage, a recording sleeper and image fixtures.
//!
//! Run from workspace root: `cargo test -p vowbox-services --test upload_flow`.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vowbox_services::{
    FileService, FileServiceConfig, ObjectMetadata, RetryPolicy, Sleeper, Storage, StorageError,
    StorageResult,
};

pub const PUBLIC_URL: &str = "https://files.example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Put,
    Get,
    Head,
    Delete,
    PresignGet,
    PresignPut,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
    pub cache_control: Option<String>,
}

struct Failure {
    op: Op,
    key_contains: Option<String>,
    remaining: Option<usize>,
    error: fn(String) -> StorageError,
}

/// Mock storage implementation that stores objects in memory and records calls
#[derive(Default)]
pub struct MockStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    calls: Mutex<Vec<(Op, String)>>,
    failures: Mutex<Vec<Failure>>,
}

impl MockStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every call of `op`
    pub fn fail(&self, op: Op, error: fn(String) -> StorageError) {
        self.push_failure(op, None, None, error);
    }

    /// Fail the next `times` calls of `op`
    pub fn fail_times(&self, op: Op, times: usize, error: fn(String) -> StorageError) {
        self.push_failure(op, None, Some(times), error);
    }

    /// Fail every call of `op` whose key contains `fragment`
    pub fn fail_key(&self, op: Op, fragment: &str, error: fn(String) -> StorageError) {
        self.push_failure(op, Some(fragment.to_string()), None, error);
    }

    fn push_failure(
        &self,
        op: Op,
        key_contains: Option<String>,
        remaining: Option<usize>,
        error: fn(String) -> StorageError,
    ) {
        self.failures.lock().unwrap().push(Failure {
            op,
            key_contains,
            remaining,
            error,
        });
    }

    /// Set an object directly, bypassing call recording
    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data: Bytes::copy_from_slice(data),
                content_type: "application/octet-stream".to_string(),
                cache_control: None,
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn calls(&self, op: Op) -> usize {
        self.keys(op).len()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Keys passed to `op`, in call order
    pub fn keys(&self, op: Op) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, _)| *o == op)
            .map(|(_, key)| key.clone())
            .collect()
    }

    fn record(&self, op: Op, key: &str) -> StorageResult<()> {
        self.calls.lock().unwrap().push((op, key.to_string()));

        let mut failures = self.failures.lock().unwrap();
        for failure in failures.iter_mut() {
            if failure.op != op || failure.remaining == Some(0) {
                continue;
            }
            if let Some(fragment) = &failure.key_contains {
                if !key.contains(fragment.as_str()) {
                    continue;
                }
            }
            if let Some(remaining) = failure.remaining.as_mut() {
                *remaining -= 1;
            }
            return Err((failure.error)(key.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        cache_control: Option<&str>,
    ) -> StorageResult<()> {
        self.record(Op::Put, key)?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                cache_control: cache_control.map(String::from),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.record(Op::Get, key)?;
        self.object(key)
            .map(|o| o.data)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMetadata> {
        self.record(Op::Head, key)?;
        let object = self
            .object(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(ObjectMetadata {
            key: key.to_string(),
            size: object.data.len() as u64,
            last_modified: Utc::now(),
            e_tag: None,
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.record(Op::Delete, key)?;
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.object(key).is_some())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        self.record(Op::PresignGet, key)?;
        Ok(format!(
            "https://example.com/presigned/{}?expires={}",
            key,
            expires_in.as_secs()
        ))
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.record(Op::PresignPut, key)?;
        Ok(format!(
            "https://example.com/upload/{}?type={}&expires={}",
            key,
            content_type,
            expires_in.as_secs()
        ))
    }
}

/// Sleeper that records requested delays and returns immediately
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn service_config(public_url: Option<&str>) -> FileServiceConfig {
    FileServiceConfig {
        retry: RetryPolicy::new(3, Duration::from_millis(100)),
        public_base_url: public_url.map(String::from),
        presigned_url_ttl: Duration::from_secs(3600),
    }
}

/// Service over a fresh mock storage with a public base URL
pub fn service() -> (FileService, Arc<MockStorage>, Arc<RecordingSleeper>) {
    service_with(Some(PUBLIC_URL))
}

pub fn service_with(
    public_url: Option<&str>,
) -> (FileService, Arc<MockStorage>, Arc<RecordingSleeper>) {
    let storage = MockStorage::new();
    let sleeper = RecordingSleeper::new();
    let service = FileService::with_sleeper(
        storage.clone(),
        service_config(public_url),
        sleeper.clone(),
    );
    (service, storage, sleeper)
}

/// Deterministic noisy RGB image, so encoders cannot collapse it
pub fn noisy_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x2545_f491;
    let img = RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&noisy_image(width, height), ImageFormat::Jpeg)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([240, 200, 210])));
    encode(&img, ImageFormat::Png)
}

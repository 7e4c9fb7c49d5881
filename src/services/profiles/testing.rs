//! In-memory fakes for the identity, document and media ports.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use profile_core::AppError;
use profile_db::{Profile, ProfileStore};
use profile_identity::{Account, IdentityVerifier};
use profile_storage::{MediaStore, StagedUpload, UploadStager};
use tempfile::TempDir;

use super::ProfileService;
use crate::core::ServiceContext;

/// Public base of locators handed out by [`FakeMedia`].
pub const LOCATOR_BASE: &str = "https://media.test/pictures";

#[derive(Default)]
pub struct FakeIdentity {
    accounts: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn with_accounts(uids: &[&str]) -> Self {
        Self {
            accounts: uids.iter().map(ToString::to_string).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for FakeIdentity {
    async fn verify(&self, uid: &str) -> Option<Account> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accounts.contains(uid).then(|| Account {
            uid: uid.to_string(),
            email: None,
            display_name: None,
            disabled: false,
        })
    }
}

#[derive(Default)]
pub struct MemoryProfiles {
    docs: Mutex<HashMap<String, Profile>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryProfiles {
    pub fn insert(&self, profile: Profile) {
        self.docs
            .lock()
            .unwrap()
            .insert(profile.uid.clone(), profile);
    }

    pub fn stored(&self, uid: &str) -> Option<Profile> {
        self.docs.lock().unwrap().get(uid).cloned()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfiles {
    async fn get(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.stored(uid))
    }

    async fn put(&self, uid: &str, profile: &Profile) -> Result<(), AppError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.docs
            .lock()
            .unwrap()
            .insert(uid.to_string(), profile.clone());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeMedia {
    stored: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    fail_store: AtomicBool,
    fail_remove: AtomicBool,
}

impl FakeMedia {
    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn set_fail_store(&self, fail: bool) {
        self.fail_store.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn store(&self, upload: StagedUpload) -> Result<String, AppError> {
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(AppError::Internal("bucket unreachable".into()));
        }
        let mut stored = self.stored.lock().unwrap();
        let key = upload.object_key(i64::try_from(stored.len()).unwrap() + 1);
        stored.push(key.clone());
        Ok(format!("{LOCATOR_BASE}/{key}"))
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.removed.lock().unwrap().push(key.to_string());
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(AppError::Internal("access denied".into()));
        }
        Ok(())
    }
}

/// A [`ProfileService`] wired to fakes, with a private staging directory.
pub struct Harness {
    pub identity: Arc<FakeIdentity>,
    pub profiles: Arc<MemoryProfiles>,
    pub media: Arc<FakeMedia>,
    pub ctx: Arc<ServiceContext>,
    pub service: Arc<ProfileService>,
    upload_dir: TempDir,
}

impl Harness {
    pub fn new(accounts: &[&str]) -> Self {
        Self::build(accounts, true)
    }

    pub fn without_media(accounts: &[&str]) -> Self {
        Self::build(accounts, false)
    }

    fn build(accounts: &[&str], with_media: bool) -> Self {
        let identity = Arc::new(FakeIdentity::with_accounts(accounts));
        let profiles = Arc::new(MemoryProfiles::default());
        let media = Arc::new(FakeMedia::default());
        let upload_dir = tempfile::tempdir().unwrap();

        let media_port: Option<Arc<dyn MediaStore>> = if with_media {
            Some(media.clone() as Arc<dyn MediaStore>)
        } else {
            None
        };
        let ctx = Arc::new(ServiceContext::new(
            identity.clone(),
            profiles.clone(),
            media_port,
            upload_dir.path().to_path_buf(),
        ));

        Self {
            identity,
            profiles,
            media,
            service: Arc::new(ProfileService::new(ctx.clone())),
            ctx,
            upload_dir,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    /// Stage `bytes` as if they had arrived in a multipart file part.
    pub async fn staged(&self, name: &str, bytes: &[u8]) -> StagedUpload {
        let mut stager = UploadStager::new_in(self.upload_dir(), name, "image/png").unwrap();
        stager.write_chunk(bytes).await.unwrap();
        stager.finish().await.unwrap()
    }

    /// Number of staged files still on disk.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir()).unwrap().count()
    }
}

pub fn profile(uid: &str, name: &str, picture: Option<&str>) -> Profile {
    Profile {
        uid: uid.to_string(),
        name: Some(name.to_string()),
        gender: Some("F".to_string()),
        lifestyle: Some("active".to_string()),
        profile_picture: picture.map(ToString::to_string),
    }
}

/// User-account orchestration
///
/// The only component with real sequencing logic: each operation is a
/// straight line of calls across the identity provider, the object store,
/// and the relational store, in a fixed order with no retries and no
/// compensation. Once a provider-side mutation succeeds, a later local
/// failure leaves the two systems divergent; there is no automatic
/// reconciliation.
///
/// # Ordering per operation
///
/// - create: email pre-check -> provider create -> role claim -> (image
///   upload) -> local insert
/// - delete: local lookup -> provider delete -> local delete
/// - change email/password: local lookup -> provider update -> local save
///
/// The service is generic over [`UserStore`], [`IdentityProvider`] and
/// [`ObjectStore`] so tests can substitute in-memory implementations; the
/// server wires [`PgUserStore`] and the HTTP adapters once at startup and
/// passes the service explicitly through application state.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use userdesk_shared::auth::password::{hash_password, PasswordError};
use userdesk_shared::identity::{IdentityError, IdentityProvider};
use userdesk_shared::models::user::{CreateUser, User};
use userdesk_shared::storage::{ImageUpload, ObjectStore, StorageError};

/// Error type for user-account orchestration
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Create-time email collision (pre-check found an existing record)
    #[error("email is already registered")]
    DuplicateEmail,

    /// Email-change collision (another record holds the new email)
    #[error("email is already in use")]
    EmailInUse,

    /// No record for the given id or subject identifier
    #[error("user not found")]
    NotFound,

    /// Identity-provider call failed
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Object-storage upload failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Relational store call failed
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Local password hashing failed
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Persistence operations the orchestration layer needs
///
/// Production uses [`PgUserStore`]; tests use an in-memory store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new record and returns it with its assigned id
    async fn insert(&self, data: CreateUser) -> Result<User, sqlx::Error>;

    /// Looks up a record by numeric id
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, sqlx::Error>;

    /// Looks up a record by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    /// Looks up a record by provider subject identifier
    async fn find_by_subject(&self, subject_id: &str) -> Result<Option<User>, sqlx::Error>;

    /// Lists all records
    async fn list(&self) -> Result<Vec<User>, sqlx::Error>;

    /// Writes a mutated record back
    async fn save(&self, user: &User) -> Result<User, sqlx::Error>;

    /// Deletes a record, returning whether a row existed
    async fn delete(&self, id: i32) -> Result<bool, sqlx::Error>;
}

/// PostgreSQL-backed [`UserStore`]
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Wraps a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, data: CreateUser) -> Result<User, sqlx::Error> {
        User::create(&self.pool, data).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, sqlx::Error> {
        User::find_by_id(&self.pool, id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        User::find_by_email(&self.pool, email).await
    }

    async fn find_by_subject(&self, subject_id: &str) -> Result<Option<User>, sqlx::Error> {
        User::find_by_subject(&self.pool, subject_id).await
    }

    async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        User::list(&self.pool).await
    }

    async fn save(&self, user: &User) -> Result<User, sqlx::Error> {
        User::save(&self.pool, user).await
    }

    async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
        User::delete(&self.pool, id).await
    }
}

/// Input for the administrative create-account operation
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Given name
    pub name: String,
    /// Family name
    pub last_name: String,
    /// Document-type code
    pub document_type: String,
    /// Document number
    pub document_number: String,
    /// Phone number
    pub cell_phone: String,
    /// Email address
    pub email: String,
    /// Plaintext password, forwarded to the provider and hashed locally
    pub password: String,
    /// Role labels; first entry becomes the provider role claim
    pub roles: Vec<String>,
}

/// Input for the administrative full update
///
/// Every field overwrites unconditionally; callers supply all fields even
/// when unchanged. Email and password are never part of this path.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    /// Given name
    pub name: String,
    /// Family name
    pub last_name: String,
    /// Document-type code
    pub document_type: String,
    /// Document number
    pub document_number: String,
    /// Phone number
    pub cell_phone: String,
    /// Role labels
    pub roles: Vec<String>,
}

/// Input for the self-service profile update
///
/// Required fields are validated at the HTTP layer before this struct is
/// built; optional fields keep their current value when absent. Email,
/// password, and roles are untouchable on this path regardless of payload.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    /// Given name
    pub name: String,
    /// Family name
    pub last_name: String,
    /// Document number
    pub document_number: String,
    /// Document-type code, unchanged when None
    pub document_type: Option<String>,
    /// Phone number, unchanged when None
    pub cell_phone: Option<String>,
    /// Profile-image URL supplied directly by the caller, unchanged when None
    pub profile_image: Option<String>,
}

/// Role claim used when the input role list is empty
const DEFAULT_ROLE: &str = "USER";

/// User-account use cases over the three external systems
pub struct UserService<S, P, O> {
    store: S,
    identity: P,
    storage: O,
}

impl<S, P, O> UserService<S, P, O>
where
    S: UserStore,
    P: IdentityProvider,
    O: ObjectStore,
{
    /// Creates the service over its injected collaborators
    pub fn new(store: S, identity: P, storage: O) -> Self {
        Self {
            store,
            identity,
            storage,
        }
    }

    /// Creates a user account: provider account first, local record last
    ///
    /// Fails with [`UserServiceError::DuplicateEmail`] before any provider
    /// call when the email already has a local record. Concurrent creates
    /// for the same email can both pass this check; the store does not
    /// enforce email uniqueness.
    pub async fn create_user(
        &self,
        input: NewUser,
        image: Option<ImageUpload>,
    ) -> Result<User, UserServiceError> {
        if self.store.find_by_email(&input.email).await?.is_some() {
            return Err(UserServiceError::DuplicateEmail);
        }

        let subject_id = self
            .identity
            .create_account(&input.email, &input.password)
            .await?;

        let primary_role = input
            .roles
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_ROLE)
            .to_uppercase();
        self.identity
            .set_role_claim(&subject_id, &primary_role)
            .await?;

        let profile_image = match image {
            Some(image) => self.storage.upload(image).await?,
            None => String::new(),
        };

        let password_hash = hash_password(&input.password)?;

        let user = self
            .store
            .insert(CreateUser {
                subject_id,
                name: input.name,
                last_name: input.last_name,
                document_type: input.document_type,
                document_number: input.document_number,
                cell_phone: input.cell_phone,
                email: input.email,
                password_hash,
                roles: input.roles,
                profile_image,
            })
            .await?;

        info!(user_id = user.id, subject_id = %user.subject_id, "Created user account");
        Ok(user)
    }

    /// Administrative full update; email and password are never touched
    ///
    /// When a new image arrives, the old stored image is deleted first; a
    /// failed delete is logged by the adapter and the upload proceeds anyway.
    pub async fn update_user(
        &self,
        id: i32,
        input: UserUpdate,
        new_image: Option<ImageUpload>,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::NotFound)?;

        user.name = input.name;
        user.last_name = input.last_name;
        user.document_type = input.document_type;
        user.document_number = input.document_number;
        user.cell_phone = input.cell_phone;
        user.roles = input.roles;

        if let Some(image) = new_image {
            self.storage.delete(&user.profile_image).await;
            user.profile_image = self.storage.upload(image).await?;
        }

        Ok(self.store.save(&user).await?)
    }

    /// Self-service profile update, resolved by the token's subject
    pub async fn update_my_profile(
        &self,
        subject_id: &str,
        input: ProfileUpdate,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .store
            .find_by_subject(subject_id)
            .await?
            .ok_or(UserServiceError::NotFound)?;

        user.name = input.name;
        user.last_name = input.last_name;
        user.document_number = input.document_number;
        if let Some(document_type) = input.document_type {
            user.document_type = document_type;
        }
        if let Some(cell_phone) = input.cell_phone {
            user.cell_phone = cell_phone;
        }
        if let Some(profile_image) = input.profile_image {
            user.profile_image = profile_image;
        }

        Ok(self.store.save(&user).await?)
    }

    /// Changes the account email: provider first, then the local record
    ///
    /// Fails with [`UserServiceError::EmailInUse`] when a different record
    /// already holds the new email; changing to one's own current email is
    /// allowed.
    pub async fn change_email(
        &self,
        subject_id: &str,
        new_email: &str,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .store
            .find_by_subject(subject_id)
            .await?
            .ok_or(UserServiceError::NotFound)?;

        if let Some(existing) = self.store.find_by_email(new_email).await? {
            if existing.id != user.id {
                return Err(UserServiceError::EmailInUse);
            }
        }

        self.identity
            .update_email(&user.subject_id, new_email)
            .await?;

        user.email = new_email.to_string();
        Ok(self.store.save(&user).await?)
    }

    /// Changes the account password: provider first, then the local hash
    pub async fn change_password(
        &self,
        subject_id: &str,
        new_password: &str,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .store
            .find_by_subject(subject_id)
            .await?
            .ok_or(UserServiceError::NotFound)?;

        self.identity
            .update_password(&user.subject_id, new_password)
            .await?;

        user.password_hash = hash_password(new_password)?;
        Ok(self.store.save(&user).await?)
    }

    /// Deletes the provider account, then the local record
    ///
    /// Fails with [`UserServiceError::NotFound`] before any provider call
    /// when the id has no local record. No rollback of the provider deletion
    /// if the local delete fails afterwards.
    pub async fn delete_user(&self, id: i32) -> Result<(), UserServiceError> {
        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::NotFound)?;

        self.identity.delete_account(&user.subject_id).await?;
        self.store.delete(user.id).await?;

        info!(user_id = user.id, subject_id = %user.subject_id, "Deleted user account");
        Ok(())
    }

    /// Own profile by the token's subject identifier
    pub async fn my_profile(&self, subject_id: &str) -> Result<User, UserServiceError> {
        self.store
            .find_by_subject(subject_id)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    /// Lookup by numeric id
    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, UserServiceError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Lookup by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.store.find_by_email(email).await?)
    }

    /// Full listing
    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.store.list().await?)
    }

    /// Whether any record holds the given email (derived from the lookup)
    pub async fn email_exists(&self, email: &str) -> Result<bool, UserServiceError> {
        Ok(self.store.find_by_email(email).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use userdesk_shared::auth::password::verify_password;

    /// In-memory [`UserStore`] backing the orchestration tests
    #[derive(Clone, Default)]
    struct MemoryStore {
        inner: Arc<Mutex<MemoryStoreInner>>,
    }

    #[derive(Default)]
    struct MemoryStoreInner {
        users: Vec<User>,
        next_id: i32,
    }

    impl MemoryStore {
        fn seed(&self, data: CreateUser) -> User {
            let mut inner = self.inner.lock().unwrap();
            inner.next_id += 1;
            let user = User {
                id: inner.next_id,
                subject_id: data.subject_id,
                name: data.name,
                last_name: data.last_name,
                document_type: data.document_type,
                document_number: data.document_number,
                cell_phone: data.cell_phone,
                email: data.email,
                password_hash: data.password_hash,
                roles: data.roles,
                profile_image: data.profile_image,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            inner.users.push(user.clone());
            user
        }

        fn get(&self, id: i32) -> Option<User> {
            self.inner
                .lock()
                .unwrap()
                .users
                .iter()
                .find(|u| u.id == id)
                .cloned()
        }

        fn len(&self) -> usize {
            self.inner.lock().unwrap().users.len()
        }
    }

    #[async_trait]
    impl UserStore for MemoryStore {
        async fn insert(&self, data: CreateUser) -> Result<User, sqlx::Error> {
            Ok(self.seed(data))
        }

        async fn find_by_id(&self, id: i32) -> Result<Option<User>, sqlx::Error> {
            Ok(self.get(id))
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .users
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_by_subject(&self, subject_id: &str) -> Result<Option<User>, sqlx::Error> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .users
                .iter()
                .find(|u| u.subject_id == subject_id)
                .cloned())
        }

        async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
            Ok(self.inner.lock().unwrap().users.clone())
        }

        async fn save(&self, user: &User) -> Result<User, sqlx::Error> {
            let mut inner = self.inner.lock().unwrap();
            let slot = inner
                .users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or(sqlx::Error::RowNotFound)?;
            *slot = user.clone();
            slot.updated_at = Utc::now();
            Ok(slot.clone())
        }

        async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
            let mut inner = self.inner.lock().unwrap();
            let before = inner.users.len();
            inner.users.retain(|u| u.id != id);
            Ok(inner.users.len() < before)
        }
    }

    /// Recording identity provider mock
    #[derive(Clone, Default)]
    struct MockIdentity {
        calls: Arc<Mutex<Vec<String>>>,
        counter: Arc<AtomicU32>,
        fail: Arc<AtomicBool>,
    }

    impl MockIdentity {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn fail_next(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }

        fn check_fail(&self) -> Result<(), IdentityError> {
            if self.fail.swap(false, Ordering::SeqCst) {
                return Err(IdentityError::Provider {
                    status: 503,
                    message: "provider unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentity {
        async fn create_account(
            &self,
            email: &str,
            _password: &str,
        ) -> Result<String, IdentityError> {
            self.check_fail()?;
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            self.calls.lock().unwrap().push(format!("create:{}", email));
            Ok(format!("subj-{}", n))
        }

        async fn set_role_claim(&self, subject_id: &str, role: &str) -> Result<(), IdentityError> {
            self.check_fail()?;
            self.calls
                .lock()
                .unwrap()
                .push(format!("claim:{}:{}", subject_id, role));
            Ok(())
        }

        async fn update_email(
            &self,
            subject_id: &str,
            new_email: &str,
        ) -> Result<(), IdentityError> {
            self.check_fail()?;
            self.calls
                .lock()
                .unwrap()
                .push(format!("email:{}:{}", subject_id, new_email));
            Ok(())
        }

        async fn update_password(
            &self,
            subject_id: &str,
            _new_password: &str,
        ) -> Result<(), IdentityError> {
            self.check_fail()?;
            self.calls
                .lock()
                .unwrap()
                .push(format!("password:{}", subject_id));
            Ok(())
        }

        async fn delete_account(&self, subject_id: &str) -> Result<(), IdentityError> {
            self.check_fail()?;
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete:{}", subject_id));
            Ok(())
        }
    }

    /// Recording object store mock
    #[derive(Clone, Default)]
    struct MockStorage {
        uploads: Arc<Mutex<Vec<String>>>,
        deletes: Arc<Mutex<Vec<String>>>,
    }

    impl MockStorage {
        fn uploads(&self) -> Vec<String> {
            self.uploads.lock().unwrap().clone()
        }

        fn deletes(&self) -> Vec<String> {
            self.deletes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for MockStorage {
        async fn upload(&self, image: ImageUpload) -> Result<String, StorageError> {
            self.uploads.lock().unwrap().push(image.filename.clone());
            Ok(format!("https://files.test/public/{}", image.filename))
        }

        async fn delete(&self, public_url: &str) -> bool {
            self.deletes.lock().unwrap().push(public_url.to_string());
            true
        }
    }

    type TestService = UserService<MemoryStore, MockIdentity, MockStorage>;

    fn service() -> (TestService, MemoryStore, MockIdentity, MockStorage) {
        let store = MemoryStore::default();
        let identity = MockIdentity::default();
        let storage = MockStorage::default();
        let service = UserService::new(store.clone(), identity.clone(), storage.clone());
        (service, store, identity, storage)
    }

    fn new_user(email: &str, roles: Vec<&str>) -> NewUser {
        NewUser {
            name: "Ana".to_string(),
            last_name: "Quispe".to_string(),
            document_type: "DNI".to_string(),
            document_number: "44556677".to_string(),
            cell_phone: "987654321".to_string(),
            email: email.to_string(),
            password: "Sup3rS3cret!".to_string(),
            roles: roles.into_iter().map(str::to_owned).collect(),
        }
    }

    fn image(filename: &str) -> ImageUpload {
        ImageUpload {
            bytes: Bytes::from_static(b"fake-image-bytes"),
            filename: filename.to_string(),
            content_type: "image/png".to_string(),
        }
    }

    fn seeded(store: &MemoryStore, subject_id: &str, email: &str) -> User {
        store.seed(CreateUser {
            subject_id: subject_id.to_string(),
            name: "Luis".to_string(),
            last_name: "Rojas".to_string(),
            document_type: "DNI".to_string(),
            document_number: "11223344".to_string(),
            cell_phone: "900111222".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$old-hash".to_string(),
            roles: vec!["USER".to_string()],
            profile_image: "https://files.test/public/old.png".to_string(),
        })
    }

    #[tokio::test]
    async fn create_user_orders_provider_then_store() {
        let (service, store, identity, _storage) = service();

        let user = service
            .create_user(new_user("ana@example.com", vec!["admin"]), None)
            .await
            .unwrap();

        assert_eq!(user.subject_id, "subj-1");
        assert_eq!(user.profile_image, "");
        assert_eq!(
            identity.calls(),
            vec!["create:ana@example.com", "claim:subj-1:ADMIN"]
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn create_user_hashes_password_locally() {
        let (service, store, _identity, _storage) = service();

        let user = service
            .create_user(new_user("ana@example.com", vec!["user"]), None)
            .await
            .unwrap();

        let stored = store.get(user.id).unwrap();
        assert_ne!(stored.password_hash, "Sup3rS3cret!");
        assert!(stored.password_hash.starts_with("$argon2id$"));
        assert!(verify_password("Sup3rS3cret!", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn create_user_with_duplicate_email_never_calls_provider() {
        let (service, store, identity, _storage) = service();
        seeded(&store, "subj-existing", "taken@example.com");

        let result = service
            .create_user(new_user("taken@example.com", vec!["user"]), None)
            .await;

        assert!(matches!(result, Err(UserServiceError::DuplicateEmail)));
        assert!(identity.calls().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn create_user_with_empty_roles_claims_default_role() {
        let (service, _store, identity, _storage) = service();

        service
            .create_user(new_user("ana@example.com", vec![]), None)
            .await
            .unwrap();

        assert_eq!(
            identity.calls(),
            vec!["create:ana@example.com", "claim:subj-1:USER"]
        );
    }

    #[tokio::test]
    async fn create_user_uploads_image_and_stores_url() {
        let (service, store, _identity, storage) = service();

        let user = service
            .create_user(
                new_user("ana@example.com", vec!["user"]),
                Some(image("photo.png")),
            )
            .await
            .unwrap();

        assert_eq!(storage.uploads(), vec!["photo.png"]);
        assert_eq!(
            store.get(user.id).unwrap().profile_image,
            "https://files.test/public/photo.png"
        );
    }

    #[tokio::test]
    async fn create_user_provider_failure_leaves_store_empty() {
        let (service, store, identity, _storage) = service();
        identity.fail_next();

        let result = service
            .create_user(new_user("ana@example.com", vec!["user"]), None)
            .await;

        assert!(matches!(result, Err(UserServiceError::Identity(_))));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn update_user_missing_id_is_not_found() {
        let (service, _store, _identity, _storage) = service();

        let input = UserUpdate {
            name: "x".to_string(),
            last_name: "y".to_string(),
            document_type: "DNI".to_string(),
            document_number: "1".to_string(),
            cell_phone: "2".to_string(),
            roles: vec!["USER".to_string()],
        };

        let result = service.update_user(99, input, None).await;
        assert!(matches!(result, Err(UserServiceError::NotFound)));
    }

    #[tokio::test]
    async fn update_user_overwrites_fields_and_preserves_identity() {
        let (service, store, _identity, _storage) = service();
        let existing = seeded(&store, "subj-1", "luis@example.com");

        let input = UserUpdate {
            name: "Luis Alberto".to_string(),
            last_name: "Rojas Diaz".to_string(),
            document_type: "CE".to_string(),
            document_number: "99887766".to_string(),
            cell_phone: "911222333".to_string(),
            roles: vec!["ADMIN".to_string()],
        };

        let updated = service.update_user(existing.id, input, None).await.unwrap();

        assert_eq!(updated.name, "Luis Alberto");
        assert_eq!(updated.roles, vec!["ADMIN".to_string()]);
        // email, password hash, subject, and image survive untouched
        assert_eq!(updated.email, "luis@example.com");
        assert_eq!(updated.password_hash, "$argon2id$old-hash");
        assert_eq!(updated.subject_id, "subj-1");
        assert_eq!(updated.profile_image, "https://files.test/public/old.png");
    }

    #[tokio::test]
    async fn update_user_replaces_image_deleting_old_first() {
        let (service, store, _identity, storage) = service();
        let existing = seeded(&store, "subj-1", "luis@example.com");

        let input = UserUpdate {
            name: existing.name.clone(),
            last_name: existing.last_name.clone(),
            document_type: existing.document_type.clone(),
            document_number: existing.document_number.clone(),
            cell_phone: existing.cell_phone.clone(),
            roles: existing.roles.clone(),
        };

        let updated = service
            .update_user(existing.id, input, Some(image("new.png")))
            .await
            .unwrap();

        assert_eq!(
            storage.deletes(),
            vec!["https://files.test/public/old.png"]
        );
        assert_eq!(storage.uploads(), vec!["new.png"]);
        assert_eq!(updated.profile_image, "https://files.test/public/new.png");
    }

    #[tokio::test]
    async fn update_my_profile_keeps_untouchable_fields() {
        let (service, store, _identity, _storage) = service();
        seeded(&store, "subj-1", "luis@example.com");

        let input = ProfileUpdate {
            name: "Nuevo".to_string(),
            last_name: "Nombre".to_string(),
            document_number: "55443322".to_string(),
            document_type: None,
            cell_phone: Some("955666777".to_string()),
            profile_image: Some("https://files.test/public/self.png".to_string()),
        };

        let updated = service.update_my_profile("subj-1", input).await.unwrap();

        assert_eq!(updated.name, "Nuevo");
        assert_eq!(updated.document_number, "55443322");
        // None keeps the current value
        assert_eq!(updated.document_type, "DNI");
        assert_eq!(updated.cell_phone, "955666777");
        assert_eq!(updated.profile_image, "https://files.test/public/self.png");
        // email, password, and roles are untouchable on this path
        assert_eq!(updated.email, "luis@example.com");
        assert_eq!(updated.password_hash, "$argon2id$old-hash");
        assert_eq!(updated.roles, vec!["USER".to_string()]);
    }

    #[tokio::test]
    async fn update_my_profile_unknown_subject_is_not_found() {
        let (service, _store, _identity, _storage) = service();

        let input = ProfileUpdate {
            name: "a".to_string(),
            last_name: "b".to_string(),
            document_number: "c".to_string(),
            document_type: None,
            cell_phone: None,
            profile_image: None,
        };

        let result = service.update_my_profile("subj-missing", input).await;
        assert!(matches!(result, Err(UserServiceError::NotFound)));
    }

    #[tokio::test]
    async fn change_email_conflict_leaves_everything_untouched() {
        let (service, store, identity, _storage) = service();
        let caller = seeded(&store, "subj-1", "luis@example.com");
        seeded(&store, "subj-2", "other@example.com");

        let result = service.change_email("subj-1", "other@example.com").await;

        assert!(matches!(result, Err(UserServiceError::EmailInUse)));
        assert!(identity.calls().is_empty());
        assert_eq!(store.get(caller.id).unwrap().email, "luis@example.com");
    }

    #[tokio::test]
    async fn change_email_updates_provider_then_store() {
        let (service, store, identity, _storage) = service();
        let caller = seeded(&store, "subj-1", "luis@example.com");

        let updated = service
            .change_email("subj-1", "nuevo@example.com")
            .await
            .unwrap();

        assert_eq!(identity.calls(), vec!["email:subj-1:nuevo@example.com"]);
        assert_eq!(updated.email, "nuevo@example.com");
        assert_eq!(store.get(caller.id).unwrap().email, "nuevo@example.com");
    }

    #[tokio::test]
    async fn change_email_to_own_address_is_allowed() {
        let (service, store, _identity, _storage) = service();
        seeded(&store, "subj-1", "luis@example.com");

        let updated = service
            .change_email("subj-1", "luis@example.com")
            .await
            .unwrap();
        assert_eq!(updated.email, "luis@example.com");
    }

    #[tokio::test]
    async fn change_password_updates_provider_and_stores_hash() {
        let (service, store, identity, _storage) = service();
        let caller = seeded(&store, "subj-1", "luis@example.com");

        service
            .change_password("subj-1", "N3wPassword!")
            .await
            .unwrap();

        assert_eq!(identity.calls(), vec!["password:subj-1"]);
        let stored = store.get(caller.id).unwrap();
        assert_ne!(stored.password_hash, "N3wPassword!");
        assert!(verify_password("N3wPassword!", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn delete_user_missing_id_never_calls_provider() {
        let (service, _store, identity, _storage) = service();

        let result = service.delete_user(42).await;

        assert!(matches!(result, Err(UserServiceError::NotFound)));
        assert!(identity.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_user_removes_provider_account_and_record() {
        let (service, store, identity, _storage) = service();
        let existing = seeded(&store, "subj-1", "luis@example.com");

        service.delete_user(existing.id).await.unwrap();

        assert_eq!(identity.calls(), vec!["delete:subj-1"]);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn email_exists_is_derived_from_lookup() {
        let (service, store, _identity, _storage) = service();
        seeded(&store, "subj-1", "luis@example.com");

        assert!(service.email_exists("luis@example.com").await.unwrap());
        assert!(!service.email_exists("nobody@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn my_profile_resolves_by_subject() {
        let (service, store, _identity, _storage) = service();
        seeded(&store, "subj-1", "luis@example.com");

        let user = service.my_profile("subj-1").await.unwrap();
        assert_eq!(user.email, "luis@example.com");

        let result = service.my_profile("subj-unknown").await;
        assert!(matches!(result, Err(UserServiceError::NotFound)));

        assert_eq!(store.len(), 1);
    }
}

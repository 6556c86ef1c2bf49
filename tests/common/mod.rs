#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use graphloader::error::StoreError;
use graphloader::memory_store::MemoryStore;
use graphloader::model::{MemberType, MemberTypeId, Post, Profile, Subscription, User};
use graphloader::store::Store;
use uuid::Uuid;

pub const ALICE: Uuid = Uuid::from_u128(0xA);
pub const BOB: Uuid = Uuid::from_u128(0xB);
pub const CAROL: Uuid = Uuid::from_u128(0xC);

pub const P1: Uuid = Uuid::from_u128(0x101);
pub const P2: Uuid = Uuid::from_u128(0x102);
pub const P3: Uuid = Uuid::from_u128(0x103);

pub fn user(id: Uuid, name: &str) -> User {
    User { id, name: name.to_owned(), balance: 10.0 }
}

pub fn post(id: Uuid, author_id: Uuid, title: &str) -> Post {
    Post { id, title: title.to_owned(), content: format!("{} body", title), author_id }
}

pub fn follows(subscriber_id: Uuid, author_id: Uuid) -> Subscription {
    Subscription { subscriber_id, author_id }
}

/// Alice has two posts, Bob none, Carol one. Bob and Carol follow Alice, Alice follows Carol.
/// Only Alice and Carol have a profile.
pub fn fixture() -> MemoryStore {
    MemoryStore {
        member_types: vec![
            MemberType { id: MemberTypeId::Basic, discount: 2.3, posts_limit_per_month: 20 },
            MemberType { id: MemberTypeId::Business, discount: 7.7, posts_limit_per_month: 100 },
        ],
        users: vec![user(ALICE, "alice"), user(BOB, "bob"), user(CAROL, "carol")],
        profiles: vec![
            Profile {
                id: Uuid::from_u128(0x201),
                is_male: false,
                year_of_birth: 1990,
                user_id: ALICE,
                member_type_id: MemberTypeId::Basic,
            },
            Profile {
                id: Uuid::from_u128(0x203),
                is_male: false,
                year_of_birth: 1985,
                user_id: CAROL,
                member_type_id: MemberTypeId::Business,
            },
        ],
        // Deliberately not grouped by author.
        posts: vec![post(P1, ALICE, "p1"), post(P3, CAROL, "p3"), post(P2, ALICE, "p2")],
        subscriptions: vec![follows(BOB, ALICE), follows(CAROL, ALICE), follows(ALICE, CAROL)],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub keys: Vec<String>,
}

/// Wraps a [`MemoryStore`], recording every call and failing the methods it is told to fail.
pub struct CountingStore {
    inner: MemoryStore,
    failing: Vec<&'static str>,
    calls: Mutex<Vec<Call>>,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Arc<Self> {
        Self::failing(inner, &[])
    }

    pub fn failing(inner: MemoryStore, methods: &[&'static str]) -> Arc<Self> {
        Arc::new(Self { inner, failing: methods.to_vec(), calls: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|call| call.method == method).count()
    }

    pub fn total(&self) -> usize {
        self.calls().len()
    }

    fn record<K: ToString>(&self, method: &'static str, keys: &[K]) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call { method, keys: keys.iter().map(ToString::to_string).collect() });
        if self.failing.contains(&method) {
            return Err(StoreError::Unavailable(format!("{} is down", method)));
        }
        Ok(())
    }
}

pub fn as_store(store: &Arc<CountingStore>) -> Arc<dyn Store> {
    store.clone()
}

#[async_trait]
impl Store for CountingStore {
    async fn users(&self) -> Result<Vec<User>, StoreError> {
        self.record::<Uuid>("users", &[])?;
        self.inner.users().await
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.record("user", &[id])?;
        self.inner.user(id).await
    }

    async fn posts(&self) -> Result<Vec<Post>, StoreError> {
        self.record::<Uuid>("posts", &[])?;
        self.inner.posts().await
    }

    async fn post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        self.record("post", &[id])?;
        self.inner.post(id).await
    }

    async fn profiles(&self) -> Result<Vec<Profile>, StoreError> {
        self.record::<Uuid>("profiles", &[])?;
        self.inner.profiles().await
    }

    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.record("profile", &[id])?;
        self.inner.profile(id).await
    }

    async fn member_types(&self) -> Result<Vec<MemberType>, StoreError> {
        self.record::<Uuid>("member_types", &[])?;
        self.inner.member_types().await
    }

    async fn member_type(&self, id: MemberTypeId) -> Result<Option<MemberType>, StoreError> {
        self.record("member_type", &[format!("{:?}", id)])?;
        self.inner.member_type(id).await
    }

    async fn member_types_by_ids(
        &self,
        ids: &[MemberTypeId],
    ) -> Result<Vec<MemberType>, StoreError> {
        let keys = ids.iter().map(|id| format!("{:?}", id)).collect::<Vec<_>>();
        self.record("member_types_by_ids", &keys)?;
        self.inner.member_types_by_ids(ids).await
    }

    async fn posts_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Post>, StoreError> {
        self.record("posts_by_authors", author_ids)?;
        self.inner.posts_by_authors(author_ids).await
    }

    async fn profiles_by_users(&self, user_ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        self.record("profiles_by_users", user_ids)?;
        self.inner.profiles_by_users(user_ids).await
    }

    async fn subscribed_authors(
        &self,
        subscriber_ids: &[Uuid],
    ) -> Result<Vec<(Subscription, User)>, StoreError> {
        self.record("subscribed_authors", subscriber_ids)?;
        self.inner.subscribed_authors(subscriber_ids).await
    }

    async fn subscribers_of(
        &self,
        author_ids: &[Uuid],
    ) -> Result<Vec<(Subscription, User)>, StoreError> {
        self.record("subscribers_of", author_ids)?;
        self.inner.subscribers_of(author_ids).await
    }

    async fn subscriptions_of(&self, user_ids: &[Uuid]) -> Result<Vec<Subscription>, StoreError> {
        self.record("subscriptions_of", user_ids)?;
        self.inner.subscriptions_of(user_ids).await
    }
}

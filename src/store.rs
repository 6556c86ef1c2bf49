use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::StoreError,
    model::{MemberType, MemberTypeId, Post, Profile, Subscription, User},
};

/// The data store the graph is served from.
///
/// The `*_by_*`, `subscribed_authors`, `subscribers_of` and `subscriptions_of` methods are grouped
/// fetches: one call serves every key in the slice, rows come back in any order and carry the
/// foreign key they belong to. Implementations are shared across requests and must not keep any
/// per-request state.
#[async_trait]
pub trait Store: Send + Sync {
    async fn users(&self) -> Result<Vec<User>, StoreError>;
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn posts(&self) -> Result<Vec<Post>, StoreError>;
    async fn post(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    async fn profiles(&self) -> Result<Vec<Profile>, StoreError>;
    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;
    async fn member_types(&self) -> Result<Vec<MemberType>, StoreError>;
    async fn member_type(&self, id: MemberTypeId) -> Result<Option<MemberType>, StoreError>;

    async fn member_types_by_ids(
        &self,
        ids: &[MemberTypeId],
    ) -> Result<Vec<MemberType>, StoreError>;
    async fn posts_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Post>, StoreError>;
    async fn profiles_by_users(&self, user_ids: &[Uuid]) -> Result<Vec<Profile>, StoreError>;

    /// Edges whose subscriber is in `subscriber_ids`, each joined with its author.
    async fn subscribed_authors(
        &self,
        subscriber_ids: &[Uuid],
    ) -> Result<Vec<(Subscription, User)>, StoreError>;

    /// Edges whose author is in `author_ids`, each joined with its subscriber.
    async fn subscribers_of(
        &self,
        author_ids: &[Uuid],
    ) -> Result<Vec<(Subscription, User)>, StoreError>;

    /// Every edge with either end in `user_ids`.
    async fn subscriptions_of(&self, user_ids: &[Uuid]) -> Result<Vec<Subscription>, StoreError>;
}

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::StoreError,
    model::{MemberType, MemberTypeId, Post, Profile, Subscription, User},
    store::Store,
};

/// A [`Store`] over plain vectors. Deserializes from the same camelCase JSON the API serves, which
/// makes it handy for fixtures.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryStore {
    pub member_types: Vec<MemberType>,
    pub users: Vec<User>,
    pub profiles: Vec<Profile>,
    pub posts: Vec<Post>,
    pub subscriptions: Vec<Subscription>,
}

impl MemoryStore {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Query(e.to_string()))
    }

    fn user_by_id(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    fn edges_with_users<F>(
        &self,
        keep: F,
        far_end: fn(&Subscription) -> Uuid,
    ) -> Vec<(Subscription, User)>
    where
        F: Fn(&Subscription) -> bool,
    {
        self.subscriptions
            .iter()
            .filter(|edge| keep(edge))
            .filter_map(|edge| self.user_by_id(far_end(edge)).map(|user| (*edge, user.clone())))
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.clone())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.user_by_id(id).cloned())
    }

    async fn posts(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self.posts.clone())
    }

    async fn post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn profiles(&self) -> Result<Vec<Profile>, StoreError> {
        Ok(self.profiles.clone())
    }

    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.iter().find(|profile| profile.id == id).cloned())
    }

    async fn member_types(&self) -> Result<Vec<MemberType>, StoreError> {
        Ok(self.member_types.clone())
    }

    async fn member_type(&self, id: MemberTypeId) -> Result<Option<MemberType>, StoreError> {
        Ok(self.member_types.iter().find(|member_type| member_type.id == id).cloned())
    }

    async fn member_types_by_ids(
        &self,
        ids: &[MemberTypeId],
    ) -> Result<Vec<MemberType>, StoreError> {
        Ok(self.member_types.iter().filter(|m| ids.contains(&m.id)).cloned().collect())
    }

    async fn posts_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Post>, StoreError> {
        Ok(self.posts.iter().filter(|p| author_ids.contains(&p.author_id)).cloned().collect())
    }

    async fn profiles_by_users(&self, user_ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        Ok(self.profiles.iter().filter(|p| user_ids.contains(&p.user_id)).cloned().collect())
    }

    async fn subscribed_authors(
        &self,
        subscriber_ids: &[Uuid],
    ) -> Result<Vec<(Subscription, User)>, StoreError> {
        Ok(self.edges_with_users(
            |edge| subscriber_ids.contains(&edge.subscriber_id),
            |edge| edge.author_id,
        ))
    }

    async fn subscribers_of(
        &self,
        author_ids: &[Uuid],
    ) -> Result<Vec<(Subscription, User)>, StoreError> {
        Ok(self.edges_with_users(
            |edge| author_ids.contains(&edge.author_id),
            |edge| edge.subscriber_id,
        ))
    }

    async fn subscriptions_of(&self, user_ids: &[Uuid]) -> Result<Vec<Subscription>, StoreError> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|edge| {
                user_ids.contains(&edge.subscriber_id) || user_ids.contains(&edge.author_id)
            })
            .copied()
            .collect())
    }
}

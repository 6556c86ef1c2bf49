//! The five relation loaders a request resolves through.
//!
//! Each batch function makes exactly one grouped store call and partitions the rows with
//! [`associate`], keyed by the relation's foreign key.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use uuid::Uuid;

use crate::{
    association::associate,
    batch_function::BatchFunction,
    error::{LoadError, StoreError},
    loader::{Dispatch, Loader},
    model::{MemberType, MemberTypeId, Post, Profile, User},
    store::Store,
};

pub type MemberTypeLoader = Loader<MemberTypeId, Option<MemberType>>;
pub type PostsByAuthorLoader = Loader<Uuid, Vec<Post>>;
pub type ProfileByUserLoader = Loader<Uuid, Option<Profile>>;
/// Both subscription directions map a user id to a list of users.
pub type SubscriptionLoader = Loader<Uuid, Vec<User>>;

/// `profile.memberType`, keyed by member type id.
pub struct MemberTypeById;

#[async_trait]
impl BatchFunction<MemberTypeId, Option<MemberType>> for MemberTypeById {
    type Context = Arc<dyn Store>;

    async fn load(
        keys: &[MemberTypeId],
        store: &Arc<dyn Store>,
    ) -> Result<HashMap<MemberTypeId, Option<MemberType>>, StoreError> {
        let rows = store.member_types_by_ids(keys).await?;
        Ok(associate(keys, rows, |member_type| (member_type.id, member_type)))
    }
}

/// `user.posts`, keyed by author id.
pub struct PostsByAuthor;

#[async_trait]
impl BatchFunction<Uuid, Vec<Post>> for PostsByAuthor {
    type Context = Arc<dyn Store>;

    async fn load(
        keys: &[Uuid],
        store: &Arc<dyn Store>,
    ) -> Result<HashMap<Uuid, Vec<Post>>, StoreError> {
        let rows = store.posts_by_authors(keys).await?;
        Ok(associate(keys, rows, |post| (post.author_id, post)))
    }
}

/// `user.profile`, keyed by user id.
pub struct ProfileByUser;

#[async_trait]
impl BatchFunction<Uuid, Option<Profile>> for ProfileByUser {
    type Context = Arc<dyn Store>;

    async fn load(
        keys: &[Uuid],
        store: &Arc<dyn Store>,
    ) -> Result<HashMap<Uuid, Option<Profile>>, StoreError> {
        let rows = store.profiles_by_users(keys).await?;
        Ok(associate(keys, rows, |profile| (profile.user_id, profile)))
    }
}

/// `user.userSubscribedTo`: the authors a subscriber follows, keyed by subscriber id.
pub struct SubscribedAuthors;

#[async_trait]
impl BatchFunction<Uuid, Vec<User>> for SubscribedAuthors {
    type Context = Arc<dyn Store>;

    async fn load(
        keys: &[Uuid],
        store: &Arc<dyn Store>,
    ) -> Result<HashMap<Uuid, Vec<User>>, StoreError> {
        let rows = store.subscribed_authors(keys).await?;
        Ok(associate(keys, rows, |(edge, author)| (edge.subscriber_id, author)))
    }
}

/// `user.subscribedToUser`: the subscribers of an author, keyed by author id.
pub struct Subscribers;

#[async_trait]
impl BatchFunction<Uuid, Vec<User>> for Subscribers {
    type Context = Arc<dyn Store>;

    async fn load(
        keys: &[Uuid],
        store: &Arc<dyn Store>,
    ) -> Result<HashMap<Uuid, Vec<User>>, StoreError> {
        let rows = store.subscribers_of(keys).await?;
        Ok(associate(keys, rows, |(edge, subscriber)| (edge.author_id, subscriber)))
    }
}

/// One loader per relation. Built per request, never shared between requests.
pub struct EntityLoaders {
    pub member_type: MemberTypeLoader,
    pub posts: PostsByAuthorLoader,
    pub profile: ProfileByUserLoader,
    /// `userSubscribedTo`
    pub subscriptions_out: SubscriptionLoader,
    /// `subscribedToUser`
    pub subscriptions_in: SubscriptionLoader,
}

impl EntityLoaders {
    pub fn new(store: Arc<dyn Store>, dispatch: Dispatch) -> Self {
        Self {
            member_type: Loader::with_dispatch(MemberTypeById, store.clone(), dispatch),
            posts: Loader::with_dispatch(PostsByAuthor, store.clone(), dispatch),
            profile: Loader::with_dispatch(ProfileByUser, store.clone(), dispatch),
            subscriptions_out: Loader::with_dispatch(SubscribedAuthors, store.clone(), dispatch),
            subscriptions_in: Loader::with_dispatch(Subscribers, store, dispatch),
        }
    }

    /// Closes the execution frame of every loader. An engine running loaders with
    /// [`Dispatch::Explicit`] calls this after each resolution level.
    ///
    /// Every loader is flushed even if one of them reports an error; the first error is returned.
    pub async fn dispatch_all(&self) -> Result<(), LoadError> {
        let (member_type, posts, profile, out, inbound) = future::join5(
            self.member_type.dispatch(),
            self.posts.dispatch(),
            self.profile.dispatch(),
            self.subscriptions_out.dispatch(),
            self.subscriptions_in.dispatch(),
        )
        .await;
        member_type.and(posts).and(profile).and(out).and(inbound)
    }
}

//! Selection-aware prefetch for the `users` list.
//!
//! When a client asks for `users { subscribedToUser { .. } }`, the per-user resolvers would each
//! go through the subscription loader, costing a second round trip after the list itself. Looking
//! at the selection up front lets the list resolver fetch the edges in the same pass and prime
//! the loaders, so the per-user loads are answered from cache. Results are the same either way.

use std::collections::HashMap;

use async_graphql::Lookahead;
use uuid::Uuid;

use crate::{
    error::{LoadError, StoreError},
    loaders::EntityLoaders,
    model::User,
    store::Store,
};

pub const USER_SUBSCRIBED_TO: &str = "userSubscribedTo";
pub const SUBSCRIBED_TO_USER: &str = "subscribedToUser";

/// Answers whether a field was selected directly below the field being resolved.
pub trait SelectionProbe {
    fn selects(&self, field: &str) -> bool;
}

impl SelectionProbe for Lookahead<'_> {
    fn selects(&self, field: &str) -> bool {
        self.field(field).exists()
    }
}

impl SelectionProbe for [&str] {
    fn selects(&self, field: &str) -> bool {
        self.iter().any(|selected| *selected == field)
    }
}

/// Which subscription relations a `users` selection asked for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchPlan {
    pub subscribed_to: bool,
    pub subscribers: bool,
}

impl PrefetchPlan {
    pub fn from_selection<S: SelectionProbe + ?Sized>(selection: &S) -> Self {
        Self {
            subscribed_to: selection.selects(USER_SUBSCRIBED_TO),
            subscribers: selection.selects(SUBSCRIBED_TO_USER),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.subscribed_to && !self.subscribers
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PrefetchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

pub struct Prefetcher<'a> {
    store: &'a dyn Store,
    loaders: &'a EntityLoaders,
}

impl<'a> Prefetcher<'a> {
    pub fn new(store: &'a dyn Store, loaders: &'a EntityLoaders) -> Self {
        Self { store, loaders }
    }

    /// Fetches the user list and, if `plan` asks for any subscription relation, the edges of
    /// those users in one extra grouped fetch, priming the matching loaders with them.
    ///
    /// Only a failure of the list itself is an error. If the edge fetch fails nothing is primed
    /// and the loaders fetch the relations on their own.
    pub async fn users(&self, plan: PrefetchPlan) -> Result<Vec<User>, PrefetchError> {
        let users = self.store.users().await?;
        if plan.is_empty() || users.is_empty() {
            return Ok(users);
        }

        let ids = users.iter().map(|user| user.id).collect::<Vec<_>>();
        let edges = match self.store.subscriptions_of(&ids).await {
            Ok(edges) => edges,
            Err(error) => {
                tracing::warn!(%error, users = users.len(), ?plan, "subscription prefetch failed");
                return Ok(users);
            }
        };
        tracing::debug!(
            users = users.len(),
            edges = edges.len(),
            ?plan,
            "prefetched subscriptions"
        );

        let by_id = users.iter().map(|user| (user.id, user)).collect::<HashMap<_, _>>();
        let mut authors: HashMap<Uuid, Option<Vec<User>>> =
            ids.iter().map(|id| (*id, Some(Vec::new()))).collect();
        let mut subscribers = authors.clone();

        for edge in &edges {
            if plan.subscribed_to {
                link(&mut authors, edge.subscriber_id, by_id.get(&edge.author_id).copied());
            }
            if plan.subscribers {
                link(&mut subscribers, edge.author_id, by_id.get(&edge.subscriber_id).copied());
            }
        }

        if plan.subscribed_to {
            self.loaders.subscriptions_out.prime_many(primable(authors))?;
        }
        if plan.subscribers {
            self.loaders.subscriptions_in.prime_many(primable(subscribers))?;
        }
        Ok(users)
    }
}

/// Adds `far_end` to the list of `key`. An edge pointing at a user outside the list poisons that
/// key's entry so it is left to the loader instead of being primed with a partial list.
fn link(lists: &mut HashMap<Uuid, Option<Vec<User>>>, key: Uuid, far_end: Option<&User>) {
    if let Some(entry) = lists.get_mut(&key) {
        match far_end {
            Some(user) => {
                if let Some(list) = entry {
                    list.push(user.clone());
                }
            }
            None => *entry = None,
        }
    }
}

fn primable(lists: HashMap<Uuid, Option<Vec<User>>>) -> Vec<(Uuid, Vec<User>)> {
    lists.into_iter().filter_map(|(key, list)| list.map(|list| (key, list))).collect()
}

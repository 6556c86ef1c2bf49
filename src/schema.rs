//! Read-only graph over the store. Relation fields resolve through the request's loaders.

use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Result, Schema};
use uuid::Uuid;

use crate::{
    context::RequestContext,
    model::{MemberType, MemberTypeId, Post, Profile, User},
    prefetch::{PrefetchPlan, Prefetcher},
};

pub type GraphSchema = Schema<Query, EmptyMutation, EmptySubscription>;

/// Builds the schema. Done once at startup; per-request state arrives as request data.
pub fn build_schema() -> GraphSchema {
    Schema::build(Query, EmptyMutation, EmptySubscription).finish()
}

fn request<'a>(ctx: &Context<'a>) -> Result<&'a RequestContext> {
    ctx.data::<RequestContext>()
}

pub struct MemberObject(MemberType);

#[Object(name = "member")]
impl MemberObject {
    async fn id(&self) -> MemberTypeId {
        self.0.id
    }

    async fn discount(&self) -> f64 {
        self.0.discount
    }

    async fn posts_limit_per_month(&self) -> i32 {
        self.0.posts_limit_per_month
    }
}

pub struct PostObject(Post);

#[Object(name = "post")]
impl PostObject {
    async fn id(&self) -> Uuid {
        self.0.id
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn content(&self) -> &str {
        &self.0.content
    }

    async fn author_id(&self) -> Uuid {
        self.0.author_id
    }
}

pub struct ProfileObject(Profile);

#[Object(name = "profile")]
impl ProfileObject {
    async fn id(&self) -> Uuid {
        self.0.id
    }

    async fn is_male(&self) -> bool {
        self.0.is_male
    }

    async fn year_of_birth(&self) -> i32 {
        self.0.year_of_birth
    }

    async fn user_id(&self) -> Uuid {
        self.0.user_id
    }

    async fn member_type(&self, ctx: &Context<'_>) -> Result<Option<MemberObject>> {
        let member_type = request(ctx)?.loaders().member_type.load(self.0.member_type_id).await?;
        Ok(member_type.map(MemberObject))
    }
}

pub struct UserObject(User);

#[Object(name = "user")]
impl UserObject {
    async fn id(&self) -> Uuid {
        self.0.id
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn balance(&self) -> f64 {
        self.0.balance
    }

    async fn profile(&self, ctx: &Context<'_>) -> Result<Option<ProfileObject>> {
        let profile = request(ctx)?.loaders().profile.load(self.0.id).await?;
        Ok(profile.map(ProfileObject))
    }

    /// Nullable so that a failed fetch only blanks this field.
    async fn posts(&self, ctx: &Context<'_>) -> Result<Option<Vec<PostObject>>> {
        let posts = request(ctx)?.loaders().posts.load(self.0.id).await?;
        Ok(Some(posts.into_iter().map(PostObject).collect()))
    }

    /// Authors this user is subscribed to.
    async fn user_subscribed_to(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let authors = request(ctx)?.loaders().subscriptions_out.load(self.0.id).await?;
        Ok(authors.into_iter().map(UserObject).collect())
    }

    /// Users subscribed to this user.
    async fn subscribed_to_user(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let subscribers = request(ctx)?.loaders().subscriptions_in.load(self.0.id).await?;
        Ok(subscribers.into_iter().map(UserObject).collect())
    }
}

#[derive(Default)]
pub struct Query;

#[Object]
impl Query {
    async fn member_types(&self, ctx: &Context<'_>) -> Result<Vec<MemberObject>> {
        let member_types = request(ctx)?.store().member_types().await?;
        Ok(member_types.into_iter().map(MemberObject).collect())
    }

    async fn member_type(
        &self,
        ctx: &Context<'_>,
        id: MemberTypeId,
    ) -> Result<Option<MemberObject>> {
        Ok(request(ctx)?.store().member_type(id).await?.map(MemberObject))
    }

    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<PostObject>> {
        let posts = request(ctx)?.store().posts().await?;
        Ok(posts.into_iter().map(PostObject).collect())
    }

    async fn post(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<PostObject>> {
        Ok(request(ctx)?.store().post(id).await?.map(PostObject))
    }

    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let request = request(ctx)?;
        let users = if request.prefetch_enabled() {
            let plan = PrefetchPlan::from_selection(&ctx.look_ahead());
            Prefetcher::new(request.store(), request.loaders()).users(plan).await?
        } else {
            request.store().users().await?
        };
        Ok(users.into_iter().map(UserObject).collect())
    }

    async fn user(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<UserObject>> {
        Ok(request(ctx)?.store().user(id).await?.map(UserObject))
    }

    async fn profiles(&self, ctx: &Context<'_>) -> Result<Vec<ProfileObject>> {
        let profiles = request(ctx)?.store().profiles().await?;
        Ok(profiles.into_iter().map(ProfileObject).collect())
    }

    async fn profile(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<ProfileObject>> {
        Ok(request(ctx)?.store().profile(id).await?.map(ProfileObject))
    }
}

//! `PgStore` against a live database.
//!
//! Needs `DATABASE_URL` pointing at a disposable Postgres. Run with
//! `cargo test --test postgres_store -- --ignored`.

use forum_engine::{
    database::{create_pool, run_migrations},
    error::AppError,
    identity::{Actor, SiteRole},
    models::{
        CommunityRole, CreateCommentRequest, CreateCommunityRequest, CreatePostRequest,
        PageRequest, Post,
        PostType, SortOrder, ThreadQuery, VoteAction, VoteIntent, VoteState, VoteTarget,
    },
    services::{
        comment_service, community_service,
        deletion_service::{self, DeleteTarget},
        post_service, vote_service,
    },
    store::{PgStore, UserStore, VoteStore},
};
use uuid::Uuid;

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&url, 20).await.expect("Failed to connect");
    run_migrations(&pool).await.expect("Failed to migrate");
    PgStore::new(pool)
}

async fn user(store: &PgStore, username: &str) -> Actor {
    let actor = Actor::new(Uuid::new_v4(), username, SiteRole::Member);
    store
        .upsert_user(actor.user_id, username)
        .await
        .expect("Failed to register user");
    actor
}

/// Fresh community and post; names are randomized so runs can share a database.
async fn post(store: &PgStore, owner: &Actor) -> Post {
    let name = format!("pg{}", &Uuid::new_v4().simple().to_string()[..16]);
    let community = community_service::create_community(
        store,
        owner,
        &CreateCommunityRequest {
            name,
            description: None,
        },
    )
    .await
    .expect("Failed to create community");

    post_service::create_post(
        store,
        owner,
        &CreatePostRequest {
            title: "Postgres".to_string(),
            content: "row locks".to_string(),
            post_type: PostType::Text,
            community_id: community.id,
            media_urls: Vec::new(),
        },
    )
    .await
    .expect("Failed to create post")
}

async fn reply(store: &PgStore, actor: &Actor, post_id: Uuid, parent_id: Option<Uuid>) -> Uuid {
    comment_service::create_comment(
        store,
        actor,
        &CreateCommentRequest {
            content: "reply".to_string(),
            post_id,
            parent_id,
        },
    )
    .await
    .expect("Failed to create comment")
    .id
}

async fn score(store: &PgStore, target: VoteTarget) -> i32 {
    store.find_votable(target).await.unwrap().unwrap().score
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn two_user_scenario() {
    let store = store().await;
    let owner = user(&store, "owner").await;
    let target = VoteTarget::post(post(&store, &owner).await.id);
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bob").await;

    let steps = [
        (&alice, VoteIntent::Upvote, 1),
        (&bob, VoteIntent::Downvote, 0),
        (&alice, VoteIntent::Downvote, -2),
        (&alice, VoteIntent::Remove, -1),
    ];
    for (actor, intent, expected) in steps {
        let outcome = vote_service::set_vote(&store, actor.user_id, target, intent)
            .await
            .unwrap();
        assert_eq!(outcome.score, expected, "{:?}", intent);
    }

    assert_eq!(score(&store, target).await, -1);
    assert_eq!(store.find_vote(alice.user_id, target).await.unwrap(), None);
    assert_eq!(
        store.find_vote(bob.user_id, target).await.unwrap(),
        Some(VoteState::Downvote)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_votes_from_many_users_compose() {
    let store = store().await;
    let owner = user(&store, "owner").await;
    let target = VoteTarget::post(post(&store, &owner).await.id);

    let mut tasks = Vec::new();
    for n in 0..30 {
        let voter = user(&store, &format!("voter{n}")).await;
        let store = store.clone();
        let intent = if n % 3 == 0 {
            VoteIntent::Downvote
        } else {
            VoteIntent::Upvote
        };
        tasks.push(tokio::spawn(async move {
            vote_service::set_vote(&store, voter.user_id, target, intent).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // 20 up, 10 down.
    assert_eq!(score(&store, target).await, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_repeats_by_one_user_match_the_recorded_vote() {
    let store = store().await;
    let owner = user(&store, "owner").await;
    let target = VoteTarget::post(post(&store, &owner).await.id);
    let alice = user(&store, "alice").await;

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let store = store.clone();
            let user_id = alice.user_id;
            tokio::spawn(async move {
                vote_service::set_vote(&store, user_id, target, VoteIntent::Upvote).await
            })
        })
        .collect();
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) | Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let recorded = store.find_vote(alice.user_id, target).await.unwrap();
    assert_eq!(
        score(&store, target).await,
        recorded.map_or(0, |state| i32::from(state.as_i16()))
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn vote_on_vanished_target_writes_nothing() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let target = VoteTarget::comment(Uuid::new_v4());

    let result = store
        .commit_vote(
            alice.user_id,
            target,
            None,
            VoteAction::Create(VoteState::Upvote),
            1,
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(store.find_vote(alice.user_id, target).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn thread_nests_and_redacts() {
    let store = store().await;
    let owner = user(&store, "owner").await;
    let post_id = post(&store, &owner).await.id;

    let c1 = reply(&store, &owner, post_id, None).await;
    let c2 = reply(&store, &owner, post_id, Some(c1)).await;
    let c3 = reply(&store, &owner, post_id, Some(c2)).await;
    deletion_service::delete_target(&store, &owner, DeleteTarget::Comment(c2))
        .await
        .unwrap();

    let thread = comment_service::get_thread(
        &store,
        post_id,
        Some(owner.user_id),
        ThreadQuery {
            page: PageRequest::default(),
            max_depth: 64,
        },
    )
    .await
    .unwrap();

    assert_eq!(thread.comments.len(), 1);
    let root = &thread.comments[0];
    assert_eq!(root.id, c1);
    assert_eq!(root.children[0].id, c2);
    assert!(root.children[0].view.is_redacted());
    assert_eq!(root.children[0].children[0].id, c3);
    assert_eq!(root.children[0].children[0].view.content(), "reply");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn top_ordered_roots_page_through() {
    let store = store().await;
    let owner = user(&store, "owner").await;
    let post_id = post(&store, &owner).await.id;

    let mut roots = Vec::new();
    for _ in 0..5 {
        let root = reply(&store, &owner, post_id, None).await;
        reply(&store, &owner, post_id, Some(root)).await;
        roots.push(root);
    }
    vote_service::set_vote(
        &store,
        owner.user_id,
        VoteTarget::comment(roots[2]),
        VoteIntent::Upvote,
    )
    .await
    .unwrap();

    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let thread = comment_service::get_thread(
            &store,
            post_id,
            None,
            ThreadQuery {
                page: PageRequest::new(cursor, Some(2), Some(SortOrder::Top)),
                max_depth: 64,
            },
        )
        .await
        .unwrap();
        for root in &thread.comments {
            assert_eq!(root.children.len(), 1);
        }
        seen.extend(thread.comments.iter().map(|node| node.id));
        match thread.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(seen[0], roots[2]);
    seen.sort();
    roots.sort();
    assert_eq!(seen, roots);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn users_sharing_a_username_can_both_vote() {
    let store = store().await;
    let owner = user(&store, "owner").await;
    let target = VoteTarget::post(post(&store, &owner).await.id);

    let first = user(&store, "same_name").await;
    let second = user(&store, "same_name").await;

    for actor in [&first, &second] {
        vote_service::set_vote(&store, actor.user_id, target, VoteIntent::Upvote)
            .await
            .unwrap();
    }
    reply(&store, &second, target.id, None).await;

    assert_eq!(score(&store, target).await, 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn memberships_round_trip() {
    let store = store().await;
    let owner = user(&store, "owner").await;
    let community_id = post(&store, &owner).await.community_id;
    let member = user(&store, "member").await;

    community_service::join_community(&store, &member, community_id)
        .await
        .unwrap();
    let again = community_service::join_community(&store, &member, community_id).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    community_service::set_member_role(
        &store,
        &owner,
        community_id,
        member.user_id,
        CommunityRole::Moderator,
    )
    .await
    .unwrap();

    assert_eq!(
        community_service::community_role(&store, member.user_id, community_id)
            .await
            .unwrap(),
        Some(CommunityRole::Moderator)
    );
}


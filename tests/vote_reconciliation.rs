//! Score bookkeeping for post and comment votes.

mod common;

use common::{forum, reply, user};
use forum_engine::{
    error::AppError,
    models::{VoteAction, VoteCommit, VoteIntent, VoteState, VoteTarget},
    services::{deletion_service, vote_service},
    store::VoteStore,
};
use uuid::Uuid;

#[tokio::test]
async fn two_users_voting_on_a_post() {
    let forum = forum().await;
    let store = &forum.store;
    let target = VoteTarget::post(forum.post.id);
    let alice = user(store, "alice").await;
    let bob = user(store, "bob").await;

    let outcome = vote_service::set_vote(store, alice.user_id, target, VoteIntent::Upvote)
        .await
        .unwrap();
    assert_eq!(outcome.score, 1);
    assert_eq!(outcome.user_vote, Some(VoteState::Upvote));

    let outcome = vote_service::set_vote(store, bob.user_id, target, VoteIntent::Downvote)
        .await
        .unwrap();
    assert_eq!(outcome.score, 0);
    assert_eq!(outcome.user_vote, Some(VoteState::Downvote));

    let outcome = vote_service::set_vote(store, alice.user_id, target, VoteIntent::Downvote)
        .await
        .unwrap();
    assert_eq!(outcome.score, -2);
    assert_eq!(outcome.user_vote, Some(VoteState::Downvote));

    let outcome = vote_service::set_vote(store, alice.user_id, target, VoteIntent::Remove)
        .await
        .unwrap();
    assert_eq!(outcome.score, -1);
    assert_eq!(outcome.user_vote, None);

    assert_eq!(
        vote_service::find_vote_state(store, alice.user_id, target)
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        vote_service::find_vote_state(store, bob.user_id, target)
            .await
            .unwrap(),
        Some(VoteState::Downvote)
    );
    assert_eq!(store.vote_count(target).await, 1);
}

#[tokio::test]
async fn repeating_a_vote_toggles_it_off() {
    let forum = forum().await;
    let store = &forum.store;
    let target = VoteTarget::post(forum.post.id);
    let alice = user(store, "alice").await;

    for _ in 0..2 {
        vote_service::set_vote(store, alice.user_id, target, VoteIntent::Upvote)
            .await
            .unwrap();
    }

    let votable = store.find_votable(target).await.unwrap().unwrap();
    assert_eq!(votable.score, 0);
    assert_eq!(store.vote_count(target).await, 0);
}

#[tokio::test]
async fn single_user_sequences_sum_their_deltas() {
    use VoteIntent::{Downvote, Remove, Upvote};

    let sequences: [(&[VoteIntent], i32, Option<VoteState>); 4] = [
        (&[Upvote, Downvote], -1, Some(VoteState::Downvote)),
        (&[Downvote, Downvote, Upvote], 1, Some(VoteState::Upvote)),
        (&[Upvote, Remove, Remove], 0, None),
        (&[Downvote, Upvote, Upvote, Downvote], -1, Some(VoteState::Downvote)),
    ];

    for (intents, score, state) in sequences {
        let forum = forum().await;
        let store = &forum.store;
        let target = VoteTarget::post(forum.post.id);
        let voter = user(store, "voter").await;

        let mut last = None;
        for intent in intents {
            last = Some(
                vote_service::set_vote(store, voter.user_id, target, *intent)
                    .await
                    .unwrap(),
            );
        }

        let last = last.unwrap();
        assert_eq!(last.score, score, "{:?}", intents);
        assert_eq!(last.user_vote, state, "{:?}", intents);
        assert_eq!(
            store.find_vote(voter.user_id, target).await.unwrap(),
            state
        );
    }
}

#[tokio::test]
async fn removing_an_absent_vote_changes_nothing() {
    let forum = forum().await;
    let store = &forum.store;
    let target = VoteTarget::post(forum.post.id);

    let outcome = vote_service::set_vote(store, forum.owner.user_id, target, VoteIntent::Remove)
        .await
        .unwrap();

    assert_eq!(outcome.score, 0);
    assert_eq!(outcome.user_vote, None);
    assert_eq!(store.vote_count(target).await, 0);
}

#[tokio::test]
async fn comment_score_matches_recorded_votes() {
    let forum = forum().await;
    let store = &forum.store;
    let comment_id = reply(store, &forum.owner, forum.post.id, None, "first").await;
    let target = VoteTarget::comment(comment_id);

    let voters = [
        (user(store, "a").await, [VoteIntent::Upvote, VoteIntent::Downvote, VoteIntent::Downvote]),
        (user(store, "b").await, [VoteIntent::Downvote, VoteIntent::Upvote, VoteIntent::Upvote]),
        (user(store, "c").await, [VoteIntent::Upvote, VoteIntent::Remove, VoteIntent::Upvote]),
    ];

    for (voter, intents) in &voters {
        for intent in intents {
            vote_service::set_vote(store, voter.user_id, target, *intent)
                .await
                .unwrap();
        }
    }

    let mut expected = 0;
    for (voter, _) in &voters {
        if let Some(state) = store.find_vote(voter.user_id, target).await.unwrap() {
            expected += i32::from(state.as_i16());
        }
    }

    let votable = store.find_votable(target).await.unwrap().unwrap();
    assert_eq!(votable.score, expected);
    // a: up, down, toggled off. b: down, up, toggled off. c: up, none, up.
    assert_eq!(votable.score, 1);
}

#[tokio::test]
async fn voting_on_missing_or_deleted_targets_is_not_found() {
    let forum = forum().await;
    let store = &forum.store;

    let missing = vote_service::set_vote(
        store,
        forum.owner.user_id,
        VoteTarget::comment(Uuid::new_v4()),
        VoteIntent::Upvote,
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    deletion_service::delete_target(
        store,
        &forum.owner,
        deletion_service::DeleteTarget::Post(forum.post.id),
    )
    .await
    .unwrap();

    let target = VoteTarget::post(forum.post.id);
    let deleted =
        vote_service::set_vote(store, forum.owner.user_id, target, VoteIntent::Upvote).await;
    assert!(matches!(deleted, Err(AppError::NotFound(_))));
    assert_eq!(store.vote_count(target).await, 0);
}

#[test]
fn out_of_range_vote_value_is_rejected_before_persistence() {
    assert!(matches!(
        VoteIntent::try_from(2),
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        VoteIntent::try_from(-5),
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn commit_against_a_stale_state_writes_nothing() {
    let forum = forum().await;
    let store = &forum.store;
    let target = VoteTarget::post(forum.post.id);
    let alice = user(store, "alice").await;

    vote_service::set_vote(store, alice.user_id, target, VoteIntent::Upvote)
        .await
        .unwrap();

    // A second first-time upvote computed before the first one landed.
    let commit = store
        .commit_vote(
            alice.user_id,
            target,
            None,
            VoteAction::Create(VoteState::Upvote),
            1,
        )
        .await
        .unwrap();

    assert_eq!(commit, VoteCommit::Stale(Some(VoteState::Upvote)));
    assert_eq!(store.find_votable(target).await.unwrap().unwrap().score, 1);
    assert_eq!(store.vote_count(target).await, 1);
}

#[tokio::test]
async fn concurrent_first_votes_by_one_user_keep_score_consistent() {
    let forum = std::sync::Arc::new(forum().await);
    let target = VoteTarget::post(forum.post.id);
    let alice = user(&forum.store, "alice").await;

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let forum = forum.clone();
            let user_id = alice.user_id;
            tokio::spawn(async move {
                vote_service::set_vote(&forum.store, user_id, target, VoteIntent::Upvote).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // Applied one after the other: up, then toggled off.
    let score = forum.store.find_votable(target).await.unwrap().unwrap().score;
    let recorded = forum.store.find_vote(alice.user_id, target).await.unwrap();
    assert_eq!(score, recorded.map_or(0, |state| i32::from(state.as_i16())));
    assert_eq!(score, 0);
}

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use sqlx::{FromRow, Pool, Sqlite};

use crate::db::models::{
    MatchCandidate, MatchDetail, MatchedUser, RelationshipStatus, Skill, SwapStatus,
};
use crate::error::AppError;

/// One (candidate, skill) pairing from a direction query.
#[derive(Debug, FromRow)]
struct DirectionRow {
    id: String,
    username: String,
    full_name: Option<String>,
    rating: f64,
    bio: Option<String>,
    skill_name: String,
}

#[derive(Debug, FromRow)]
struct SessionPairRow {
    user1_id: String,
    user2_id: String,
    status: SwapStatus,
}

#[derive(Debug, FromRow)]
struct PendingRequestRow {
    id: String,
    requester_id: String,
    receiver_id: String,
}

/// Skill pair selected for a new swap request.
#[derive(Debug)]
pub struct SkillPair {
    pub requester_skill: Skill,
    pub receiver_skill: Skill,
}

/// Matching is recomputed live on every call; skill edits need no cache
/// invalidation anywhere.
pub struct MatchingRepository;

impl MatchingRepository {
    /// Every other user with a skill overlap in either direction, with the
    /// overlapping skill names per direction and the authoritative
    /// relationship status. Ordered by rating descending, username ascending.
    pub async fn compute_matches(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<MatchCandidate>, AppError> {
        // Direction (a): their OFFER skills whose name matches one of my WANTs.
        let they_offer = sqlx::query_as::<_, DirectionRow>(
            r#"
SELECT u.id, u.username, u.full_name, u.rating, u.bio, s.skill_name
FROM users u
JOIN skills s ON s.user_id = u.id AND s.skill_type = 'OFFER'
JOIN skills w ON w.user_id = ? AND w.skill_type = 'WANT'
    AND LOWER(w.skill_name) = LOWER(s.skill_name)
WHERE u.id != ?
ORDER BY s.created_at
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        // Direction (b): my OFFER skills whose name matches one of their WANTs.
        let i_offer = sqlx::query_as::<_, DirectionRow>(
            r#"
SELECT u.id, u.username, u.full_name, u.rating, u.bio, s.skill_name
FROM users u
JOIN skills w ON w.user_id = u.id AND w.skill_type = 'WANT'
JOIN skills s ON s.user_id = ? AND s.skill_type = 'OFFER'
    AND LOWER(s.skill_name) = LOWER(w.skill_name)
WHERE u.id != ?
ORDER BY s.created_at
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        struct Accum {
            user: MatchedUser,
            they_offer: Vec<String>,
            they_seen: HashSet<String>,
            i_offer: Vec<String>,
            i_seen: HashSet<String>,
        }

        let mut candidates: HashMap<String, Accum> = HashMap::new();

        let mut absorb = |row: DirectionRow, reverse: bool| {
            let entry = candidates.entry(row.id.clone()).or_insert_with(|| Accum {
                user: MatchedUser {
                    id: row.id.clone(),
                    username: row.username.clone(),
                    full_name: row.full_name.clone(),
                    rating: row.rating,
                    bio: row.bio.clone(),
                },
                they_offer: Vec::new(),
                they_seen: HashSet::new(),
                i_offer: Vec::new(),
                i_seen: HashSet::new(),
            });
            // Deduplicate by case-folded name; the "(OFFER)" suffix is cosmetic.
            let key = row.skill_name.to_lowercase();
            let (names, seen) = if reverse {
                (&mut entry.i_offer, &mut entry.i_seen)
            } else {
                (&mut entry.they_offer, &mut entry.they_seen)
            };
            if seen.insert(key) {
                names.push(format!("{} (OFFER)", row.skill_name));
            }
        };

        for row in they_offer {
            absorb(row, false);
        }
        for row in i_offer {
            absorb(row, true);
        }

        let (sessions, pending) = Self::relationship_rows(pool, user_id).await?;

        let mut matches: Vec<MatchCandidate> = candidates
            .into_values()
            .map(|acc| {
                let (relationship, pending_request_id) =
                    Self::classify(user_id, &acc.user.id, &sessions, &pending);
                MatchCandidate {
                    user: acc.user,
                    they_offer_that_i_want: acc.they_offer,
                    i_offer_that_they_want: acc.i_offer,
                    relationship,
                    pending_request_id,
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.user
                .rating
                .partial_cmp(&a.user.rating)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.user.username.cmp(&b.user.username))
        });

        Ok(matches)
    }

    /// The four skill lists backing the pairing rule, plus the matched
    /// user's public card.
    pub async fn match_detail(
        pool: &Pool<Sqlite>,
        user_id: &str,
        other_id: &str,
    ) -> Result<MatchDetail, AppError> {
        let matched_user = sqlx::query_as::<_, MatchedUser>(
            "SELECT id, username, full_name, rating, bio FROM users WHERE id = ?",
        )
        .bind(other_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let their_offers_that_i_want = Self::matched_offers(pool, other_id, user_id).await?;
        let my_offers_that_they_want = Self::matched_offers(pool, user_id, other_id).await?;
        let all_their_offers = Self::all_offers(pool, other_id).await?;
        let all_my_offers = Self::all_offers(pool, user_id).await?;

        Ok(MatchDetail {
            matched_user,
            their_offers_that_i_want,
            my_offers_that_they_want,
            all_their_offers,
            all_my_offers,
        })
    }

    /// Select the skill pair for a request from `requester_id` to
    /// `receiver_id`: a bidirectional pairing when both directions match,
    /// otherwise the single matched skill against the other party's first
    /// OFFER skill.
    pub async fn auto_pair(
        pool: &Pool<Sqlite>,
        requester_id: &str,
        receiver_id: &str,
    ) -> Result<SkillPair, AppError> {
        let detail = Self::match_detail(pool, requester_id, receiver_id).await?;

        let MatchDetail {
            their_offers_that_i_want: mut their_matched,
            my_offers_that_they_want: mut my_matched,
            all_their_offers: mut all_theirs,
            all_my_offers: mut all_mine,
            ..
        } = detail;

        if !my_matched.is_empty() && !their_matched.is_empty() {
            return Ok(SkillPair {
                requester_skill: my_matched.remove(0),
                receiver_skill: their_matched.remove(0),
            });
        }
        if !their_matched.is_empty() && !all_mine.is_empty() {
            return Ok(SkillPair {
                requester_skill: all_mine.remove(0),
                receiver_skill: their_matched.remove(0),
            });
        }
        if !my_matched.is_empty() && !all_theirs.is_empty() {
            return Ok(SkillPair {
                requester_skill: my_matched.remove(0),
                receiver_skill: all_theirs.remove(0),
            });
        }

        if their_matched.is_empty() && my_matched.is_empty() {
            Err(AppError::Validation(
                "No matching skills between the two users".to_string(),
            ))
        } else {
            Err(AppError::Validation(
                "Both users must have at least one offer skill".to_string(),
            ))
        }
    }

    /// `owner_id`'s OFFER skills whose name matches one of `wanter_id`'s WANTs.
    async fn matched_offers(
        pool: &Pool<Sqlite>,
        owner_id: &str,
        wanter_id: &str,
    ) -> Result<Vec<Skill>, AppError> {
        let skills = sqlx::query_as::<_, Skill>(
            r#"
SELECT DISTINCT s.*
FROM skills s
JOIN skills w ON w.user_id = ? AND w.skill_type = 'WANT'
    AND LOWER(w.skill_name) = LOWER(s.skill_name)
WHERE s.user_id = ? AND s.skill_type = 'OFFER'
ORDER BY s.created_at
            "#,
        )
        .bind(wanter_id)
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(skills)
    }

    async fn all_offers(pool: &Pool<Sqlite>, owner_id: &str) -> Result<Vec<Skill>, AppError> {
        let skills = sqlx::query_as::<_, Skill>(
            "SELECT * FROM skills WHERE user_id = ? AND skill_type = 'OFFER' ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(skills)
    }

    async fn relationship_rows(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<(Vec<SessionPairRow>, Vec<PendingRequestRow>), AppError> {
        let sessions = sqlx::query_as::<_, SessionPairRow>(
            "SELECT user1_id, user2_id, status FROM swap_sessions WHERE user1_id = ? OR user2_id = ?",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let pending = sqlx::query_as::<_, PendingRequestRow>(
            r#"
SELECT id, requester_id, receiver_id
FROM swap_requests
WHERE (requester_id = ? OR receiver_id = ?) AND status = 'PENDING'
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok((sessions, pending))
    }

    fn classify(
        user_id: &str,
        other_id: &str,
        sessions: &[SessionPairRow],
        pending: &[PendingRequestRow],
    ) -> (RelationshipStatus, Option<String>) {
        let mut has_active = false;
        let mut has_completed = false;
        for s in sessions {
            let involves_other = (s.user1_id == user_id && s.user2_id == other_id)
                || (s.user2_id == user_id && s.user1_id == other_id);
            if !involves_other {
                continue;
            }
            match s.status {
                SwapStatus::Active => has_active = true,
                SwapStatus::Completed => has_completed = true,
                SwapStatus::Cancelled => {}
            }
        }
        if has_active {
            return (RelationshipStatus::Active, None);
        }
        if has_completed {
            return (RelationshipStatus::Completed, None);
        }

        for r in pending {
            if r.requester_id == other_id && r.receiver_id == user_id {
                return (RelationshipStatus::ReceivedPending, Some(r.id.clone()));
            }
        }
        for r in pending {
            if r.requester_id == user_id && r.receiver_id == other_id {
                return (RelationshipStatus::SentPending, Some(r.id.clone()));
            }
        }

        (RelationshipStatus::None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SkillType;
    use crate::db::swap_requests::SwapRequestRepository;
    use crate::db::testing;

    #[tokio::test]
    async fn test_match_symmetric_in_visibility() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        // Case-insensitive name equality in both views.
        testing::skill(&pool, &alice, "JavaScript", SkillType::Want).await;
        testing::skill(&pool, &bob, "javascript", SkillType::Offer).await;

        let alice_matches = MatchingRepository::compute_matches(&pool, &alice.id)
            .await
            .unwrap();
        assert_eq!(alice_matches.len(), 1);
        assert_eq!(alice_matches[0].user.id, bob.id);
        assert_eq!(
            alice_matches[0].they_offer_that_i_want,
            vec!["javascript (OFFER)".to_string()]
        );
        assert!(alice_matches[0].i_offer_that_they_want.is_empty());

        let bob_matches = MatchingRepository::compute_matches(&pool, &bob.id)
            .await
            .unwrap();
        assert_eq!(bob_matches.len(), 1);
        assert_eq!(bob_matches[0].user.id, alice.id);
        assert_eq!(
            bob_matches[0].i_offer_that_they_want,
            vec!["javascript (OFFER)".to_string()]
        );
        assert!(bob_matches[0].they_offer_that_i_want.is_empty());
    }

    #[tokio::test]
    async fn test_self_excluded_and_ordering() {
        let pool = testing::pool().await;
        let me = testing::user(&pool, "me").await;
        let low = testing::user(&pool, "aardvark").await;
        let high = testing::user(&pool, "zebra").await;

        testing::skill(&pool, &me, "Cooking", SkillType::Want).await;
        // My own OFFER of the same name must never match me back.
        testing::skill(&pool, &me, "Cooking", SkillType::Offer).await;
        testing::skill(&pool, &low, "Cooking", SkillType::Offer).await;
        testing::skill(&pool, &high, "Cooking", SkillType::Offer).await;

        sqlx::query("UPDATE users SET rating = 4.5 WHERE id = ?")
            .bind(&high.id)
            .execute(&pool)
            .await
            .unwrap();

        let matches = MatchingRepository::compute_matches(&pool, &me.id)
            .await
            .unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.user.id.as_str()).collect();
        assert_eq!(ids, vec![high.id.as_str(), low.id.as_str()]);
    }

    #[tokio::test]
    async fn test_duplicate_names_deduplicated() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        testing::skill(&pool, &alice, "Photography", SkillType::Want).await;
        testing::skill(&pool, &bob, "Photography", SkillType::Offer).await;
        testing::skill(&pool, &bob, "photography", SkillType::Offer).await;

        let matches = MatchingRepository::compute_matches(&pool, &alice.id)
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].they_offer_that_i_want.len(), 1);
    }

    #[tokio::test]
    async fn test_bidirectional_pairing_rule() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        // A wants JavaScript and offers Design; B offers JavaScript and
        // wants Design: a perfect bidirectional match.
        testing::skill(&pool, &alice, "JavaScript", SkillType::Want).await;
        let design = testing::skill(&pool, &alice, "Design", SkillType::Offer).await;
        let js = testing::skill(&pool, &bob, "JavaScript", SkillType::Offer).await;
        testing::skill(&pool, &bob, "Design", SkillType::Want).await;

        let matches = MatchingRepository::compute_matches(&pool, &alice.id)
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].they_offer_that_i_want.is_empty());
        assert!(!matches[0].i_offer_that_they_want.is_empty());

        let pair = MatchingRepository::auto_pair(&pool, &alice.id, &bob.id)
            .await
            .unwrap();
        assert_eq!(pair.requester_skill.id, design.id);
        assert_eq!(pair.receiver_skill.id, js.id);
    }

    #[tokio::test]
    async fn test_one_direction_falls_back_to_first_offer() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        // Only one direction matches; Alice's first OFFER fills the gap.
        testing::skill(&pool, &alice, "Spanish", SkillType::Want).await;
        let knitting = testing::skill(&pool, &alice, "Knitting", SkillType::Offer).await;
        testing::skill(&pool, &alice, "Chess", SkillType::Offer).await;
        let spanish = testing::skill(&pool, &bob, "Spanish", SkillType::Offer).await;

        let pair = MatchingRepository::auto_pair(&pool, &alice.id, &bob.id)
            .await
            .unwrap();
        assert_eq!(pair.requester_skill.id, knitting.id);
        assert_eq!(pair.receiver_skill.id, spanish.id);
    }

    #[tokio::test]
    async fn test_fallback_requires_an_offer_skill() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        // Alice has nothing to offer back.
        testing::skill(&pool, &alice, "Spanish", SkillType::Want).await;
        testing::skill(&pool, &bob, "Spanish", SkillType::Offer).await;

        let err = MatchingRepository::auto_pair(&pool, &alice.id, &bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_relationship_status_reported() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let bob = testing::user(&pool, "bob").await;

        testing::skill(&pool, &alice, "Piano", SkillType::Want).await;
        let alice_offer = testing::skill(&pool, &alice, "Singing", SkillType::Offer).await;
        let bob_offer = testing::skill(&pool, &bob, "Piano", SkillType::Offer).await;

        let matches = MatchingRepository::compute_matches(&pool, &alice.id)
            .await
            .unwrap();
        assert_eq!(matches[0].relationship, RelationshipStatus::None);

        let request = SwapRequestRepository::create(
            &pool,
            &alice.id,
            &bob.id,
            Some(&alice_offer.id),
            Some(&bob_offer.id),
            None,
        )
        .await
        .unwrap();

        let matches = MatchingRepository::compute_matches(&pool, &alice.id)
            .await
            .unwrap();
        assert_eq!(matches[0].relationship, RelationshipStatus::SentPending);
        assert_eq!(
            matches[0].pending_request_id.as_deref(),
            Some(request.id.as_str())
        );

        let matches = MatchingRepository::compute_matches(&pool, &bob.id)
            .await
            .unwrap();
        assert_eq!(matches[0].relationship, RelationshipStatus::ReceivedPending);

        SwapRequestRepository::accept(&pool, &request.id, &bob.id)
            .await
            .unwrap();
        let matches = MatchingRepository::compute_matches(&pool, &alice.id)
            .await
            .unwrap();
        assert_eq!(matches[0].relationship, RelationshipStatus::Active);
    }
}

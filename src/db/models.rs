use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum SkillType {
    Offer,
    Want,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum SwapStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum SessionType {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum LearningStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ResourceType {
    Link,
    #[serde(rename = "PDF")]
    #[sqlx(rename = "PDF")]
    Pdf,
    Note,
    Other,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Vec<u8>,
    #[serde(skip_serializing)]
    pub password_salt: Vec<u8>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub rating: f64,
    pub total_swaps: i64,
    pub is_admin: bool,
    pub created_at: i64,
}

/// Public view of a user, safe to return to any authenticated caller.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub rating: f64,
    pub total_swaps: i64,
    pub is_admin: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct AuthSession {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Skill {
    pub id: String,
    pub user_id: String,
    pub skill_name: String,
    pub skill_type: SkillType,
    pub description: Option<String>,
    pub proficiency_level: ProficiencyLevel,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SkillWithOwner {
    pub id: String,
    pub user_id: String,
    pub skill_name: String,
    pub skill_type: SkillType,
    pub description: Option<String>,
    pub proficiency_level: ProficiencyLevel,
    pub created_at: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub rating: f64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SwapRequest {
    pub id: String,
    pub requester_id: String,
    pub receiver_id: String,
    pub requester_skill_id: String,
    pub receiver_skill_id: String,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Swap request joined with both parties and both skills.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SwapRequestDetail {
    pub id: String,
    pub requester_id: String,
    pub receiver_id: String,
    pub requester_skill_id: String,
    pub receiver_skill_id: String,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub requester_username: String,
    pub requester_name: Option<String>,
    pub requester_rating: f64,
    pub receiver_username: String,
    pub receiver_name: Option<String>,
    pub receiver_rating: f64,
    pub requester_skill_name: String,
    pub receiver_skill_name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SwapSession {
    pub id: String,
    pub swap_request_id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub user1_skill_id: String,
    pub user2_skill_id: String,
    pub status: SwapStatus,
    pub started_at: i64,
    pub completed_at: Option<i64>,
}

impl SwapSession {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The counterpart of `user_id` in this session, if they participate.
    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        if self.user1_id == user_id {
            Some(&self.user2_id)
        } else if self.user2_id == user_id {
            Some(&self.user1_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SwapSessionDetail {
    pub id: String,
    pub swap_request_id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub user1_skill_id: String,
    pub user2_skill_id: String,
    pub status: SwapStatus,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub user1_username: String,
    pub user1_name: Option<String>,
    pub user2_username: String,
    pub user2_name: Option<String>,
    pub user1_skill_name: String,
    pub user2_skill_name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LearningSession {
    pub id: String,
    pub swap_session_id: String,
    pub teacher_id: String,
    pub student_id: String,
    pub topic: String,
    pub session_type: SessionType,
    pub scheduled_date: i64,
    pub duration_hours: f64,
    pub status: LearningStatus,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
    pub place: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LearningSessionDetail {
    pub id: String,
    pub swap_session_id: String,
    pub teacher_id: String,
    pub student_id: String,
    pub topic: String,
    pub session_type: SessionType,
    pub scheduled_date: i64,
    pub duration_hours: f64,
    pub status: LearningStatus,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
    pub place: Option<String>,
    pub created_at: i64,
    pub teacher_username: String,
    pub teacher_name: Option<String>,
    pub student_username: String,
    pub student_name: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resource {
    pub id: String,
    pub swap_session_id: String,
    pub uploaded_by: String,
    pub resource_type: ResourceType,
    pub title: String,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResourceDetail {
    pub id: String,
    pub swap_session_id: String,
    pub uploaded_by: String,
    pub resource_type: ResourceType,
    pub title: String,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub created_at: i64,
    pub uploaded_by_username: String,
    pub uploaded_by_name: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: String,
    pub swap_session_id: String,
    pub sender_id: String,
    pub sender_username: String, // Joined from users table
    pub message_text: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: String,
    pub swap_session_id: String,
    pub reviewer_id: String,
    pub reviewee_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewDetail {
    pub id: String,
    pub swap_session_id: String,
    pub reviewer_id: String,
    pub reviewee_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: i64,
    pub reviewer_username: String,
    pub reviewer_name: Option<String>,
    pub reviewee_username: String,
    pub reviewee_name: Option<String>,
}

/// Matched-user card in the match list.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MatchedUser {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub rating: f64,
    pub bio: Option<String>,
}

/// Authoritative relationship between the caller and a matched user,
/// computed server-side so clients never reconstruct it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipStatus {
    None,
    SentPending,
    ReceivedPending,
    Active,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub user: MatchedUser,
    pub they_offer_that_i_want: Vec<String>,
    pub i_offer_that_they_want: Vec<String>,
    pub relationship: RelationshipStatus,
    pub pending_request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchDetail {
    pub matched_user: MatchedUser,
    pub their_offers_that_i_want: Vec<Skill>,
    pub my_offers_that_they_want: Vec<Skill>,
    pub all_their_offers: Vec<Skill>,
    pub all_my_offers: Vec<Skill>,
}

// Input payloads shared between the API layer and the repositories.

#[derive(Debug, Clone, Deserialize)]
pub struct NewSkill {
    pub skill_name: String,
    pub skill_type: SkillType,
    pub description: Option<String>,
    pub proficiency_level: Option<ProficiencyLevel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSkill {
    pub skill_name: Option<String>,
    pub skill_type: Option<SkillType>,
    pub description: Option<String>,
    pub proficiency_level: Option<ProficiencyLevel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSwapRequest {
    pub receiver_id: String,
    pub requester_skill_id: Option<String>,
    pub receiver_skill_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLearningSession {
    pub swap_session_id: String,
    pub teacher_id: String,
    pub student_id: String,
    pub topic: String,
    pub session_type: SessionType,
    pub scheduled_date: i64,
    pub duration_hours: Option<f64>,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
    pub place: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLearningSession {
    pub status: Option<LearningStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewResource {
    pub swap_session_id: String,
    pub resource_type: ResourceType,
    pub title: String,
    pub content: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub swap_session_id: String,
    pub message_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub swap_session_id: String,
    pub reviewee_id: String,
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectRating {
    pub rating: i64,
    pub comment: Option<String>,
}
